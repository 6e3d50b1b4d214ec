//! Per-asset load progress.
//!
//! One [`ProgressTracker`] lives for a session and is shared by every load in
//! flight through [`SharedProgress`]. Each `begin` stamps a fresh generation;
//! callbacks carrying an older [`LoadToken`] are dropped so a superseded load
//! cannot touch the entry of the load that replaced it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type SharedProgress = Rc<RefCell<ProgressTracker>>;

/// Identifies one load of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadToken {
    id: String,
    generation: u64,
}

impl LoadToken {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("transfer of {url} failed: {message}")]
    TransferFailed { url: String, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadProgressEntry {
    pub active: bool,
    pub percent: f32,
    pub errors: Vec<TransferError>,
    generation: u64,
}

impl LoadProgressEntry {
    fn started(generation: u64) -> Self {
        Self {
            active: true,
            percent: 0.0,
            errors: Vec::new(),
            generation,
        }
    }

    pub fn indicator(&self) -> ProgressIndicator {
        ProgressIndicator::from_percent(self.percent)
    }
}

/// Ternary state shown by the gallery's loading bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ProgressIndicator {
    NotStarted,
    InProgress,
    Done,
}

impl ProgressIndicator {
    pub fn from_percent(percent: f32) -> Self {
        if percent <= 0.0 {
            Self::NotStarted
        } else if percent >= 100.0 {
            Self::Done
        } else {
            Self::InProgress
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::NotStarted => "red",
            Self::InProgress => "blue",
            Self::Done => "green",
        }
    }
}

/// `loaded / total * 100`, clamped to [0, 100]. A zero total is 0%.
pub fn percent_of(loaded: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    let percent = loaded as f64 / total as f64 * 100.0;
    percent.clamp(0.0, 100.0) as f32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&str, &LoadProgressEntry)>;

#[derive(Default)]
pub struct ProgressTracker {
    entries: HashMap<String, LoadProgressEntry>,
    next_generation: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("entries", &self.entries)
            .field("next_generation", &self.next_generation)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedProgress {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Starts (or restarts) tracking `id`, replacing any previous entry.
    pub fn begin(&mut self, id: &str) -> LoadToken {
        self.next_generation += 1;
        let generation = self.next_generation;
        if let Some(previous) = self.entries.get(id) {
            if previous.active {
                log::info!(
                    "Load of '{}' superseded (generation {} -> {})",
                    id,
                    previous.generation,
                    generation
                );
            }
        }
        self.entries
            .insert(id.to_string(), LoadProgressEntry::started(generation));
        self.notify(id);
        LoadToken {
            id: id.to_string(),
            generation,
        }
    }

    /// Returns false when the token is stale or the load already finished.
    pub fn on_progress(&mut self, token: &LoadToken, loaded: u64, total: u64) -> bool {
        let Some(entry) = self.current_mut(token) else {
            return false;
        };
        if !entry.active {
            return false;
        }
        let percent = percent_of(loaded, total);
        if percent > entry.percent {
            entry.percent = percent;
        }
        self.notify(&token.id);
        true
    }

    pub fn complete(&mut self, token: &LoadToken) -> bool {
        let Some(entry) = self.current_mut(token) else {
            return false;
        };
        entry.active = false;
        log::info!("Load of '{}' complete ({:.0}%)", token.id, entry.percent);
        self.notify(&token.id);
        true
    }

    pub fn fail(&mut self, token: &LoadToken, error: TransferError) -> bool {
        let Some(entry) = self.current_mut(token) else {
            return false;
        };
        log::warn!("Load of '{}' failed: {}", token.id, error);
        entry.errors.push(error);
        entry.active = false;
        self.notify(&token.id);
        true
    }

    pub fn read(&self, id: &str) -> Option<&LoadProgressEntry> {
        self.entries.get(id)
    }

    /// Percent for the UI; absent entries read as 0.
    pub fn percent(&self, id: &str) -> f32 {
        self.read(id).map(|entry| entry.percent).unwrap_or(0.0)
    }

    pub fn indicator(&self, id: &str) -> ProgressIndicator {
        ProgressIndicator::from_percent(self.percent(id))
    }

    pub fn is_current(&self, token: &LoadToken) -> bool {
        self.entries
            .get(&token.id)
            .is_some_and(|entry| entry.generation == token.generation)
    }

    pub fn active_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.active)
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Registers a listener called synchronously after every committed change.
    ///
    /// Listeners receive the new entry directly and must not reach back into
    /// the tracker.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&str, &LoadProgressEntry) + 'static,
    ) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(id, _)| *id != subscription);
        self.listeners.len() != before
    }

    fn current_mut(&mut self, token: &LoadToken) -> Option<&mut LoadProgressEntry> {
        match self.entries.get_mut(&token.id) {
            Some(entry) if entry.generation == token.generation => Some(entry),
            _ => {
                log::debug!(
                    "Dropping stale callback for '{}' (generation {})",
                    token.id,
                    token.generation
                );
                None
            }
        }
    }

    fn notify(&mut self, id: &str) {
        let Some(entry) = self.entries.get(id) else {
            return;
        };
        for (_, listener) in &mut self.listeners {
            listener(id, entry);
        }
    }
}
