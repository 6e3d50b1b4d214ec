//! Per-load handle tying a tracker token to that load's URL remapper.

use super::remap::UrlRemapper;
use super::LoadSpec;
use crate::progress::{LoadToken, SharedProgress, TransferError};

/// Handle for one asset instance's load, given to the external loader.
///
/// Bundles the tracker token with a remapper built from this load's own
/// include manifest. The loader routes every request through
/// [`LoadManager::request_url`] and reports back through the event methods;
/// events from a manager whose load has been superseded are ignored.
#[derive(Debug)]
pub struct LoadManager {
    token: LoadToken,
    spec: LoadSpec,
    remapper: UrlRemapper,
    progress: SharedProgress,
}

impl LoadManager {
    pub fn start(progress: &SharedProgress, asset_id: &str, spec: LoadSpec) -> Self {
        let token = progress.borrow_mut().begin(asset_id);
        log::info!(
            "Loading {:?} '{}' at {} ({} include entries)",
            spec.kind,
            asset_id,
            spec.tier,
            spec.auxiliary.len()
        );
        let remapper = UrlRemapper::new(spec.auxiliary.clone());
        Self {
            token,
            spec,
            remapper,
            progress: SharedProgress::clone(progress),
        }
    }

    pub fn asset_id(&self) -> &str {
        self.token.id()
    }

    pub fn token(&self) -> &LoadToken {
        &self.token
    }

    pub fn spec(&self) -> &LoadSpec {
        &self.spec
    }

    pub fn remapper(&self) -> &UrlRemapper {
        &self.remapper
    }

    /// The url to actually fetch for `requested`.
    pub fn request_url(&self, requested: &str) -> String {
        self.remapper.remap(requested)
    }

    pub fn is_current(&self) -> bool {
        self.progress.borrow().is_current(&self.token)
    }

    pub fn on_progress(&self, loaded: u64, total: u64) -> bool {
        self.progress.borrow_mut().on_progress(&self.token, loaded, total)
    }

    pub fn on_complete(&self) -> bool {
        self.progress.borrow_mut().complete(&self.token)
    }

    pub fn on_error(&self, url: &str, message: impl Into<String>) -> bool {
        let error = TransferError::TransferFailed {
            url: url.to_string(),
            message: message.into(),
        };
        self.progress.borrow_mut().fail(&self.token, error)
    }
}
