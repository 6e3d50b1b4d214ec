//! Sub-resource URL rewriting for a single load.
//!
//! A glTF references its textures by relative path, but the catalog serves
//! each of them from its own CDN location. The include manifest maps the
//! internal reference name to that location. A [`UrlRemapper`] is built from
//! one load's manifest and consulted for every request that load issues.

use crate::catalog::FileInfo;

/// One include entry: internal reference name -> override location.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IncludeEntry {
    pub reference: String,
    pub url: String,
}

/// Ordered include manifest for one model load.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct AuxiliaryManifest {
    entries: Vec<IncludeEntry>,
}

impl AuxiliaryManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_includes(includes: Vec<(String, FileInfo)>) -> Self {
        Self {
            entries: includes
                .into_iter()
                .map(|(reference, file)| IncludeEntry {
                    reference,
                    url: file.url,
                })
                .collect(),
        }
    }

    pub fn insert(&mut self, reference: impl Into<String>, url: impl Into<String>) {
        self.entries.push(IncludeEntry {
            reference: reference.into(),
            url: url.into(),
        });
    }

    pub fn entries(&self) -> &[IncludeEntry] {
        &self.entries
    }

    pub fn get(&self, reference: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.reference == reference)
            .map(|entry| entry.url.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemapDiagnostic {
    #[error(
        "'{filename}' matches {} include entries ({}); using '{chosen}'",
        .candidates.len(),
        .candidates.join(", ")
    )]
    AmbiguousRemap {
        filename: String,
        chosen: String,
        candidates: Vec<String>,
    },
}

/// Result of looking a request up in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemapOutcome<'a> {
    PassThrough,
    Rewritten(&'a str),
    Ambiguous {
        url: &'a str,
        diagnostic: RemapDiagnostic,
    },
}

impl RemapOutcome<'_> {
    pub fn url<'r>(&'r self, requested: &'r str) -> &'r str {
        match self {
            Self::PassThrough => requested,
            Self::Rewritten(url) => url,
            Self::Ambiguous { url, .. } => url,
        }
    }
}

/// Per-load request rewriter. Never share one between loads.
#[derive(Debug, Clone)]
pub struct UrlRemapper {
    manifest: AuxiliaryManifest,
}

impl UrlRemapper {
    pub fn new(manifest: AuxiliaryManifest) -> Self {
        Self { manifest }
    }

    pub fn manifest(&self) -> &AuxiliaryManifest {
        &self.manifest
    }

    /// Looks `requested` up without side effects.
    ///
    /// The filename is the final path segment. The first manifest key ending
    /// with it wins; further matches turn the outcome into `Ambiguous` while
    /// still carrying the first match.
    pub fn lookup(&self, requested: &str) -> RemapOutcome<'_> {
        let filename = final_segment(requested);
        if filename.is_empty() {
            return RemapOutcome::PassThrough;
        }
        let mut matches = self
            .manifest
            .entries
            .iter()
            .filter(|entry| entry.reference.ends_with(filename));
        let Some(first) = matches.next() else {
            return RemapOutcome::PassThrough;
        };
        let others: Vec<&IncludeEntry> = matches.collect();
        if others.is_empty() {
            return RemapOutcome::Rewritten(&first.url);
        }
        let candidates = std::iter::once(first)
            .chain(others)
            .map(|entry| entry.reference.clone())
            .collect();
        RemapOutcome::Ambiguous {
            url: &first.url,
            diagnostic: RemapDiagnostic::AmbiguousRemap {
                filename: filename.to_string(),
                chosen: first.reference.clone(),
                candidates,
            },
        }
    }

    /// The loader hook: returns the address to actually fetch.
    pub fn remap(&self, requested: &str) -> String {
        let outcome = self.lookup(requested);
        match &outcome {
            RemapOutcome::PassThrough => {}
            RemapOutcome::Rewritten(url) => log::debug!("Remapping {} -> {}", requested, url),
            RemapOutcome::Ambiguous { url, diagnostic } => {
                log::warn!("{}", diagnostic);
                log::debug!("Remapping {} -> {}", requested, url);
            }
        }
        outcome.url(requested).to_string()
    }

    /// Closure form for loaders that take a plain URL modifier.
    pub fn into_fn(self) -> impl Fn(&str) -> String {
        move |requested| self.remap(requested)
    }
}

/// Last `/`-separated segment, ignoring any query string or fragment.
fn final_segment(url: &str) -> &str {
    let end = url.find(|c| c == '?' || c == '#').unwrap_or(url.len());
    let path = &url[..end];
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(entries: &[(&str, &str)]) -> AuxiliaryManifest {
        let mut manifest = AuxiliaryManifest::new();
        for (reference, url) in entries {
            manifest.insert(*reference, *url);
        }
        manifest
    }

    #[test]
    fn rewrites_by_filename_suffix() {
        let remapper = UrlRemapper::new(manifest(&[("a/b/tex.png", "X")]));
        assert_eq!(remapper.remap("http://host/path/tex.png"), "X");
        assert_eq!(remapper.remap("http://host/other.png"), "http://host/other.png");
    }

    #[test]
    fn empty_manifest_passes_through() {
        let remapper = UrlRemapper::new(AuxiliaryManifest::new());
        assert_eq!(remapper.remap("m.bin"), "m.bin");
    }

    #[test]
    fn trailing_slash_never_matches() {
        let remapper = UrlRemapper::new(manifest(&[("textures/tex.png", "X")]));
        assert_eq!(remapper.lookup("http://host/dir/"), RemapOutcome::PassThrough);
    }

    #[test]
    fn query_string_is_ignored_for_matching() {
        let remapper = UrlRemapper::new(manifest(&[("textures/tex.png", "X")]));
        assert_eq!(remapper.remap("http://host/tex.png?v=2"), "X");
    }

    #[test]
    fn first_match_wins_and_is_flagged() {
        let remapper = UrlRemapper::new(manifest(&[
            ("textures/rock_diff.png", "FIRST"),
            ("other/rock_diff.png", "SECOND"),
        ]));
        match remapper.lookup("rock_diff.png") {
            RemapOutcome::Ambiguous { url, diagnostic } => {
                assert_eq!(url, "FIRST");
                let RemapDiagnostic::AmbiguousRemap {
                    chosen, candidates, ..
                } = diagnostic;
                assert_eq!(chosen, "textures/rock_diff.png");
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
        assert_eq!(remapper.remap("rock_diff.png"), "FIRST");
    }

    #[test]
    fn independent_remappers_do_not_interfere() {
        let a = UrlRemapper::new(manifest(&[("tex.png", "A")]));
        let b = UrlRemapper::new(manifest(&[("tex.png", "B")]));
        assert_eq!(a.remap("tex.png"), "A");
        assert_eq!(b.remap("tex.png"), "B");
        let hook = a.into_fn();
        assert_eq!(hook("x/tex.png"), "A");
    }
}
