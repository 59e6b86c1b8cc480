// src/options.rs
use std::fmt;
use xmlpoke_core::Document;
use xmlpoke_source::PathExtractor;

/// When the files of a batch are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitMode {
    /// Each file is saved as soon as its callback returns. A failure part
    /// way through leaves the earlier files modified on disk. (Default)
    #[default]
    Immediate,
    /// Every file is modified in memory first; nothing is written unless all
    /// callbacks succeed.
    Staged,
}

/// Settings applied to every document of a run before its callback sees it.
#[derive(Default)]
pub struct PokeOptions {
    pub commit: CommitMode,
    pub base_path: Option<String>,
    pub namespaces: Vec<(String, String)>,
    pub strict: bool,
    pub extractor: Option<Box<PathExtractor>>,
}

impl PokeOptions {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_commit_mode(mut self, commit: CommitMode) -> Self {
        self.commit = commit;
        self
    }

    pub fn with_base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.push((prefix.into(), uri.into()));
        self
    }

    /// Makes every document fail on paths that match nothing.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Reads the glob pattern of context objects with `extract` instead of
    /// from their `path` field.
    pub fn with_path_extractor<F>(mut self, extract: F) -> Self
    where
        F: Fn(&serde_json::Value) -> Option<String> + 'static,
    {
        self.extractor = Some(Box::new(extract));
        self
    }

    pub(crate) fn configure(&self, document: &mut Document) {
        if let Some(base_path) = &self.base_path {
            document.with_base_path(base_path.as_str());
        }
        for (prefix, uri) in &self.namespaces {
            document.add_namespace(prefix, uri);
        }
        if self.strict {
            document.error_on_no_matches();
        }
    }
}

impl fmt::Debug for PokeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PokeOptions")
            .field("commit", &self.commit)
            .field("base_path", &self.base_path)
            .field("namespaces", &self.namespaces)
            .field("strict", &self.strict)
            .field("extractor", &self.extractor.as_ref().map(|_| ".."))
            .finish()
    }
}
