// src/error.rs
//! Error types for document sessions and batch runs.

use thiserror::Error;
use xmlpoke_dom::DomError;
use xmlpoke_source::SourceError;
use xmlpoke_xpath1::XPathError;

#[derive(Error, Debug)]
pub enum PokeError {
    /// A query came back empty while the session demands matches.
    #[error("No matching nodes for xpath '{0}'.")]
    NoMatch(String),
    #[error("XPath evaluation failed: {0}")]
    XPath(#[from] XPathError),
    #[error("{0}")]
    Dom(#[from] DomError),
    #[error("File selection failed: {0}")]
    Source(#[from] SourceError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot assign {kind} to attribute '{name}'")]
    AttributeValue { kind: &'static str, name: String },
    #[error("Invalid path '{0}': the last step is not a node name")]
    InvalidPath(String),
    #[error("Document was loaded from a string and has no file to save to")]
    NotFileBacked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_message() {
        let err = PokeError::NoMatch("a/b".to_string());
        assert_eq!(err.to_string(), "No matching nodes for xpath 'a/b'.");
    }

    #[test]
    fn test_wraps_collaborator_errors() {
        let err: PokeError = XPathError::UnknownPrefix("z".to_string()).into();
        assert!(matches!(err, PokeError::XPath(_)));
        let err: PokeError = DomError::NoRootElement.into();
        assert!(matches!(err, PokeError::Dom(DomError::NoRootElement)));
    }
}
