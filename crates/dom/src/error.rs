use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("XML parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("XML parse error: unclosed element(s): <{0}>")]
    Unclosed(String),

    #[error("Empty XML document: no root element found")]
    NoRootElement,

    #[error("Cannot add element <{0}>: the document already has a root element")]
    MultipleRoots(String),

    #[error("A {0} node cannot have children or attributes")]
    InvalidParent(&'static str),
}
