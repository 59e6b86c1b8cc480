use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("No paths specified!")]
    NoPaths,
    #[error("No path found in context object {0}")]
    MissingPath(String),
    #[error("Invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("Cannot read a match of the glob pattern: {0}")]
    Glob(#[from] glob::GlobError),
}
