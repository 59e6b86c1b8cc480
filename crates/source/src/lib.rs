//! File-set expansion for batch runs.
//!
//! A run is given any mix of:
//!
//! - glob patterns, which all share the context `{}`
//! - context objects, JSON values that carry their pattern in a field
//!   (`path` unless a [`PathExtractor`] says otherwise) and are handed to
//!   the caller with every file they match
//! - nested lists of either, flattened in order
//!
//! ## Example
//!
//! ```no_run
//! use serde_json::json;
//! use xmlpoke_source::{FileArg, expand};
//!
//! let args = vec![
//!     FileArg::from("config/*.xml"),
//!     FileArg::from(json!({"path": "build/*.csproj", "version": "1.2.0"})),
//! ];
//! for entry in expand(&args, None)? {
//!     println!("{} {}", entry.path.display(), entry.context);
//! }
//! # Ok::<(), xmlpoke_source::SourceError>(())
//! ```

mod error;

pub use error::SourceError;

use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;

/// Pulls the glob pattern out of a context object.
pub type PathExtractor = dyn Fn(&Value) -> Option<String>;

#[derive(Debug, Clone, PartialEq)]
pub enum FileArg {
    Pattern(String),
    Context(Value),
    List(Vec<FileArg>),
}

impl From<&str> for FileArg {
    fn from(pattern: &str) -> Self {
        FileArg::Pattern(pattern.to_string())
    }
}

impl From<String> for FileArg {
    fn from(pattern: String) -> Self {
        FileArg::Pattern(pattern)
    }
}

/// JSON strings are patterns, arrays are lists, anything else is a
/// context object.
impl From<Value> for FileArg {
    fn from(value: Value) -> Self {
        match value {
            Value::String(pattern) => FileArg::Pattern(pattern),
            Value::Array(items) => FileArg::List(items.into_iter().map(FileArg::from).collect()),
            other => FileArg::Context(other),
        }
    }
}

impl<T: Into<FileArg>> From<Vec<T>> for FileArg {
    fn from(items: Vec<T>) -> Self {
        FileArg::List(items.into_iter().map(Into::into).collect())
    }
}

/// One file of the set.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSetEntry {
    /// `0` for files matched by plain patterns; each context object gets
    /// its own id.
    pub id: usize,
    pub path: PathBuf,
    /// `{}` for plain patterns, otherwise the context object.
    pub context: Value,
}

/// Resolves `args` to files, in argument order and then match order.
///
/// Entries with the same id and path are kept once, so two patterns that
/// match the same file yield it once while two context objects that match
/// it yield it twice.
pub fn expand(
    args: &[FileArg],
    extractor: Option<&PathExtractor>,
) -> Result<Vec<FileSetEntry>, SourceError> {
    let mut flat = Vec::new();
    flatten(args, &mut flat);
    if flat.is_empty() {
        return Err(SourceError::NoPaths);
    }

    let mut next_id = 1;
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for arg in flat {
        let (id, pattern, context) = match arg {
            FileArg::Context(context) => {
                let pattern = match extractor {
                    Some(extract) => extract(context),
                    None => context.get("path").and_then(Value::as_str).map(str::to_string),
                }
                .ok_or_else(|| SourceError::MissingPath(context.to_string()))?;
                let id = next_id;
                next_id += 1;
                (id, pattern, context.clone())
            }
            FileArg::Pattern(pattern) => (0, pattern.clone(), Value::Object(Default::default())),
            FileArg::List(_) => continue,
        };

        let paths = glob_files(&pattern)?;
        log::debug!("Pattern '{}' matched {} file(s)", pattern, paths.len());
        for path in paths {
            if seen.insert((id, path.clone())) {
                entries.push(FileSetEntry {
                    id,
                    path,
                    context: context.clone(),
                });
            }
        }
    }
    Ok(entries)
}

fn flatten<'a>(args: &'a [FileArg], out: &mut Vec<&'a FileArg>) {
    for arg in args {
        match arg {
            FileArg::List(items) => flatten(items, out),
            other => out.push(other),
        }
    }
}

/// Files (never directories) matching `pattern`, sorted.
fn glob_files(pattern: &str) -> Result<Vec<PathBuf>, SourceError> {
    let matches = glob::glob(pattern).map_err(|source| SourceError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;
    let mut paths = Vec::new();
    for entry in matches {
        let path = entry?;
        if !path.is_dir() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.xml"), "<a/>").unwrap();
        fs::write(dir.path().join("b.xml"), "<b/>").unwrap();
        fs::write(dir.path().join("c.txt"), "c").unwrap();
        fs::create_dir(dir.path().join("dir.xml")).unwrap();
        dir
    }

    fn pattern(dir: &TempDir, glob: &str) -> String {
        dir.path().join(glob).to_string_lossy().into_owned()
    }

    fn names(entries: &[FileSetEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| e.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_no_paths() {
        assert!(matches!(expand(&[], None), Err(SourceError::NoPaths)));
        let empty = [FileArg::List(vec![FileArg::List(vec![])])];
        let err = expand(&empty, None).unwrap_err();
        assert_eq!(err.to_string(), "No paths specified!");
    }

    #[test]
    fn test_patterns_skip_directories() {
        let dir = fixture();
        let entries = expand(&[pattern(&dir, "*.xml").into()], None).unwrap();
        assert_eq!(names(&entries), vec!["a.xml", "b.xml"]);
        assert!(entries.iter().all(|e| e.id == 0 && e.context == json!({})));
    }

    #[test]
    fn test_patterns_collapse_on_the_same_file() {
        let dir = fixture();
        let args: Vec<FileArg> = vec![
            pattern(&dir, "a.xml").into(),
            vec![pattern(&dir, "*.xml")].into(),
        ];
        let entries = expand(&args, None).unwrap();
        assert_eq!(names(&entries), vec!["a.xml", "b.xml"]);
    }

    #[test]
    fn test_context_objects_do_not_collapse() {
        let dir = fixture();
        let args = vec![
            FileArg::from(json!({"path": pattern(&dir, "a.xml"), "n": 1})),
            FileArg::from(json!({"path": pattern(&dir, "a.*"), "n": 2})),
            FileArg::from(pattern(&dir, "a.xml")),
        ];
        let entries = expand(&args, None).unwrap();
        let ids: Vec<usize> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 0]);
        assert_eq!(entries[1].context["n"], json!(2));
        assert_eq!(entries[2].context, json!({}));
    }

    #[test]
    fn test_custom_extractor() {
        let dir = fixture();
        let file = pattern(&dir, "b.xml");
        let extract = |v: &Value| v["file"].as_str().map(str::to_string);
        let args = vec![FileArg::from(json!({ "file": file }))];
        let entries = expand(&args, Some(&extract)).unwrap();
        assert_eq!(names(&entries), vec!["b.xml"]);

        let err = expand(&args, None).unwrap_err();
        assert!(matches!(err, SourceError::MissingPath(_)));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = expand(&["a/***/b".into()], None).unwrap_err();
        assert!(matches!(err, SourceError::Pattern { .. }));
    }
}
