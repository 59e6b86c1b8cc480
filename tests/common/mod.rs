#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use xmlpoke::{Document, PokeError};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Loads `xml`, runs `edit` on it and returns the serialized result.
pub fn poked<F>(xml: &str, edit: F) -> Result<String, PokeError>
where
    F: FnOnce(&mut Document) -> Result<(), PokeError>,
{
    let mut doc = Document::load(xml)?;
    edit(&mut doc)?;
    Ok(doc.to_string())
}

/// A temporary directory of XML files.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new(files: &[(&str, &str)]) -> std::io::Result<Self> {
        let dir = TempDir::new()?;
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
        }
        Ok(Self { dir })
    }

    /// `a.xml`, `b.xml`, `dir/a.xml` and `dir/b.xml`, all `<a><b/></a>`.
    pub fn standard() -> std::io::Result<Self> {
        Self::new(&[
            ("a.xml", "<a><b/></a>"),
            ("b.xml", "<a><b/></a>"),
            ("dir/a.xml", "<a><b/></a>"),
            ("dir/b.xml", "<a><b/></a>"),
        ])
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// A glob pattern rooted in the fixture directory.
    pub fn pattern(&self, glob: &str) -> String {
        self.path(glob).to_string_lossy().into_owned()
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).unwrap_or_default()
    }

    /// `path` relative to the fixture directory, with `/` separators.
    pub fn relative(&self, path: &Path) -> String {
        path.strip_prefix(self.dir.path())
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}
