// src/poke.rs
//! Runs a modify callback over a literal document or a set of files.

use crate::options::{CommitMode, PokeOptions};
use serde_json::{Value as Json, json};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use xmlpoke_core::{Document, PokeError};
use xmlpoke_source::{FileArg, FileSetEntry, expand};

/// The files a batch wrote, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PokeReport {
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PokeOutcome {
    /// The patched text of a literal document.
    Literal(String),
    Files(PokeReport),
}

/// Patches a literal document. The callback's context is `{}`.
pub fn poke_str<F>(xml: &str, modify: F) -> Result<String, PokeError>
where
    F: FnOnce(&mut Document, &Json) -> Result<(), PokeError>,
{
    poke_literal(xml, &PokeOptions::default(), modify)
}

/// Patches a literal document (a single pattern starting with `<`) or
/// every file `args` expands to.
pub fn poke<F>(args: &[FileArg], options: &PokeOptions, mut modify: F) -> Result<PokeOutcome, PokeError>
where
    F: FnMut(&mut Document, &Json) -> Result<(), PokeError>,
{
    if let [FileArg::Pattern(source)] = args
        && source.trim_start().starts_with('<')
    {
        return poke_literal(source, options, &mut modify).map(PokeOutcome::Literal);
    }
    let entries = expand(args, options.extractor.as_deref())?;
    poke_files(&entries, options, modify).map(PokeOutcome::Files)
}

/// Opens, modifies and saves each file, passing the entry's context to
/// the callback.
pub fn poke_files<F>(
    entries: &[FileSetEntry],
    options: &PokeOptions,
    mut modify: F,
) -> Result<PokeReport, PokeError>
where
    F: FnMut(&mut Document, &Json) -> Result<(), PokeError>,
{
    let mut report = PokeReport::default();
    match options.commit {
        CommitMode::Immediate => {
            for entry in entries {
                let document = open_and_modify(entry, options, &mut modify)?;
                document.save()?;
                report.files.push(entry.path.clone());
            }
        }
        CommitMode::Staged => {
            // One document per file; entries that share a file edit it in turn.
            let mut staged: Vec<(PathBuf, Document)> = Vec::new();
            let mut index: HashMap<&Path, usize> = HashMap::new();
            for entry in entries {
                match index.get(entry.path.as_path()) {
                    Some(&i) => modify(&mut staged[i].1, &entry.context)?,
                    None => {
                        let document = open_and_modify(entry, options, &mut modify)?;
                        index.insert(&entry.path, staged.len());
                        staged.push((entry.path.clone(), document));
                    }
                }
            }
            log::debug!("All {} file(s) modified, writing", staged.len());
            for (path, document) in staged {
                document.save()?;
                report.files.push(path);
            }
        }
    }
    Ok(report)
}

fn poke_literal<F>(xml: &str, options: &PokeOptions, modify: F) -> Result<String, PokeError>
where
    F: FnOnce(&mut Document, &Json) -> Result<(), PokeError>,
{
    let mut document = Document::load(xml)?;
    options.configure(&mut document);
    modify(&mut document, &json!({}))?;
    Ok(document.to_string())
}

fn open_and_modify<F>(
    entry: &FileSetEntry,
    options: &PokeOptions,
    modify: &mut F,
) -> Result<Document, PokeError>
where
    F: FnMut(&mut Document, &Json) -> Result<(), PokeError>,
{
    let mut document = Document::open(&entry.path)?;
    options.configure(&mut document);
    modify(&mut document, &entry.context)?;
    Ok(document)
}
