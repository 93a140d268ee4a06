//! Where batch documents come from: the built-in set or files on disk.

use crate::document::RawDocument;
use crate::error::KgError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Domain documents compiled into the binary, in load order.
pub const BUNDLED: &[(&str, &str)] = &[
    ("Ethics_KG.json", include_str!("../resources/Ethics_KG.json")),
    (
        "CyberSecurity_KG.json",
        include_str!("../resources/CyberSecurity_KG.json"),
    ),
    (
        "ARC_Puzzle_Agent_Definitions_KG.json",
        include_str!("../resources/ARC_Puzzle_Agent_Definitions_KG.json"),
    ),
];

/// A source entry that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unreadable {
    pub source: String,
    pub message: String,
}

pub type SourceItem = Result<RawDocument, Unreadable>;

#[derive(Debug, Clone)]
enum Origin {
    Bundled,
    Paths(Vec<PathBuf>),
}

#[derive(Debug, Clone)]
pub struct DocumentSource {
    origin: Origin,
}

impl DocumentSource {
    pub fn bundled() -> Self {
        Self {
            origin: Origin::Bundled,
        }
    }

    /// Files are taken as given; directories expand to every `.json` file beneath them.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            origin: Origin::Paths(paths.into_iter().map(Into::into).collect()),
        }
    }

    /// Names of the documents this source would yield.
    pub fn list(&self) -> Vec<String> {
        match &self.origin {
            Origin::Bundled => BUNDLED.iter().map(|(name, _)| name.to_string()).collect(),
            Origin::Paths(paths) => expand(paths)
                .into_iter()
                .filter(|p| p.is_file())
                .map(|p| p.display().to_string())
                .collect(),
        }
    }

    /// Read every document. Unreadable entries are returned, not raised.
    pub fn read(&self) -> Vec<SourceItem> {
        match &self.origin {
            Origin::Bundled => BUNDLED
                .iter()
                .map(|(name, text)| Ok(RawDocument::new(*name, *text)))
                .collect(),
            Origin::Paths(paths) => expand(paths).into_iter().map(|p| read_file(&p)).collect(),
        }
    }
}

fn expand(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(e) => Some(e),
                    Err(err) => {
                        warn!(error = %err, "skipping unreadable directory entry");
                        None
                    }
                })
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            found.sort();
            debug!(dir = %path.display(), files = found.len(), "expanded document directory");
            out.extend(found);
        } else {
            out.push(path.clone());
        }
    }
    out
}

fn read_file(path: &Path) -> SourceItem {
    let source = path.display().to_string();
    std::fs::read_to_string(path)
        .map(|text| RawDocument::new(source.clone(), text))
        .map_err(|e| Unreadable {
            message: KgError::Io {
                path: path.to_path_buf(),
                source: e,
            }
            .to_string(),
            source,
        })
}
