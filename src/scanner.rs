//! Filesystem scanner for `*.config.json` documents.
//!
//! Walks a directory tree, parses every matching file, and keeps the ones
//! that parse. Malformed files are dropped without failing the scan.

use crate::document::ConfigDocument;
use crate::error::ScanError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Filename suffix a configuration document must carry.
pub const CONFIG_SUFFIX: &str = ".config.json";

/// Result of one per-file parse attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Parsed(ConfigDocument),
    Skipped { path: PathBuf, reason: String },
}

impl FileOutcome {
    pub fn into_document(self) -> Option<ConfigDocument> {
        match self {
            FileOutcome::Parsed(doc) => Some(doc),
            FileOutcome::Skipped { .. } => None,
        }
    }
}

/// True if `name` is `<base>.config.json` with a non-empty base.
pub fn is_config_file_name(name: &str) -> bool {
    name.len() > CONFIG_SUFFIX.len() && name.ends_with(CONFIG_SUFFIX)
}

/// Remove every CRLF pair. Lone CR or LF characters are left alone.
pub fn strip_crlf(content: &str) -> String {
    content.replace("\r\n", "")
}

/// Parse normalized file content into a document.
///
/// Only objects and arrays are accepted.
pub fn parse_document(content: &str) -> Result<ConfigDocument, String> {
    let value: ConfigDocument =
        serde_json::from_str(&strip_crlf(content)).map_err(|e| e.to_string())?;
    if value.is_object() || value.is_array() {
        Ok(value)
    } else {
        Err("top-level value is not an object or array".to_string())
    }
}

/// Read and parse a single file.
pub fn load_file(path: &Path) -> FileOutcome {
    let outcome = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| parse_document(&content));
    match outcome {
        Ok(doc) => FileOutcome::Parsed(doc),
        Err(reason) => FileOutcome::Skipped {
            path: path.to_path_buf(),
            reason,
        },
    }
}

/// Collect matching file paths under `root` in walk order.
///
/// Entries are sorted by name within each directory so the order only
/// depends on the directory contents. Symlinks are not followed.
pub fn find_config_files(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let access_error = |source| ScanError::DirectoryAccess {
        path: root.to_path_buf(),
        source,
    };
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Ok(Vec::new()),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            return Ok(Vec::new());
        }
        Err(e) => return Err(access_error(e)),
    }

    // Only the root itself is required to be listable.
    std::fs::read_dir(root).map_err(access_error)?;

    let mut matches = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if entry
            .file_name()
            .to_str()
            .is_some_and(is_config_file_name)
        {
            matches.push(entry.into_path());
        }
    }
    Ok(matches)
}

/// Scan `root` recursively and return every document that parsed.
///
/// A missing root yields an empty list. A root that exists but cannot be
/// listed yields [`ScanError::DirectoryAccess`].
pub fn scan_directory(root: &Path) -> Result<Vec<ConfigDocument>, ScanError> {
    trace!("Loading configurations from directory [{}]", root.display());

    let outcomes: Vec<FileOutcome> = find_config_files(root)?
        .iter()
        .map(|path| load_file(path))
        .collect();

    let documents: Vec<ConfigDocument> = outcomes
        .into_iter()
        .filter_map(|outcome| {
            if let FileOutcome::Skipped { path, reason } = &outcome {
                debug!(path = %path.display(), %reason, "Skipping unparsable configuration file");
            }
            outcome.into_document()
        })
        .collect();

    trace!(
        count = documents.len(),
        "Total documents returned from fs [{}]",
        documents.len()
    );
    Ok(documents)
}
