//! Output records and the directory writer that persists them.
//!
//! Each processed image becomes one pretty-printed JSON file named after the
//! last path segment of its object key, extension removed.

use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Prefix of every record id.
pub const ID_PREFIX: &str = "illustration_";

/// The persisted result for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Original object key
    pub key: String,

    /// Last key segment without extension
    pub filename: String,

    /// `illustration_<filename>`
    pub id: String,

    /// Generated texts, one per input image
    pub description: Vec<String>,

    /// First generated text
    pub tags: String,
}

impl OutputRecord {
    /// Build the record for `key` from its generated description.
    ///
    /// Fails if the key has no usable file name or the description is empty.
    pub fn new(key: &str, description: Vec<String>) -> Result<Self, RecordError> {
        let filename = derive_filename(key)?;
        let tags = description
            .first()
            .cloned()
            .ok_or_else(|| RecordError::EmptyDescription {
                key: key.to_string(),
            })?;

        Ok(Self {
            key: key.to_string(),
            id: format!("{ID_PREFIX}{filename}"),
            filename,
            description,
            tags,
        })
    }
}

/// Derive the record file name from an object key.
///
/// Takes the segment after the last `/` and drops everything from its first
/// `.`, so `a/b/c/image.png` gives `image` and `x/archive.tar.gz` gives
/// `archive`.
pub fn derive_filename(key: &str) -> Result<String, RecordError> {
    let last = key.rsplit('/').next().unwrap_or(key);
    let stem = last.split('.').next().unwrap_or(last);
    if stem.is_empty() {
        return Err(RecordError::InvalidKey(key.to_string()));
    }
    Ok(stem.to_string())
}

/// Writes records as `<dir>/<filename>.json`.
#[derive(Debug, Clone)]
pub struct RecordWriter {
    dir: PathBuf,
}

impl RecordWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory if it does not exist yet.
    pub fn ensure_dir(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }

    /// Where the record for `filename` lives.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(format!("{filename}.json"))
    }

    /// Write `record`, replacing any previous file for the same name.
    ///
    /// The JSON goes to a temporary sibling first and is renamed into place,
    /// so a failed write never leaves a truncated record behind.
    pub fn write(&self, record: &OutputRecord) -> io::Result<PathBuf> {
        let path = self.path_for(&record.filename);
        let tmp = self.dir.join(format!(".{}.json.tmp", record.filename));

        let result = (|| {
            let mut file = io::BufWriter::new(std::fs::File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut file, record).map_err(io::Error::other)?;
            writeln!(file)?;
            file.flush()?;
            std::fs::rename(&tmp, &path)
        })();

        if result.is_err() {
            let _ = std::fs::remove_file(&tmp);
        }
        result.map(|()| path)
    }
}
