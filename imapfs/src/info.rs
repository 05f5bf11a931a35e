use std::fmt;

use chrono::{DateTime, FixedOffset};

/// The type of a filesystem entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(
    feature = "derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum FileType {
    File,
    Directory,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// The information about a filesystem entry.
///
/// Folders and messages are directories of size 0. Attachments are
/// files, sized by their decoded content.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub struct FileInfo {
    /// The normalized path of the entry.
    pub name: String,

    /// The size of the entry, in bytes.
    pub size: u64,

    /// The type of the entry.
    #[cfg_attr(feature = "derive", serde(rename = "type"))]
    pub kind: FileType,

    /// The creation date of the entry, when known.
    #[cfg_attr(
        feature = "derive",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub created: Option<DateTime<FixedOffset>>,
}

impl FileInfo {
    pub fn directory(name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            size: 0,
            kind: FileType::Directory,
            created: None,
        }
    }

    pub fn file(name: impl ToString, size: u64) -> Self {
        Self {
            name: name.to_string(),
            size,
            kind: FileType::File,
            created: None,
        }
    }

    pub fn with_created(mut self, created: Option<DateTime<FixedOffset>>) -> Self {
        self.created = created;
        self
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileType::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileType::File
    }
}
