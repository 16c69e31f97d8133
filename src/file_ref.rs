//! References to binary attachments.
//!
//! A live `FileHandle` owns bytes the user just picked and can never be
//! written to durable storage. The persistable form, `StoredFileRef`, has
//! no variant for it: converting a `FileRef` replaces handles with
//! placeholder metadata, so a serialized draft cannot contain one.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An opaque, in-memory file the user attached in this session.
#[derive(Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// Session-unique handle id.
    pub id: Uuid,
    /// Original file name.
    pub name: String,
    /// MIME type reported by the picker.
    pub mime_type: String,
    bytes: Arc<[u8]>,
}

impl FileHandle {
    /// Wraps picked bytes in a new handle.
    #[must_use]
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Size of the content in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// The file content.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Metadata describing this handle once it can no longer be held.
    #[must_use]
    pub fn placeholder(&self) -> FileMeta {
        FileMeta {
            name: self.name.clone(),
            size: self.size(),
            mime_type: self.mime_type.clone(),
            is_placeholder: true,
        }
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size())
            .finish()
    }
}

/// Inert description of a file that must be re-supplied by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub is_placeholder: bool,
}

/// A binary-reference field value held by the live form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FileRef {
    /// Picked in this session, not yet uploaded.
    Handle(FileHandle),
    /// Already uploaded.
    RemoteUrl(String),
    /// Restored from a draft; the original bytes are gone.
    Placeholder(FileMeta),
    #[default]
    None,
}

impl FileRef {
    /// Returns true if the reference points at usable content.
    ///
    /// Placeholders do not count: the user has to pick the file again.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Handle(_) | Self::RemoteUrl(_))
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    /// The uploaded URL, if any.
    #[must_use]
    pub fn remote_url(&self) -> Option<&str> {
        match self {
            Self::RemoteUrl(url) => Some(url),
            _ => None,
        }
    }

    /// Converts to the persistable form, replacing handles with placeholders.
    #[must_use]
    pub fn to_stored(&self) -> StoredFileRef {
        match self {
            Self::Handle(handle) => StoredFileRef::Placeholder(handle.placeholder()),
            Self::RemoteUrl(url) => StoredFileRef::RemoteUrl(url.clone()),
            Self::Placeholder(meta) => StoredFileRef::Placeholder(meta.clone()),
            Self::None => StoredFileRef::None,
        }
    }

    /// Stable identity used when fingerprinting state for memoization.
    #[must_use]
    pub fn fingerprint(&self) -> FileFingerprint {
        match self {
            Self::Handle(handle) => FileFingerprint::Handle(handle.id),
            Self::RemoteUrl(url) => FileFingerprint::RemoteUrl(url.clone()),
            Self::Placeholder(meta) => FileFingerprint::Placeholder(meta.name.clone()),
            Self::None => FileFingerprint::None,
        }
    }
}

impl From<FileHandle> for FileRef {
    fn from(handle: FileHandle) -> Self {
        Self::Handle(handle)
    }
}

impl From<StoredFileRef> for FileRef {
    fn from(stored: StoredFileRef) -> Self {
        match stored {
            StoredFileRef::RemoteUrl(url) => Self::RemoteUrl(url),
            StoredFileRef::Placeholder(meta) => Self::Placeholder(meta),
            StoredFileRef::None => Self::None,
        }
    }
}

/// The only file reference shape that is ever serialized.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredFileRef {
    RemoteUrl(String),
    Placeholder(FileMeta),
    #[default]
    None,
}

/// Serializable identity of a file reference, used only for cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum FileFingerprint {
    Handle(Uuid),
    RemoteUrl(String),
    Placeholder(String),
    None,
}
