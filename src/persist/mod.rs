//! Draft persistence.
//!
//! The persisted form of a wizard is a single keyed blob:
//!
//! ```text
//! {"state": <Snapshot>, "version": "1.0"}
//! ```
//!
//! Key invariants:
//! - Live file handles are never written; they become placeholder metadata.
//! - Placeholders are restored as placeholders, never as usable handles.
//! - A snapshot with an incompatible major version, or one that fails to
//!   parse, is discarded and the wizard starts from its initial state.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            PersistedStore<S, B, C>            │
//! │   dispatch ──► FormActions (inner store)      │
//! │      │                                        │
//! │      └─ dirtied? ──► Debouncer (one window)   │
//! │                          │ quiet period       │
//! │                          ↓                    │
//! │   tick ──► Snapshot ──► Envelope ──► B: store │
//! └──────────────────────────────────────────────┘
//! ```

mod background;
mod debounce;
#[cfg(feature = "persistent")]
mod file;
mod storage;
mod store;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::STEP_COUNT;
use crate::error::PersistError;
use crate::file_ref::{FileRef, StoredFileRef};
use crate::record::FormRecord;
use crate::store::FormState;

pub use background::BackgroundStorage;
pub use debounce::{Clock, Debouncer, ManualClock, SystemClock};
#[cfg(feature = "persistent")]
pub use file::FileStorage;
pub use storage::{MemoryStorage, SnapshotStorage};
pub use store::{PersistedStore, RestoreStatus};

/// Schema version written into every envelope.
pub const SCHEMA_VERSION: &str = "1.0";

/// True if a snapshot written with `version` can be read by this build.
///
/// Versions sharing the same major component are compatible.
#[must_use]
pub fn is_compatible(version: &str) -> bool {
    let major = |v: &str| v.split('.').next().map(str::to_owned);
    !version.is_empty() && major(version) == major(SCHEMA_VERSION)
}

/// The persisted part of a `FormState`.
///
/// Touched fields and errors are not persisted: a resumed wizard starts
/// with a clean validation slate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub record: FormRecord<StoredFileRef>,
    pub current_step: u8,
    pub completed_steps: BTreeSet<u8>,
    pub last_saved: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Captures `state`, replacing file handles with placeholders.
    #[must_use]
    pub fn capture(state: &FormState) -> Self {
        Self {
            record: state.record.map_files(FileRef::to_stored),
            current_step: state.current_step,
            completed_steps: state.completed_steps.clone(),
            last_saved: state.last_saved,
        }
    }

    /// Rebuilds a clean form state from this snapshot.
    #[must_use]
    pub fn into_state(self) -> FormState {
        FormState {
            record: self.record.into_files(FileRef::from),
            current_step: self.current_step.clamp(1, STEP_COUNT),
            completed_steps: self
                .completed_steps
                .into_iter()
                .filter(|s| (1..=STEP_COUNT).contains(s))
                .collect(),
            last_saved: self.last_saved,
            ..FormState::initial()
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    state: &'a Snapshot,
    version: &'static str,
}

#[derive(Deserialize)]
struct RawEnvelope {
    state: serde_json::Value,
    version: String,
}

/// Serializes `snapshot` into a versioned envelope.
///
/// # Errors
///
/// Returns `PersistError::Serialization` if JSON encoding fails.
pub fn encode_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>, PersistError> {
    serde_json::to_vec(&Envelope {
        state: snapshot,
        version: SCHEMA_VERSION,
    })
    .map_err(|e| PersistError::Serialization {
        message: format!("encode snapshot: {e}"),
    })
}

/// Parses a versioned envelope.
///
/// # Errors
///
/// - `Corrupt` if the blob is not an envelope at all
/// - `IncompatibleVersion` if the schema major version differs
/// - `Serialization` if the state does not match the current schema
pub fn decode_snapshot(blob: &[u8]) -> Result<Snapshot, PersistError> {
    let raw: RawEnvelope = serde_json::from_slice(blob).map_err(|e| PersistError::Corrupt {
        message: format!("decode envelope: {e}"),
    })?;
    if !is_compatible(&raw.version) {
        return Err(PersistError::IncompatibleVersion {
            found: raw.version,
            expected: SCHEMA_VERSION,
        });
    }
    serde_json::from_value(raw.state).map_err(|e| PersistError::Serialization {
        message: format!("decode snapshot state: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_ref::FileHandle;

    #[test]
    fn envelope_layout() {
        let snapshot = Snapshot::capture(&FormState::initial());
        let blob = encode_snapshot(&snapshot).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&blob).unwrap();
        assert_eq!(json["version"], SCHEMA_VERSION);
        assert_eq!(json["state"]["currentStep"], 1);
        assert!(json["state"]["record"]["launchChecklist"].is_array());
    }

    #[test]
    fn handles_are_written_as_placeholders() {
        let mut state = FormState::initial();
        state.record.thumbnail_image = FileHandle::new("thumb.jpg", "image/jpeg", vec![0u8; 32]).into();
        let blob = encode_snapshot(&Snapshot::capture(&state)).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&blob).unwrap();
        let thumb = &json["state"]["record"]["thumbnailImage"];
        assert_eq!(thumb["isPlaceholder"], true);
        assert_eq!(thumb["size"], 32);
        assert_eq!(thumb["name"], "thumb.jpg");
    }

    #[test]
    fn restored_state_keeps_placeholders_inert() {
        let mut state = FormState::initial();
        state.record.title = "Resume me".to_string();
        state.record.thumbnail_image = FileHandle::new("thumb.jpg", "image/jpeg", vec![1u8]).into();
        state.current_step = 4;
        state.completed_steps.extend([1, 2, 3]);

        let blob = encode_snapshot(&Snapshot::capture(&state)).unwrap();
        let restored = decode_snapshot(&blob).unwrap().into_state();

        assert_eq!(restored.record.title, "Resume me");
        assert!(restored.record.thumbnail_image.is_placeholder());
        assert_eq!(restored.current_step, 4);
        assert_eq!(restored.completed_steps, BTreeSet::from([1, 2, 3]));
        assert!(!restored.is_dirty);
        assert!(restored.touched_fields.is_empty());
    }

    #[test]
    fn rejects_incompatible_major_version() {
        let blob = br#"{"state": {}, "version": "2.3"}"#;
        assert!(matches!(
            decode_snapshot(blob),
            Err(PersistError::IncompatibleVersion { found, .. }) if found == "2.3"
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(decode_snapshot(b"not json"), Err(PersistError::Corrupt { .. })));
        assert!(matches!(
            decode_snapshot(br#"{"state": {"record": 5}, "version": "1.0"}"#),
            Err(PersistError::Serialization { .. })
        ));
    }

    #[test]
    fn compatible_versions() {
        assert!(is_compatible("1.0"));
        assert!(is_compatible("1.7"));
        assert!(!is_compatible("2.0"));
        assert!(!is_compatible(""));
    }

    #[test]
    fn out_of_range_steps_are_clamped_on_restore() {
        let mut snapshot = Snapshot::capture(&FormState::initial());
        snapshot.current_step = 99;
        snapshot.completed_steps = BTreeSet::from([0, 2, 12]);
        let state = snapshot.into_state();
        assert_eq!(state.current_step, STEP_COUNT);
        assert_eq!(state.completed_steps, BTreeSet::from([2]));
    }
}
