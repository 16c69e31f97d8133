//! Draft persistence tests.
//!
//! These verify that:
//! - Autosave fires once per quiet period, timed from the last edit
//! - Drafts survive a reopen, with file handles reduced to placeholders
//! - Incompatible or corrupt drafts fall back to a fresh wizard
//! - Reset discards the stored draft

use std::sync::Arc;
use std::time::Duration;

use formwizard::persist::{encode_snapshot, Snapshot, SCHEMA_VERSION};
use formwizard::{
    BackgroundStorage, FieldPath, FileHandle, FormActions, FormState, FormStore, ManualClock, MemoryStorage,
    PersistedStore, RestoreStatus, SnapshotStorage, WizardConfig,
};

const KEY: &str = "create-product-wizard";

type Wizard = PersistedStore<FormStore, Arc<MemoryStorage>, ManualClock>;

fn open(storage: &Arc<MemoryStorage>, clock: &ManualClock) -> Wizard {
    PersistedStore::open(WizardConfig::default(), Arc::clone(storage), clock.clone()).unwrap()
}

#[test]
fn test_debounced_save_fires_once_after_last_edit() {
    let storage = Arc::new(MemoryStorage::new());
    let clock = ManualClock::new();
    let mut wizard = open(&storage, &clock);

    for title in ["First", "Second", "Third"] {
        wizard.set_field(FieldPath::Title, title);
        assert!(!wizard.tick().unwrap());
        clock.advance(Duration::from_millis(500));
    }
    // Last edit at t=1000ms; now t=1500ms.
    assert_eq!(storage.writes(), 0);

    clock.advance(Duration::from_millis(1_900));
    assert!(!wizard.tick().unwrap());
    assert_eq!(storage.writes(), 0, "must not fire 2.5s after the first edit");

    clock.advance(Duration::from_millis(100));
    assert!(wizard.tick().unwrap());
    assert_eq!(storage.writes(), 1);
    assert!(!wizard.state().is_dirty);
    assert!(wizard.state().last_saved.is_some());

    clock.advance(Duration::from_secs(10));
    assert!(!wizard.tick().unwrap());
    assert_eq!(storage.writes(), 1);
}

#[test]
fn test_draft_survives_reopen() {
    let storage = Arc::new(MemoryStorage::new());
    let clock = ManualClock::new();
    {
        let mut wizard = open(&storage, &clock);
        wizard.set_field(FieldPath::Title, "Resumable draft");
        wizard.set_file(
            FieldPath::ThumbnailImage,
            FileHandle::new("cover.png", "image/png", vec![7u8; 128]),
        );
        wizard.add_file(
            FieldPath::AdditionalImages,
            formwizard::FileRef::RemoteUrl("https://cdn.example.com/a.png".to_string()),
        );
        wizard.set_step(3);
        wizard.mark_step_complete(1);
        assert!(wizard.flush().unwrap());
    }

    let wizard = open(&storage, &clock);
    assert_eq!(wizard.restore_status(), &RestoreStatus::Restored);
    let state = wizard.state();
    assert_eq!(state.record.title, "Resumable draft");
    assert_eq!(state.current_step, 3);
    assert!(state.completed_steps.contains(&1));
    assert!(!state.is_dirty);
    assert!(state.last_saved.is_some());

    assert!(state.record.thumbnail_image.is_placeholder());
    assert!(!state.record.thumbnail_image.is_present());
    assert_eq!(
        state.record.additional_images[0].remote_url(),
        Some("https://cdn.example.com/a.png")
    );
}

#[test]
fn test_placeholder_thumbnail_blocks_media_step() {
    let storage = Arc::new(MemoryStorage::new());
    let clock = ManualClock::new();
    {
        let mut wizard = open(&storage, &clock);
        wizard.set_file(
            FieldPath::ThumbnailImage,
            FileHandle::new("cover.png", "image/png", vec![1u8]),
        );
        assert!(wizard.validate_step(4));
        wizard.flush().unwrap();
    }

    let mut wizard = open(&storage, &clock);
    assert!(!wizard.validate_step(4));
    wizard.set_file(
        FieldPath::ThumbnailImage,
        FileHandle::new("cover.png", "image/png", vec![1u8]),
    );
    assert!(wizard.validate_step(4));
}

#[test]
fn test_incompatible_version_falls_back_to_initial_state() {
    let storage = Arc::new(MemoryStorage::new());
    let mut snapshot = Snapshot::capture(&FormState::initial());
    snapshot.record.title = "From the future".to_string();
    let blob = encode_snapshot(&snapshot).unwrap();
    let future = String::from_utf8(blob)
        .unwrap()
        .replace(&format!("\"version\":\"{SCHEMA_VERSION}\""), "\"version\":\"9.0\"");
    storage.store(KEY, future.as_bytes()).unwrap();

    let wizard = open(&storage, &ManualClock::new());
    assert!(matches!(wizard.restore_status(), RestoreStatus::Discarded { .. }));
    assert_eq!(wizard.state(), &FormState::initial());
    assert_eq!(storage.load(KEY).unwrap(), None);
}

#[test]
fn test_minor_version_bump_is_compatible() {
    let storage = Arc::new(MemoryStorage::new());
    let mut snapshot = Snapshot::capture(&FormState::initial());
    snapshot.record.title = "Minor bump".to_string();
    let blob = String::from_utf8(encode_snapshot(&snapshot).unwrap())
        .unwrap()
        .replace(&format!("\"version\":\"{SCHEMA_VERSION}\""), "\"version\":\"1.4\"");
    storage.store(KEY, blob.as_bytes()).unwrap();

    let wizard = open(&storage, &ManualClock::new());
    assert_eq!(wizard.restore_status(), &RestoreStatus::Restored);
    assert_eq!(wizard.state().record.title, "Minor bump");
}

#[test]
fn test_reset_discards_stored_draft() {
    let storage = Arc::new(MemoryStorage::new());
    let clock = ManualClock::new();
    let mut wizard = open(&storage, &clock);

    wizard.set_field(FieldPath::Title, "Throwaway");
    wizard.set_step(4);
    wizard.flush().unwrap();
    assert!(storage.load(KEY).unwrap().is_some());

    wizard.set_field(FieldPath::Tagline, "pending edit");
    wizard.reset();

    assert_eq!(wizard.state(), &FormState::initial());
    assert_eq!(wizard.save_due_at(), None);
    assert_eq!(storage.load(KEY).unwrap(), None);

    clock.advance(Duration::from_secs(5));
    assert!(!wizard.tick().unwrap());
    assert_eq!(storage.load(KEY).unwrap(), None);
}

#[test]
fn test_background_storage_round_trip() {
    let memory = Arc::new(MemoryStorage::new());
    let clock = ManualClock::new();
    {
        let config = WizardConfig::default();
        let background = BackgroundStorage::with_config(Arc::clone(&memory), &config).unwrap();
        let mut wizard = PersistedStore::open(WizardConfig::default(), background, clock.clone()).unwrap();
        wizard.set_field(FieldPath::Title, "Written off-thread");
        clock.advance(Duration::from_secs(3));
        assert!(wizard.tick().unwrap());
        // Dropping the wizard drains the writer queue.
    }
    assert_eq!(memory.writes(), 1);

    let background = BackgroundStorage::start(Arc::clone(&memory), 4).unwrap();
    let reopened = PersistedStore::open(WizardConfig::default(), background, clock).unwrap();
    assert_eq!(reopened.state().record.title, "Written off-thread");
}

#[cfg(feature = "persistent")]
mod on_disk {
    use super::*;
    use formwizard::FileStorage;
    use tempfile::tempdir;

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempdir().unwrap();
        let clock = ManualClock::new();
        {
            let storage = FileStorage::open(dir.path()).unwrap();
            let mut wizard = PersistedStore::open(WizardConfig::default(), storage, clock.clone()).unwrap();
            wizard.set_field(FieldPath::Title, "On disk");
            wizard.set_field(FieldPath::Price, 12.5);
            clock.advance(Duration::from_secs(3));
            assert!(wizard.tick().unwrap());
        }

        let storage = FileStorage::open(dir.path()).unwrap();
        let wizard = PersistedStore::open(WizardConfig::default(), storage, clock).unwrap();
        assert_eq!(wizard.restore_status(), &RestoreStatus::Restored);
        assert_eq!(wizard.state().record.title, "On disk");
        assert_eq!(wizard.state().record.price, Some(12.5));
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(format!("{KEY}.snap")), b"garbage").unwrap();

        let storage = FileStorage::open(dir.path()).unwrap();
        let wizard = PersistedStore::open(WizardConfig::default(), storage, ManualClock::new()).unwrap();
        assert!(matches!(wizard.restore_status(), RestoreStatus::Discarded { .. }));
        assert_eq!(wizard.state(), &FormState::initial());
        assert!(!dir.path().join(format!("{KEY}.snap")).exists());
    }
}
