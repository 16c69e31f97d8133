//! Autosaving store decorator.

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::WizardConfig;
use crate::error::{ConfigError, PersistError};
use crate::store::{Action, FormActions, FormState, FormStore, Outcome};

use super::debounce::{Clock, Debouncer, SystemClock};
use super::storage::SnapshotStorage;
use super::{decode_snapshot, encode_snapshot, Snapshot};

/// What `PersistedStore::open` found in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreStatus {
    /// No stored draft; started from the initial state.
    Fresh,
    /// A stored draft was restored.
    Restored,
    /// A stored draft existed but could not be used; started fresh.
    Discarded { reason: String },
}

/// Wraps a store and saves a snapshot after a quiet period.
///
/// Every dirtying action restarts one debounce window. `tick` saves once the
/// window has elapsed. `isDirty` is cleared only after the backend accepted
/// the write.
pub struct PersistedStore<S, B, C = SystemClock> {
    inner: S,
    storage: B,
    clock: C,
    debouncer: Debouncer,
    key: String,
    restore: RestoreStatus,
}

impl<B: SnapshotStorage, C: Clock> PersistedStore<FormStore, B, C> {
    /// Opens a wizard, restoring any compatible draft found in `storage`.
    ///
    /// Unreadable or incompatible drafts are logged, removed and replaced by
    /// the initial state; they never fail the open.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid.
    pub fn open(config: WizardConfig, storage: B, clock: C) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        let (state, restore) = load_state(&storage, &config.storage_key);
        let inner = FormStore::with_state(state, config)?;
        let mut store = Self::wrap(inner, storage, clock);
        store.restore = restore;
        Ok(store)
    }
}

impl<S: FormActions, B: SnapshotStorage, C: Clock> PersistedStore<S, B, C> {
    /// Decorates `inner` without reading storage.
    pub fn wrap(inner: S, storage: B, clock: C) -> Self {
        let config = inner.config();
        let debouncer = Debouncer::new(config.autosave_debounce);
        let key = config.storage_key.clone();
        Self {
            inner,
            storage,
            clock,
            debouncer,
            key,
            restore: RestoreStatus::Fresh,
        }
    }

    #[must_use]
    pub const fn restore_status(&self) -> &RestoreStatus {
        &self.restore
    }

    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    #[must_use]
    pub const fn storage(&self) -> &B {
        &self.storage
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// When the pending autosave fires, if one is pending.
    #[must_use]
    pub const fn save_due_at(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Saves if the quiet period has elapsed. Returns true if it saved.
    ///
    /// A failed save keeps the state dirty and re-arms the window.
    ///
    /// # Errors
    ///
    /// Returns the backend error of a failed save.
    pub fn tick(&mut self) -> Result<bool, PersistError> {
        let now = self.clock.now();
        if !self.debouncer.take_due(now) {
            return Ok(false);
        }
        if !self.inner.state().is_dirty {
            return Ok(false);
        }
        match self.save() {
            Ok(()) => Ok(true),
            Err(err) => {
                warn!(key = %self.key, error = %err, "autosave failed; will retry");
                self.debouncer.restart(now);
                Err(err)
            }
        }
    }

    /// Writes a snapshot now, then stamps `last_saved` and clears `is_dirty`.
    ///
    /// # Errors
    ///
    /// Returns a `PersistError` if encoding or the backend write fails; the
    /// state is left untouched in that case.
    pub fn save(&mut self) -> Result<(), PersistError> {
        let saved_at = Utc::now();
        let mut snapshot = Snapshot::capture(self.inner.state());
        snapshot.last_saved = Some(saved_at);
        let blob = encode_snapshot(&snapshot)?;
        self.storage.store(&self.key, &blob)?;
        self.inner.dispatch(Action::MarkSaved(saved_at));
        debug!(key = %self.key, bytes = blob.len(), revision = self.inner.state().revision, "draft saved");
        Ok(())
    }

    /// Saves immediately if dirty, skipping any pending window.
    ///
    /// # Errors
    ///
    /// Returns the backend error of a failed save.
    pub fn flush(&mut self) -> Result<bool, PersistError> {
        if !self.inner.state().is_dirty {
            return Ok(false);
        }
        self.debouncer.cancel();
        self.save()?;
        Ok(true)
    }

    /// Removes the stored draft without touching the in-memory state.
    ///
    /// # Errors
    ///
    /// Returns the backend error of a failed remove.
    pub fn clear_persisted(&mut self) -> Result<(), PersistError> {
        self.debouncer.cancel();
        self.storage.remove(&self.key)
    }

    /// Resets the form and removes the stored draft.
    ///
    /// # Errors
    ///
    /// Returns the backend error of a failed remove; the form is reset
    /// either way.
    pub fn discard_draft(&mut self) -> Result<(), PersistError> {
        self.inner.dispatch(Action::Reset);
        self.clear_persisted()
    }
}

impl<S: FormActions, B: SnapshotStorage, C: Clock> FormActions for PersistedStore<S, B, C> {
    fn state(&self) -> &FormState {
        self.inner.state()
    }

    fn config(&self) -> &WizardConfig {
        self.inner.config()
    }

    fn dispatch(&mut self, action: Action) -> Outcome {
        if matches!(action, Action::Reset) {
            let outcome = self.inner.dispatch(action);
            if let Err(err) = self.clear_persisted() {
                warn!(key = %self.key, error = %err, "failed to remove stored draft on reset");
            }
            return outcome;
        }
        let outcome = self.inner.dispatch(action);
        if outcome.is_dirtied() {
            self.debouncer.restart(self.clock.now());
        }
        outcome
    }

    fn run_deferred(&mut self) -> usize {
        self.inner.run_deferred()
    }
}

fn load_state<B: SnapshotStorage>(storage: &B, key: &str) -> (FormState, RestoreStatus) {
    let discarded = |err: PersistError| {
        warn!(%key, error = %err, "discarding stored draft");
        if err.is_recoverable_by_reset() {
            if let Err(remove_err) = storage.remove(key) {
                warn!(%key, error = %remove_err, "failed to remove unusable draft");
            }
        }
        (
            FormState::initial(),
            RestoreStatus::Discarded {
                reason: err.to_string(),
            },
        )
    };

    match storage.load(key) {
        Ok(None) => (FormState::initial(), RestoreStatus::Fresh),
        Ok(Some(blob)) => match decode_snapshot(&blob) {
            Ok(snapshot) => {
                debug!(%key, "restored stored draft");
                (snapshot.into_state(), RestoreStatus::Restored)
            }
            Err(err) => discarded(err),
        },
        Err(err) => discarded(err),
    }
}
