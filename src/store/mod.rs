//! The wizard form store.
//!
//! `FormStore` owns a `FormState` and changes it only through `Action`s fed
//! to a pure reducer. The `FormActions` trait is the seam that decorators
//! (such as `PersistedStore`) implement to observe every action; all
//! convenience methods UI code calls are provided on top of `dispatch`.

mod reducer;
mod revalidation;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::WizardConfig;
use crate::error::ConfigError;
use crate::file_ref::FileRef;
use crate::path::{FieldPath, FieldValue, ListItem};
use crate::record::FormRecord;
use crate::validation::ErrorCode;

use reducer::{reduce, Effect};
use revalidation::Revalidator;

pub use revalidation::TouchedCheck;

/// Everything the wizard knows about the product being created.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub record: FormRecord,
    /// 1-based, always within `1..=STEP_COUNT`.
    pub current_step: u8,
    pub completed_steps: BTreeSet<u8>,
    /// Only grows, except on reset.
    pub touched_fields: BTreeSet<FieldPath>,
    pub errors: BTreeMap<FieldPath, ErrorCode>,
    /// A mutation ran since the last successful save.
    pub is_dirty: bool,
    pub is_submitting: bool,
    pub last_saved: Option<DateTime<Utc>>,
    /// Number of dirtying mutations applied to this state.
    pub revision: u64,
}

impl FormState {
    /// The state every new wizard starts from.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            record: FormRecord::initial(),
            current_step: 1,
            completed_steps: BTreeSet::new(),
            touched_fields: BTreeSet::new(),
            errors: BTreeMap::new(),
            is_dirty: false,
            is_submitting: false,
            last_saved: None,
            revision: 0,
        }
    }

    #[must_use]
    pub fn is_touched(&self, path: FieldPath) -> bool {
        self.touched_fields.contains(&path)
    }

    #[must_use]
    pub fn error_for(&self, path: FieldPath) -> Option<ErrorCode> {
        self.errors.get(&path).copied()
    }

    fn mark_dirty(&mut self) {
        self.is_dirty = true;
        self.revision += 1;
    }
}

impl Default for FormState {
    fn default() -> Self {
        Self::initial()
    }
}

/// A single request to change the form.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetField { path: FieldPath, value: FieldValue },
    MarkFieldTouched(FieldPath),
    AddToArray { path: FieldPath, item: ListItem },
    RemoveFromArray { path: FieldPath, index: usize },
    UpdateArrayItem { path: FieldPath, index: usize, item: ListItem },
    AddTag { path: FieldPath, tag: String },
    RemoveTag { path: FieldPath, index: usize },
    SetFile { path: FieldPath, file: FileRef },
    AddFile { path: FieldPath, file: FileRef },
    /// Clears a single-file field, or removes `index` from a file list.
    RemoveFile { path: FieldPath, index: Option<usize> },
    SetStep(u8),
    NextStep,
    PrevStep,
    MarkStepComplete(u8),
    ValidateStep(u8),
    ValidateTouchedFields,
    Reset,
    SetSubmitting(bool),
    MarkSaved(DateTime<Utc>),
}

/// What an action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed (no-op, duplicate, or ignored structural error).
    Unchanged,
    /// Metadata changed; the record is not dirtier than before.
    Updated,
    /// The record changed and the state is now dirty.
    Dirtied,
    /// Result of a step gate.
    Validated(bool),
    /// A touched-field revalidation was queued with this sequence number.
    Scheduled(u64),
}

impl Outcome {
    /// True if the record itself changed.
    #[must_use]
    pub const fn is_dirtied(self) -> bool {
        matches!(self, Self::Dirtied)
    }
}

/// The action surface of a wizard store.
pub trait FormActions {
    /// Current state.
    fn state(&self) -> &FormState;

    /// Configuration the store was built with.
    fn config(&self) -> &WizardConfig;

    /// Applies one action.
    fn dispatch(&mut self, action: Action) -> Outcome;

    /// Applies deferred work queued by earlier actions, returning how many
    /// queued results were applied.
    fn run_deferred(&mut self) -> usize;

    fn set_field(&mut self, path: FieldPath, value: impl Into<FieldValue>) -> Outcome {
        self.dispatch(Action::SetField {
            path,
            value: value.into(),
        })
    }

    /// Like `set_field`, for callers holding a dotted path string.
    ///
    /// Unknown or malformed paths are logged and ignored.
    fn set_field_str(&mut self, path: &str, value: impl Into<FieldValue>) -> Outcome {
        match FieldPath::parse(path) {
            Ok(path) => self.set_field(path, value),
            Err(err) => {
                debug!(error = %err, "set_field ignored");
                Outcome::Unchanged
            }
        }
    }

    fn mark_field_touched(&mut self, path: FieldPath) -> Outcome {
        self.dispatch(Action::MarkFieldTouched(path))
    }

    fn add_to_array(&mut self, path: FieldPath, item: impl Into<ListItem>) -> Outcome {
        self.dispatch(Action::AddToArray {
            path,
            item: item.into(),
        })
    }

    fn remove_from_array(&mut self, path: FieldPath, index: usize) -> Outcome {
        self.dispatch(Action::RemoveFromArray { path, index })
    }

    fn update_array_item(&mut self, path: FieldPath, index: usize, item: impl Into<ListItem>) -> Outcome {
        self.dispatch(Action::UpdateArrayItem {
            path,
            index,
            item: item.into(),
        })
    }

    fn add_tag(&mut self, path: FieldPath, tag: impl Into<String>) -> Outcome {
        self.dispatch(Action::AddTag {
            path,
            tag: tag.into(),
        })
    }

    fn remove_tag(&mut self, path: FieldPath, index: usize) -> Outcome {
        self.dispatch(Action::RemoveTag { path, index })
    }

    fn set_file(&mut self, path: FieldPath, file: impl Into<FileRef>) -> Outcome {
        self.dispatch(Action::SetFile {
            path,
            file: file.into(),
        })
    }

    fn add_file(&mut self, path: FieldPath, file: impl Into<FileRef>) -> Outcome {
        self.dispatch(Action::AddFile {
            path,
            file: file.into(),
        })
    }

    fn remove_file(&mut self, path: FieldPath, index: Option<usize>) -> Outcome {
        self.dispatch(Action::RemoveFile { path, index })
    }

    fn set_step(&mut self, step: u8) -> Outcome {
        self.dispatch(Action::SetStep(step))
    }

    fn next_step(&mut self) -> Outcome {
        self.dispatch(Action::NextStep)
    }

    fn prev_step(&mut self) -> Outcome {
        self.dispatch(Action::PrevStep)
    }

    fn mark_step_complete(&mut self, step: u8) -> Outcome {
        self.dispatch(Action::MarkStepComplete(step))
    }

    /// Runs the step gate. Never fails; returns whether the step passed.
    fn validate_step(&mut self, step: u8) -> bool {
        matches!(
            self.dispatch(Action::ValidateStep(step)),
            Outcome::Validated(true)
        )
    }

    /// Queues a touched-field revalidation and returns its sequence number.
    ///
    /// The results land on the next `run_deferred`, unless a newer call
    /// was issued first.
    fn validate_touched_fields(&mut self) -> u64 {
        match self.dispatch(Action::ValidateTouchedFields) {
            Outcome::Scheduled(sequence) => sequence,
            _ => 0,
        }
    }

    /// Gates the current step and, if it passes, records it as complete
    /// and moves to the next one.
    fn try_advance(&mut self) -> bool {
        let step = self.state().current_step;
        if !self.validate_step(step) {
            return false;
        }
        self.mark_step_complete(step);
        self.next_step();
        true
    }

    fn reset(&mut self) -> Outcome {
        self.dispatch(Action::Reset)
    }

    fn set_submitting(&mut self, submitting: bool) -> Outcome {
        self.dispatch(Action::SetSubmitting(submitting))
    }
}

/// In-memory wizard store.
#[derive(Debug, Default)]
pub struct FormStore {
    state: FormState,
    config: WizardConfig,
    revalidator: Revalidator,
}

impl FormStore {
    /// Creates a store at the initial state.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid.
    pub fn new(config: WizardConfig) -> Result<Self, ConfigError> {
        Self::with_state(FormState::initial(), config)
    }

    /// Creates a store resuming from `state`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid.
    pub fn with_state(state: FormState, config: WizardConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            state,
            config: config.validate()?,
            revalidator: Revalidator::default(),
        })
    }

    /// Number of revalidations waiting for `run_deferred`.
    #[must_use]
    pub fn pending_revalidations(&self) -> usize {
        self.revalidator.pending()
    }
}

impl FormActions for FormStore {
    fn state(&self) -> &FormState {
        &self.state
    }

    fn config(&self) -> &WizardConfig {
        &self.config
    }

    fn dispatch(&mut self, action: Action) -> Outcome {
        // Queued touched-field results must not outlive a later edit or gate.
        let supersedes = matches!(action, Action::Reset | Action::ValidateStep(_));
        let outcome = match reduce(&mut self.state, action, &self.config) {
            Effect::Done(outcome) => outcome,
            Effect::Defer(check) => Outcome::Scheduled(self.revalidator.schedule(check)),
        };
        if supersedes || outcome.is_dirtied() {
            self.revalidator.invalidate();
        }
        outcome
    }

    fn run_deferred(&mut self) -> usize {
        self.revalidator.drain(&mut self.state.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::HowItWorksStep;

    fn store() -> FormStore {
        FormStore::new(WizardConfig::default()).unwrap()
    }

    #[test]
    fn touched_revalidation_ignores_untouched_fields() {
        let mut store = store();
        store.set_field(FieldPath::Title, "abc");
        store.validate_touched_fields();
        store.run_deferred();

        assert_eq!(store.state().error_for(FieldPath::Title), Some(ErrorCode::MinLength));
        assert_eq!(store.state().error_for(FieldPath::Tagline), None);
        assert_eq!(store.state().error_for(FieldPath::Description), None);
    }

    #[test]
    fn touched_revalidation_recomputes_gate_errors() {
        let mut store = store();
        store.validate_step(1);
        assert!(store.state().error_for(FieldPath::Industry).is_some());

        store.set_field(FieldPath::Industry, "Retail");
        store.set_field(FieldPath::Title, "Quarterly planner");
        store.validate_touched_fields();
        store.run_deferred();

        assert_eq!(store.state().error_for(FieldPath::Industry), None);
        assert_eq!(store.state().error_for(FieldPath::Title), None);
        assert_eq!(store.state().error_for(FieldPath::Tagline), Some(ErrorCode::Required));
    }

    #[test]
    fn newer_revalidation_wins() {
        let mut store = store();
        store.set_field(FieldPath::Title, "ab");
        let a = store.validate_touched_fields();

        store.set_field(FieldPath::Title, "A proper title");
        let b = store.validate_touched_fields();
        assert!(b > a);

        assert_eq!(store.pending_revalidations(), 2);
        assert_eq!(store.run_deferred(), 1);
        assert_eq!(store.state().error_for(FieldPath::Title), None);
    }

    #[test]
    fn stale_revalidation_cannot_overwrite_newer_results() {
        let mut store = store();
        store.set_field(FieldPath::Title, "A proper title");
        store.validate_touched_fields();

        store.set_field(FieldPath::Title, "ab");
        store.validate_touched_fields();
        store.run_deferred();

        assert_eq!(store.state().error_for(FieldPath::Title), Some(ErrorCode::MinLength));
    }

    #[test]
    fn edit_after_revalidation_discards_stale_errors() {
        let mut store = store();
        store.set_field(FieldPath::Title, "ab");
        store.validate_touched_fields();

        store.set_field(FieldPath::Title, "A perfectly valid title");
        assert_eq!(store.state().error_for(FieldPath::Title), None);

        assert_eq!(store.run_deferred(), 0);
        assert_eq!(store.state().error_for(FieldPath::Title), None);
    }

    #[test]
    fn step_gate_after_revalidation_wins() {
        let mut store = store();
        store.set_field(FieldPath::Title, "ab");
        store.validate_touched_fields();

        // Edited outside the action surface so only the gate can supersede.
        store.state.record.title = "A perfectly valid title".to_string();
        store.validate_step(1);
        assert_eq!(store.state().error_for(FieldPath::Title), None);

        assert_eq!(store.run_deferred(), 0);
        assert_eq!(store.state().error_for(FieldPath::Title), None);
    }

    #[test]
    fn reset_discards_pending_revalidation() {
        let mut store = store();
        store.set_field(FieldPath::Title, "ab");
        store.validate_touched_fields();
        store.reset();

        assert_eq!(store.run_deferred(), 0);
        assert!(store.state().errors.is_empty());
        assert_eq!(store.state(), &FormState::initial());
    }

    #[test]
    fn separate_stores_have_separate_counters() {
        let mut a = store();
        let mut b = store();
        assert_eq!(a.validate_touched_fields(), 1);
        assert_eq!(a.validate_touched_fields(), 2);
        assert_eq!(b.validate_touched_fields(), 1);
    }

    #[test]
    fn how_it_works_step_gate() {
        let mut store = store();
        store.set_field(FieldPath::Description, "x".repeat(60));
        store.update_array_item(FieldPath::HowItWorks, 0, HowItWorksStep::new("Buy", "Checkout"));
        store.add_to_array(FieldPath::HowItWorks, HowItWorksStep::new("Download", "Grab the zip"));

        assert!(!store.validate_step(2));
        assert_eq!(store.state().error_for(FieldPath::HowItWorks), Some(ErrorCode::MinSteps));

        store.add_to_array(FieldPath::HowItWorks, HowItWorksStep::new("Use", "Import it"));
        assert!(store.validate_step(2));
        assert_eq!(store.state().error_for(FieldPath::HowItWorks), None);
    }

    #[test]
    fn try_advance_stops_on_invalid_step() {
        let mut store = store();
        assert!(!store.try_advance());
        assert_eq!(store.state().current_step, 1);
        assert!(store.state().completed_steps.is_empty());
    }

    #[test]
    fn set_field_str_ignores_unknown_paths() {
        let mut store = store();
        assert_eq!(store.set_field_str("premiumContent.bogus", "x"), Outcome::Unchanged);
        assert_eq!(store.set_field_str("premiumContent.promptText", "x"), Outcome::Dirtied);
        assert_eq!(store.state().record.premium_content.prompt_text, "x");
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = WizardConfig {
            max_tags: 0,
            ..WizardConfig::default()
        };
        assert!(FormStore::new(cfg).is_err());
    }
}
