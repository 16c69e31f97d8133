//! Pure state transitions.
//!
//! `reduce` applies one `Action` to a `FormState`. It never panics and never
//! leaves the state half-updated: values are checked before anything is
//! written, and structurally invalid actions are logged and ignored.

use tracing::debug;

use crate::config::{WizardConfig, STEP_COUNT};
use crate::file_ref::FileRef;
use crate::path::{self, FieldPath, FieldValue, ListItem, ListMut};
use crate::validation::{self, step_fields};

use super::revalidation::TouchedCheck;
use super::{Action, FormState, Outcome};

/// What the store has to do after a reduction.
#[derive(Debug)]
pub(crate) enum Effect {
    Done(Outcome),
    Defer(TouchedCheck),
}

impl From<Outcome> for Effect {
    fn from(outcome: Outcome) -> Self {
        Self::Done(outcome)
    }
}

fn ignored(action: &'static str, path: FieldPath, reason: &str) -> Outcome {
    debug!(action, path = %path, reason, "action ignored");
    Outcome::Unchanged
}

const fn clamp_step(step: u8) -> u8 {
    if step < 1 {
        1
    } else if step > STEP_COUNT {
        STEP_COUNT
    } else {
        step
    }
}

pub(crate) fn reduce(state: &mut FormState, action: Action, config: &WizardConfig) -> Effect {
    match action {
        Action::SetField { path, value } => set_field(state, path, value).into(),
        Action::MarkFieldTouched(path) => {
            if state.touched_fields.insert(path) {
                Outcome::Updated.into()
            } else {
                Outcome::Unchanged.into()
            }
        }
        Action::AddToArray { path, item } => add_to_array(state, path, item).into(),
        Action::RemoveFromArray { path, index } | Action::RemoveTag { path, index } => {
            remove_from_array(state, path, index).into()
        }
        Action::UpdateArrayItem { path, index, item } => {
            let Some(mut list) = path::list_mut(&mut state.record, path) else {
                return ignored("update_array_item", path, "not a list").into();
            };
            if !list.replace(index, item) {
                return ignored("update_array_item", path, "index out of range or item shape mismatch").into();
            }
            state.mark_dirty();
            Outcome::Dirtied.into()
        }
        Action::AddTag { path, tag } => add_tag(state, path, &tag, config).into(),
        Action::SetFile { path, file } => {
            if !path.is_file() || path.is_list() {
                return ignored("set_file", path, "not a single-file field").into();
            }
            set_field(state, path, FieldValue::File(file)).into()
        }
        Action::AddFile { path, file } => {
            if !(path.is_file() && path.is_list()) {
                return ignored("add_file", path, "not a file list").into();
            }
            add_to_array(state, path, ListItem::File(file)).into()
        }
        Action::RemoveFile { path, index } => match (path.is_file(), path.is_list(), index) {
            (true, false, _) => set_field(state, path, FieldValue::File(FileRef::None)).into(),
            (true, true, Some(index)) => remove_from_array(state, path, index).into(),
            _ => ignored("remove_file", path, "no file to remove").into(),
        },
        Action::SetStep(step) => goto_step(state, clamp_step(step)).into(),
        Action::NextStep => goto_step(state, clamp_step(state.current_step.saturating_add(1))).into(),
        Action::PrevStep => goto_step(state, clamp_step(state.current_step.saturating_sub(1))).into(),
        Action::MarkStepComplete(step) => {
            if (1..=STEP_COUNT).contains(&step) && state.completed_steps.insert(step) {
                Outcome::Updated.into()
            } else {
                Outcome::Unchanged.into()
            }
        }
        Action::ValidateStep(step) => Outcome::Validated(validate_step(state, step, config)).into(),
        Action::ValidateTouchedFields => Effect::Defer(TouchedCheck::compute(state, config)),
        Action::Reset => {
            *state = FormState::initial();
            Outcome::Updated.into()
        }
        Action::SetSubmitting(submitting) => {
            if state.is_submitting == submitting {
                Outcome::Unchanged.into()
            } else {
                state.is_submitting = submitting;
                Outcome::Updated.into()
            }
        }
        Action::MarkSaved(at) => {
            state.last_saved = Some(at);
            state.is_dirty = false;
            Outcome::Updated.into()
        }
    }
}

fn set_field(state: &mut FormState, path: FieldPath, value: FieldValue) -> Outcome {
    let present = value.is_present();
    if let Err(err) = path::assign(&mut state.record, path, value) {
        return ignored("set_field", path, &err.to_string());
    }
    state.mark_dirty();
    state.touched_fields.insert(path);
    // Clear optimistically; the next revalidation pass restores it if needed.
    if present {
        state.errors.remove(&path);
    }
    Outcome::Dirtied
}

fn add_to_array(state: &mut FormState, path: FieldPath, item: ListItem) -> Outcome {
    let Some(mut list) = path::list_mut(&mut state.record, path) else {
        return ignored("add_to_array", path, "not a list");
    };
    if !list.push(item) {
        return ignored("add_to_array", path, "item shape mismatch");
    }
    state.mark_dirty();
    Outcome::Dirtied
}

fn remove_from_array(state: &mut FormState, path: FieldPath, index: usize) -> Outcome {
    let Some(mut list) = path::list_mut(&mut state.record, path) else {
        return ignored("remove_from_array", path, "not a list");
    };
    if !list.remove(index) {
        return ignored("remove_from_array", path, "index out of range");
    }
    state.mark_dirty();
    Outcome::Dirtied
}

/// Most entries a tag-style text list accepts through `add_tag`.
fn tag_cap(path: FieldPath, config: &WizardConfig) -> usize {
    match path {
        FieldPath::UseCases => validation::MAX_USE_CASES,
        FieldPath::PremiumExamples => validation::MAX_PREMIUM_EXAMPLES,
        _ => config.max_tags,
    }
}

fn add_tag(state: &mut FormState, path: FieldPath, tag: &str, config: &WizardConfig) -> Outcome {
    let tag = tag.trim();
    if tag.is_empty() {
        return Outcome::Unchanged;
    }
    let Some(ListMut::Text(tags)) = path::list_mut(&mut state.record, path) else {
        return ignored("add_tag", path, "not a text list");
    };
    if tags.len() >= tag_cap(path, config) {
        return Outcome::Unchanged;
    }
    let folded = tag.to_lowercase();
    if tags.iter().any(|existing| existing.trim().to_lowercase() == folded) {
        return Outcome::Unchanged;
    }
    tags.push(tag.to_string());
    state.mark_dirty();
    Outcome::Dirtied
}

fn goto_step(state: &mut FormState, step: u8) -> Outcome {
    if state.current_step == step {
        Outcome::Unchanged
    } else {
        state.current_step = step;
        Outcome::Updated
    }
}

fn validate_step(state: &mut FormState, step: u8, config: &WizardConfig) -> bool {
    let found = validation::validate_step(&state.record, step, config);
    for path in step_fields(step) {
        match found.get(&path) {
            Some(code) => {
                state.errors.insert(path, *code);
                state.touched_fields.insert(path);
            }
            None => {
                state.errors.remove(&path);
            }
        }
    }
    found.is_empty()
}
