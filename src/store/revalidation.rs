//! Deferred touched-field revalidation.
//!
//! Key invariants:
//! - Every call is stamped with the store's sequence number at call time.
//! - Results are applied later, when the store drains its deferred queue.
//! - A result is applied only if nothing superseded it in the meantime: a
//!   newer call, an edit, a step gate or a reset. Otherwise it is discarded.
//! - Only fields that were touched when the call was issued are affected.

use std::collections::{BTreeMap, VecDeque};

use crate::config::WizardConfig;
use crate::path::FieldPath;
use crate::validation::{check_field, ErrorCode};

use super::FormState;

/// Per-field results of one touched-field pass. `None` means "passes".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TouchedCheck {
    results: BTreeMap<FieldPath, Option<ErrorCode>>,
}

impl TouchedCheck {
    /// Checks every touched field against the current record.
    #[must_use]
    pub fn compute(state: &FormState, config: &WizardConfig) -> Self {
        let results = state
            .touched_fields
            .iter()
            .map(|path| (*path, check_field(&state.record, *path, config)))
            .collect();
        Self { results }
    }

    /// Writes new error codes and clears errors of fields that now pass.
    pub fn apply(self, errors: &mut BTreeMap<FieldPath, ErrorCode>) {
        for (path, result) in self.results {
            match result {
                Some(code) => {
                    errors.insert(path, code);
                }
                None => {
                    errors.remove(&path);
                }
            }
        }
    }
}

#[derive(Debug)]
struct Pending {
    sequence: u64,
    check: TouchedCheck,
}

/// Sequence counter plus queue of not-yet-applied checks.
///
/// Owned by a single store instance, so two stores never share a counter.
#[derive(Debug, Default)]
pub(crate) struct Revalidator {
    sequence: u64,
    queue: VecDeque<Pending>,
}

impl Revalidator {
    /// Stamps `check` with the next sequence number and queues it.
    pub(crate) fn schedule(&mut self, check: TouchedCheck) -> u64 {
        self.sequence += 1;
        self.queue.push_back(Pending {
            sequence: self.sequence,
            check,
        });
        self.sequence
    }

    /// Makes every queued check stale without reusing sequence numbers.
    pub(crate) fn invalidate(&mut self) {
        self.sequence += 1;
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.len()
    }

    #[cfg(test)]
    pub(crate) const fn current(&self) -> u64 {
        self.sequence
    }

    /// Applies the queued check that is still current and drops the rest.
    ///
    /// Returns the number of checks applied (0 or 1).
    pub(crate) fn drain(&mut self, errors: &mut BTreeMap<FieldPath, ErrorCode>) -> usize {
        let mut applied = 0;
        while let Some(pending) = self.queue.pop_front() {
            if pending.sequence == self.sequence {
                pending.check.apply(errors);
                applied += 1;
            } else {
                tracing::trace!(
                    stale = pending.sequence,
                    current = self.sequence,
                    "discarding superseded revalidation"
                );
            }
        }
        applied
    }
}
