//! Derived views over a `FormState`.
//!
//! The plain functions recompute every time. `MemoizedSelectors` caches their
//! results in bounded LRU caches keyed by a fingerprint of the state slice
//! each selector reads:
//!
//! ```text
//! key = "<selector>:" + blake3(canonical JSON of the slice)
//! ```
//!
//! The JSON is canonical because every map in a slice is a `BTreeMap` and
//! every struct serializes its fields in declaration order. Equal slices
//! therefore always produce equal keys, and any change to a slice produces
//! a new key, so a cached value is never stale.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::cache::LruCache;
use crate::config::{WizardConfig, STEP_COUNT};
use crate::file_ref::{FileFingerprint, FileRef};
use crate::path::FieldPath;
use crate::record::FormRecord;
use crate::store::FormState;
use crate::validation::{step_fields, step_passes, ErrorCode, REQUIRED_STEPS};

/// One field error, in display form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: FieldPath,
    pub code: ErrorCode,
}

/// True if none of the fields of `step` currently has an error.
#[must_use]
pub fn is_step_valid(errors: &BTreeMap<FieldPath, ErrorCode>, step: u8) -> bool {
    step_fields(step).all(|path| !errors.contains_key(&path))
}

/// True if every required step passes its rules against the record.
///
/// Recomputed from the record, so it does not depend on which fields were
/// touched or which gates have run.
#[must_use]
pub fn is_valid(record: &FormRecord, config: &WizardConfig) -> bool {
    REQUIRED_STEPS
        .iter()
        .all(|step| step_passes(record, *step, config))
}

/// Share of steps marked complete, rounded to a whole percent.
#[must_use]
pub fn completion_percentage(completed_steps: &BTreeSet<u8>) -> u8 {
    let done = completed_steps
        .iter()
        .filter(|s| (1..=STEP_COUNT).contains(*s))
        .count();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let pct = (done as f64 * 100.0 / f64::from(STEP_COUNT)).round() as u8;
    pct
}

/// Current errors in schema order.
#[must_use]
pub fn validation_errors(errors: &BTreeMap<FieldPath, ErrorCode>) -> Vec<FieldIssue> {
    errors
        .iter()
        .map(|(field, code)| FieldIssue {
            field: *field,
            code: *code,
        })
        .collect()
}

/// Cache hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectorStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Serialize)]
struct StepSlice<'a> {
    step: u8,
    errors: BTreeMap<FieldPath, &'a ErrorCode>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValiditySlice {
    record: FormRecord<FileFingerprint>,
    max_tags: usize,
    max_additional_images: usize,
}

fn fingerprint(selector: &str, slice: &impl Serialize) -> Option<String> {
    match serde_json::to_vec(slice) {
        Ok(bytes) => Some(format!("{selector}:{}", blake3::hash(&bytes).to_hex())),
        Err(err) => {
            tracing::debug!(selector, error = %err, "slice not serializable; bypassing cache");
            None
        }
    }
}

fn memoize<V: Clone>(
    cache: &mut LruCache<String, V>,
    stats: &mut SelectorStats,
    key: Option<String>,
    compute: impl FnOnce() -> V,
) -> V {
    if let Some(key) = &key {
        if let Some(value) = cache.get(key) {
            stats.hits += 1;
            return value.clone();
        }
    }
    stats.misses += 1;
    let value = compute();
    if let Some(key) = key {
        cache.set(key, value.clone());
    }
    value
}

/// Memoized versions of the selectors, one LRU cache per result type.
#[derive(Debug)]
pub struct MemoizedSelectors {
    flags: LruCache<String, bool>,
    percents: LruCache<String, u8>,
    issues: LruCache<String, Vec<FieldIssue>>,
    stats: SelectorStats,
}

impl MemoizedSelectors {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            flags: LruCache::new(capacity),
            percents: LruCache::new(capacity),
            issues: LruCache::new(capacity),
            stats: SelectorStats::default(),
        }
    }

    #[must_use]
    pub fn from_config(config: &WizardConfig) -> Self {
        Self::new(config.cache_capacity)
    }

    #[must_use]
    pub const fn stats(&self) -> SelectorStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.flags.clear();
        self.percents.clear();
        self.issues.clear();
    }

    pub fn is_step_valid(&mut self, state: &FormState, step: u8) -> bool {
        let slice = StepSlice {
            step,
            errors: step_fields(step)
                .filter_map(|path| state.errors.get(&path).map(|code| (path, code)))
                .collect(),
        };
        let key = fingerprint("isStepValid", &slice);
        memoize(&mut self.flags, &mut self.stats, key, || {
            is_step_valid(&state.errors, step)
        })
    }

    pub fn is_valid(&mut self, state: &FormState, config: &WizardConfig) -> bool {
        let slice = ValiditySlice {
            record: state.record.map_files(FileRef::fingerprint),
            max_tags: config.max_tags,
            max_additional_images: config.max_additional_images,
        };
        let key = fingerprint("isValid", &slice);
        memoize(&mut self.flags, &mut self.stats, key, || {
            is_valid(&state.record, config)
        })
    }

    pub fn completion_percentage(&mut self, state: &FormState) -> u8 {
        let key = fingerprint("completionPercentage", &state.completed_steps);
        memoize(&mut self.percents, &mut self.stats, key, || {
            completion_percentage(&state.completed_steps)
        })
    }

    pub fn validation_errors(&mut self, state: &FormState) -> Vec<FieldIssue> {
        let key = fingerprint("validationErrors", &state.errors);
        memoize(&mut self.issues, &mut self.stats, key, || {
            validation_errors(&state.errors)
        })
    }
}

impl Default for MemoizedSelectors {
    fn default() -> Self {
        Self::from_config(&WizardConfig::default())
    }
}
