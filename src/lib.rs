//! # formwizard - State engine for a multi-step "create product" wizard
//!
//! formwizard owns the in-progress product record behind a six-step
//! creation wizard: it applies typed edits, gates step transitions on
//! validation, revalidates touched fields without letting stale results
//! win, autosaves drafts after a quiet period, and derives memoized views
//! for rendering.
//!
//! ## Core Concepts
//!
//! - **FormRecord**: The nested product record, one section per step
//! - **FieldPath**: A typed dotted path into the record (`"premiumContent.promptText"`)
//! - **FormStore**: Owns a `FormState` and changes it only through `Action`s
//! - **PersistedStore**: Decorator that debounces snapshots into a `SnapshotStorage`
//! - **MemoizedSelectors**: LRU-cached derived views keyed by state fingerprints
//!
//! ## Usage
//!
//! ```rust
//! use formwizard::{FieldPath, FormActions, FormStore, WizardConfig};
//!
//! let mut store = FormStore::new(WizardConfig::default())?;
//! store.set_field(FieldPath::Title, "Inbox Zero Prompt");
//! store.add_tag(FieldPath::ProductTags, "email");
//! store.add_tag(FieldPath::ProductTags, "Email");
//!
//! assert_eq!(store.state().record.product_tags, vec!["email"]);
//! assert!(!store.validate_step(1));
//! # Ok::<(), formwizard::WizardError>(())
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod file_ref;
pub mod path;
pub mod persist;
pub mod record;
pub mod selectors;
pub mod store;
pub mod validation;

// Re-export primary types at crate root for convenience
pub use api::{to_api_payload, ProductPayload};
pub use cache::LruCache;
pub use config::{WizardConfig, STEP_COUNT};
pub use error::{ConfigError, PathError, PayloadError, PersistError, WizardError, WizardResult};
pub use file_ref::{FileHandle, FileMeta, FileRef, StoredFileRef};
pub use path::{assign, resolve, FieldPath, FieldValue, ListItem};
pub use persist::{
    BackgroundStorage, Clock, ManualClock, MemoryStorage, PersistedStore, RestoreStatus, SnapshotStorage,
    SystemClock,
};
#[cfg(feature = "persistent")]
pub use persist::FileStorage;
pub use record::{ChecklistItem, FaqEntry, FormRecord, HowItWorksStep, PremiumContent, PricingModel, ProductType};
pub use selectors::{FieldIssue, MemoizedSelectors};
pub use store::{Action, FormActions, FormState, FormStore, Outcome};
pub use validation::ErrorCode;
