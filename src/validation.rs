//! Field rules shared by both validation passes.
//!
//! Each field has at most one rule set; `check_field` applies it and
//! returns the first violated constraint as a categorical `ErrorCode`.
//! The step gate runs every rule of a step, the touched-field pass runs
//! only the rules of fields the user has visited.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{WizardConfig, STEP_COUNT};
use crate::path::FieldPath;
use crate::record::{FaqEntry, FormRecord, HowItWorksStep, PricingModel};

pub const TITLE_LEN: (usize, usize) = (5, 100);
pub const TAGLINE_LEN: (usize, usize) = (10, 160);
pub const DESCRIPTION_LEN: (usize, usize) = (50, 5000);
pub const MIN_HOW_IT_WORKS: usize = 3;
pub const MAX_HOW_IT_WORKS: usize = 10;
pub const MAX_USE_CASES: usize = 10;
pub const MIN_FAQ: usize = 1;
pub const MAX_FAQ: usize = 20;
pub const MAX_PRICE: f64 = 10_000.0;
pub const MAX_PROMPT_TEXT: usize = 20_000;
pub const MAX_INSTRUCTIONS: usize = 5000;
pub const MAX_PREMIUM_EXAMPLES: usize = 10;
pub const MAX_SUPPORT_EMAIL: usize = 254;

/// Steps that must pass before the product can be submitted.
///
/// Step 5 (premium content) is optional.
pub const REQUIRED_STEPS: [u8; 5] = [1, 2, 3, 4, 6];

/// Categorical validation failure, localized by presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    Required,
    MinLength,
    MaxLength,
    MinItems,
    MaxItems,
    MinSteps,
    OutOfRange,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MinLength => "minLength",
            Self::MaxLength => "maxLength",
            Self::MinItems => "minItems",
            Self::MaxItems => "maxItems",
            Self::MinSteps => "minSteps",
            Self::OutOfRange => "outOfRange",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn char_len(text: &str) -> usize {
    text.trim().chars().count()
}

fn check_text(text: &str, (min, max): (usize, usize)) -> Option<ErrorCode> {
    let len = char_len(text);
    if len == 0 {
        Some(ErrorCode::Required)
    } else if len < min {
        Some(ErrorCode::MinLength)
    } else if len > max {
        Some(ErrorCode::MaxLength)
    } else {
        None
    }
}

fn check_required(text: &str) -> Option<ErrorCode> {
    (char_len(text) == 0).then_some(ErrorCode::Required)
}

fn check_max_len(text: &str, max: usize) -> Option<ErrorCode> {
    (char_len(text) > max).then_some(ErrorCode::MaxLength)
}

fn check_max_items<T>(items: &[T], max: usize) -> Option<ErrorCode> {
    (items.len() > max).then_some(ErrorCode::MaxItems)
}

/// Applies the rules of a single field. `None` means the field is valid.
#[must_use]
pub fn check_field(record: &FormRecord, path: FieldPath, config: &WizardConfig) -> Option<ErrorCode> {
    match path {
        FieldPath::Title => check_text(&record.title, TITLE_LEN),
        FieldPath::Tagline => check_text(&record.tagline, TAGLINE_LEN),
        FieldPath::ProductType => record.product_type.is_none().then_some(ErrorCode::Required),
        FieldPath::Category => check_required(&record.category),
        FieldPath::Industry => check_required(&record.industry),
        FieldPath::ProductTags => {
            if record.product_tags.is_empty() {
                Some(ErrorCode::Required)
            } else {
                check_max_items(&record.product_tags, config.max_tags)
            }
        }
        FieldPath::Description => check_text(&record.description, DESCRIPTION_LEN),
        FieldPath::HowItWorks => {
            if complete_steps(&record.how_it_works) < MIN_HOW_IT_WORKS {
                Some(ErrorCode::MinSteps)
            } else {
                check_max_items(&record.how_it_works, MAX_HOW_IT_WORKS)
            }
        }
        FieldPath::UseCases => check_max_items(&record.use_cases, MAX_USE_CASES),
        FieldPath::Price => match (record.pricing_model, record.price) {
            (PricingModel::Free, _) => None,
            (_, None) => Some(ErrorCode::Required),
            (_, Some(p)) if !(0.0..=MAX_PRICE).contains(&p) => Some(ErrorCode::OutOfRange),
            (_, Some(_)) => None,
        },
        FieldPath::ThumbnailImage => {
            (!record.thumbnail_image.is_present()).then_some(ErrorCode::Required)
        }
        FieldPath::AdditionalImages => {
            check_max_items(&record.additional_images, config.max_additional_images)
        }
        FieldPath::PremiumPromptText => {
            check_max_len(&record.premium_content.prompt_text, MAX_PROMPT_TEXT)
        }
        FieldPath::PremiumInstructions => {
            check_max_len(&record.premium_content.instructions, MAX_INSTRUCTIONS)
        }
        FieldPath::PremiumExamples => {
            check_max_items(&record.premium_content.examples, MAX_PREMIUM_EXAMPLES)
        }
        FieldPath::Faq => {
            if complete_faq(&record.faq) < MIN_FAQ {
                Some(ErrorCode::MinItems)
            } else {
                check_max_items(&record.faq, MAX_FAQ)
            }
        }
        FieldPath::SupportEmail => check_max_len(&record.support_email, MAX_SUPPORT_EMAIL),
        FieldPath::TermsAccepted => (!record.terms_accepted).then_some(ErrorCode::Required),
        FieldPath::PricingModel
        | FieldPath::PreviewVideo
        | FieldPath::PremiumContent
        | FieldPath::LaunchChecklist => None,
    }
}

/// Fields whose errors gate the given step, in schema order.
pub fn step_fields(step: u8) -> impl Iterator<Item = FieldPath> {
    FieldPath::ALL
        .into_iter()
        .filter(move |path| path.step() == step && path.has_rules())
}

/// Runs every rule of `step` against the record.
///
/// Steps outside `1..=STEP_COUNT` have no rules.
#[must_use]
pub fn validate_step(record: &FormRecord, step: u8, config: &WizardConfig) -> BTreeMap<FieldPath, ErrorCode> {
    if !(1..=STEP_COUNT).contains(&step) {
        return BTreeMap::new();
    }
    step_fields(step)
        .filter_map(|path| check_field(record, path, config).map(|code| (path, code)))
        .collect()
}

/// True if every rule of `step` passes.
#[must_use]
pub fn step_passes(record: &FormRecord, step: u8, config: &WizardConfig) -> bool {
    step_fields(step).all(|path| check_field(record, path, config).is_none())
}

impl FieldPath {
    /// Fields with at least one validation rule.
    #[must_use]
    pub const fn has_rules(self) -> bool {
        !matches!(
            self,
            Self::PricingModel | Self::PreviewVideo | Self::PremiumContent | Self::LaunchChecklist
        )
    }
}

/// Counts entries with both halves filled in.
#[must_use]
pub fn complete_steps(steps: &[HowItWorksStep]) -> usize {
    steps.iter().filter(|s| s.is_complete()).count()
}

/// Counts FAQ entries with both halves filled in.
#[must_use]
pub fn complete_faq(entries: &[FaqEntry]) -> usize {
    entries.iter().filter(|e| e.is_complete()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_ref::FileRef;
    use crate::record::ProductType;

    fn cfg() -> WizardConfig {
        WizardConfig::default()
    }

    #[test]
    fn title_length_bounds() {
        let mut record = FormRecord::initial();
        assert_eq!(check_field(&record, FieldPath::Title, &cfg()), Some(ErrorCode::Required));
        record.title = "abc".to_string();
        assert_eq!(check_field(&record, FieldPath::Title, &cfg()), Some(ErrorCode::MinLength));
        record.title = "x".repeat(101);
        assert_eq!(check_field(&record, FieldPath::Title, &cfg()), Some(ErrorCode::MaxLength));
        record.title = "Prompt pack".to_string();
        assert_eq!(check_field(&record, FieldPath::Title, &cfg()), None);
    }

    #[test]
    fn how_it_works_counts_only_complete_entries() {
        let mut record = FormRecord::initial();
        record.how_it_works = vec![
            HowItWorksStep::new("Buy", "Checkout"),
            HowItWorksStep::new("Download", "Get the file"),
            HowItWorksStep::new("Use", ""),
        ];
        assert_eq!(
            check_field(&record, FieldPath::HowItWorks, &cfg()),
            Some(ErrorCode::MinSteps)
        );
        record.how_it_works[2].detail = "Paste into your tool".to_string();
        assert_eq!(check_field(&record, FieldPath::HowItWorks, &cfg()), None);
        assert_eq!(complete_steps(&record.how_it_works), 3);
    }

    #[test]
    fn free_products_need_no_price() {
        let mut record = FormRecord::initial();
        assert_eq!(check_field(&record, FieldPath::Price, &cfg()), Some(ErrorCode::Required));
        record.price = Some(-1.0);
        assert_eq!(check_field(&record, FieldPath::Price, &cfg()), Some(ErrorCode::OutOfRange));
        record.pricing_model = PricingModel::Free;
        assert_eq!(check_field(&record, FieldPath::Price, &cfg()), None);
    }

    #[test]
    fn tag_cap_comes_from_config() {
        let mut record = FormRecord::initial();
        record.product_tags = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let tight = WizardConfig {
            max_tags: 2,
            ..WizardConfig::default()
        };
        assert_eq!(check_field(&record, FieldPath::ProductTags, &tight), Some(ErrorCode::MaxItems));
        assert_eq!(check_field(&record, FieldPath::ProductTags, &cfg()), None);
    }

    #[test]
    fn step_one_reports_every_missing_field() {
        let record = FormRecord::initial();
        let errors = validate_step(&record, 1, &cfg());
        let fields: Vec<_> = errors.keys().copied().collect();
        assert_eq!(
            fields,
            vec![
                FieldPath::Title,
                FieldPath::Tagline,
                FieldPath::ProductType,
                FieldPath::Category,
                FieldPath::Industry,
                FieldPath::ProductTags,
            ]
        );
    }

    #[test]
    fn premium_step_passes_when_empty() {
        let record = FormRecord::initial();
        assert!(step_passes(&record, 5, &cfg()));
        assert!(validate_step(&record, 5, &cfg()).is_empty());
    }

    #[test]
    fn out_of_range_step_has_no_rules() {
        let record = FormRecord::initial();
        assert!(validate_step(&record, 0, &cfg()).is_empty());
        assert!(validate_step(&record, 7, &cfg()).is_empty());
    }

    #[test]
    fn step_one_passes_when_filled() {
        let mut record = FormRecord::initial();
        record.title = "Cold email kit".to_string();
        record.tagline = "Fifty templates that get replies".to_string();
        record.product_type = Some(ProductType::Template);
        record.category = "Marketing".to_string();
        record.industry = "SaaS".to_string();
        record.product_tags = vec!["email".to_string()];
        assert!(step_passes(&record, 1, &cfg()));
    }

    #[test]
    fn placeholder_thumbnail_is_required_again() {
        let mut record = FormRecord::initial();
        record.thumbnail_image = FileRef::RemoteUrl("https://cdn/t.png".to_string());
        assert_eq!(check_field(&record, FieldPath::ThumbnailImage, &cfg()), None);
        record.thumbnail_image = FileRef::Placeholder(crate::file_ref::FileMeta {
            name: "t.png".to_string(),
            size: 10,
            mime_type: "image/png".to_string(),
            is_placeholder: true,
        });
        assert_eq!(
            check_field(&record, FieldPath::ThumbnailImage, &cfg()),
            Some(ErrorCode::Required)
        );
    }

    #[test]
    fn error_code_wire_names() {
        assert_eq!(serde_json::to_string(&ErrorCode::MinSteps).unwrap(), "\"minSteps\"");
        assert_eq!(ErrorCode::OutOfRange.to_string(), "outOfRange");
    }
}
