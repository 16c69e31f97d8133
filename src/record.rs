//! The product record edited by the wizard.
//!
//! `FormRecord` is generic over its file reference type: the live form
//! holds `FileRef` (which may own bytes), while drafts on disk hold
//! `StoredFileRef`. Only the latter implements `Serialize`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::file_ref::FileRef;

/// Kind of product being listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductType {
    Prompt,
    Template,
    Workflow,
    Agent,
    Dataset,
}

impl ProductType {
    pub const ALL: [Self; 5] = [
        Self::Prompt,
        Self::Template,
        Self::Workflow,
        Self::Agent,
        Self::Dataset,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Template => "template",
            Self::Workflow => "workflow",
            Self::Agent => "agent",
            Self::Dataset => "dataset",
        }
    }
}

impl FromStr for ProductType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|t| t.as_str() == s).ok_or(())
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the product is charged for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PricingModel {
    Free,
    #[default]
    OneTime,
    Subscription,
}

impl PricingModel {
    pub const ALL: [Self; 3] = [Self::Free, Self::OneTime, Self::Subscription];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::OneTime => "oneTime",
            Self::Subscription => "subscription",
        }
    }
}

impl FromStr for PricingModel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|m| m.as_str() == s).ok_or(())
    }
}

/// One entry of the "how it works" walkthrough.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HowItWorksStep {
    pub title: String,
    pub detail: String,
}

impl HowItWorksStep {
    pub fn new(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
        }
    }

    /// Both halves are filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.detail.trim().is_empty()
    }
}

/// A frequently asked question.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

impl FaqEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Both halves are filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.question.trim().is_empty() && !self.answer.trim().is_empty()
    }
}

/// A pre-launch checklist item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub label: String,
    pub done: bool,
}

impl ChecklistItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            done: false,
        }
    }
}

/// Content only buyers receive.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumContent {
    pub prompt_text: String,
    pub instructions: String,
    pub examples: Vec<String>,
}

impl PremiumContent {
    /// Nothing has been entered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompt_text.trim().is_empty()
            && self.instructions.trim().is_empty()
            && self.examples.iter().all(|e| e.trim().is_empty())
    }
}

/// The nested product record behind the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormRecord<F = FileRef> {
    // Step 1: basics
    pub title: String,
    pub tagline: String,
    pub product_type: Option<ProductType>,
    pub category: String,
    pub industry: String,
    pub product_tags: Vec<String>,

    // Step 2: details
    pub description: String,
    pub how_it_works: Vec<HowItWorksStep>,
    pub use_cases: Vec<String>,

    // Step 3: pricing
    pub pricing_model: PricingModel,
    pub price: Option<f64>,

    // Step 4: media
    pub thumbnail_image: F,
    pub additional_images: Vec<F>,
    pub preview_video: F,

    // Step 5: premium content
    pub premium_content: PremiumContent,

    // Step 6: launch
    pub faq: Vec<FaqEntry>,
    pub launch_checklist: Vec<ChecklistItem>,
    pub support_email: String,
    pub terms_accepted: bool,
}

/// Labels of the checklist every new draft starts with.
pub const STARTER_CHECKLIST: [&str; 5] = [
    "Write a clear, specific title",
    "Describe at least three steps of how it works",
    "Upload a thumbnail image",
    "Set a price or mark the product free",
    "Answer the most common buyer question",
];

impl<F: Default> FormRecord<F> {
    /// The record every wizard starts from.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            title: String::new(),
            tagline: String::new(),
            product_type: None,
            category: String::new(),
            industry: String::new(),
            product_tags: Vec::new(),
            description: String::new(),
            how_it_works: vec![HowItWorksStep::default()],
            use_cases: Vec::new(),
            pricing_model: PricingModel::default(),
            price: None,
            thumbnail_image: F::default(),
            additional_images: Vec::new(),
            preview_video: F::default(),
            premium_content: PremiumContent::default(),
            faq: vec![FaqEntry::default()],
            launch_checklist: STARTER_CHECKLIST.iter().map(|l| ChecklistItem::new(*l)).collect(),
            support_email: String::new(),
            terms_accepted: false,
        }
    }
}

impl<F: Default> Default for FormRecord<F> {
    fn default() -> Self {
        Self::initial()
    }
}

impl<F> FormRecord<F> {
    /// Copies the record, converting every file reference with `f`.
    pub fn map_files<G>(&self, mut f: impl FnMut(&F) -> G) -> FormRecord<G> {
        FormRecord {
            title: self.title.clone(),
            tagline: self.tagline.clone(),
            product_type: self.product_type,
            category: self.category.clone(),
            industry: self.industry.clone(),
            product_tags: self.product_tags.clone(),
            description: self.description.clone(),
            how_it_works: self.how_it_works.clone(),
            use_cases: self.use_cases.clone(),
            pricing_model: self.pricing_model,
            price: self.price,
            thumbnail_image: f(&self.thumbnail_image),
            additional_images: self.additional_images.iter().map(&mut f).collect(),
            preview_video: f(&self.preview_video),
            premium_content: self.premium_content.clone(),
            faq: self.faq.clone(),
            launch_checklist: self.launch_checklist.clone(),
            support_email: self.support_email.clone(),
            terms_accepted: self.terms_accepted,
        }
    }
}

impl<F> FormRecord<F> {
    /// Converts every file reference with `f`, consuming the record.
    pub fn into_files<G>(self, mut f: impl FnMut(F) -> G) -> FormRecord<G> {
        FormRecord {
            title: self.title,
            tagline: self.tagline,
            product_type: self.product_type,
            category: self.category,
            industry: self.industry,
            product_tags: self.product_tags,
            description: self.description,
            how_it_works: self.how_it_works,
            use_cases: self.use_cases,
            pricing_model: self.pricing_model,
            price: self.price,
            thumbnail_image: f(self.thumbnail_image),
            additional_images: self.additional_images.into_iter().map(&mut f).collect(),
            preview_video: f(self.preview_video),
            premium_content: self.premium_content,
            faq: self.faq,
            launch_checklist: self.launch_checklist,
            support_email: self.support_email,
            terms_accepted: self.terms_accepted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_ref::{FileHandle, StoredFileRef};

    #[test]
    fn initial_record_has_starter_subrecords() {
        let record: FormRecord = FormRecord::initial();
        assert_eq!(record.launch_checklist.len(), STARTER_CHECKLIST.len());
        assert!(record.launch_checklist.iter().all(|i| !i.done));
        assert_eq!(record.how_it_works.len(), 1);
        assert_eq!(record.faq.len(), 1);
        assert!(record.thumbnail_image.is_none());
    }

    #[test]
    fn stored_record_uses_camel_case() {
        let record: FormRecord<StoredFileRef> = FormRecord::initial();
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("howItWorks").is_some());
        assert!(json["premiumContent"].get("promptText").is_some());
        assert_eq!(json["pricingModel"], "oneTime");
    }

    #[test]
    fn map_files_converts_handles() {
        let mut record: FormRecord = FormRecord::initial();
        record.thumbnail_image = FileHandle::new("a.png", "image/png", vec![0u8; 8]).into();
        record.additional_images = vec![FileRef::RemoteUrl("https://x/y.png".to_string())];

        let stored = record.map_files(FileRef::to_stored);
        assert!(matches!(stored.thumbnail_image, StoredFileRef::Placeholder(_)));
        assert_eq!(
            stored.additional_images,
            vec![StoredFileRef::RemoteUrl("https://x/y.png".to_string())]
        );
    }

    #[test]
    fn product_type_parses_from_wire_name() {
        assert_eq!("workflow".parse::<ProductType>(), Ok(ProductType::Workflow));
        assert!("Workflow".parse::<ProductType>().is_err());
        assert_eq!("oneTime".parse::<PricingModel>(), Ok(PricingModel::OneTime));
    }

    #[test]
    fn premium_content_emptiness() {
        let mut premium = PremiumContent::default();
        assert!(premium.is_empty());
        premium.examples.push("  ".to_string());
        assert!(premium.is_empty());
        premium.instructions = "Paste into chat".to_string();
        assert!(!premium.is_empty());
    }
}
