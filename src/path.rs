//! Field paths into the product record.
//!
//! UI code addresses fields with dotted strings such as
//! `"premiumContent.promptText"`. Strings are parsed once against a static
//! schema tree into a `FieldPath`; every read and write then goes through a
//! typed accessor for that path. Intermediate segments must name objects
//! that exist in the schema; numeric index segments are not supported (list
//! elements are edited through the list actions instead).

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PathError;
use crate::file_ref::FileRef;
use crate::record::{ChecklistItem, FaqEntry, FormRecord, HowItWorksStep, PremiumContent};

/// Every addressable field of `FormRecord`, in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldPath {
    Title,
    Tagline,
    ProductType,
    Category,
    Industry,
    ProductTags,
    Description,
    HowItWorks,
    UseCases,
    PricingModel,
    Price,
    ThumbnailImage,
    AdditionalImages,
    PreviewVideo,
    PremiumContent,
    PremiumPromptText,
    PremiumInstructions,
    PremiumExamples,
    Faq,
    LaunchChecklist,
    SupportEmail,
    TermsAccepted,
}

impl FieldPath {
    pub const ALL: [Self; 22] = [
        Self::Title,
        Self::Tagline,
        Self::ProductType,
        Self::Category,
        Self::Industry,
        Self::ProductTags,
        Self::Description,
        Self::HowItWorks,
        Self::UseCases,
        Self::PricingModel,
        Self::Price,
        Self::ThumbnailImage,
        Self::AdditionalImages,
        Self::PreviewVideo,
        Self::PremiumContent,
        Self::PremiumPromptText,
        Self::PremiumInstructions,
        Self::PremiumExamples,
        Self::Faq,
        Self::LaunchChecklist,
        Self::SupportEmail,
        Self::TermsAccepted,
    ];

    /// Canonical dotted form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Tagline => "tagline",
            Self::ProductType => "productType",
            Self::Category => "category",
            Self::Industry => "industry",
            Self::ProductTags => "productTags",
            Self::Description => "description",
            Self::HowItWorks => "howItWorks",
            Self::UseCases => "useCases",
            Self::PricingModel => "pricingModel",
            Self::Price => "price",
            Self::ThumbnailImage => "thumbnailImage",
            Self::AdditionalImages => "additionalImages",
            Self::PreviewVideo => "previewVideo",
            Self::PremiumContent => "premiumContent",
            Self::PremiumPromptText => "premiumContent.promptText",
            Self::PremiumInstructions => "premiumContent.instructions",
            Self::PremiumExamples => "premiumContent.examples",
            Self::Faq => "faq",
            Self::LaunchChecklist => "launchChecklist",
            Self::SupportEmail => "supportEmail",
            Self::TermsAccepted => "termsAccepted",
        }
    }

    /// Wizard step (1-based) on which the field is edited.
    #[must_use]
    pub const fn step(self) -> u8 {
        match self {
            Self::Title
            | Self::Tagline
            | Self::ProductType
            | Self::Category
            | Self::Industry
            | Self::ProductTags => 1,
            Self::Description | Self::HowItWorks | Self::UseCases => 2,
            Self::PricingModel | Self::Price => 3,
            Self::ThumbnailImage | Self::AdditionalImages | Self::PreviewVideo => 4,
            Self::PremiumContent
            | Self::PremiumPromptText
            | Self::PremiumInstructions
            | Self::PremiumExamples => 5,
            Self::Faq | Self::LaunchChecklist | Self::SupportEmail | Self::TermsAccepted => 6,
        }
    }

    /// Fields holding binary references.
    #[must_use]
    pub const fn is_file(self) -> bool {
        matches!(
            self,
            Self::ThumbnailImage | Self::AdditionalImages | Self::PreviewVideo
        )
    }

    /// Fields holding ordered sequences.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(
            self,
            Self::ProductTags
                | Self::HowItWorks
                | Self::UseCases
                | Self::AdditionalImages
                | Self::PremiumExamples
                | Self::Faq
                | Self::LaunchChecklist
        )
    }

    const fn expected(self) -> &'static str {
        match self {
            Self::Title
            | Self::Tagline
            | Self::Category
            | Self::Industry
            | Self::Description
            | Self::PremiumPromptText
            | Self::PremiumInstructions
            | Self::SupportEmail => "text",
            Self::ProductType => "product type",
            Self::PricingModel => "pricing model",
            Self::Price => "number",
            Self::TermsAccepted => "boolean",
            Self::ProductTags | Self::UseCases | Self::PremiumExamples => "text list",
            Self::HowItWorks => "how-it-works list",
            Self::Faq => "faq list",
            Self::LaunchChecklist => "checklist",
            Self::ThumbnailImage | Self::PreviewVideo => "file",
            Self::AdditionalImages => "file list",
            Self::PremiumContent => "premium content",
        }
    }

    /// Parses a dotted path against the record schema.
    ///
    /// # Errors
    ///
    /// Returns a `PathError` if the string is not a dotted identifier path,
    /// names an unknown segment, or walks through a non-object field.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if !grammar().is_match(path) {
            return Err(PathError::Malformed {
                path: path.to_string(),
            });
        }

        let mut nodes = ROOT;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let Some((_, node)) = nodes.iter().find(|(name, _)| *name == segment) else {
                return Err(PathError::UnknownSegment {
                    path: path.to_string(),
                    segment: segment.to_string(),
                });
            };
            let is_last = segments.peek().is_none();
            match (node, is_last) {
                (Node::Field(field) | Node::Object(field, _), true) => return Ok(*field),
                (Node::Object(_, children), false) => nodes = *children,
                (Node::Field(_), false) => {
                    return Err(PathError::NotAnObject {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    })
                }
            }
        }

        Err(PathError::NotAField {
            path: path.to_string(),
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

enum Node {
    Field(FieldPath),
    Object(FieldPath, &'static [(&'static str, Node)]),
}

const PREMIUM: &[(&str, Node)] = &[
    ("promptText", Node::Field(FieldPath::PremiumPromptText)),
    ("instructions", Node::Field(FieldPath::PremiumInstructions)),
    ("examples", Node::Field(FieldPath::PremiumExamples)),
];

const ROOT: &[(&str, Node)] = &[
    ("title", Node::Field(FieldPath::Title)),
    ("tagline", Node::Field(FieldPath::Tagline)),
    ("productType", Node::Field(FieldPath::ProductType)),
    ("category", Node::Field(FieldPath::Category)),
    ("industry", Node::Field(FieldPath::Industry)),
    ("productTags", Node::Field(FieldPath::ProductTags)),
    ("description", Node::Field(FieldPath::Description)),
    ("howItWorks", Node::Field(FieldPath::HowItWorks)),
    ("useCases", Node::Field(FieldPath::UseCases)),
    ("pricingModel", Node::Field(FieldPath::PricingModel)),
    ("price", Node::Field(FieldPath::Price)),
    ("thumbnailImage", Node::Field(FieldPath::ThumbnailImage)),
    ("additionalImages", Node::Field(FieldPath::AdditionalImages)),
    ("previewVideo", Node::Field(FieldPath::PreviewVideo)),
    ("premiumContent", Node::Object(FieldPath::PremiumContent, PREMIUM)),
    ("faq", Node::Field(FieldPath::Faq)),
    ("launchChecklist", Node::Field(FieldPath::LaunchChecklist)),
    ("supportEmail", Node::Field(FieldPath::SupportEmail)),
    ("termsAccepted", Node::Field(FieldPath::TermsAccepted)),
];

fn grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
            .expect("path grammar is a valid regex")
    })
}

/// A value read from or written to a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    TextList(Vec<String>),
    Steps(Vec<HowItWorksStep>),
    Faq(Vec<FaqEntry>),
    Checklist(Vec<ChecklistItem>),
    File(FileRef),
    Files(Vec<FileRef>),
    Premium(PremiumContent),
}

impl FieldValue {
    /// Trivial presence check used to clear errors while the user types.
    #[must_use]
    pub fn is_present(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Text(v) => !v.trim().is_empty(),
            Self::Number(n) => n.is_finite(),
            Self::Bool(b) => *b,
            Self::TextList(v) => v.iter().any(|s| !s.trim().is_empty()),
            Self::Steps(v) => v.iter().any(HowItWorksStep::is_complete),
            Self::Faq(v) => v.iter().any(FaqEntry::is_complete),
            Self::Checklist(v) => !v.is_empty(),
            Self::File(f) => f.is_present(),
            Self::Files(v) => v.iter().any(FileRef::is_present),
            Self::Premium(p) => !p.is_empty(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<FileRef> for FieldValue {
    fn from(v: FileRef) -> Self {
        Self::File(v)
    }
}

/// Reads the value at `path`.
#[must_use]
pub fn resolve(record: &FormRecord, path: FieldPath) -> FieldValue {
    match path {
        FieldPath::Title => FieldValue::Text(record.title.clone()),
        FieldPath::Tagline => FieldValue::Text(record.tagline.clone()),
        FieldPath::ProductType => record
            .product_type
            .map_or(FieldValue::Null, |t| FieldValue::Text(t.as_str().to_string())),
        FieldPath::Category => FieldValue::Text(record.category.clone()),
        FieldPath::Industry => FieldValue::Text(record.industry.clone()),
        FieldPath::ProductTags => FieldValue::TextList(record.product_tags.clone()),
        FieldPath::Description => FieldValue::Text(record.description.clone()),
        FieldPath::HowItWorks => FieldValue::Steps(record.how_it_works.clone()),
        FieldPath::UseCases => FieldValue::TextList(record.use_cases.clone()),
        FieldPath::PricingModel => FieldValue::Text(record.pricing_model.as_str().to_string()),
        FieldPath::Price => record.price.map_or(FieldValue::Null, FieldValue::Number),
        FieldPath::ThumbnailImage => FieldValue::File(record.thumbnail_image.clone()),
        FieldPath::AdditionalImages => FieldValue::Files(record.additional_images.clone()),
        FieldPath::PreviewVideo => FieldValue::File(record.preview_video.clone()),
        FieldPath::PremiumContent => FieldValue::Premium(record.premium_content.clone()),
        FieldPath::PremiumPromptText => FieldValue::Text(record.premium_content.prompt_text.clone()),
        FieldPath::PremiumInstructions => {
            FieldValue::Text(record.premium_content.instructions.clone())
        }
        FieldPath::PremiumExamples => FieldValue::TextList(record.premium_content.examples.clone()),
        FieldPath::Faq => FieldValue::Faq(record.faq.clone()),
        FieldPath::LaunchChecklist => FieldValue::Checklist(record.launch_checklist.clone()),
        FieldPath::SupportEmail => FieldValue::Text(record.support_email.clone()),
        FieldPath::TermsAccepted => FieldValue::Bool(record.terms_accepted),
    }
}

/// Overwrites the value at `path`.
///
/// The record is untouched when an error is returned.
///
/// # Errors
///
/// Returns `PathError::TypeMismatch` if `value` does not fit the field.
pub fn assign(record: &mut FormRecord, path: FieldPath, value: FieldValue) -> Result<(), PathError> {
    let mismatch = || PathError::TypeMismatch {
        path: path.as_str().to_string(),
        expected: path.expected(),
    };

    match (path, value) {
        (FieldPath::Title, FieldValue::Text(v)) => record.title = v,
        (FieldPath::Tagline, FieldValue::Text(v)) => record.tagline = v,
        (FieldPath::ProductType, FieldValue::Null) => record.product_type = None,
        (FieldPath::ProductType, FieldValue::Text(v)) => {
            record.product_type = Some(v.parse().map_err(|()| mismatch())?);
        }
        (FieldPath::Category, FieldValue::Text(v)) => record.category = v,
        (FieldPath::Industry, FieldValue::Text(v)) => record.industry = v,
        (FieldPath::ProductTags, FieldValue::TextList(v)) => record.product_tags = v,
        (FieldPath::Description, FieldValue::Text(v)) => record.description = v,
        (FieldPath::HowItWorks, FieldValue::Steps(v)) => record.how_it_works = v,
        (FieldPath::UseCases, FieldValue::TextList(v)) => record.use_cases = v,
        (FieldPath::PricingModel, FieldValue::Text(v)) => {
            record.pricing_model = v.parse().map_err(|()| mismatch())?;
        }
        (FieldPath::Price, FieldValue::Null) => record.price = None,
        (FieldPath::Price, FieldValue::Number(n)) if n.is_finite() => record.price = Some(n),
        (FieldPath::ThumbnailImage, FieldValue::File(f)) => record.thumbnail_image = f,
        (FieldPath::ThumbnailImage, FieldValue::Null) => record.thumbnail_image = FileRef::None,
        (FieldPath::AdditionalImages, FieldValue::Files(v)) => record.additional_images = v,
        (FieldPath::PreviewVideo, FieldValue::File(f)) => record.preview_video = f,
        (FieldPath::PreviewVideo, FieldValue::Null) => record.preview_video = FileRef::None,
        (FieldPath::PremiumContent, FieldValue::Premium(p)) => record.premium_content = p,
        (FieldPath::PremiumPromptText, FieldValue::Text(v)) => record.premium_content.prompt_text = v,
        (FieldPath::PremiumInstructions, FieldValue::Text(v)) => {
            record.premium_content.instructions = v;
        }
        (FieldPath::PremiumExamples, FieldValue::TextList(v)) => record.premium_content.examples = v,
        (FieldPath::Faq, FieldValue::Faq(v)) => record.faq = v,
        (FieldPath::LaunchChecklist, FieldValue::Checklist(v)) => record.launch_checklist = v,
        (FieldPath::SupportEmail, FieldValue::Text(v)) => record.support_email = v,
        (FieldPath::TermsAccepted, FieldValue::Bool(b)) => record.terms_accepted = b,
        _ => return Err(mismatch()),
    }
    Ok(())
}

/// Parses `path` and reads the value there.
///
/// # Errors
///
/// Returns a `PathError` if `path` does not parse.
pub fn resolve_str(record: &FormRecord, path: &str) -> Result<FieldValue, PathError> {
    Ok(resolve(record, FieldPath::parse(path)?))
}

/// Parses `path` and overwrites the value there.
///
/// # Errors
///
/// Returns a `PathError` if `path` does not parse or `value` does not fit.
pub fn assign_str(record: &mut FormRecord, path: &str, value: FieldValue) -> Result<(), PathError> {
    assign(record, FieldPath::parse(path)?, value)
}

/// One element of a list field.
#[derive(Debug, Clone, PartialEq)]
pub enum ListItem {
    Text(String),
    Step(HowItWorksStep),
    Faq(FaqEntry),
    Checklist(ChecklistItem),
    File(FileRef),
}

impl From<&str> for ListItem {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<HowItWorksStep> for ListItem {
    fn from(v: HowItWorksStep) -> Self {
        Self::Step(v)
    }
}

impl From<FaqEntry> for ListItem {
    fn from(v: FaqEntry) -> Self {
        Self::Faq(v)
    }
}

impl From<ChecklistItem> for ListItem {
    fn from(v: ChecklistItem) -> Self {
        Self::Checklist(v)
    }
}

impl From<FileRef> for ListItem {
    fn from(v: FileRef) -> Self {
        Self::File(v)
    }
}

/// Mutable view of a list-typed field.
#[derive(Debug)]
pub enum ListMut<'a> {
    Text(&'a mut Vec<String>),
    Steps(&'a mut Vec<HowItWorksStep>),
    Faq(&'a mut Vec<FaqEntry>),
    Checklist(&'a mut Vec<ChecklistItem>),
    Files(&'a mut Vec<FileRef>),
}

fn remove_at<T>(list: &mut Vec<T>, index: usize) -> bool {
    if index < list.len() {
        list.remove(index);
        true
    } else {
        false
    }
}

fn replace_at<T>(list: &mut [T], index: usize, item: T) -> bool {
    match list.get_mut(index) {
        Some(slot) => {
            *slot = item;
            true
        }
        None => false,
    }
}

impl ListMut<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(l) => l.len(),
            Self::Steps(l) => l.len(),
            Self::Faq(l) => l.len(),
            Self::Checklist(l) => l.len(),
            Self::Files(l) => l.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends `item`. Returns false if it does not fit the list.
    pub fn push(&mut self, item: ListItem) -> bool {
        match (self, item) {
            (Self::Text(l), ListItem::Text(v)) => l.push(v),
            (Self::Steps(l), ListItem::Step(v)) => l.push(v),
            (Self::Faq(l), ListItem::Faq(v)) => l.push(v),
            (Self::Checklist(l), ListItem::Checklist(v)) => l.push(v),
            (Self::Files(l), ListItem::File(v)) => l.push(v),
            _ => return false,
        }
        true
    }

    /// Removes the element at `index`, shifting later elements down.
    pub fn remove(&mut self, index: usize) -> bool {
        match self {
            Self::Text(l) => remove_at(l, index),
            Self::Steps(l) => remove_at(l, index),
            Self::Faq(l) => remove_at(l, index),
            Self::Checklist(l) => remove_at(l, index),
            Self::Files(l) => remove_at(l, index),
        }
    }

    /// Replaces the element at `index`. Returns false when out of range or
    /// when `item` does not fit the list.
    pub fn replace(&mut self, index: usize, item: ListItem) -> bool {
        match (self, item) {
            (Self::Text(l), ListItem::Text(v)) => replace_at(l, index, v),
            (Self::Steps(l), ListItem::Step(v)) => replace_at(l, index, v),
            (Self::Faq(l), ListItem::Faq(v)) => replace_at(l, index, v),
            (Self::Checklist(l), ListItem::Checklist(v)) => replace_at(l, index, v),
            (Self::Files(l), ListItem::File(v)) => replace_at(l, index, v),
            _ => false,
        }
    }
}

/// Mutable access to a list field, or `None` if `path` is not a list.
pub fn list_mut(record: &mut FormRecord, path: FieldPath) -> Option<ListMut<'_>> {
    match path {
        FieldPath::ProductTags => Some(ListMut::Text(&mut record.product_tags)),
        FieldPath::UseCases => Some(ListMut::Text(&mut record.use_cases)),
        FieldPath::PremiumExamples => Some(ListMut::Text(&mut record.premium_content.examples)),
        FieldPath::HowItWorks => Some(ListMut::Steps(&mut record.how_it_works)),
        FieldPath::Faq => Some(ListMut::Faq(&mut record.faq)),
        FieldPath::LaunchChecklist => Some(ListMut::Checklist(&mut record.launch_checklist)),
        FieldPath::AdditionalImages => Some(ListMut::Files(&mut record.additional_images)),
        _ => None,
    }
}
