//! Submission boundary.
//!
//! `to_api_payload` turns a finished record into the wire shape the product
//! API accepts. It is pure: uploads must already have replaced local file
//! handles with remote URLs.

use serde::Serialize;

use crate::error::PayloadError;
use crate::file_ref::FileRef;
use crate::path::FieldPath;
use crate::record::{FormRecord, PricingModel, ProductType};

/// Pricing block of a submitted product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pricing {
    pub model: PricingModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// A question and answer pair, trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumPayload {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub prompt_text: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub instructions: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Wire shape of a new product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub title: String,
    pub tagline: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub category: String,
    pub industry: String,
    pub tags: Vec<String>,
    pub description: String,
    pub how_it_works: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub use_cases: Vec<String>,
    pub pricing: Pricing,
    pub thumbnail_url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gallery_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_content: Option<PremiumPayload>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub faq: Vec<FaqItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_email: Option<String>,
}

fn trimmed(s: &str) -> String {
    s.trim().to_string()
}

fn non_empty(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn optional(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Remote URL of an optional file. `None` stays absent; anything local fails.
fn optional_url(file: &FileRef, field: FieldPath) -> Result<Option<String>, PayloadError> {
    match file {
        FileRef::None => Ok(None),
        FileRef::RemoteUrl(url) => Ok(Some(url.clone())),
        FileRef::Handle(_) | FileRef::Placeholder(_) => Err(PayloadError::UnresolvedFile {
            field: field.to_string(),
        }),
    }
}

fn required_url(file: &FileRef, field: FieldPath) -> Result<String, PayloadError> {
    optional_url(file, field)?.ok_or_else(|| PayloadError::MissingField {
        field: field.to_string(),
    })
}

/// Maps a record into the submission payload.
///
/// # Errors
///
/// - `MissingField` if the product type or thumbnail is absent
/// - `UnresolvedFile` if any media is still a local handle or a placeholder
pub fn to_api_payload(record: &FormRecord) -> Result<ProductPayload, PayloadError> {
    let product_type = record.product_type.ok_or_else(|| PayloadError::MissingField {
        field: FieldPath::ProductType.to_string(),
    })?;

    let gallery_urls = record
        .additional_images
        .iter()
        .map(|file| optional_url(file, FieldPath::AdditionalImages))
        .filter_map(Result::transpose)
        .collect::<Result<Vec<_>, _>>()?;

    let premium = &record.premium_content;
    let premium_content = (!premium.is_empty()).then(|| PremiumPayload {
        prompt_text: trimmed(&premium.prompt_text),
        instructions: trimmed(&premium.instructions),
        examples: non_empty(&premium.examples),
    });

    let price = match record.pricing_model {
        PricingModel::Free => None,
        PricingModel::OneTime | PricingModel::Subscription => record.price,
    };

    Ok(ProductPayload {
        title: trimmed(&record.title),
        tagline: trimmed(&record.tagline),
        product_type,
        category: trimmed(&record.category),
        industry: trimmed(&record.industry),
        tags: non_empty(&record.product_tags),
        description: trimmed(&record.description),
        how_it_works: record
            .how_it_works
            .iter()
            .filter(|step| step.is_complete())
            .map(|step| format!("{}: {}", step.title.trim(), step.detail.trim()))
            .collect(),
        use_cases: non_empty(&record.use_cases),
        pricing: Pricing {
            model: record.pricing_model,
            price,
        },
        thumbnail_url: required_url(&record.thumbnail_image, FieldPath::ThumbnailImage)?,
        gallery_urls,
        preview_video_url: optional_url(&record.preview_video, FieldPath::PreviewVideo)?,
        premium_content,
        faq: record
            .faq
            .iter()
            .filter(|entry| entry.is_complete())
            .map(|entry| FaqItem {
                question: trimmed(&entry.question),
                answer: trimmed(&entry.answer),
            })
            .collect(),
        support_email: optional(&record.support_email),
    })
}
