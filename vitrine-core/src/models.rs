//! Typed content models for the documents the site edits.
//!
//! Field names serialize in camelCase so they line up with the dotted
//! paths used by editable fields (`section2.expertisePoints.0` and
//! friends). Remote documents may hold only a subset of these fields;
//! the merge engine fills the rest from the base configuration, so every
//! field here carries a serde default.

use serde::{Deserialize, Serialize};

/// Per-company marketing copy: five presentational sections plus the
/// closing call to action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyContent {
    pub brand_name: String,
    pub tagline: String,
    pub description: String,
    pub section1: IntroSection,
    pub section2: ExpertiseSection,
    pub section3: BenefitsSection,
    pub section4: FeaturesSection,
    pub section5: HighlightsSection,
    pub cta: CallToAction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntroSection {
    pub title: String,
    pub summary: String,
    pub description: String,
    pub services: String,
    pub services_label: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpertiseSection {
    pub title: String,
    pub description: String,
    pub expertise_points: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BenefitsSection {
    pub title: String,
    pub description: String,
    pub benefits: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeaturesSection {
    pub title: String,
    pub description: String,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HighlightsSection {
    pub title: String,
    pub description: String,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallToAction {
    pub heading: String,
    pub description: String,
}

/// Per-company imagery: a cover plus per-section image/alt slideshows.
/// The single `sectionNSrc`/`sectionNAlt` fields are the pre-slideshow
/// document shape and are still read when the array fields are absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyImages {
    pub cover_src: String,
    pub cover_alt: String,
    pub section1_images: Vec<String>,
    pub section1_alts: Vec<String>,
    pub section2_images: Vec<String>,
    pub section2_alts: Vec<String>,
    pub section3_images: Vec<String>,
    pub section3_alts: Vec<String>,
    pub section4_images: Vec<String>,
    pub section4_alts: Vec<String>,
    pub section5_images: Vec<String>,
    pub section5_alts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section1_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section1_alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section2_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section2_alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section3_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section3_alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section4_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section4_alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section5_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section5_alt: Option<String>,
}

/// Footer: three columns of text or link items plus the legal line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FooterContent {
    pub columns: Vec<FooterColumn>,
    pub bottom: FooterBottom,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FooterColumn {
    pub title: String,
    pub items: Vec<FooterItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterItem {
    #[serde(rename = "type")]
    pub kind: FooterItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FooterItemKind {
    Text,
    Link,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FooterBottom {
    pub legal: String,
}

/// An entry in the admin registry collection. A signed-in account is only
/// promoted to admin when its registry document exists and carries
/// `isAdmin: true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRecord {
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub password_hash: String,
    #[serde(default)]
    pub is_admin: bool,
}
