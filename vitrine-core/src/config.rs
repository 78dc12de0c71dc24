//! Static site configuration.
//!
//! The configuration is the base content tree: everything the site can
//! render has a value here, defined once at startup and never mutated.
//! Remote admin edits are layered on top of it with
//! [`crate::content::merge_content`], so a deployment with an empty
//! document store still renders the full site.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{CompanyContent, CompanyImages, FooterContent};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Unknown company slug: {0}")]
    UnknownCompany(String),
}

const BUILTIN_SITE: &str = include_str!("../defaults/site.yml");

/// The full static configuration: site-wide chrome and copy, one entry
/// per company, and the footer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub website: WebsiteConfig,
    pub companies: Vec<CompanyConfig>,
    pub footer: FooterContent,
}

impl SiteConfig {
    /// Load a configuration file, YAML with camelCase keys.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// The configuration compiled into the binary, used when no config
    /// file is supplied.
    pub fn builtin() -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(BUILTIN_SITE)?)
    }

    pub fn company(&self, slug: &str) -> Option<&CompanyConfig> {
        self.companies.iter().find(|c| c.slug == slug)
    }

    pub fn company_slugs(&self) -> Vec<&str> {
        self.companies.iter().map(|c| c.slug.as_str()).collect()
    }

    /// Base trees as JSON values, the shape the merge engine consumes.
    pub fn website_base(&self) -> Value {
        serde_json::to_value(&self.website).unwrap_or(Value::Null)
    }

    pub fn footer_base(&self) -> Value {
        serde_json::to_value(&self.footer).unwrap_or(Value::Null)
    }

    pub fn company_content_base(&self, slug: &str) -> Option<Value> {
        self.company(slug)
            .map(|c| serde_json::to_value(&c.content).unwrap_or(Value::Null))
    }

    pub fn company_images_base(&self, slug: &str) -> Option<Value> {
        self.company(slug)
            .map(|c| serde_json::to_value(&c.images).unwrap_or(Value::Null))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyConfig {
    pub slug: String,
    pub content: CompanyContent,
    #[serde(default)]
    pub images: CompanyImages,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteConfig {
    pub meta: MetaConfig,
    pub header: HeaderConfig,
    pub home: HomeConfig,
    pub about: PageCopy,
    pub services: ServicesConfig,
    pub contact: ContactCopy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetaConfig {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub author: String,
    pub year: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeaderConfig {
    pub brand: BrandMark,
    pub nav: Vec<NavItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandMark {
    pub text: String,
    pub logo_src: String,
    pub alt: String,
    pub route: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavItem {
    pub title: String,
    pub route: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HomeConfig {
    pub hero: Hero,
    pub intro: PageCopy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hero {
    pub heading: String,
    pub subheading: String,
    pub cta_label: String,
    pub cta_route: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageCopy {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServicesConfig {
    pub title: String,
    pub intro: String,
    pub items: Vec<ServiceItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceItem {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactCopy {
    pub title: String,
    pub body: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::merge_content;
    use crate::path::ContentPath;
    use serde_json::json;

    #[test]
    fn builtin_config_parses_and_lists_three_companies() {
        let config = SiteConfig::builtin().unwrap();
        assert_eq!(config.companies.len(), 3);
        assert!(config.company("forkline").is_some());
        assert!(config.company("nope").is_none());
        assert!(!config.website.meta.title.is_empty());
        assert_eq!(config.footer.columns.len(), 3);
    }

    #[test]
    fn company_base_exposes_dotted_paths() {
        let config = SiteConfig::builtin().unwrap();
        let base = config.company_content_base("voltaic").unwrap();
        let title = ContentPath::parse("section2.title").get(&base);
        assert!(title.and_then(Value::as_str).is_some());
        assert!(!ContentPath::parse("section2.expertisePoints")
            .get(&base)
            .and_then(Value::as_array)
            .map(|points| points.is_empty())
            .unwrap_or(true));
    }

    #[test]
    fn base_tree_merges_with_remote_overrides() {
        let config = SiteConfig::builtin().unwrap();
        let base = config.company_content_base("forkline").unwrap();
        let merged = merge_content(&base, Some(&json!({"tagline": "edited"})));
        assert_eq!(merged["tagline"], "edited");
        assert_eq!(merged["brandName"], base["brandName"]);
    }

    #[test]
    fn from_file_round_trips_the_builtin_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.yml");
        std::fs::write(&path, super::BUILTIN_SITE).unwrap();
        let config = SiteConfig::from_file(&path).unwrap();
        assert_eq!(config.company_slugs().len(), 3);
    }
}
