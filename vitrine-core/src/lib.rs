//! # vitrine-core
//!
//! Core library for the vitrine brand-group sites.
//!
//! This crate provides the static site configuration, the typed content
//! models, and the override machinery that layers remotely stored admin
//! edits on top of the built-in configuration tree: dotted-path
//! addressing, the array/map normalizer, and the deep merge engine.

pub mod config;
pub mod content;
pub mod models;
pub mod path;

pub use config::{CompanyConfig, ConfigError, SiteConfig};
pub use content::{merge_content, to_array};
pub use models::{CompanyContent, CompanyImages, FooterContent, FooterItem};
pub use path::{ContentPath, PathError};
