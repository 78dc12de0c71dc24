//! Askama templates and the view models behind them.
//!
//! Pages render from the merged content trees, not from the typed
//! config structs, so inline edits show up on the next render without
//! any schema round trip. The helpers here pull strings and lists out
//! of a merged [`Value`] by dotted path.

use askama::Template;
use serde_json::Value;

use vitrine_core::{to_array, ContentPath};

pub fn text(root: &Value, path: &str) -> String {
    ContentPath::parse(path)
        .get(root)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub fn string_list(root: &Value, path: &str) -> Vec<String> {
    to_array(ContentPath::parse(path).get(root))
        .into_iter()
        .filter_map(|item| item.as_str().map(str::to_string))
        .collect()
}

// ───────────────────────── shared chrome ─────────────────────────

#[derive(Debug, Clone)]
pub struct NavLink {
    pub title: String,
    pub route: String,
}

/// A footer entry: plain text, or a link when a route is present.
#[derive(Debug, Clone)]
pub struct FooterItemView {
    pub label: String,
    pub route: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FooterColumnView {
    pub title: String,
    pub items: Vec<FooterItemView>,
}

/// Everything base.html needs: head metadata, header nav, footer.
#[derive(Debug, Clone)]
pub struct Chrome {
    pub site_title: String,
    pub description: String,
    pub brand_text: String,
    pub nav: Vec<NavLink>,
    pub footer_columns: Vec<FooterColumnView>,
    pub footer_legal: String,
    pub is_admin: bool,
}

impl Chrome {
    pub fn build(website: &Value, footer: &Value, is_admin: bool) -> Self {
        let nav = to_array(ContentPath::parse("header.nav").get(website))
            .iter()
            .map(|item| NavLink {
                title: text(item, "title"),
                route: text(item, "route"),
            })
            .collect();

        let footer_columns = to_array(ContentPath::parse("columns").get(footer))
            .iter()
            .map(|column| FooterColumnView {
                title: text(column, "title"),
                items: to_array(ContentPath::parse("items").get(column))
                    .iter()
                    .map(|item| {
                        let route = text(item, "route");
                        let label = match text(item, "type").as_str() {
                            "link" => text(item, "label"),
                            _ => text(item, "value"),
                        };
                        FooterItemView {
                            label,
                            route: if route.is_empty() { None } else { Some(route) },
                        }
                    })
                    .collect(),
            })
            .collect();

        Self {
            site_title: text(website, "meta.title"),
            description: text(website, "meta.description"),
            brand_text: text(website, "header.brand.text"),
            nav,
            footer_columns,
            footer_legal: text(footer, "bottom.legal"),
            is_admin,
        }
    }
}

// ───────────────────────── page templates ─────────────────────────

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub chrome: Chrome,
    pub hero_heading: String,
    pub hero_subheading: String,
    pub cta_label: String,
    pub cta_route: String,
    pub intro_title: String,
    pub intro_body: String,
    pub companies: Vec<CompanyCard>,
}

impl HomeTemplate {
    pub fn build(chrome: Chrome, website: &Value, companies: Vec<CompanyCard>) -> Self {
        Self {
            chrome,
            hero_heading: text(website, "home.hero.heading"),
            hero_subheading: text(website, "home.hero.subheading"),
            cta_label: text(website, "home.hero.ctaLabel"),
            cta_route: text(website, "home.hero.ctaRoute"),
            intro_title: text(website, "home.intro.title"),
            intro_body: text(website, "home.intro.body"),
            companies,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompanyCard {
    pub slug: String,
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub cover_src: String,
    pub cover_alt: String,
}

impl CompanyCard {
    pub fn build(slug: &str, content: &Value, images: &Value) -> Self {
        Self {
            slug: slug.to_string(),
            name: text(content, "brandName"),
            tagline: text(content, "tagline"),
            description: text(content, "description"),
            cover_src: text(images, "coverSrc"),
            cover_alt: text(images, "coverAlt"),
        }
    }
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub chrome: Chrome,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct ServiceView {
    pub title: String,
    pub description: String,
}

#[derive(Template)]
#[template(path = "services.html")]
pub struct ServicesTemplate {
    pub chrome: Chrome,
    pub title: String,
    pub intro: String,
    pub services: Vec<ServiceView>,
}

impl ServicesTemplate {
    pub fn build(chrome: Chrome, website: &Value) -> Self {
        let services = to_array(ContentPath::parse("services.items").get(website))
            .iter()
            .map(|item| ServiceView {
                title: text(item, "title"),
                description: text(item, "description"),
            })
            .collect();
        Self {
            chrome,
            title: text(website, "services.title"),
            intro: text(website, "services.intro"),
            services,
        }
    }
}

#[derive(Template)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub chrome: Chrome,
    pub title: String,
    pub body: String,
    pub email: String,
}

#[derive(Template)]
#[template(path = "companies.html")]
pub struct CompaniesTemplate {
    pub chrome: Chrome,
    pub companies: Vec<CompanyCard>,
}

/// One numbered section of a company page: a title, a description, a
/// list of points, and its image strip.
#[derive(Debug, Clone)]
pub struct SectionView {
    pub title: String,
    pub summary: String,
    pub description: String,
    pub services: String,
    pub services_label: String,
    pub points: Vec<String>,
    pub images: Vec<ImageView>,
}

#[derive(Debug, Clone)]
pub struct ImageView {
    pub src: String,
    pub alt: String,
}

#[derive(Template)]
#[template(path = "company.html")]
pub struct CompanyTemplate {
    pub chrome: Chrome,
    pub slug: String,
    pub name: String,
    pub tagline: String,
    pub cover_src: String,
    pub cover_alt: String,
    pub sections: Vec<SectionView>,
    pub cta_heading: String,
    pub cta_description: String,
}

/// Point-list key per numbered section.
const SECTION_POINTS: [&str; 5] = ["", "expertisePoints", "benefits", "features", "highlights"];

impl CompanyTemplate {
    /// Assemble the page from the merged content and image documents.
    pub fn build(chrome: Chrome, slug: &str, content: &Value, images: &Value) -> Self {
        let sections = (1..=5)
            .map(|n| {
                let base = format!("section{n}");
                let points_key = SECTION_POINTS[n - 1];
                let points = if points_key.is_empty() {
                    Vec::new()
                } else {
                    string_list(content, &format!("{base}.{points_key}"))
                };
                SectionView {
                    title: text(content, &format!("{base}.title")),
                    summary: text(content, &format!("{base}.summary")),
                    description: text(content, &format!("{base}.description")),
                    services: text(content, &format!("{base}.services")),
                    services_label: text(content, &format!("{base}.servicesLabel")),
                    points,
                    images: section_images(images, n),
                }
            })
            .collect();

        Self {
            chrome,
            slug: slug.to_string(),
            name: text(content, "brandName"),
            tagline: text(content, "tagline"),
            cover_src: text(images, "coverSrc"),
            cover_alt: text(images, "coverAlt"),
            sections,
            cta_heading: text(content, "cta.heading"),
            cta_description: text(content, "cta.description"),
        }
    }
}

/// Pair `sectionNImages` with `sectionNAlts` by index, falling back to
/// the legacy single-image fields when the lists are empty.
fn section_images(images: &Value, n: usize) -> Vec<ImageView> {
    let srcs = string_list(images, &format!("section{n}Images"));
    let alts = string_list(images, &format!("section{n}Alts"));
    if !srcs.is_empty() {
        return srcs
            .into_iter()
            .enumerate()
            .map(|(i, src)| ImageView {
                src,
                alt: alts.get(i).cloned().unwrap_or_default(),
            })
            .collect();
    }

    let legacy = text(images, &format!("section{n}Src"));
    if legacy.is_empty() {
        Vec::new()
    } else {
        vec![ImageView {
            src: legacy,
            alt: text(images, &format!("section{n}Alt")),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chrome_pulls_nav_and_footer() {
        let website = json!({
            "meta": { "title": "meridian group", "description": "holding" },
            "header": {
                "brand": { "text": "meridian group" },
                "nav": [
                    { "title": "Home", "route": "/" },
                    { "title": "Contact", "route": "/contact" }
                ]
            }
        });
        let footer = json!({
            "columns": [
                { "title": "Visit", "items": [
                    { "type": "link", "label": "About", "route": "/about" },
                    { "type": "text", "value": "12 Harbor Lane" }
                ]}
            ],
            "bottom": { "legal": "All rights reserved." }
        });

        let chrome = Chrome::build(&website, &footer, false);
        assert_eq!(chrome.brand_text, "meridian group");
        assert_eq!(chrome.nav.len(), 2);
        assert_eq!(chrome.footer_columns[0].items[0].label, "About");
        assert_eq!(
            chrome.footer_columns[0].items[0].route.as_deref(),
            Some("/about")
        );
        assert_eq!(chrome.footer_columns[0].items[1].label, "12 Harbor Lane");
        assert_eq!(chrome.footer_columns[0].items[1].route, None);
        assert_eq!(chrome.footer_legal, "All rights reserved.");
    }

    #[test]
    fn section_images_prefer_lists_over_legacy_fields() {
        let images = json!({
            "section1Images": ["/uploads/a.jpg", "/uploads/b.jpg"],
            "section1Alts": ["first"],
            "section2Src": "/uploads/legacy.jpg",
            "section2Alt": "old"
        });
        let listed = section_images(&images, 1);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].alt, "first");
        assert_eq!(listed[1].alt, "");

        let legacy = section_images(&images, 2);
        assert_eq!(legacy.len(), 1);
        assert_eq!(legacy[0].src, "/uploads/legacy.jpg");
        assert_eq!(legacy[0].alt, "old");
    }

    #[test]
    fn company_page_reads_merged_overrides() {
        let base = json!({
            "brandName": "forkline",
            "section2": {
                "title": "What we bring",
                "expertisePoints": ["audits", "menus", "franchising"]
            }
        });
        let edits = json!({
            "section2": { "expertisePoints": { "1": "pricing" } }
        });
        let merged = vitrine_core::merge_content(&base, Some(&edits));
        let page = CompanyTemplate::build(
            Chrome::build(&json!({}), &json!({}), true),
            "forkline",
            &merged,
            &json!({ "coverSrc": "/uploads/cover.jpg" }),
        );
        assert_eq!(page.name, "forkline");
        assert_eq!(
            page.sections[1].points,
            vec!["audits", "pricing", "franchising"]
        );
        assert_eq!(page.cover_src, "/uploads/cover.jpg");
    }
}
