//! In-memory content state over the document store.
//!
//! The hub fetches every content collection up front, folds fragment
//! documents into their owning slug, and replaces the whole snapshot on
//! any change notification. No incremental patching: at this content
//! scale a full refetch is simpler than reconciling per-document deltas,
//! and a failed refetch keeps the previous snapshot instead of blanking
//! the site.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

use vitrine_core::content::merge_content;
use vitrine_core::path::ContentPath;
use vitrine_core::SiteConfig;

use crate::store::{collections, DocumentStore, StoreError};

/// Image fragment documents are keyed `{slug}_section{N}` to stay under
/// the store's per-document size ceiling.
static FRAGMENT_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+)_section(\d+)$").expect("fragment id pattern is valid")
});

/// One fetched-and-assembled view of every content collection.
#[derive(Debug, Clone, Default)]
pub struct ContentSnapshot {
    pub company_content: HashMap<String, Value>,
    pub company_images: HashMap<String, Value>,
    pub website_content: Option<Value>,
    pub website_images: Option<Value>,
    pub footer_content: Option<Value>,
    pub revision: u64,
}

pub struct ContentHub {
    store: Arc<dyn DocumentStore>,
    config: Arc<SiteConfig>,
    state: RwLock<ContentSnapshot>,
    changed: broadcast::Sender<u64>,
    loading: AtomicBool,
}

impl ContentHub {
    /// Fetch the initial snapshot. A failed fetch degrades to the base
    /// configuration rather than refusing to start.
    pub async fn load(store: Arc<dyn DocumentStore>, config: Arc<SiteConfig>) -> Arc<Self> {
        let (changed, _) = broadcast::channel(16);
        let hub = Arc::new(Self {
            store,
            config,
            state: RwLock::new(ContentSnapshot::default()),
            changed,
            loading: AtomicBool::new(true),
        });
        if let Err(err) = hub.refresh().await {
            warn!(?err, "initial content fetch failed; serving base configuration only");
        }
        hub.loading.store(false, Ordering::Relaxed);
        hub
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Relaxed)
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Listen for store change events and refetch the whole snapshot on
    /// each one. Lagged receivers refetch too; a refetch is idempotent.
    pub fn spawn_refresh(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let hub = Arc::clone(self);
        let mut events = hub.store.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        debug!(collection = %event.collection, doc = %event.doc, "store changed");
                        if let Err(err) = hub.refresh().await {
                            warn!(?err, "content refetch failed; keeping previous snapshot");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        if let Err(err) = hub.refresh().await {
                            warn!(?err, "content refetch failed; keeping previous snapshot");
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Refetch everything and replace the snapshot.
    pub async fn refresh(&self) -> Result<u64, StoreError> {
        let mut fetched = self.fetch_all().await?;
        let mut state = self.state.write().await;
        fetched.revision = state.revision + 1;
        *state = fetched;
        let revision = state.revision;
        drop(state);
        let _ = self.changed.send(revision);
        Ok(revision)
    }

    async fn fetch_all(&self) -> Result<ContentSnapshot, StoreError> {
        let (company_content, raw_images, website_content, website_images, footer_content) =
            tokio::try_join!(
                self.store.list(collections::COMPANY_CONTENT),
                self.store.list(collections::COMPANY_IMAGES),
                self.store
                    .get(collections::WEBSITE_CONTENT, collections::MAIN_DOC),
                self.store
                    .get(collections::WEBSITE_IMAGES, collections::MAIN_DOC),
                self.store
                    .get(collections::FOOTER_CONTENT, collections::MAIN_DOC),
            )?;

        Ok(ContentSnapshot {
            company_content: company_content.into_iter().collect(),
            company_images: assemble_company_images(raw_images),
            website_content,
            website_images,
            footer_content,
            revision: 0,
        })
    }

    pub async fn snapshot(&self) -> ContentSnapshot {
        self.state.read().await.clone()
    }

    pub async fn revision(&self) -> u64 {
        self.state.read().await.revision
    }

    /// Notifications carrying the revision of each replaced snapshot.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<u64> {
        self.changed.subscribe()
    }

    // ── Merged views ────────────────────────────────────────────────────

    pub async fn merged_company_content(&self, slug: &str) -> Option<Value> {
        let base = self.config.company_content_base(slug)?;
        let state = self.state.read().await;
        Some(merge_content(&base, state.company_content.get(slug)))
    }

    pub async fn merged_company_images(&self, slug: &str) -> Option<Value> {
        let base = self.config.company_images_base(slug)?;
        let state = self.state.read().await;
        Some(merge_content(&base, state.company_images.get(slug)))
    }

    pub async fn merged_website(&self) -> Value {
        let base = self.config.website_base();
        let state = self.state.read().await;
        merge_content(&base, state.website_content.as_ref())
    }

    /// Site-wide image overrides have no typed base; the empty mapping
    /// makes merge yield exactly what was stored.
    pub async fn merged_website_images(&self) -> Value {
        let state = self.state.read().await;
        merge_content(&Value::Object(Map::new()), state.website_images.as_ref())
    }

    pub async fn merged_footer(&self) -> Value {
        let base = self.config.footer_base();
        let state = self.state.read().await;
        merge_content(&base, state.footer_content.as_ref())
    }

    // ── Writers ─────────────────────────────────────────────────────────

    pub async fn update_company_text(
        &self,
        slug: &str,
        path: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.known_company(slug, collections::COMPANY_CONTENT)?;
        self.store
            .update_fields(
                collections::COMPANY_CONTENT,
                slug,
                &[(path.to_string(), value)],
            )
            .await
    }

    pub async fn update_company_image(
        &self,
        slug: &str,
        path: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.known_company(slug, collections::COMPANY_IMAGES)?;
        self.store
            .update_fields(
                collections::COMPANY_IMAGES,
                slug,
                &[(path.to_string(), value)],
            )
            .await
    }

    /// Section slideshows go to a fragment document per section so no
    /// single document outgrows the store's size ceiling.
    pub async fn update_company_section_images(
        &self,
        slug: &str,
        section: u8,
        images: Vec<String>,
        alts: Vec<String>,
    ) -> Result<(), StoreError> {
        self.known_company(slug, collections::COMPANY_IMAGES)?;
        let fragment = format!("{slug}_section{section}");
        self.store
            .update_fields(
                collections::COMPANY_IMAGES,
                &fragment,
                &[
                    (format!("section{section}Images"), json!(images)),
                    (format!("section{section}Alts"), json!(alts)),
                ],
            )
            .await
    }

    pub async fn update_website_text(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.store
            .update_fields(
                collections::WEBSITE_CONTENT,
                collections::MAIN_DOC,
                &[(path.to_string(), value)],
            )
            .await
    }

    pub async fn update_website_image(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.store
            .update_fields(
                collections::WEBSITE_IMAGES,
                collections::MAIN_DOC,
                &[(path.to_string(), value)],
            )
            .await
    }

    /// Footer updates rewrite the whole document so its arrays keep their
    /// native typing. The write is strict: an out-of-range index or
    /// unknown key fails without touching the document.
    pub async fn update_footer_text(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let mut current = self
            .store
            .get(collections::FOOTER_CONTENT, collections::MAIN_DOC)
            .await?
            .unwrap_or_else(|| self.config.footer_base());
        ContentPath::parse(path).set_strict(&mut current, value)?;
        self.store
            .put(collections::FOOTER_CONTENT, collections::MAIN_DOC, current)
            .await
    }

    fn known_company(&self, slug: &str, collection: &str) -> Result<(), StoreError> {
        if self.config.company(slug).is_some() {
            Ok(())
        } else {
            Err(StoreError::MissingDocument {
                collection: collection.to_string(),
                doc: slug.to_string(),
            })
        }
    }
}

/// Fold `{slug}_section{N}` fragments into their owning slug; fragment
/// fields win over the main document's, and a fragment without a main
/// document still surfaces.
fn assemble_company_images(raw: Vec<(String, Value)>) -> HashMap<String, Value> {
    let mut main: HashMap<String, Value> = HashMap::new();
    let mut fragments: Vec<(String, Value)> = Vec::new();

    for (id, value) in raw {
        match FRAGMENT_ID.captures(&id) {
            Some(caps) => fragments.push((caps[1].to_string(), value)),
            None => {
                main.insert(id, value);
            }
        }
    }

    for (slug, fragment) in fragments {
        let Value::Object(fields) = fragment else {
            continue;
        };
        let target = main
            .entry(slug)
            .or_insert_with(|| Value::Object(Map::new()));
        if !target.is_object() {
            *target = Value::Object(Map::new());
        }
        if let Some(map) = target.as_object_mut() {
            for (key, value) in fields {
                map.insert(key, value);
            }
        }
    }

    main
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_fold_into_their_slug() {
        let raw = vec![
            ("forkline".to_string(), json!({"coverSrc": "/c.jpg", "section2Images": ["old"]})),
            ("forkline_section2".to_string(), json!({"section2Images": ["new-a", "new-b"]})),
            ("voltaic_section1".to_string(), json!({"section1Images": ["only-frag"]})),
        ];
        let assembled = assemble_company_images(raw);

        let forkline = &assembled["forkline"];
        assert_eq!(forkline["coverSrc"], "/c.jpg");
        assert_eq!(forkline["section2Images"], json!(["new-a", "new-b"]));

        // Fragment without a main document still surfaces.
        assert_eq!(assembled["voltaic"]["section1Images"], json!(["only-frag"]));
    }

    #[test]
    fn non_fragment_ids_pass_through() {
        let raw = vec![("meridian-studio".to_string(), json!({"coverSrc": "/m.jpg"}))];
        let assembled = assemble_company_images(raw);
        assert_eq!(assembled.len(), 1);
        assert_eq!(assembled["meridian-studio"]["coverSrc"], "/m.jpg");
    }
}
