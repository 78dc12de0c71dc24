//! End-to-end content flow: admin writes land in the file store, the hub
//! refetches, and merged views show the edit layered on the base
//! configuration.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use vitrine_core::content::to_array;
use vitrine_core::path::ContentPath;
use vitrine_core::SiteConfig;
use vitrine_store::{ContentHub, DocumentStore, EditableField, FsStore, HubWriter, WriteTarget};

async fn hub_fixture() -> (tempfile::TempDir, Arc<FsStore>, Arc<ContentHub>) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsStore::new(dir.path()));
    let config = Arc::new(SiteConfig::builtin().unwrap());
    let hub = ContentHub::load(store.clone() as Arc<dyn DocumentStore>, config).await;
    (dir, store, hub)
}

#[tokio::test]
async fn empty_store_serves_base_configuration() {
    let (_dir, _store, hub) = hub_fixture().await;
    assert!(!hub.is_loading());

    let merged = hub.merged_company_content("forkline").await.unwrap();
    assert_eq!(merged["brandName"], "forkline");
    assert!(hub.merged_company_content("unknown").await.is_none());

    let website = hub.merged_website().await;
    assert_eq!(website["header"]["brand"]["text"], "meridian group");
}

#[tokio::test]
async fn committed_write_becomes_visible_after_refetch() {
    let (_dir, _store, hub) = hub_fixture().await;

    hub.update_company_text("forkline", "section2.expertisePoints.1", json!("edited point"))
        .await
        .unwrap();
    hub.refresh().await.unwrap();

    let merged = hub.merged_company_content("forkline").await.unwrap();
    // The stored override is a numeric-keyed mapping; the merged view is
    // a proper array with only index 1 replaced.
    let points = to_array(ContentPath::parse("section2.expertisePoints").get(&merged));
    assert_eq!(points[1], json!("edited point"));
    assert_ne!(points[0], json!("edited point"));
}

#[tokio::test]
async fn refresh_task_picks_up_store_events() {
    let (_dir, _store, hub) = hub_fixture().await;
    let task = hub.spawn_refresh();
    let mut changes = hub.subscribe_changes();
    let before = hub.revision().await;

    hub.update_website_text("home.hero.heading", json!("New heading"))
        .await
        .unwrap();

    let revision = tokio::time::timeout(Duration::from_secs(5), changes.recv())
        .await
        .expect("refetch within timeout")
        .expect("change channel open");
    assert!(revision > before);

    let website = hub.merged_website().await;
    assert_eq!(website["home"]["hero"]["heading"], "New heading");
    task.abort();
}

#[tokio::test]
async fn section_images_route_to_fragment_documents() {
    let (_dir, store, hub) = hub_fixture().await;

    hub.update_company_section_images(
        "voltaic",
        3,
        vec!["/u/a.jpg".into(), "/u/b.jpg".into()],
        vec!["first".into(), "second".into()],
    )
    .await
    .unwrap();

    // Stored as its own fragment document, not in the main images doc.
    let fragment = store
        .get("company_images", "voltaic_section3")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fragment["section3Images"], json!(["/u/a.jpg", "/u/b.jpg"]));
    assert!(store
        .get("company_images", "voltaic")
        .await
        .unwrap()
        .is_none());

    // The assembled snapshot folds the fragment under its slug.
    hub.refresh().await.unwrap();
    let merged = hub.merged_company_images("voltaic").await.unwrap();
    assert_eq!(merged["section3Alts"], json!(["first", "second"]));
}

#[tokio::test]
async fn footer_updates_rewrite_arrays_in_place() {
    let (_dir, store, hub) = hub_fixture().await;

    hub.update_footer_text("columns.0.title", json!("The group"))
        .await
        .unwrap();

    let doc = store.get("footer_content", "main").await.unwrap().unwrap();
    // Whole-document write preserves native array typing.
    assert!(doc["columns"].is_array());
    assert_eq!(doc["columns"][0]["title"], "The group");

    // Strict addressing: out-of-range index fails and writes nothing.
    let err = hub
        .update_footer_text("columns.9.title", json!("nope"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("out of bounds"));
}

#[tokio::test]
async fn editable_field_commit_lands_in_the_store() {
    let (_dir, store, hub) = hub_fixture().await;
    let writer = HubWriter::new(hub.clone(), WriteTarget::CompanyText("forkline".into()));

    let mut field = EditableField::new("tagline", json!("Brand architecture for restaurants"), true);
    assert!(field.begin_edit());
    field.set_pending(json!("Brands that move covers"));
    field.commit(&writer).await.unwrap();

    let doc = store
        .get("company_content", "forkline")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doc["tagline"], "Brands that move covers");

    hub.refresh().await.unwrap();
    let merged = hub.merged_company_content("forkline").await.unwrap();
    assert_eq!(merged["tagline"], "Brands that move covers");
    // Untouched fields still come from the base tree.
    assert_eq!(merged["brandName"], "forkline");
}

#[tokio::test]
async fn failed_refetch_keeps_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsStore::new(dir.path()));
    let config = Arc::new(SiteConfig::builtin().unwrap());
    let hub = ContentHub::load(store.clone() as Arc<dyn DocumentStore>, config).await;

    hub.update_website_text("home.hero.heading", json!("Kept"))
        .await
        .unwrap();
    hub.refresh().await.unwrap();

    // Corrupt the stored document so the next refetch fails to parse.
    std::fs::write(
        dir.path().join("website_content").join("main.json"),
        b"{ not json",
    )
    .unwrap();
    assert!(hub.refresh().await.is_err());

    let website = hub.merged_website().await;
    assert_eq!(website["home"]["hero"]["heading"], "Kept");
}
