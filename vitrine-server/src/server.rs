//! HTTP server: page rendering, the content API, and admin editing.
//!
//! Pages are rendered server-side from the merged content trees. The
//! editing API is gated on an admin session; every successful write goes
//! to the document store and then refreshes the in-memory snapshot, so
//! the write is visible to the next read and broadcast to websocket
//! subscribers.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        DefaultBodyLimit, Path, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post, put},
    Extension, Json, Router,
};
use axum_extra::extract::Multipart;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use vitrine_core::SiteConfig;
use vitrine_store::{
    prepare_image, ContentHub, DocumentStore, FsStore, ImagePrepError, StoreError,
};

use crate::{
    auth::{self, AuthState, MaybeAdmin, RequireAdmin},
    config::ServerConfig,
    contact::{self, ContactRequest, HttpMailer, LogMailer, Mailer},
    health,
    render::{
        AboutTemplate, Chrome, CompaniesTemplate, CompanyCard, CompanyTemplate, ContactTemplate,
        HomeTemplate, ServicesTemplate, text,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub site: Arc<SiteConfig>,
    pub hub: Arc<ContentHub>,
    pub mailer: Arc<dyn Mailer>,
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let config = Arc::new(config);
    let site = Arc::new(match &config.site_config {
        Some(path) => SiteConfig::from_file(path)?,
        None => SiteConfig::builtin()?,
    });

    let store: Arc<dyn DocumentStore> = Arc::new(FsStore::new(config.content_dir()));
    tokio::fs::create_dir_all(config.uploads_dir()).await?;

    if let Some(seed) = &config.seed_admin {
        auth::seed_admin(store.as_ref(), &seed.email, &seed.password, &seed.name).await?;
        info!(email = %seed.email, "seeded admin registry entry");
    }

    let auth_state = AuthState::new(config.session.secret.as_deref(), config.session.ttl_secs);
    if !auth_state.enabled() {
        warn!("no session secret configured; serving read-only");
    }

    let mailer: Arc<dyn Mailer> = match &config.email.api_key {
        Some(key) => Arc::new(HttpMailer::new(&config.email, key.clone())),
        None => Arc::new(LogMailer),
    };

    let hub = ContentHub::load(store, site.clone()).await;
    hub.spawn_refresh();

    let state = AppState {
        config: config.clone(),
        site,
        hub,
        mailer,
    };
    let app = build_router(state, auth_state);

    info!(addr = %config.listen_addr, "vitrine listening");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState, auth_state: AuthState) -> Router {
    let uploads = ServeDir::new(state.config.uploads_dir());

    Router::new()
        // Pages
        .route("/", get(home_page))
        .route("/about", get(about_page))
        .route("/services", get(services_page))
        .route("/contact", get(contact_page))
        .route("/companies", get(companies_page))
        .route("/companies/{slug}", get(company_page))
        // Public API
        .route("/healthz", get(healthz))
        .route("/api/health", get(api_health))
        .route("/api/content", get(get_content))
        .route("/api/content/ws", get(content_ws))
        .route("/api/contact", post(submit_contact))
        .route("/api/auth/login", post(login))
        // Editing API (admin session required)
        .route("/api/content/companies/{slug}/text", put(put_company_text))
        .route("/api/content/companies/{slug}/image", put(put_company_image))
        .route(
            "/api/content/companies/{slug}/sections/{section}/images",
            put(put_section_images),
        )
        .route("/api/content/website/text", put(put_website_text))
        .route("/api/content/website/image", put(put_website_image))
        .route("/api/content/footer", put(put_footer_text))
        .route("/api/upload", post(upload_image))
        // Static assets compiled into the binary
        .route("/assets/site.css", get(site_css))
        .route("/assets/edit.js", get(edit_js))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(8 * 1024 * 1024))
        .layer(Extension(auth_state))
        .with_state(state)
}

async fn site_css() -> impl IntoResponse {
    (
        [(axum::http::header::CONTENT_TYPE, "text/css")],
        include_str!("../assets/site.css"),
    )
}

async fn edit_js() -> impl IntoResponse {
    (
        [(axum::http::header::CONTENT_TYPE, "application/javascript")],
        include_str!("../assets/edit.js"),
    )
}

// ───────────────────────── pages ─────────────────────────

fn render_page<T: askama::Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            error!("template render failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "render error").into_response()
        }
    }
}

async fn chrome(state: &AppState, is_admin: bool) -> (Chrome, Value) {
    let website = state.hub.merged_website().await;
    let footer = state.hub.merged_footer().await;
    (Chrome::build(&website, &footer, is_admin), website)
}

async fn company_cards(state: &AppState) -> Vec<CompanyCard> {
    let mut cards = Vec::new();
    for slug in state.site.company_slugs() {
        let content = state.hub.merged_company_content(slug).await;
        let images = state.hub.merged_company_images(slug).await;
        if let (Some(content), Some(images)) = (content, images) {
            cards.push(CompanyCard::build(slug, &content, &images));
        }
    }
    cards
}

async fn home_page(
    State(state): State<AppState>,
    MaybeAdmin(claims): MaybeAdmin,
) -> Response {
    let (chrome, website) = chrome(&state, claims.is_some()).await;
    let companies = company_cards(&state).await;
    render_page(HomeTemplate::build(chrome, &website, companies))
}

async fn about_page(
    State(state): State<AppState>,
    MaybeAdmin(claims): MaybeAdmin,
) -> Response {
    let (chrome, website) = chrome(&state, claims.is_some()).await;
    render_page(AboutTemplate {
        chrome,
        title: text(&website, "about.title"),
        body: text(&website, "about.body"),
    })
}

async fn services_page(
    State(state): State<AppState>,
    MaybeAdmin(claims): MaybeAdmin,
) -> Response {
    let (chrome, website) = chrome(&state, claims.is_some()).await;
    render_page(ServicesTemplate::build(chrome, &website))
}

async fn contact_page(
    State(state): State<AppState>,
    MaybeAdmin(claims): MaybeAdmin,
) -> Response {
    let (chrome, website) = chrome(&state, claims.is_some()).await;
    render_page(ContactTemplate {
        chrome,
        title: text(&website, "contact.title"),
        body: text(&website, "contact.body"),
        email: text(&website, "contact.email"),
    })
}

async fn companies_page(
    State(state): State<AppState>,
    MaybeAdmin(claims): MaybeAdmin,
) -> Response {
    let (chrome, _) = chrome(&state, claims.is_some()).await;
    let companies = company_cards(&state).await;
    render_page(CompaniesTemplate { chrome, companies })
}

async fn company_page(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    MaybeAdmin(claims): MaybeAdmin,
) -> Response {
    let (Some(content), Some(images)) = (
        state.hub.merged_company_content(&slug).await,
        state.hub.merged_company_images(&slug).await,
    ) else {
        return (StatusCode::NOT_FOUND, "no such company").into_response();
    };
    let (chrome, _) = chrome(&state, claims.is_some()).await;
    render_page(CompanyTemplate::build(chrome, &slug, &content, &images))
}

// ──────────────────────── public API ────────────────────────

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn api_health(State(state): State<AppState>) -> impl IntoResponse {
    health::report(state.config.db_path.clone()).await
}

/// The merged content for every collection, as the pages see it.
async fn get_content(State(state): State<AppState>) -> impl IntoResponse {
    let mut companies = serde_json::Map::new();
    for slug in state.site.company_slugs() {
        let content = state.hub.merged_company_content(slug).await;
        let images = state.hub.merged_company_images(slug).await;
        if let (Some(content), Some(images)) = (content, images) {
            companies.insert(
                slug.to_string(),
                json!({ "content": content, "images": images }),
            );
        }
    }

    Json(json!({
        "revision": state.hub.revision().await,
        "website": state.hub.merged_website().await,
        "websiteImages": state.hub.merged_website_images().await,
        "footer": state.hub.merged_footer().await,
        "companies": companies,
    }))
}

async fn submit_contact(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> impl IntoResponse {
    contact::submit(state.mailer.as_ref(), request).await
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Extension(auth_state): Extension<AuthState>,
    Json(request): Json<LoginRequest>,
) -> Response {
    match auth::sign_in(
        state.hub.store(),
        &auth_state,
        &request.email,
        &request.password,
    )
    .await
    {
        Ok(token) => Json(json!({ "token": token })).into_response(),
        Err(err) => err.into_response(),
    }
}

// ──────────────────────── editing API ────────────────────────

#[derive(Deserialize)]
struct FieldUpdate {
    path: String,
    value: Value,
}

#[derive(Deserialize)]
struct SectionImagesUpdate {
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    alts: Vec<String>,
}

fn store_error_response(err: StoreError) -> Response {
    let status = match &err {
        StoreError::MissingDocument { .. } => StatusCode::NOT_FOUND,
        StoreError::InvalidName(_) | StoreError::Path(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("store write failed: {err}");
    }
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

/// Refresh the snapshot after a write so the change is visible to the
/// next read and pushed to websocket subscribers.
async fn committed(state: &AppState) -> Response {
    if let Err(err) = state.hub.refresh().await {
        warn!("snapshot refresh after write failed: {err}");
    }
    Json(json!({ "success": true })).into_response()
}

async fn put_company_text(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    RequireAdmin(_claims): RequireAdmin,
    Json(update): Json<FieldUpdate>,
) -> Response {
    match state
        .hub
        .update_company_text(&slug, &update.path, update.value)
        .await
    {
        Ok(()) => committed(&state).await,
        Err(err) => store_error_response(err),
    }
}

async fn put_company_image(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    RequireAdmin(_claims): RequireAdmin,
    Json(update): Json<FieldUpdate>,
) -> Response {
    match state
        .hub
        .update_company_image(&slug, &update.path, update.value)
        .await
    {
        Ok(()) => committed(&state).await,
        Err(err) => store_error_response(err),
    }
}

async fn put_section_images(
    Path((slug, section)): Path<(String, u8)>,
    State(state): State<AppState>,
    RequireAdmin(_claims): RequireAdmin,
    Json(update): Json<SectionImagesUpdate>,
) -> Response {
    if !(1..=5).contains(&section) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "section out of range" })),
        )
            .into_response();
    }
    match state
        .hub
        .update_company_section_images(&slug, section, update.images, update.alts)
        .await
    {
        Ok(()) => committed(&state).await,
        Err(err) => store_error_response(err),
    }
}

async fn put_website_text(
    State(state): State<AppState>,
    RequireAdmin(_claims): RequireAdmin,
    Json(update): Json<FieldUpdate>,
) -> Response {
    match state.hub.update_website_text(&update.path, update.value).await {
        Ok(()) => committed(&state).await,
        Err(err) => store_error_response(err),
    }
}

async fn put_website_image(
    State(state): State<AppState>,
    RequireAdmin(_claims): RequireAdmin,
    Json(update): Json<FieldUpdate>,
) -> Response {
    match state.hub.update_website_image(&update.path, update.value).await {
        Ok(()) => committed(&state).await,
        Err(err) => store_error_response(err),
    }
}

async fn put_footer_text(
    State(state): State<AppState>,
    RequireAdmin(_claims): RequireAdmin,
    Json(update): Json<FieldUpdate>,
) -> Response {
    match state.hub.update_footer_text(&update.path, update.value).await {
        Ok(()) => committed(&state).await,
        Err(err) => store_error_response(err),
    }
}

// ──────────────────────── image upload ────────────────────────

async fn upload_image(
    State(state): State<AppState>,
    RequireAdmin(_claims): RequireAdmin,
    mut multipart: Multipart,
) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(err) => {
                warn!("failed to read upload: {err}");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "failed to read file data" })),
                )
                    .into_response();
            }
        };

        let jpeg = match prepare_image(&data, state.config.upload_limit) {
            Ok(jpeg) => jpeg,
            Err(ImagePrepError::TooLarge { limit }) => {
                return (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    Json(json!({ "error": "image too large", "limit": limit })),
                )
                    .into_response();
            }
            Err(err) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": err.to_string() })),
                )
                    .into_response();
            }
        };

        let filename = format!("{}.jpg", uuid::Uuid::new_v4());
        let path = state.config.uploads_dir().join(&filename);
        if let Err(err) = tokio::fs::write(&path, &jpeg).await {
            error!("failed to write upload: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to store file" })),
            )
                .into_response();
        }

        info!(file = %filename, size = jpeg.len(), "image uploaded");
        return Json(json!({ "url": format!("/uploads/{filename}") })).into_response();
    }

    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "no file field in request" })),
    )
        .into_response()
}

// ──────────────────────── change notifications ────────────────────────

async fn content_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(err) = handle_ws(socket, state).await {
            warn!("websocket session ended with error: {err}");
        }
    })
}

/// Push the current revision on connect, then a new revision each time
/// the snapshot refreshes. The client refetches `/api/content` when the
/// number moves.
async fn handle_ws(mut socket: WebSocket, state: AppState) -> Result<()> {
    let mut changes = state.hub.subscribe_changes();
    let revision = state.hub.revision().await;
    send_revision(&mut socket, revision).await?;

    loop {
        tokio::select! {
            change = changes.recv() => match change {
                Ok(revision) => send_revision(&mut socket, revision).await?,
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    let revision = state.hub.revision().await;
                    send_revision(&mut socket, revision).await?;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
            },
        }
    }
    Ok(())
}

async fn send_revision(socket: &mut WebSocket, revision: u64) -> Result<()> {
    let payload = json!({ "revision": revision }).to_string();
    socket.send(WsMessage::Text(payload.into())).await?;
    Ok(())
}
