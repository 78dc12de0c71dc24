use std::path::PathBuf;

use clap::Parser;

/// CLI for the vitrine site server. Everything is overridable via
/// environment so deployments configure it without flags.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "vitrine-server",
    about = "Marketing site + admin inline-editing server for the vitrine brand group"
)]
pub struct Cli {
    /// Listen address for HTTP/WS endpoints
    #[arg(long, env = "VITRINE_ADDR", default_value = "127.0.0.1:8780")]
    pub listen_addr: String,

    /// Directory holding the content document store and uploaded assets
    #[arg(long, env = "VITRINE_DATA_DIR", default_value = ".vitrine")]
    pub data_dir: PathBuf,

    /// Optional site configuration file (YAML); defaults to the built-in tree
    #[arg(long, env = "VITRINE_SITE_CONFIG")]
    pub site_config: Option<PathBuf>,

    /// SQLite database probed by the health endpoint
    #[arg(long, env = "VITRINE_DB")]
    pub db_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,

    // ─────────────────────────────────────────────────────────────────────
    // Session options
    // ─────────────────────────────────────────────────────────────────────

    /// Secret for signing admin session tokens (HS256). If not set, admin
    /// sign-in is disabled and the site is read-only.
    #[arg(long, env = "VITRINE_SESSION_SECRET", hide_env_values = true)]
    pub session_secret: Option<String>,

    /// Admin session lifetime in seconds
    #[arg(long, env = "VITRINE_SESSION_TTL_SECS", default_value = "43200")]
    pub session_ttl_secs: u64,

    /// Seed an admin registry entry at startup: email for the account
    #[arg(long, env = "VITRINE_SEED_ADMIN_EMAIL")]
    pub seed_admin_email: Option<String>,

    /// Password for the seeded admin account
    #[arg(long, env = "VITRINE_SEED_ADMIN_PASSWORD", hide_env_values = true)]
    pub seed_admin_password: Option<String>,

    /// Display name for the seeded admin account
    #[arg(long, env = "VITRINE_SEED_ADMIN_NAME", default_value = "Admin")]
    pub seed_admin_name: String,

    // ─────────────────────────────────────────────────────────────────────
    // Contact form options
    // ─────────────────────────────────────────────────────────────────────

    /// API key for the transactional email provider. If not set, contact
    /// submissions are logged instead of sent.
    #[arg(long, env = "VITRINE_EMAIL_API_KEY", hide_env_values = true)]
    pub email_api_key: Option<String>,

    /// Email provider endpoint (Resend-compatible JSON API)
    #[arg(
        long,
        env = "VITRINE_EMAIL_ENDPOINT",
        default_value = "https://api.resend.com/emails"
    )]
    pub email_endpoint: String,

    /// Recipient of contact form submissions
    #[arg(long, env = "VITRINE_CONTACT_TO", default_value = "hello@meridian.example")]
    pub contact_to: String,

    /// Sender shown on contact form emails
    #[arg(
        long,
        env = "VITRINE_CONTACT_FROM",
        default_value = "Contact Form <noreply@meridian.example>"
    )]
    pub contact_from: String,

    // ─────────────────────────────────────────────────────────────────────
    // Upload options
    // ─────────────────────────────────────────────────────────────────────

    /// Maximum stored size per processed image, in bytes (the store's
    /// per-document ceiling)
    #[arg(long, env = "VITRINE_UPLOAD_LIMIT", default_value = "1048576")]
    pub upload_limit: usize,
}
