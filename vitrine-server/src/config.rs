use std::path::PathBuf;

use anyhow::Result;

use crate::cli::Cli;

/// Runtime configuration derived from CLI/env.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub data_dir: PathBuf,
    pub site_config: Option<PathBuf>,
    pub db_path: PathBuf,
    pub session: SessionConfig,
    pub email: EmailConfig,
    pub upload_limit: usize,
    pub seed_admin: Option<SeedAdmin>,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: Option<String>,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub to: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl ServerConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let data_dir = if cli.data_dir.is_relative() {
            std::env::current_dir()?.join(&cli.data_dir)
        } else {
            cli.data_dir.clone()
        };

        let db_path = cli
            .db_path
            .clone()
            .unwrap_or_else(|| data_dir.join("vitrine.db"));

        let seed_admin = match (&cli.seed_admin_email, &cli.seed_admin_password) {
            (Some(email), Some(password)) => Some(SeedAdmin {
                email: email.clone(),
                password: password.clone(),
                name: cli.seed_admin_name.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            listen_addr: cli.listen_addr.clone(),
            data_dir,
            site_config: cli.site_config.clone(),
            db_path,
            session: SessionConfig {
                secret: cli.session_secret.clone(),
                ttl_secs: cli.session_ttl_secs,
            },
            email: EmailConfig {
                api_key: cli.email_api_key.clone(),
                endpoint: cli.email_endpoint.clone(),
                to: cli.contact_to.clone(),
                from: cli.contact_from.clone(),
            },
            upload_limit: cli.upload_limit,
            seed_admin,
        })
    }

    /// Root of the document store.
    pub fn content_dir(&self) -> PathBuf {
        self.data_dir.join("content")
    }

    /// Where processed uploads are written and served from.
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
}
