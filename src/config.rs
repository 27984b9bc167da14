use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ai::DEFAULT_GEMINI_MODEL;
use crate::mail::{Address, MailSettings};
use crate::rate_limit::RateLimitConfig;

const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8080";
const DEFAULT_BASE_URL: &str = "https://www.precisiongauges.in";
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_CONTACT_RATE_LIMIT: u32 = 5;
const DEFAULT_CONTACT_RATE_WINDOW_SECS: u64 = 3600;
const DEFAULT_SITEMAP_REVALIDATE_SECS: u64 = 3600;
const DEFAULT_MAIL_SENDER: &str = "website@precisiongauges.in";
const DEFAULT_MAIL_SENDER_NAME: &str = "Precision Gauges Website";
const DEFAULT_MAIL_RECIPIENT: &str = "sales@precisiongauges.in";
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;
const POSTS_FILE: &str = "posts.json";

#[derive(Clone)]
pub struct ServerConfig {
    pub http_bind_address: SocketAddr,
    /// Canonical site origin without a trailing slash
    pub base_url: String,
    pub data_dir: PathBuf,
    pub contact_rate_limit: u32,
    pub contact_rate_window_secs: u64,
    pub sitemap_revalidate_secs: u64,
    /// Admin API is disabled when absent
    pub admin_token: Option<String>,
    pub brevo_api_key: Option<String>,
    pub mail_sender: String,
    pub mail_sender_name: String,
    pub mail_recipient: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub graceful_shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_bind_address: default_bind(),
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            contact_rate_limit: DEFAULT_CONTACT_RATE_LIMIT,
            contact_rate_window_secs: DEFAULT_CONTACT_RATE_WINDOW_SECS,
            sitemap_revalidate_secs: DEFAULT_SITEMAP_REVALIDATE_SECS,
            admin_token: None,
            brevo_api_key: None,
            mail_sender: DEFAULT_MAIL_SENDER.to_string(),
            mail_sender_name: DEFAULT_MAIL_SENDER_NAME.to_string(),
            mail_recipient: DEFAULT_MAIL_RECIPIENT.to_string(),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            graceful_shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        }
    }
}

// Secrets are reported as present or absent only.
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_bind_address", &self.http_bind_address)
            .field("base_url", &self.base_url)
            .field("data_dir", &self.data_dir)
            .field("contact_rate_limit", &self.contact_rate_limit)
            .field("contact_rate_window_secs", &self.contact_rate_window_secs)
            .field("sitemap_revalidate_secs", &self.sitemap_revalidate_secs)
            .field("admin_token", &redacted(&self.admin_token))
            .field("brevo_api_key", &redacted(&self.brevo_api_key))
            .field("mail_sender", &self.mail_sender)
            .field("mail_recipient", &self.mail_recipient)
            .field("gemini_api_key", &redacted(&self.gemini_api_key))
            .field("gemini_model", &self.gemini_model)
            .field(
                "graceful_shutdown_timeout_secs",
                &self.graceful_shutdown_timeout_secs,
            )
            .finish()
    }
}

fn redacted(secret: &Option<String>) -> &'static str {
    if secret.is_some() { "<set>" } else { "<unset>" }
}

fn default_bind() -> SocketAddr {
    DEFAULT_HTTP_BIND
        .parse()
        .expect("default bind address valid")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ServerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            http_bind: cli_http_bind,
            base_url: cli_base_url,
            data_dir: cli_data_dir,
            contact_rate_limit: cli_contact_rate_limit,
            contact_rate_window_secs: cli_contact_rate_window_secs,
            sitemap_revalidate_secs: cli_sitemap_revalidate_secs,
            admin_token: cli_admin_token,
            brevo_api_key: cli_brevo_api_key,
            mail_sender: cli_mail_sender,
            mail_recipient: cli_mail_recipient,
            gemini_api_key: cli_gemini_api_key,
            gemini_model: cli_gemini_model,
            graceful_shutdown_timeout_secs: cli_shutdown_timeout,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            http_bind: file_http_bind,
            base_url: file_base_url,
            data_dir: file_data_dir,
            contact_rate_limit: file_contact_rate_limit,
            contact_rate_window_secs: file_contact_rate_window_secs,
            sitemap_revalidate_secs: file_sitemap_revalidate_secs,
            admin_token: file_admin_token,
            brevo_api_key: file_brevo_api_key,
            mail_sender: file_mail_sender,
            mail_sender_name: file_mail_sender_name,
            mail_recipient: file_mail_recipient,
            gemini_api_key: file_gemini_api_key,
            gemini_model: file_gemini_model,
            graceful_shutdown_timeout_secs: file_shutdown_timeout,
        } = file_config;

        let defaults = Self::default();
        let base_url = cli_base_url
            .or(file_base_url)
            .unwrap_or(defaults.base_url)
            .trim()
            .trim_end_matches('/')
            .to_string();

        let config = Self {
            http_bind_address: cli_http_bind
                .or(file_http_bind)
                .unwrap_or(defaults.http_bind_address),
            base_url,
            data_dir: cli_data_dir.or(file_data_dir).unwrap_or(defaults.data_dir),
            contact_rate_limit: cli_contact_rate_limit
                .or(file_contact_rate_limit)
                .unwrap_or(defaults.contact_rate_limit),
            contact_rate_window_secs: cli_contact_rate_window_secs
                .or(file_contact_rate_window_secs)
                .unwrap_or(defaults.contact_rate_window_secs),
            sitemap_revalidate_secs: cli_sitemap_revalidate_secs
                .or(file_sitemap_revalidate_secs)
                .unwrap_or(defaults.sitemap_revalidate_secs),
            admin_token: non_empty(cli_admin_token.or(file_admin_token)),
            brevo_api_key: non_empty(cli_brevo_api_key.or(file_brevo_api_key)),
            mail_sender: non_empty(cli_mail_sender.or(file_mail_sender))
                .unwrap_or(defaults.mail_sender),
            mail_sender_name: non_empty(file_mail_sender_name)
                .unwrap_or(defaults.mail_sender_name),
            mail_recipient: non_empty(cli_mail_recipient.or(file_mail_recipient))
                .unwrap_or(defaults.mail_recipient),
            gemini_api_key: non_empty(cli_gemini_api_key.or(file_gemini_api_key)),
            gemini_model: non_empty(cli_gemini_model.or(file_gemini_model))
                .unwrap_or(defaults.gemini_model),
            graceful_shutdown_timeout_secs: cli_shutdown_timeout
                .or(file_shutdown_timeout)
                .unwrap_or(defaults.graceful_shutdown_timeout_secs),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.contact_rate_limit > 0,
            "contact_rate_limit must be at least 1"
        );
        anyhow::ensure!(
            self.contact_rate_window_secs > 0,
            "contact_rate_window_secs must be at least 1"
        );

        let parsed = url::Url::parse(&self.base_url)
            .with_context(|| format!("base_url {:?} is not a valid URL", self.base_url))?;
        anyhow::ensure!(
            matches!(parsed.scheme(), "http" | "https"),
            "base_url {:?} must use http or https",
            self.base_url
        );
        anyhow::ensure!(
            parsed.host_str().is_some(),
            "base_url {:?} has no host",
            self.base_url
        );

        anyhow::ensure!(
            self.mail_sender.contains('@') && self.mail_recipient.contains('@'),
            "mail_sender and mail_recipient must be email addresses"
        );
        Ok(())
    }

    pub fn posts_path(&self) -> PathBuf {
        self.data_dir.join(POSTS_FILE)
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.contact_rate_limit,
            window: Duration::from_secs(self.contact_rate_window_secs),
        }
    }

    pub fn mail_settings(&self) -> MailSettings {
        MailSettings {
            sender: Address {
                email: self.mail_sender.clone(),
                name: Some(self.mail_sender_name.clone()),
            },
            recipient: Address {
                email: self.mail_recipient.clone(),
                name: None,
            },
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.graceful_shutdown_timeout_secs)
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(
    name = "gauge-site",
    about = "Precision gauge marketing site and blog backend",
    version
)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "GAUGE_SITE_HTTP_BIND",
        value_name = "ADDR",
        help = "HTTP bind address"
    )]
    pub http_bind: Option<SocketAddr>,

    #[arg(
        long,
        env = "GAUGE_SITE_BASE_URL",
        value_name = "URL",
        help = "Public site origin used in the sitemap"
    )]
    pub base_url: Option<String>,

    #[arg(
        long,
        env = "GAUGE_SITE_DATA_DIR",
        value_name = "DIR",
        help = "Directory holding posts.json"
    )]
    pub data_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "GAUGE_SITE_CONTACT_RATE_LIMIT",
        value_name = "N",
        help = "Contact submissions allowed per client and window",
        value_parser = clap::value_parser!(u32)
    )]
    pub contact_rate_limit: Option<u32>,

    #[arg(
        long,
        env = "GAUGE_SITE_CONTACT_RATE_WINDOW_SECS",
        value_name = "SECS",
        help = "Length of the contact rate limit window",
        value_parser = clap::value_parser!(u64)
    )]
    pub contact_rate_window_secs: Option<u64>,

    #[arg(
        long,
        env = "GAUGE_SITE_SITEMAP_REVALIDATE_SECS",
        value_name = "SECS",
        help = "Cache lifetime advertised for sitemap.xml",
        value_parser = clap::value_parser!(u64)
    )]
    pub sitemap_revalidate_secs: Option<u64>,

    #[arg(
        long,
        env = "GAUGE_SITE_ADMIN_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        help = "Bearer token for the admin API"
    )]
    pub admin_token: Option<String>,

    #[arg(
        long,
        env = "GAUGE_SITE_BREVO_API_KEY",
        value_name = "KEY",
        hide_env_values = true,
        help = "Brevo API key; notifications are only logged without it"
    )]
    pub brevo_api_key: Option<String>,

    #[arg(
        long,
        env = "GAUGE_SITE_MAIL_SENDER",
        value_name = "EMAIL",
        help = "From address for notifications"
    )]
    pub mail_sender: Option<String>,

    #[arg(
        long,
        env = "GAUGE_SITE_MAIL_RECIPIENT",
        value_name = "EMAIL",
        help = "Where contact notifications are sent"
    )]
    pub mail_recipient: Option<String>,

    #[arg(
        long,
        env = "GAUGE_SITE_GEMINI_API_KEY",
        value_name = "KEY",
        hide_env_values = true,
        help = "Gemini API key; draft generation is disabled without it"
    )]
    pub gemini_api_key: Option<String>,

    #[arg(
        long,
        env = "GAUGE_SITE_GEMINI_MODEL",
        value_name = "MODEL",
        help = "Gemini model used for drafts"
    )]
    pub gemini_model: Option<String>,

    #[arg(
        long,
        env = "GAUGE_SITE_SHUTDOWN_TIMEOUT_SECS",
        value_name = "SECS",
        help = "How long to wait for in-flight work on shutdown",
        value_parser = clap::value_parser!(u64)
    )]
    pub graceful_shutdown_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    http_bind: Option<SocketAddr>,
    base_url: Option<String>,
    data_dir: Option<PathBuf>,
    contact_rate_limit: Option<u32>,
    contact_rate_window_secs: Option<u64>,
    sitemap_revalidate_secs: Option<u64>,
    admin_token: Option<String>,
    brevo_api_key: Option<String>,
    mail_sender: Option<String>,
    mail_sender_name: Option<String>,
    mail_recipient: Option<String>,
    gemini_api_key: Option<String>,
    gemini_model: Option<String>,
    graceful_shutdown_timeout_secs: Option<u64>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
