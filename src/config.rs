use std::{env, fmt::Display, str::FromStr};

/// Outbound email settings. `smtp_host = None` selects the file transport.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    pub mail_dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmsMode {
    Disabled,
    Log,
    Http,
}

impl FromStr for SmsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" | "" => Ok(SmsMode::Disabled),
            "log" => Ok(SmsMode::Log),
            "http" => Ok(SmsMode::Http),
            other => Err(format!("unknown SMS mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub mode: SmsMode,
    pub endpoint: String,
    pub api_key: String,
    pub sender_id: String,
}

/// Client credentials for one OAuth provider.
#[derive(Debug, Clone, Default)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub google: OAuthClientConfig,
    pub facebook: OAuthClientConfig,
    /// Allows placeholder credentials to short-circuit the provider round trip.
    pub dev_mode: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub base_url: String,
    pub session_key: Option<String>,
    pub session_idle_minutes: i64,
    pub cookie_secure: bool,
    pub admin_password: String,
    pub oauth: OAuthConfig,
    pub mail: MailConfig,
    pub sms: SmsConfig,
}

impl AppConfig {
    /// Read configuration from the environment (after `.env` has been loaded).
    pub fn load() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            database_url,
            bind_addr: var_or("BIND_ADDR", "127.0.0.1:8080"),
            base_url: var_or("BASE_URL", "http://127.0.0.1:8080")
                .trim_end_matches('/')
                .to_string(),
            session_key: env::var("SESSION_KEY").ok(),
            session_idle_minutes: try_load("SESSION_IDLE_MINUTES", "30")?,
            cookie_secure: try_load("COOKIE_SECURE", "false")?,
            admin_password: var_or("ADMIN_PASSWORD", "admin123"),
            oauth: OAuthConfig {
                google: OAuthClientConfig {
                    client_id: var_or("GOOGLE_CLIENT_ID", ""),
                    client_secret: var_or("GOOGLE_CLIENT_SECRET", ""),
                },
                facebook: OAuthClientConfig {
                    client_id: var_or("FACEBOOK_APP_ID", ""),
                    client_secret: var_or("FACEBOOK_APP_SECRET", ""),
                },
                dev_mode: try_load("OAUTH_DEV_MODE", "false")?,
            },
            mail: MailConfig {
                smtp_host: env::var("SMTP_HOST").ok().filter(|h| !h.trim().is_empty()),
                smtp_port: try_load("SMTP_PORT", "587")?,
                smtp_username: var_or("SMTP_USERNAME", ""),
                smtp_password: var_or("SMTP_PASSWORD", ""),
                from_email: var_or("MAIL_FROM", "noreply@src.local"),
                from_name: var_or("MAIL_FROM_NAME", "SRC Portal"),
                mail_dir: var_or("MAIL_DIR", "data/mail"),
            },
            sms: SmsConfig {
                mode: try_load("SMS_MODE", "disabled")?,
                endpoint: var_or("SMS_ENDPOINT", ""),
                api_key: var_or("SMS_API_KEY", ""),
                sender_id: var_or("SMS_SENDER_ID", "SRC"),
            },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, String>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        log::debug!("{key} not set, using default: {default}");
        default.to_string()
    });
    parse_value(key, &raw)
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, String>
where
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| format!("Invalid {key} value '{raw}': {e}"))
}
