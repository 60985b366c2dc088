// src/config.rs

use std::env;
use std::str::FromStr;

use dotenvy::dotenv;
use url::Url;

/// Default countdown for one test attempt (20 minutes).
pub const DEFAULT_TEST_DURATION_SECS: u64 = 20 * 60;

/// Where a session pulls its questions from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionSourceKind {
    /// The `questions` table managed through the admin panel.
    Database,
    /// A remote question service returning a JSON array.
    Http(Url),
    /// The list bundled with the binary (`data/questions.json`).
    Static,
}

/// Which backend confirms admin credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAuthMode {
    Database,
    Static,
}

impl FromStr for AdminAuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "database" | "db" => Ok(Self::Database),
            "static" => Ok(Self::Static),
            other => Err(format!("unknown ADMIN_AUTH mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: String,
    pub admin_auth: AdminAuthMode,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub test_duration_secs: u64,
    pub question_source: QuestionSourceKind,
    pub question_fetch_timeout_secs: u64,
    pub session_retention_secs: u64,
    pub auth_check_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://quiz.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let admin_auth = env::var("ADMIN_AUTH")
            .ok()
            .map(|v| v.parse::<AdminAuthMode>().expect("ADMIN_AUTH must be 'database' or 'static'"))
            .unwrap_or(AdminAuthMode::Database);

        let question_source = parse_source(
            env::var("QUESTION_SOURCE").ok().as_deref(),
            env::var("QUESTION_API_URL").ok().as_deref(),
        )
        .unwrap_or_else(|e| panic!("Invalid question source configuration: {}", e));

        Self {
            database_url,
            jwt_secret,
            jwt_expiration: env_u64("JWT_EXPIRATION", 86_400),
            rust_log,
            bind_addr,
            admin_auth,
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            test_duration_secs: env_u64("TEST_DURATION_SECS", DEFAULT_TEST_DURATION_SECS),
            question_source,
            question_fetch_timeout_secs: env_u64("QUESTION_FETCH_TIMEOUT_SECS", 10),
            session_retention_secs: env_u64("SESSION_RETENTION_SECS", 3600),
            auth_check_timeout_ms: env_u64("AUTH_CHECK_TIMEOUT_MS", 2000),
        }
    }

    /// Configuration used by tests and local tooling: in-memory SQLite, bundled questions.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: jwt_secret.to_string(),
            jwt_expiration: 600,
            rust_log: "error".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            admin_auth: AdminAuthMode::Database,
            admin_username: None,
            admin_password: None,
            test_duration_secs: DEFAULT_TEST_DURATION_SECS,
            question_source: QuestionSourceKind::Database,
            question_fetch_timeout_secs: 5,
            session_retention_secs: 3600,
            auth_check_timeout_ms: 2000,
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{} must be a non-negative integer", key)),
        Err(_) => default,
    }
}

/// Resolves `QUESTION_SOURCE` / `QUESTION_API_URL` into a source kind.
pub fn parse_source(kind: Option<&str>, api_url: Option<&str>) -> Result<QuestionSourceKind, String> {
    match kind.map(|k| k.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("database") | Some("db") => Ok(QuestionSourceKind::Database),
        Some("static") => Ok(QuestionSourceKind::Static),
        Some("http") => {
            let raw = api_url.ok_or("QUESTION_API_URL must be set when QUESTION_SOURCE=http")?;
            let url = Url::parse(raw).map_err(|e| format!("QUESTION_API_URL: {}", e))?;
            match url.scheme() {
                "http" | "https" => Ok(QuestionSourceKind::Http(url)),
                scheme => Err(format!("QUESTION_API_URL: unsupported scheme '{}'", scheme)),
            }
        }
        Some(other) => Err(format!("unknown QUESTION_SOURCE '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_defaults_to_database() {
        assert_eq!(parse_source(None, None), Ok(QuestionSourceKind::Database));
        assert_eq!(parse_source(Some("DB"), None), Ok(QuestionSourceKind::Database));
    }

    #[test]
    fn http_source_requires_a_valid_url() {
        assert!(parse_source(Some("http"), None).is_err());
        assert!(parse_source(Some("http"), Some("not a url")).is_err());
        assert!(parse_source(Some("http"), Some("ftp://example.com/q")).is_err());

        let kind = parse_source(Some("http"), Some("http://localhost:3001/api/questions")).unwrap();
        match kind {
            QuestionSourceKind::Http(url) => assert_eq!(url.path(), "/api/questions"),
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn unknown_source_is_rejected() {
        assert!(parse_source(Some("supabase"), None).is_err());
    }

    #[test]
    fn admin_auth_mode_parses() {
        assert_eq!("static".parse::<AdminAuthMode>(), Ok(AdminAuthMode::Static));
        assert_eq!(" Database ".parse::<AdminAuthMode>(), Ok(AdminAuthMode::Database));
        assert!("ldap".parse::<AdminAuthMode>().is_err());
    }
}
