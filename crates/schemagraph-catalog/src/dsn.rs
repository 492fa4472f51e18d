//! Data source names and dispatch to a concrete source
//!
//! Supported forms:
//! - `json://path/to/schema.json` or a bare path ending in `.json`
//! - `pg://`, `postgres://` or `postgresql://` URLs (needs the `postgres` feature)

use crate::adapter::{FetchError, SchemaSource};
use crate::json::JsonSource;
use crate::postgres::PostgresSource;
use schemagraph_core::Schema;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// A parsed data source name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dsn {
    /// JSON snapshot file
    Json(PathBuf),

    /// PostgreSQL connection URL, normalized to the `postgres://` scheme
    Postgres { url: String, tls: bool },
}

impl Dsn {
    /// Parse a DSN string
    pub fn parse(dsn: &str) -> Result<Self, FetchError> {
        let dsn = dsn.trim();
        if dsn.is_empty() {
            return Err(FetchError::UnsupportedDsn("empty DSN".to_string()));
        }

        let Some((scheme, rest)) = dsn.split_once("://") else {
            if dsn.ends_with(".json") {
                return Ok(Dsn::Json(PathBuf::from(dsn)));
            }
            return Err(FetchError::UnsupportedDsn(dsn.to_string()));
        };

        match scheme.to_ascii_lowercase().as_str() {
            "json" => {
                if rest.is_empty() {
                    return Err(FetchError::ConfigError(
                        "json:// DSN needs a file path".to_string(),
                    ));
                }
                Ok(Dsn::Json(PathBuf::from(rest)))
            }
            "pg" | "postgres" | "postgresql" => {
                let (rest, tls) = normalize_sslmode(rest);
                Ok(Dsn::Postgres {
                    url: format!("postgres://{}", rest),
                    tls,
                })
            }
            _ => Err(FetchError::UnsupportedDsn(dsn.to_string())),
        }
    }

    /// Open a source for this DSN
    pub async fn connect(&self) -> Result<Box<dyn SchemaSource>, FetchError> {
        match self {
            Dsn::Json(path) => Ok(Box::new(JsonSource::new(path.clone()))),
            Dsn::Postgres { url, tls: true } => {
                Ok(Box::new(PostgresSource::connect_with_tls(url).await?))
            }
            Dsn::Postgres { url, tls: false } => Ok(Box::new(PostgresSource::connect(url).await?)),
        }
    }
}

impl fmt::Display for Dsn {
    /// Credentials in PostgreSQL URLs are masked
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dsn::Json(path) => write!(f, "json://{}", path.display()),
            Dsn::Postgres { url, .. } => {
                let rest = url.trim_start_matches("postgres://");
                match rest.split_once('@') {
                    Some((_, host)) => write!(f, "postgres://***@{}", host),
                    None => write!(f, "{}", url),
                }
            }
        }
    }
}

/// Rewrite `sslmode` to a value the driver accepts and report whether TLS is on
///
/// The driver only knows `disable`, `prefer` and `require`. The native TLS
/// connector always verifies the certificate chain and host name, so
/// `verify-ca` and `verify-full` become `require`.
fn normalize_sslmode(rest: &str) -> (String, bool) {
    let Some((base, query)) = rest.split_once('?') else {
        return (rest.to_string(), false);
    };

    let mut tls = false;
    let params: Vec<&str> = query
        .split('&')
        .map(|param| match param.split_once('=') {
            Some(("sslmode", "require")) => {
                tls = true;
                param
            }
            Some(("sslmode", "verify-ca" | "verify-full")) => {
                tls = true;
                "sslmode=require"
            }
            _ => param,
        })
        .collect();

    (format!("{}?{}", base, params.join("&")), tls)
}

/// Open the source a DSN names
pub async fn connect(dsn: &str) -> Result<Box<dyn SchemaSource>, FetchError> {
    Dsn::parse(dsn)?.connect().await
}

/// Analyze the data source a DSN names and return its repaired schema
pub async fn analyze(dsn: &str) -> Result<Schema, FetchError> {
    let parsed = Dsn::parse(dsn)?;
    let source = parsed.connect().await?;
    info!(source = source.name(), dsn = %parsed, "analyzing data source");
    source.analyze().await
}
