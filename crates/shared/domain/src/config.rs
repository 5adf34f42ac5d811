use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level API configuration shared across services.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub database: DatabaseConfig,
    pub attendance: AttendanceConfig,
    pub analytics: AnalyticsConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
    /// Browser origins allowed by CORS. Empty means any origin.
    pub cors_origins: Vec<String>,
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// `SurrealDB` connection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<DatabaseCredentials>,
}

/// `SurrealDB` root credentials (optional when using unauthenticated engines like mem://).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt: JwtConfig,
    pub qr: QrConfig,
    /// Seeds an administrator account on startup when present.
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

/// Session token settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub ttl_seconds: u64,
    pub clock_skew_seconds: u64,
}

/// Check-in QR token settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    /// 64 hex chars (32 bytes). A random key is generated at startup when absent,
    /// which invalidates outstanding QR codes on restart.
    pub signing_seed: Option<String>,
    pub ttl_seconds: u64,
    pub clock_skew_seconds: u64,
    /// Minimum rendered QR size in pixels.
    pub size_px: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootstrapAdminConfig {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Check-in rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    /// Offset applied to check-in instants to derive the session date.
    pub utc_offset_minutes: i32,
    pub require_location: bool,
    /// Fixes with a reported accuracy worse than this are rejected.
    pub max_accuracy_m: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// `From` address stamped on dispatched reports.
    pub sender: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for rolling log files; console only when absent.
    pub directory: Option<PathBuf>,
    pub json: bool,
    pub filter: Option<String>,
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 4590,
            ssl: None,
            cors_origins: Vec::new(),
        }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "mem://".to_owned(),
            namespace: "rollcall".to_owned(),
            database: "core".to_owned(),
            credentials: None,
        }
    }
}

impl Default for DatabaseCredentials {
    fn default() -> Self {
        Self { username: "root".to_owned(), password: "root".to_owned() }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "dev-only-change-me".to_owned(),
            issuer: "rollcall".to_owned(),
            ttl_seconds: 12 * 3600,
            clock_skew_seconds: 60,
        }
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        Self { signing_seed: None, ttl_seconds: 900, clock_skew_seconds: 30, size_px: 256 }
    }
}

impl Default for BootstrapAdminConfig {
    fn default() -> Self {
        Self {
            email: "admin@rollcall.local".to_owned(),
            password: String::new(),
            full_name: "Administrator".to_owned(),
        }
    }
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self { utc_offset_minutes: 0, require_location: false, max_accuracy_m: 500.0 }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self { sender: "reports@rollcall.local".to_owned() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), directory: None, json: false, filter: None }
    }
}
