use rollcall_domain::config::{ApiConfig, AttendanceConfig, DatabaseConfig, QrConfig, ServerConfig};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 4590);
    assert!(server.ssl.is_none());
    assert!(server.cors_origins.is_empty());

    let db = DatabaseConfig::default();
    assert_eq!(db.url, "mem://");
    assert_eq!(db.namespace, "rollcall");
    assert_eq!(db.database, "core");
    assert!(db.credentials.is_none());

    let qr = QrConfig::default();
    assert_eq!(qr.ttl_seconds, 900);
    assert!(qr.signing_seed.is_none());

    let attendance = AttendanceConfig::default();
    assert_eq!(attendance.utc_offset_minutes, 0);
    assert!(!attendance.require_location);
}

#[test]
fn api_config_deserializes() {
    let raw = json!({
        "server": { "address": "::", "port": 8080, "cors_origins": ["https://campus.example"] },
        "database": { "url": "mem://", "namespace": "n", "database": "d", "credentials": null },
        "security": { "jwt": { "secret": "s3cret", "ttl_seconds": 60 }, "qr": { "ttl_seconds": 120 } },
        "attendance": { "utc_offset_minutes": 120, "require_location": true }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.server.cors_origins, vec!["https://campus.example".to_owned()]);
    assert_eq!(cfg.database.namespace, "n");
    assert_eq!(cfg.security.jwt.secret, "s3cret");
    assert_eq!(cfg.security.jwt.issuer, "rollcall");
    assert_eq!(cfg.security.qr.ttl_seconds, 120);
    assert_eq!(cfg.attendance.utc_offset_minutes, 120);
    assert!(cfg.attendance.require_location);
    assert!(cfg.security.bootstrap_admin.is_none());
}

#[test]
fn empty_document_yields_defaults() {
    let cfg: ApiConfig = serde_json::from_value(json!({})).expect("empty config");
    assert_eq!(cfg.server.port, 4590);
    assert_eq!(cfg.logging.level, "info");
}
