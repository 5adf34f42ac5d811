use rollcall_kernel::config::load_config;
use rollcall_kernel::domain::config::ApiConfig;
use std::io::Write;

#[test]
fn explicit_file_is_layered_over_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[server]
port = 8088

[attendance]
utc_offset_minutes = -300
require_location = true
"#
    )
    .unwrap();

    let cfg: ApiConfig = load_config(Some(file.path())).unwrap();
    assert_eq!(cfg.server.port, 8088);
    assert_eq!(cfg.attendance.utc_offset_minutes, -300);
    assert!(cfg.attendance.require_location);
    assert_eq!(cfg.database.url, "mem://");
    assert_eq!(cfg.security.qr.ttl_seconds, 900);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let result = load_config::<ApiConfig>(Some("/definitely/not/here/server.toml"));
    assert!(result.is_err());
}

#[test]
fn no_file_falls_back_to_defaults() {
    let cfg: ApiConfig = load_config(None::<&str>).unwrap();
    assert_eq!(cfg.server.port, 4590);
    assert_eq!(cfg.logging.level, "info");
}
