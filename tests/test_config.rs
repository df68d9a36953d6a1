use clap::Parser;
use dirserve::cli::Cli;
use dirserve::config::Config;
use std::io::Write;
use std::path::PathBuf;

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.port, 8080);
    assert!(cfg.server.workers >= 1);
    assert_eq!(cfg.static_files.root, PathBuf::from("."));
    assert_eq!(cfg.server.listen_addr(), "0.0.0.0:8080");
}

#[test]
fn test_config_from_yaml() {
    let cfg = Config::from_yaml(
        "server:\n  port: 9000\n  workers: 3\nstatic_files:\n  root: /srv/www\n",
    )
    .unwrap();

    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.server.workers, 3);
    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.static_files.root, PathBuf::from("/srv/www"));
}

#[test]
fn test_config_partial_yaml_keeps_defaults() {
    let cfg = Config::from_yaml("server:\n  port: 9001\n").unwrap();

    assert_eq!(cfg.server.port, 9001);
    assert_eq!(cfg.static_files, Config::default().static_files);
}

#[test]
fn test_config_invalid_yaml() {
    assert!(Config::from_yaml("server:\n  port: not-a-port\n").is_err());
}

#[test]
fn test_config_validate_missing_root() {
    let mut cfg = Config::default();
    cfg.static_files.root = PathBuf::from("/definitely/not/here/dirserve");

    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_config_validate_root_is_file() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut cfg = Config::default();
    cfg.static_files.root = file.path().to_path_buf();

    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_validate_zero_workers() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.static_files.root = dir.path().to_path_buf();
    cfg.server.workers = 0;

    assert!(cfg.validate().is_err());
}

#[test]
fn test_cli_flags_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();

    let cli = Cli::try_parse_from(["dirserve", "-p", "9090", "-d", root, "-w", "2"]).unwrap();
    let cfg = cli.into_config().unwrap();

    assert_eq!(cfg.server.port, 9090);
    assert_eq!(cfg.server.workers, 2);
    assert_eq!(cfg.static_files.root, dir.path());
}

#[test]
fn test_cli_flags_override_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "server:\n  port: 7000\n  workers: 5\nstatic_files:\n  root: {}",
        dir.path().display()
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "dirserve",
        "-c",
        file.path().to_str().unwrap(),
        "--port",
        "7001",
    ])
    .unwrap();
    let cfg = cli.into_config().unwrap();

    assert_eq!(cfg.server.port, 7001);
    assert_eq!(cfg.server.workers, 5);
    assert_eq!(cfg.static_files.root, dir.path());
}

#[test]
fn test_cli_rejects_missing_root() {
    let cli = Cli::try_parse_from(["dirserve", "-d", "/definitely/not/here/dirserve"]).unwrap();

    assert!(cli.into_config().is_err());
}

#[test]
fn test_cli_rejects_bad_port() {
    assert!(Cli::try_parse_from(["dirserve", "-p", "http"]).is_err());
}
