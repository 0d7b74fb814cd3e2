#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use chatrelay_dashboard::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
dashboard:
  listen: "127.0.0.1:5001"
  poll_intervl_ms: 500 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.upstream.username, "ADMIN");
    assert_eq!(cfg.upstream.url, "ws://127.0.0.1:8765");
    assert_eq!(cfg.dashboard.listen, "127.0.0.1:5001");
    assert_eq!(cfg.dashboard.poll_interval_ms, 500);
    assert_eq!(cfg.dashboard.history_capacity, 500);
    assert_eq!(cfg.dashboard.reconnect_delay().map(|d| d.as_millis()), Some(3000));
}

#[test]
fn version_is_checked() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn ranges_are_checked() {
    for bad in [
        "version: 1\ndashboard: { poll_interval_ms: 10 }\n",
        "version: 1\ndashboard: { history_capacity: 0 }\n",
        "version: 1\ndashboard: { reconnect_delay_ms: 50 }\n",
        "version: 1\ndashboard: { listen: \"nowhere\" }\n",
        "version: 1\nupstream: { url: \"http://127.0.0.1:8765\" }\n",
        "version: 1\nupstream: { username: \"  \" }\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert_eq!(err.code().as_str(), "BAD_CONFIG", "{bad}");
    }
}

#[test]
fn zero_reconnect_delay_disables_reconnect() {
    let cfg = config::load_from_str("version: 1\ndashboard: { reconnect_delay_ms: 0 }\n").unwrap();
    assert!(cfg.dashboard.reconnect_delay().is_none());
}
