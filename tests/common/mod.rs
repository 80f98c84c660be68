#![allow(dead_code)]

use std::net::SocketAddr;

use attendance::config::Config;

pub const PEER: &str = "127.0.0.1:40000";

pub fn test_config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".into(),
        database_url: None,
        jwt_secret: "test-secret".into(),
        admin_password: "admin123".into(),
        admin_password_hash: None,
        admin_session_ttl: 3600,
        rate_login_per_min: 1000,
        rate_submit_per_min: 1000,
        rate_admin_per_min: 1000,
        api_prefix: "/api".into(),
        max_payload_bytes: 4 * 1024 * 1024,
        log_dir: "logs".into(),
        kiosk_camera_url: None,
        camera_timeout_secs: 1,
        kiosk_latitude: None,
        kiosk_longitude: None,
    }
}

/// The governor keys on the peer address, so every request needs one.
pub fn peer() -> SocketAddr {
    PEER.parse().unwrap()
}
