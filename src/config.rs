use std::env;
use std::str::FromStr;

use dotenvy::dotenv;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    /// MySQL connection string; without it records live in memory only.
    pub database_url: Option<String>,
    pub jwt_secret: String,

    // Admin gate
    pub admin_password: String,
    pub admin_password_hash: Option<String>,
    pub admin_session_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_submit_per_min: u32,
    pub rate_admin_per_min: u32,

    pub api_prefix: String,
    pub max_payload_bytes: usize,
    pub log_dir: String,

    // Kiosk
    pub kiosk_camera_url: Option<String>,
    pub camera_timeout_secs: u64,
    pub kiosk_latitude: Option<f64>,
    pub kiosk_longitude: Option<f64>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: optional("DATABASE_URL"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),

            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
            admin_password_hash: optional("ADMIN_PASSWORD_HASH"),
            admin_session_ttl: parse_or("ADMIN_SESSION_TTL", 28_800), // 8h

            rate_login_per_min: parse_or("RATE_LOGIN_PER_MIN", 60),
            rate_submit_per_min: parse_or("RATE_SUBMIT_PER_MIN", 120),
            rate_admin_per_min: parse_or("RATE_ADMIN_PER_MIN", 1000),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            max_payload_bytes: parse_or("MAX_PAYLOAD_BYTES", 4 * 1024 * 1024),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            kiosk_camera_url: optional("KIOSK_CAMERA_URL"),
            camera_timeout_secs: parse_or("CAMERA_TIMEOUT_SECS", 10),
            kiosk_latitude: optional("KIOSK_LATITUDE").map(|v| parse_value("KIOSK_LATITUDE", &v)),
            kiosk_longitude: optional("KIOSK_LONGITUDE").map(|v| parse_value("KIOSK_LONGITUDE", &v)),
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match optional(key) {
        Some(raw) => parse_value(key, &raw),
        None => default,
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> T {
    raw.trim()
        .parse()
        .unwrap_or_else(|_| panic!("{key} has an invalid value: {raw}"))
}
