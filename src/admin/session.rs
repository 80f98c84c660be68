use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use moka::Expiry;
use moka::future::Cache;
use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::config::Config;
use crate::models::AdminClaims;

const ADMIN_SUBJECT: &str = "admin";

/// Matches `Validation::default()`'s clock leeway.
const EXP_LEEWAY_SECS: u64 = 60;

/// jti => `exp` of the revoked token.
static REVOKED_SESSIONS: Lazy<Cache<String, usize>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .expire_after(UntilTokenExpiry)
        .build()
});

/// A revoked jti is kept until its token could no longer verify anyway.
struct UntilTokenExpiry;

impl Expiry<String, usize> for UntilTokenExpiry {
    fn expire_after_create(&self, _jti: &String, exp: &usize, _created_at: Instant) -> Option<Duration> {
        let remaining = exp.saturating_sub(now()) as u64;
        Some(Duration::from_secs(remaining + EXP_LEEWAY_SECS))
    }
}

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

pub fn issue_admin_token(secret: &str, ttl: usize) -> Result<(String, AdminClaims), jsonwebtoken::errors::Error> {
    let issued_at = now();
    let claims = AdminClaims {
        sub: ADMIN_SUBJECT.to_string(),
        iat: issued_at,
        exp: issued_at + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, claims))
}

pub fn verify_admin_token(token: &str, secret: &str) -> Result<AdminClaims, String> {
    let claims = decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.sub != ADMIN_SUBJECT {
        return Err("not an admin session".into());
    }
    if REVOKED_SESSIONS.contains_key(&claims.jti) {
        return Err("session ended".into());
    }
    Ok(claims)
}

pub async fn revoke(claims: &AdminClaims) {
    REVOKED_SESSIONS.insert(claims.jti.clone(), claims.exp).await;
}

/// Present on a request only when it carries a live admin session.
pub struct AdminSession {
    pub claims: AdminClaims,
}

impl FromRequest for AdminSession {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    actix_web::error::ErrorInternalServerError("Config missing"),
                ));
            }
        };

        match verify_admin_token(token, &config.jwt_secret) {
            Ok(claims) => ready(Ok(AdminSession { claims })),
            Err(_) => ready(Err(ErrorUnauthorized("Invalid or expired admin session"))),
        }
    }
}
