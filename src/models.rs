use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct AdminLoginReq {
    #[schema(example = "admin123")]
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AdminLoginResponse {
    pub access_token: String,
    /// Seconds until the session expires
    #[schema(example = 28800)]
    pub expires_in: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}
