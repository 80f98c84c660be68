use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use tracing::warn;

pub const INVALID_PASSWORD: &str = "Invalid admin password";

/// Decides whether a candidate password opens the admin view.
pub trait AdminGate: Send + Sync {
    fn verify(&self, candidate: &str) -> bool;
}

/// Plain comparison against one shared secret.
pub struct SharedSecretGate {
    secret: String,
}

impl SharedSecretGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl AdminGate for SharedSecretGate {
    fn verify(&self, candidate: &str) -> bool {
        !self.secret.is_empty() && candidate == self.secret
    }
}

/// Compares against an argon2 PHC string so the secret itself never sits in
/// the environment.
pub struct HashedSecretGate {
    hash: String,
}

impl HashedSecretGate {
    pub fn new(hash: impl Into<String>) -> Result<Self, argon2::password_hash::Error> {
        let hash = hash.into();
        PasswordHash::new(&hash)?;
        Ok(Self { hash })
    }
}

impl AdminGate for HashedSecretGate {
    fn verify(&self, candidate: &str) -> bool {
        let parsed = match PasswordHash::new(&self.hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Admin password hash unreadable");
                return false;
            }
        };

        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};

    #[test]
    fn shared_secret_requires_exact_match() {
        let gate = SharedSecretGate::new("admin123");
        assert!(gate.verify("admin123"));
        assert!(!gate.verify("admin1234"));
        assert!(!gate.verify("ADMIN123"));
        assert!(!gate.verify(""));
    }

    #[test]
    fn empty_secret_opens_nothing() {
        assert!(!SharedSecretGate::new("").verify(""));
    }

    #[test]
    fn hashed_secret_verifies_with_argon2() {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"s3cret", &salt)
            .unwrap()
            .to_string();

        let gate = HashedSecretGate::new(hash).unwrap();
        assert!(gate.verify("s3cret"));
        assert!(!gate.verify("admin123"));
    }

    #[test]
    fn malformed_hash_is_rejected_up_front() {
        assert!(HashedSecretGate::new("not-a-phc-string").is_err());
    }
}
