//! Bearer token signing and verification.
//!
//! Token format: `<user-uuid>.<hex hmac-sha256 signature>`, signed over the
//! raw UUID bytes with the configured auth secret. The API itself only ever
//! verifies; minting lives in the cli `token` command and in tests, standing
//! in for the external identity issuer.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tamarind_core::UserId;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// The signing key could not be constructed from the configured secret.
#[derive(Debug, Error)]
#[error("invalid token signing key")]
pub struct InvalidKey;

/// Signs and verifies bearer tokens.
pub struct TokenService {
    secret: SecretString,
}

impl TokenService {
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn mac(&self) -> Result<HmacSha256, InvalidKey> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes()).map_err(|_| InvalidKey)
    }

    /// Mint a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidKey`] if the signing key cannot be constructed.
    pub fn issue(&self, user: UserId) -> Result<String, InvalidKey> {
        let mut mac = self.mac()?;
        mac.update(user.as_uuid().as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(format!("{user}.{signature}"))
    }

    /// Verify a presented token and return the user id it names.
    ///
    /// Signature comparison is constant-time. Any malformed or tampered
    /// token yields `None`; the caller decides whether that means 401 or an
    /// anonymous request.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<UserId> {
        let (id_part, signature_part) = token.split_once('.')?;
        let user: UserId = id_part.parse().ok()?;
        let signature = hex::decode(signature_part).ok()?;
        let mut mac = self.mac().ok()?;
        mac.update(user.as_uuid().as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"))
    }

    #[test]
    fn test_issued_token_verifies() {
        let tokens = service();
        let user = UserId::generate();

        let token = tokens.issue(user).unwrap();

        assert_eq!(tokens.verify(&token), Some(user));
    }

    #[test]
    fn test_tampered_signature_is_rejected() {
        let tokens = service();
        let token = tokens.issue(UserId::generate()).unwrap();

        let mut tampered = token[..token.len() - 2].to_string();
        tampered.push_str("00");

        assert_eq!(tokens.verify(&tampered), None);
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let issuer = TokenService::new(SecretString::from("nQ8#vD3$wF6!kJ1@mP5^sX9&tZ2*yB4%"));
        let token = issuer.issue(UserId::generate()).unwrap();

        assert_eq!(service().verify(&token), None);
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let tokens = service();

        assert_eq!(tokens.verify(""), None);
        assert_eq!(tokens.verify("no-dot-here"), None);
        assert_eq!(tokens.verify("not-a-uuid.cafebabe"), None);
        let user = UserId::generate();
        assert_eq!(tokens.verify(&format!("{user}.zzzz")), None);
    }
}
