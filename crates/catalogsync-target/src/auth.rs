//! Key-pair JWT authentication for the SQL API
//!
//! The SQL API accepts a JWT signed with the user's RSA private key. The
//! token is scoped to `<ACCOUNT>.<USER>` and names the public key by its
//! SHA-256 fingerprint:
//!
//! ```text
//! iss = ACCOUNT.USER.SHA256:<base64 fingerprint>
//! sub = ACCOUNT.USER
//! iat = now, exp = now + lifetime
//! ```
//!
//! Expiry is not tracked locally. The session keeps handing out the last
//! token until a caller asks for a refresh, which happens after the
//! warehouse rejects a call.
//!
//! Reference: https://docs.snowflake.com/en/developer-guide/sql-api/authenticating

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey};
use rsa::RsaPrivateKey;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use catalogsync_core::SyncConfig;

use crate::error::AuthError;

/// A signed access token
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    /// Encoded token, sent as the bearer credential
    pub value: String,

    pub issued_at: DateTime<Utc>,

    /// How long the warehouse will accept the token
    pub ttl: Duration,

    /// How long the token is meant to be reused before signing a new one
    pub renew_after: Duration,
}

impl AuthToken {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + self.ttl
    }

    pub fn renew_at(&self) -> DateTime<Utc> {
        self.issued_at + self.renew_after
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("ttl", &self.ttl)
            .field("renew_after", &self.renew_after)
            .finish()
    }
}

/// Something that can mint access tokens
pub trait TokenIssuer: Send + Sync {
    fn issue(&self) -> Result<AuthToken, AuthError>;
}

#[derive(Debug, Serialize)]
struct Claims {
    iss: String,
    sub: String,
    iat: i64,
    exp: i64,
}

/// Signs key-pair JWTs from an RSA private key
pub struct KeyPairIssuer {
    qualified_user: String,
    fingerprint: String,
    key: EncodingKey,
    lifetime: Duration,
    signing_lifetime: Duration,
}

impl KeyPairIssuer {
    /// Create an issuer from a PEM private key (PKCS#8 or PKCS#1)
    pub fn new(
        account_identifier: &str,
        username: &str,
        private_key_pem: &SecretString,
        lifetime: std::time::Duration,
        signing_lifetime: std::time::Duration,
    ) -> Result<Self, AuthError> {
        let pem = private_key_pem.expose_secret();

        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        let fingerprint = public_key_fingerprint(&private_key)?;

        let key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;

        let to_chrono = |d: std::time::Duration| {
            Duration::from_std(d).map_err(|e| AuthError::SigningError(e.to_string()))
        };

        Ok(Self {
            qualified_user: format!(
                "{}.{}",
                normalize_account(account_identifier),
                username.to_uppercase()
            ),
            fingerprint,
            key,
            lifetime: to_chrono(lifetime)?,
            signing_lifetime: to_chrono(signing_lifetime)?,
        })
    }

    /// Create an issuer from the connection configuration
    pub fn from_config(config: &SyncConfig) -> Result<Self, AuthError> {
        Self::new(
            &config.account_identifier,
            &config.username,
            &config.private_key,
            config.token_lifetime(),
            config.signing_lifetime(),
        )
    }

    /// `ACCOUNT.USER` the tokens are issued for
    pub fn qualified_user(&self) -> &str {
        &self.qualified_user
    }

    /// `SHA256:<base64>` fingerprint of the public key
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn issue_at(&self, now: DateTime<Utc>) -> Result<AuthToken, AuthError> {
        let claims = Claims {
            iss: format!("{}.{}", self.qualified_user, self.fingerprint),
            sub: self.qualified_user.clone(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        let value = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| AuthError::SigningError(e.to_string()))?;

        Ok(AuthToken {
            value,
            issued_at: now,
            ttl: self.lifetime,
            renew_after: self.signing_lifetime,
        })
    }
}

impl TokenIssuer for KeyPairIssuer {
    fn issue(&self) -> Result<AuthToken, AuthError> {
        self.issue_at(Utc::now())
    }
}

/// Account part of an identifier, upper-cased, without region or cloud suffix
///
/// `xy12345.us-east-1.aws` becomes `XY12345`; for global identifiers
/// (`xy12345-org.global`) everything from the first `-` is dropped.
pub fn normalize_account(account_identifier: &str) -> String {
    let separator = if account_identifier.contains(".global") { '-' } else { '.' };
    let account = match account_identifier.find(separator) {
        Some(idx) if idx > 0 => &account_identifier[..idx],
        _ => account_identifier,
    };
    account.to_uppercase()
}

fn public_key_fingerprint(private_key: &RsaPrivateKey) -> Result<String, AuthError> {
    let der = private_key
        .to_public_key()
        .to_public_key_der()
        .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
    let digest = Sha256::digest(der.as_bytes());
    Ok(format!("SHA256:{}", STANDARD.encode(digest)))
}

/// Holds the most recently issued token
///
/// Each invocation owns its own session; nothing here is shared across
/// concurrent invocations.
pub struct AuthSession {
    issuer: Box<dyn TokenIssuer>,
    current: RwLock<Option<AuthToken>>,
    issued: AtomicUsize,
}

impl AuthSession {
    pub fn new(issuer: impl TokenIssuer + 'static) -> Self {
        Self {
            issuer: Box::new(issuer),
            current: RwLock::new(None),
            issued: AtomicUsize::new(0),
        }
    }

    /// Current token value, issuing the first one on demand
    pub async fn token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.current.read().await.as_ref() {
            return Ok(token.value.clone());
        }
        Ok(self.refresh().await?.value)
    }

    /// Issue a new token and make it current
    pub async fn refresh(&self) -> Result<AuthToken, AuthError> {
        let token = self.issuer.issue()?;
        self.issued.fetch_add(1, Ordering::SeqCst);
        tracing::info!(expires_at = %token.expires_at(), "Issued access token");

        *self.current.write().await = Some(token.clone());
        Ok(token)
    }

    /// Number of tokens issued so far
    pub fn issued_count(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::StaticTokenIssuer;
    use pretty_assertions::assert_eq;

    const TEST_KEY: &str = include_str!("../tests/fixtures/test_rsa_key.pem");
    const TEST_KEY_PKCS1: &str = include_str!("../tests/fixtures/test_rsa_key_pkcs1.pem");
    const TEST_KEY_FINGERPRINT: &str = "SHA256:sUS7SzLaTp3Jwk1M8DDiBUPBc80V8jIn5Q8CCbx1LrY=";

    fn issuer(pem: &str) -> KeyPairIssuer {
        KeyPairIssuer::new(
            "xy12345.us-east-1",
            "catalog_sync",
            &SecretString::from(pem.to_string()),
            std::time::Duration::from_secs(3600),
            std::time::Duration::from_secs(3000),
        )
        .unwrap()
    }

    #[test]
    fn account_normalization() {
        assert_eq!(normalize_account("xy12345"), "XY12345");
        assert_eq!(normalize_account("xy12345.us-east-1.aws"), "XY12345");
        assert_eq!(normalize_account("myorg-acct.global"), "MYORG");
    }

    #[test]
    fn fingerprint_matches_public_key() {
        let issuer = issuer(TEST_KEY);
        assert_eq!(issuer.fingerprint(), TEST_KEY_FINGERPRINT);
        assert_eq!(issuer.qualified_user(), "XY12345.CATALOG_SYNC");
    }

    #[test]
    fn pkcs1_keys_accepted() {
        assert_eq!(issuer(TEST_KEY_PKCS1).fingerprint(), TEST_KEY_FINGERPRINT);
    }

    #[test]
    fn invalid_key_rejected() {
        let result = KeyPairIssuer::new(
            "xy12345",
            "user",
            &SecretString::from("not a key".to_string()),
            std::time::Duration::from_secs(60),
            std::time::Duration::from_secs(60),
        );
        assert!(matches!(result, Err(AuthError::InvalidKey(_))));
    }

    #[test]
    fn token_lifetime() {
        let now = Utc::now();
        let token = issuer(TEST_KEY).issue_at(now).unwrap();
        assert_eq!(token.issued_at, now);
        assert_eq!(token.expires_at(), now + Duration::seconds(3600));
        assert_eq!(token.renew_at(), now + Duration::seconds(3000));
        assert_eq!(token.value.split('.').count(), 3);
        assert!(!format!("{:?}", token).contains(&token.value));
    }

    #[tokio::test]
    async fn session_issues_lazily_and_reuses() {
        let issuer = StaticTokenIssuer::new();
        let session = AuthSession::new(issuer.clone());
        assert_eq!(session.issued_count(), 0);

        let first = session.token().await.unwrap();
        let again = session.token().await.unwrap();
        assert_eq!(first, again);
        assert_eq!(session.issued_count(), 1);

        let refreshed = session.refresh().await.unwrap();
        assert_ne!(refreshed.value, first);
        assert_eq!(session.token().await.unwrap(), refreshed.value);
        assert_eq!(issuer.issued_count(), 2);
    }
}
