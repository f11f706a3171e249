//! Request signing for the authenticated feed.
//!
//! The server verifies an HMAC-SHA256 over the exact query string, so the
//! parameter order below is part of the protocol.

use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::Sha256;

use crate::error::{ConfigError, Result};
use crate::port::SignedRequest;

type HmacSha256 = Hmac<Sha256>;

/// Length of the random nonce sent as `random`.
pub const NONCE_LEN: usize = 16;

/// Produces signed connection requests from a key pair.
#[derive(Clone)]
pub struct Signer {
    api_key: String,
    api_secret: String,
    recv_window_ms: u64,
}

impl Signer {
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        recv_window_ms: u64,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            recv_window_ms,
        }
    }

    /// Canonical query: `timestamp`, `random`, `recvWindow`, `topic`, in
    /// that order, joined with `&`.
    #[must_use]
    pub fn canonical_query(&self, timestamp_ms: i64, nonce: &str, topic: &str) -> String {
        format!(
            "timestamp={timestamp_ms}&random={nonce}&recvWindow={}&topic={topic}",
            self.recv_window_ms
        )
    }

    /// Lowercase hex HMAC-SHA256 of `query` under the secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret cannot be used as an HMAC key.
    pub fn signature(&self, query: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "BINANCE_API_SECRET",
                reason: e.to_string(),
            }
        })?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Build a signed request for explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn sign(
        &self,
        base_url: &str,
        topic: &str,
        timestamp_ms: i64,
        nonce: &str,
    ) -> Result<SignedRequest> {
        let query = self.canonical_query(timestamp_ms, nonce, topic);
        let signature = self.signature(&query)?;
        Ok(SignedRequest {
            url: format!("{base_url}?{query}&signature={signature}"),
            api_key: self.api_key.clone(),
        })
    }

    /// Build a signed request with the current time and a fresh nonce.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn sign_now(&self, base_url: &str, topic: &str) -> Result<SignedRequest> {
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        self.sign(base_url, topic, timestamp_ms, &nonce())
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("recv_window_ms", &self.recv_window_ms)
            .finish_non_exhaustive()
    }
}

/// Random alphanumeric nonce of [`NONCE_LEN`] characters.
#[must_use]
pub fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPIC: &str = "com_announcement_en";
    const NONCE: &str = "abcdefghijklmnop";

    fn signer() -> Signer {
        Signer::new("public-key", "secret", 30_000)
    }

    #[test]
    fn canonical_query_has_fixed_order() {
        assert_eq!(
            signer().canonical_query(1_700_000_000_000, NONCE, TOPIC),
            "timestamp=1700000000000&random=abcdefghijklmnop&recvWindow=30000&topic=com_announcement_en"
        );
    }

    #[test]
    fn signature_matches_reference_hmac() {
        let signer = signer();
        let query = signer.canonical_query(1_700_000_000_000, NONCE, TOPIC);
        assert_eq!(
            signer.signature(&query).unwrap(),
            "cb2d94f3699fd9e9e6221d23d5c72c5c8661cec570c4a195d793bbb968083a23"
        );
    }

    #[test]
    fn signature_is_deterministic() {
        let a = signer().sign("wss://x", TOPIC, 1, NONCE).unwrap();
        let b = signer().sign("wss://x", TOPIC, 1, NONCE).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn any_parameter_change_changes_signature() {
        let signer = signer();
        let base = signer.sign("wss://x", TOPIC, 1, NONCE).unwrap().url;

        assert_ne!(base, signer.sign("wss://x", TOPIC, 2, NONCE).unwrap().url);
        assert_ne!(
            base,
            signer.sign("wss://x", TOPIC, 1, "bbcdefghijklmnop").unwrap().url
        );
        assert_ne!(base, signer.sign("wss://x", "other", 1, NONCE).unwrap().url);
        assert_ne!(
            base,
            Signer::new("public-key", "secret", 5_000)
                .sign("wss://x", TOPIC, 1, NONCE)
                .unwrap()
                .url
        );
        assert_ne!(
            base,
            Signer::new("public-key", "other-secret", 30_000)
                .sign("wss://x", TOPIC, 1, NONCE)
                .unwrap()
                .url
        );
    }

    #[test]
    fn signed_url_appends_signature_last() {
        let request = signer()
            .sign("wss://api.binance.com/sapi/wss", TOPIC, 1_700_000_000_000, NONCE)
            .unwrap();

        assert!(request.url.starts_with(
            "wss://api.binance.com/sapi/wss?timestamp=1700000000000&random=abcdefghijklmnop"
        ));
        assert!(request.url.ends_with(
            "&signature=cb2d94f3699fd9e9e6221d23d5c72c5c8661cec570c4a195d793bbb968083a23"
        ));
        assert_eq!(request.api_key, "public-key");
    }

    #[test]
    fn nonce_is_sixteen_alphanumerics() {
        let value = nonce();
        assert_eq!(value.len(), NONCE_LEN);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(value, nonce());
    }

    #[test]
    fn fresh_requests_differ() {
        let signer = signer();
        let a = signer.sign_now("wss://x", TOPIC).unwrap();
        let b = signer.sign_now("wss://x", TOPIC).unwrap();
        assert_ne!(a.url, b.url);
    }

    #[test]
    fn debug_hides_secret() {
        let rendered = format!("{:?}", signer());
        assert!(!rendered.contains("secret\""));
        assert!(!rendered.contains("public-key"));
    }
}
