use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// The shared secret the gateway sends with every postback.
///
/// Candidates are compared in constant time by verifying an HMAC tag of the
/// configured secret, keyed with random bytes chosen at startup. An empty
/// configured secret never authorizes anything.
#[derive(Clone)]
pub struct PostingKey {
    mac_key: [u8; 32],
    expected_tag: Option<Vec<u8>>,
}

impl PostingKey {
    pub fn new(secret: &str) -> Self {
        let mut mac_key = [0u8; 32];
        mac_key[..16].copy_from_slice(Uuid::new_v4().as_bytes());
        mac_key[16..].copy_from_slice(Uuid::new_v4().as_bytes());

        let expected_tag = if secret.is_empty() {
            None
        } else {
            let mut mac = new_mac(&mac_key);
            mac.update(secret.as_bytes());
            Some(mac.finalize().into_bytes().to_vec())
        };

        Self {
            mac_key,
            expected_tag,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.expected_tag.is_some()
    }

    pub fn verify(&self, candidate: &str) -> bool {
        let Some(expected_tag) = &self.expected_tag else {
            return false;
        };
        if candidate.is_empty() {
            return false;
        }

        let mut mac = new_mac(&self.mac_key);
        mac.update(candidate.as_bytes());
        mac.verify_slice(expected_tag).is_ok()
    }
}

impl fmt::Debug for PostingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostingKey")
            .field("configured", &self.is_configured())
            .finish()
    }
}

fn new_mac(key: &[u8]) -> HmacSha256 {
    // HMAC takes keys of any length
    <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC key of any size is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exact_secret() {
        let key = PostingKey::new("k1");
        assert!(key.verify("k1"));
    }

    #[test]
    fn rejects_other_values() {
        let key = PostingKey::new("k1");
        assert!(!key.verify("wrong"));
        assert!(!key.verify("K1"));
        assert!(!key.verify("k1 "));
        assert!(!key.verify(""));
    }

    #[test]
    fn empty_configured_secret_rejects_everything() {
        let key = PostingKey::new("");
        assert!(!key.is_configured());
        assert!(!key.verify(""));
        assert!(!key.verify("anything"));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let key = PostingKey::new("super-secret");
        let printed = format!("{:?}", key);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("configured: true"));
    }
}
