use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Calculate the base64-encoded HMAC-SHA256 signature that Shopify attaches to its webhook deliveries.
///
/// Returns `None` when the key cannot be used. Callers must treat that as a failed check, never as a match.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> Option<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(data);
    Some(base64::encode(mac.finalize().into_bytes()))
}
