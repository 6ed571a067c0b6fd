// apps/payout_console/src/services/signature.rs

//! HMAC-SHA256 signatures for processor webhooks: hex digest of the raw
//! request body, sent in the `Processor-Signature` header.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Processor-Signature";

fn mac_for(secret: &str, payload: &[u8]) -> Option<HmacSha256> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
  mac.update(payload);
  Some(mac)
}

/// Hex signature for `payload`, as the processor computes it.
#[cfg(test)]
pub fn sign(secret: &str, payload: &[u8]) -> String {
  mac_for(secret, payload)
    .map(|mac| hex::encode(mac.finalize().into_bytes()))
    .unwrap_or_default()
}

/// Constant-time check of a hex signature, with or without a `sha256=` prefix.
pub fn verify(secret: &str, payload: &[u8], signature: &str) -> bool {
  let Ok(expected) = hex::decode(signature.trim().trim_start_matches("sha256=")) else {
    return false;
  };
  mac_for(secret, payload).map_or(false, |mac| mac.verify_slice(&expected).is_ok())
}
