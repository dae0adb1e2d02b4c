// sra-core/src/remediation/fingerprint.rs
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Stable hex SHA-256 digest of one corrective change.
///
/// Two deliveries of the same finding that compute the same patch against the
/// same resource produce the same fingerprint, which is what gets written to
/// the finding's marks.
pub fn remediation_fingerprint(action: &str, resource: &str, patch: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(action.as_bytes());
    hasher.update([0u8]);
    hasher.update(resource.as_bytes());
    hasher.update([0u8]);
    // serde_json maps are ordered by key, so this text is canonical.
    hasher.update(patch.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
