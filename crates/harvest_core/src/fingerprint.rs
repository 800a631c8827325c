use std::fmt::Write;

use sha2::{Digest, Sha256};

/// Stable record id: uppercase hex SHA-256 of `title` followed by `date_text`.
///
/// Total for any input, including empty strings.
pub fn fingerprint(title: &str, date_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(date_text.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        let _ = write!(&mut hex, "{byte:02X}");
    }
    hex
}
