use sha1::{Digest, Sha1};

/// Hash a canonical parameter string into the signature Cloudinary expects:
/// lowercase hex SHA-1 over the ordered `key=value` pairs with the shared
/// secret appended directly, no separator.
pub fn sign(params_to_sign: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(params_to_sign.as_bytes());
    hex::encode(hasher.finalize())
}

/// Canonical string for an upload request.
pub fn upload_params(timestamp: i64, api_secret: &str) -> String {
    format!("timestamp={timestamp}{api_secret}")
}

/// Canonical string for a destroy request. Parameters are ordered
/// alphabetically; the remote side rebuilds the same string to verify.
pub fn destroy_params(public_id: &str, timestamp: i64, api_secret: &str) -> String {
    format!("public_id={public_id}&timestamp={timestamp}{api_secret}")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn sign_produces_lowercase_hex_sha1() {
        // Well-known SHA-1 vector.
        assert_eq!(sign("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn sign_is_deterministic_and_fixed_length() {
        let first = sign("timestamp=1700000000secret");
        let second = sign("timestamp=1700000000secret");
        assert_eq!(first, second);
        assert_eq!(first.len(), 40);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn upload_params_appends_secret_without_separator() {
        assert_eq!(upload_params(1700000000, "s3cret"), "timestamp=1700000000s3cret");
    }

    #[test]
    fn destroy_params_orders_public_id_before_timestamp() {
        assert_eq!(
            destroy_params("folder/img", 1700000000, "s3cret"),
            "public_id=folder/img&timestamp=1700000000s3cret"
        );
    }
}
