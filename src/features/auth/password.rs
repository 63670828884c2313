//! Salted password digests.
//!
//! Stored form: `hmac-sha256$<salt>$<hex digest>`, where the digest is
//! HMAC-SHA256 keyed with the salt over the password. Anything else is treated
//! as a legacy plain-text password.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const SCHEME: &str = "hmac-sha256";

pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = keyed(&salt, password).finalize().into_bytes();
    format!("{}${}${}", SCHEME, salt, hex::encode(digest))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match parse(stored) {
        Some((salt, expected)) => match hex::decode(expected) {
            Ok(expected) => keyed(salt, password).verify_slice(&expected).is_ok(),
            Err(_) => false,
        },
        // Legacy plain-text record
        None => !stored.is_empty() && stored == password,
    }
}

/// True when the stored value predates hashing and should be replaced
pub fn is_legacy(stored: &str) -> bool {
    parse(stored).is_none()
}

fn parse(stored: &str) -> Option<(&str, &str)> {
    let mut parts = stored.splitn(3, '$');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(SCHEME), Some(salt), Some(digest)) if !salt.is_empty() => Some((salt, digest)),
        _ => None,
    }
}

fn keyed(salt: &str, password: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(salt.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(password.as_bytes());
    mac
}
