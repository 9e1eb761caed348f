//! Payment-field integrity signing
//!
//! Wallet gateways and the merchant verify each other's payloads with a
//! digest over a canonical rendering of the fields. Both directions use
//! the same canonical form: field names sorted, joined as `key=value`
//! pairs with `&`, the signature field itself excluded. Which digest runs
//! over that string varies by provider integration, so the scheme is
//! per-gateway configuration rather than a single hardcoded algorithm.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

type HmacSha256 = Hmac<Sha256>;

/// Digest applied to the canonical field string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureScheme {
    /// HMAC-SHA256 keyed with the shared secret, lowercase hex output.
    #[default]
    HmacSha256,

    /// Plain SHA-256 over `canonical&secret`, lowercase hex output. Used
    /// by older salted-hash integrations.
    Sha256Salted,
}

impl SignatureScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            SignatureScheme::HmacSha256 => "hmac-sha256",
            SignatureScheme::Sha256Salted => "sha256-salted",
        }
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hmac-sha256" => Ok(SignatureScheme::HmacSha256),
            "sha256-salted" => Ok(SignatureScheme::Sha256Salted),
            other => Err(format!("unknown signature scheme '{}'", other)),
        }
    }
}

/// Canonical rendering of payment fields: sorted by name, `key=value`
/// joined with `&`, `signature_field` left out.
///
/// Builders and verifiers must produce byte-identical output for the same
/// fields, so this is the only place the form is defined.
pub fn canonical_string<'a, I>(fields: I, signature_field: &str) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut pairs: Vec<(&str, &str)> = fields
        .into_iter()
        .filter(|(key, _)| *key != signature_field)
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let mut out = String::new();
    for (i, (key, value)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(key);
        out.push('=');
        out.push_str(value);
    }
    out
}

/// Compute the signature for a canonical string.
pub fn sign(scheme: SignatureScheme, secret: &str, canonical: &str) -> String {
    match scheme {
        SignatureScheme::HmacSha256 => {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .expect("HMAC can take key of any size");
            mac.update(canonical.as_bytes());
            format!("{:x}", mac.finalize().into_bytes())
        }
        SignatureScheme::Sha256Salted => {
            let mut hasher = Sha256::new();
            hasher.update(canonical.as_bytes());
            hasher.update(b"&");
            hasher.update(secret.as_bytes());
            format!("{:x}", hasher.finalize())
        }
    }
}

/// Check a supplied signature against the recomputed one.
///
/// HMAC verification is constant-time. Hex case is ignored, gateways are
/// inconsistent about it.
pub fn verify(
    scheme: SignatureScheme,
    secret: &str,
    canonical: &str,
    supplied: &str,
) -> bool {
    match scheme {
        SignatureScheme::HmacSha256 => {
            let Ok(supplied_bytes) = hex::decode(supplied) else {
                return false;
            };
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .expect("HMAC can take key of any size");
            mac.update(canonical.as_bytes());
            mac.verify_slice(&supplied_bytes).is_ok()
        }
        SignatureScheme::Sha256Salted => {
            sign(scheme, secret, canonical).eq_ignore_ascii_case(supplied)
        }
    }
}
