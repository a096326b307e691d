//! IPN signature verification.
//!
//! The gateway signs callbacks with HMAC-SHA512 and sends the hex digest in
//! the `x-nowpayments-sig` header. The digest is computed over the JSON body
//! re-serialized with keys sorted and compact separators, which usually
//! differs from the bytes on the wire. Both forms are accepted.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use sha2::Sha512;
use std::fmt::Write as _;
use subtle::ConstantTimeEq;

use super::webhook_errors::WebhookError;

/// Header carrying the IPN signature.
pub const SIGNATURE_HEADER: &str = "x-nowpayments-sig";

/// Which byte representation matched the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    Raw,
    Canonical,
}

/// Verifier for IPN callback signatures.
#[derive(Clone)]
pub struct IpnVerifier {
    secret: SecretString,
    canonical_fallback: bool,
}

impl IpnVerifier {
    /// Creates a verifier accepting both raw and canonical signatures.
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            canonical_fallback: true,
        }
    }

    /// Enables or disables the canonical re-serialization check.
    pub fn with_canonical_fallback(mut self, enabled: bool) -> Self {
        self.canonical_fallback = enabled;
        self
    }

    /// Verifies a callback signature.
    ///
    /// # Errors
    ///
    /// - `SecretNotConfigured` if the secret is blank
    /// - `MissingSignature` if the header is absent or blank
    /// - `InvalidSignature` if neither form matches
    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<SignatureScheme, WebhookError> {
        let secret = self.secret.expose_secret();
        if secret.trim().is_empty() {
            return Err(WebhookError::SecretNotConfigured);
        }

        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(WebhookError::MissingSignature)?;

        let provided = hex::decode(signature).map_err(|_| WebhookError::InvalidSignature)?;

        if let Some(expected) = hmac_sha512(secret, body) {
            if constant_time_compare(&expected, &provided) {
                return Ok(SignatureScheme::Raw);
            }
        }

        if self.canonical_fallback {
            if let Ok(value) = serde_json::from_slice::<Value>(body) {
                let canonical = canonical_json(&value);
                if let Some(expected) = hmac_sha512(secret, canonical.as_bytes()) {
                    if constant_time_compare(&expected, &provided) {
                        return Ok(SignatureScheme::Canonical);
                    }
                }
            }
        }

        Err(WebhookError::InvalidSignature)
    }
}

/// Hex-encoded HMAC-SHA512 of `payload`.
///
/// Used by the mock gateway and tests to produce valid callbacks.
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    hmac_sha512(secret, payload).map(hex::encode).unwrap_or_default()
}

fn hmac_sha512(secret: &str, payload: &[u8]) -> Option<Vec<u8>> {
    let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Serializes JSON with sorted keys, `,`/`:` separators, and all
/// non-printable-ASCII characters escaped as `\uXXXX`.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_escaped(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_escaped(key, out);
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
    }
}

fn write_escaped(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            ' '..='~' => out.push(ch),
            _ => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{:04x}", unit);
                }
            }
        }
    }
    out.push('"');
}
