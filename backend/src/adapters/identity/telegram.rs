//! Telegram WebApp `initData` verification.
//!
//! The Mini App forwards `Telegram.WebApp.initData` verbatim in the
//! `X-Telegram-Init-Data` header. It is a urlencoded query string whose
//! `hash` field is an HMAC-SHA256 over the remaining fields:
//!
//! ```text
//! secret_key       = HMAC_SHA256(key = "WebAppData", msg = bot_token)
//! data_check_string = sorted("key=value" for every field except hash).join("\n")
//! hash             = hex(HMAC_SHA256(key = secret_key, msg = data_check_string))
//! ```
//!
//! Older clients derived `secret_key` as `SHA256(bot_token)`; both are
//! accepted. The `user` field is JSON and its `id` becomes the `UserId`.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Duration;
use subtle::ConstantTimeEq;

use crate::domain::foundation::UserId;
use crate::ports::{IdentityError, UserIdentityValidator};

pub const INIT_DATA_HEADER: &str = "x-telegram-init-data";

const WEB_APP_KEY: &[u8] = b"WebAppData";
const DEFAULT_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Verifies Telegram WebApp `initData` signed with the bot token.
#[derive(Clone)]
pub struct TelegramInitDataValidator {
    bot_token: SecretString,
    max_age: Duration,
}

impl TelegramInitDataValidator {
    pub fn new(bot_token: SecretString) -> Self {
        Self {
            bot_token,
            max_age: DEFAULT_MAX_AGE,
        }
    }

    /// Sets the maximum accepted `auth_date` age. Zero disables the check.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    fn verify_at(&self, init_data: &str, now_secs: i64) -> Result<UserId, IdentityError> {
        let fields = parse_fields(init_data)?;

        let received = fields
            .get("hash")
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .ok_or_else(|| IdentityError::invalid("initData has no hash"))?;
        let received = hex::decode(received).map_err(|_| IdentityError::invalid("hash is not hex"))?;

        let check_string = data_check_string(&fields);
        let token = self.bot_token.expose_secret().as_bytes();
        let matches = secret_keys(token)
            .iter()
            .filter_map(|key| hmac_sha256(key, check_string.as_bytes()))
            .any(|expected| constant_time_compare(&expected, &received));
        if !matches {
            return Err(IdentityError::invalid("signature mismatch"));
        }

        if let Some(auth_date) = fields.get("auth_date").and_then(|d| d.trim().parse::<i64>().ok()) {
            let max_age = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
            if max_age > 0 && now_secs.saturating_sub(auth_date) > max_age {
                return Err(IdentityError::Expired);
            }
        }

        let user = fields
            .get("user")
            .filter(|u| !u.is_empty())
            .ok_or_else(|| IdentityError::invalid("initData has no user"))?;
        let user: Value =
            serde_json::from_str(user).map_err(|_| IdentityError::invalid("user is not JSON"))?;
        user.get("id")
            .and_then(Value::as_i64)
            .filter(|id| *id > 0)
            .map(UserId::new)
            .ok_or_else(|| IdentityError::invalid("user has no id"))
    }
}

impl std::fmt::Debug for TelegramInitDataValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramInitDataValidator")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl UserIdentityValidator for TelegramInitDataValidator {
    fn credential_header(&self) -> &'static str {
        INIT_DATA_HEADER
    }

    async fn validate(&self, credential: &str) -> Result<UserId, IdentityError> {
        if self.bot_token.expose_secret().trim().is_empty() {
            return Err(IdentityError::invalid("bot token is not configured"));
        }
        self.verify_at(credential.trim(), Utc::now().timestamp())
    }
}

/// Produces signed `initData` for the given fields.
///
/// Used by tests and local tooling to impersonate the Mini App.
pub fn sign_init_data(bot_token: &str, fields: &[(&str, &str)]) -> String {
    let map: BTreeMap<String, String> = fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let check_string = data_check_string(&map);
    let hash = secret_keys(bot_token.as_bytes())
        .first()
        .and_then(|key| hmac_sha256(key, check_string.as_bytes()))
        .map(hex::encode)
        .unwrap_or_default();

    let mut pairs: Vec<(&str, &str)> = fields.to_vec();
    pairs.push(("hash", hash.as_str()));
    serde_urlencoded::to_string(pairs).unwrap_or_default()
}

/// First value wins for repeated keys.
fn parse_fields(init_data: &str) -> Result<BTreeMap<String, String>, IdentityError> {
    if init_data.is_empty() {
        return Err(IdentityError::Missing);
    }
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(init_data)
        .map_err(|_| IdentityError::invalid("initData is not urlencoded"))?;
    let mut fields = BTreeMap::new();
    for (key, value) in pairs {
        fields.entry(key).or_insert(value);
    }
    Ok(fields)
}

/// Sorted `key=value` lines of every field except `hash`.
fn data_check_string(fields: &BTreeMap<String, String>) -> String {
    let mut lines: Vec<String> = fields
        .iter()
        .filter(|(key, _)| key.as_str() != "hash")
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    lines.sort();
    lines.join("\n")
}

/// Current derivation first, then the legacy one.
fn secret_keys(bot_token: &[u8]) -> Vec<Vec<u8>> {
    let mut keys = Vec::with_capacity(2);
    if let Some(current) = hmac_sha256(WEB_APP_KEY, bot_token) {
        keys.push(current);
    }
    keys.push(Sha256::digest(bot_token).to_vec());
    keys
}

fn hmac_sha256(key: &[u8], payload: &[u8]) -> Option<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).ok()?;
    mac.update(payload);
    Some(mac.finalize().into_bytes().to_vec())
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT_TOKEN: &str = "123456:bot-token";
    const USER: &str = r#"{"id":279058397,"first_name":"Vlad"}"#;

    fn validator() -> TelegramInitDataValidator {
        TelegramInitDataValidator::new(SecretString::new(BOT_TOKEN.to_string()))
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    // ══════════════════════════════════════════════════════════════
    // Accepted
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn signed_init_data_resolves_user() {
        let auth_date = now().to_string();
        let init_data = sign_init_data(
            BOT_TOKEN,
            &[("query_id", "AAHdF6IQ"), ("user", USER), ("auth_date", &auth_date)],
        );

        let user_id = validator().validate(&init_data).await.unwrap();

        assert_eq!(user_id, UserId::new(279058397));
    }

    #[test]
    fn legacy_secret_key_is_accepted() {
        let fields = BTreeMap::from([
            ("auth_date".to_string(), "100".to_string()),
            ("user".to_string(), USER.to_string()),
        ]);
        let legacy_key = Sha256::digest(BOT_TOKEN.as_bytes()).to_vec();
        let hash = hex::encode(
            hmac_sha256(&legacy_key, data_check_string(&fields).as_bytes()).unwrap(),
        );
        let init_data = serde_urlencoded::to_string(vec![
            ("auth_date", "100"),
            ("user", USER),
            ("hash", hash.as_str()),
        ])
        .unwrap();

        assert_eq!(validator().verify_at(&init_data, 200), Ok(UserId::new(279058397)));
    }

    #[test]
    fn missing_auth_date_skips_age_check() {
        let init_data = sign_init_data(BOT_TOKEN, &[("user", USER)]);
        assert!(validator().verify_at(&init_data, i64::MAX).is_ok());
    }

    // ══════════════════════════════════════════════════════════════
    // Rejected
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn tampered_user_is_rejected() {
        let init_data = sign_init_data(BOT_TOKEN, &[("user", USER), ("auth_date", "100")]);
        let forged = init_data.replace("279058397", "1");

        let err = validator().verify_at(&forged, 100).unwrap_err();

        assert_eq!(err, IdentityError::invalid("signature mismatch"));
    }

    #[test]
    fn other_bot_token_is_rejected() {
        let init_data = sign_init_data("999:other", &[("user", USER)]);
        assert!(matches!(validator().verify_at(&init_data, 0), Err(IdentityError::Invalid(_))));
    }

    #[test]
    fn stale_auth_date_is_expired() {
        let init_data = sign_init_data(BOT_TOKEN, &[("user", USER), ("auth_date", "1000")]);

        assert_eq!(validator().verify_at(&init_data, 1000 + 86_401), Err(IdentityError::Expired));
        assert!(validator()
            .with_max_age(Duration::ZERO)
            .verify_at(&init_data, 1000 + 86_401)
            .is_ok());
    }

    #[test]
    fn missing_hash_or_user_is_rejected() {
        assert!(validator().verify_at("user=%7B%7D", 0).is_err());
        let no_user = sign_init_data(BOT_TOKEN, &[("auth_date", "5")]);
        assert_eq!(
            validator().verify_at(&no_user, 5),
            Err(IdentityError::invalid("initData has no user"))
        );
    }

    #[test]
    fn empty_init_data_is_missing() {
        assert_eq!(validator().verify_at("", 0), Err(IdentityError::Missing));
    }

    #[tokio::test]
    async fn blank_bot_token_fails_closed() {
        let init_data = sign_init_data("", &[("user", USER)]);
        let validator = TelegramInitDataValidator::new(SecretString::new(String::new()));
        assert!(validator.validate(&init_data).await.is_err());
    }
}
