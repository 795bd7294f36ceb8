//! Redis-backed one-time-code cache
//!
//! Both operations run as single Lua scripts so the cooldown check, the
//! write, and the attempt accounting cannot interleave across instances.
//! Codes are stored as SHA-256 digests; the plaintext never reaches the
//! store.

use async_trait::async_trait;
use redis::Script;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, error};

use relay_core::services::verification::CodeCache;
use relay_core::{DomainError, DomainResult};
use relay_shared::config::verification::VerificationConfig;

use crate::cache::redis_client::RedisClient;
use crate::InfrastructureError;

/// Stores a fresh code unless one was issued inside the cooldown.
///
/// TTL -1 (a key that lost its expiry) is reported as corruption and
/// never repaired; TTL -2 (no key) or a TTL below the resend threshold
/// admits the write. The attempt counter is reset alongside the code and
/// shares its expiry.
const SET_CODE_SCRIPT: &str = r#"
local key = KEYS[1]
local cntKey = KEYS[2]
local val = ARGV[1]
local threshold = tonumber(ARGV[2])
local codeTtl = tonumber(ARGV[3])
local maxAttempts = tonumber(ARGV[4])
local ttl = tonumber(redis.call("ttl", key))
if ttl == -1 then
    return -2
elseif ttl == -2 or ttl < threshold then
    redis.call("set", key, val)
    redis.call("expire", key, codeTtl)
    redis.call("set", cntKey, maxAttempts)
    redis.call("expire", cntKey, codeTtl)
    return 0
else
    return -1
end
"#;

/// Compares a candidate against the stored digest while spending the
/// attempt budget. A match zeroes the counter so the code verifies at
/// most once; KEEPTTL leaves the counter on the same expiry as the code
/// key instead of making it immortal. A mismatch decrements it. An
/// exhausted or missing counter refuses the comparison outright.
const VERIFY_CODE_SCRIPT: &str = r#"
local key = KEYS[1]
local cntKey = KEYS[2]
local expected = redis.call("get", key)
local cnt = tonumber(redis.call("get", cntKey))
if cnt == nil or cnt <= 0 then
    return -1
end
if expected == ARGV[1] then
    redis.call("set", cntKey, 0, "KEEPTTL")
    return 0
else
    redis.call("decr", cntKey)
    return -2
end
"#;

/// Redis implementation of the code cache
pub struct RedisCodeCache {
    client: Arc<RedisClient>,
    config: VerificationConfig,
    set_script: Script,
    verify_script: Script,
}

impl RedisCodeCache {
    /// Create a new code cache over an existing client
    pub fn new(client: Arc<RedisClient>, config: VerificationConfig) -> Self {
        Self {
            client,
            config,
            set_script: Script::new(SET_CODE_SCRIPT),
            verify_script: Script::new(VERIFY_CODE_SCRIPT),
        }
    }

    fn code_key(biz: &str, phone: &str) -> String {
        format!("phone_code:{}:{}", biz, phone)
    }
}

/// SHA-256 hex digest of a code, the only form stored
fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl CodeCache for RedisCodeCache {
    async fn store_code(&self, biz: &str, phone: &str, code: &str) -> DomainResult<()> {
        let key = Self::code_key(biz, phone);
        let cnt_key = format!("{}:cnt", key);
        let mut conn = self.client.connection();

        let verdict: i64 = self
            .set_script
            .key(&key)
            .key(&cnt_key)
            .arg(hash_code(code))
            .arg(self.config.resend_threshold_seconds())
            .arg(self.config.code_ttl_seconds)
            .arg(self.config.max_attempts)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| DomainError::from(InfrastructureError::Cache(e)))?;

        match verdict {
            0 => {
                debug!(biz, "verification code stored");
                Ok(())
            }
            -1 => Err(DomainError::TooManySends),
            -2 => {
                error!(key = %key, "code key has no expiry; refusing to overwrite");
                Err(DomainError::CodeIntegrity { key })
            }
            other => Err(DomainError::Internal {
                message: format!("unexpected set_code verdict: {}", other),
            }),
        }
    }

    async fn verify_code(&self, biz: &str, phone: &str, code: &str) -> DomainResult<bool> {
        let key = Self::code_key(biz, phone);
        let cnt_key = format!("{}:cnt", key);
        let mut conn = self.client.connection();

        let verdict: i64 = self
            .verify_script
            .key(&key)
            .key(&cnt_key)
            .arg(hash_code(code))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| DomainError::from(InfrastructureError::Cache(e)))?;

        match verdict {
            0 => Ok(true),
            -2 => Ok(false),
            -1 => Err(DomainError::TooManyVerifyAttempts),
            other => Err(DomainError::Internal {
                message: format!("unexpected verify_code verdict: {}", other),
            }),
        }
    }
}
