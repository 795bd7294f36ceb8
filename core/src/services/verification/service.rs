//! Code issuance and verification service

use rand::{rngs::OsRng, Rng};
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::{DomainError, DomainResult};
use crate::services::delivery::SmsProvider;

use super::config::{CodeServiceConfig, CODE_LENGTH};
use super::traits::CodeCache;

/// Service issuing and verifying one-time SMS codes
///
/// The cache enforces the cooldown and attempt cap atomically; this
/// service adds code generation, delivery, and the policy that an
/// exhausted attempt cap reads as a plain verification failure.
pub struct CodeService<C: CodeCache> {
    cache: Arc<C>,
    provider: Arc<dyn SmsProvider>,
    config: CodeServiceConfig,
}

impl<C: CodeCache> CodeService<C> {
    /// Create a new code service
    ///
    /// # Arguments
    ///
    /// * `cache` - Atomic code storage
    /// * `provider` - Delivery chain for the code message
    /// * `config` - Service configuration
    pub fn new(cache: Arc<C>, provider: Arc<dyn SmsProvider>, config: CodeServiceConfig) -> Self {
        Self {
            cache,
            provider,
            config,
        }
    }

    /// Issue a fresh code for (business, recipient) and deliver it
    ///
    /// Storage happens before delivery: a code that cannot be stored is
    /// never sent, and a `TooManySends` from the cooldown reaches the
    /// caller unchanged.
    pub async fn send_code(&self, biz: &str, phone: &str) -> DomainResult<()> {
        let code = generate_code();
        self.cache.store_code(biz, phone, &code).await?;

        self.provider
            .send(&self.config.template_id, &[code], &[phone.to_string()])
            .await?;

        info!(biz, phone = %mask_phone(phone), "verification code issued");
        Ok(())
    }

    /// Check a candidate code for (business, recipient)
    ///
    /// An exhausted attempt cap is collapsed into `Ok(false)`:
    /// verification failure is not a hard error, and the caller cannot
    /// distinguish a creative brute force from a typo. Store errors
    /// surface unchanged.
    pub async fn verify_code(&self, biz: &str, phone: &str, code: &str) -> DomainResult<bool> {
        match self.cache.verify_code(biz, phone, code).await {
            Ok(matched) => Ok(matched),
            Err(DomainError::TooManyVerifyAttempts) => {
                warn!(
                    biz,
                    phone = %mask_phone(phone),
                    "verification attempt cap exhausted"
                );
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

/// Generate a random numeric code of `CODE_LENGTH` digits
fn generate_code() -> String {
    let max = 10u32.pow(CODE_LENGTH);
    let value = OsRng.gen_range(0..max);
    format!("{:0width$}", value, width = CODE_LENGTH as usize)
}

/// Mask a phone number for logging (show only the last 4 digits)
fn mask_phone(phone: &str) -> String {
    if phone.len() <= 4 {
        "****".to_string()
    } else {
        format!("***{}", &phone[phone.len() - 4..])
    }
}
