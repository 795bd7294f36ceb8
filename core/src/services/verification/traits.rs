//! Trait for code cache integration

use async_trait::async_trait;

use crate::errors::DomainResult;

/// Atomic one-time-code storage keyed by (business, recipient)
///
/// Both operations must execute as single atomic steps inside the shared
/// store. Client-side get-then-compare is disallowed: it races under
/// concurrent verification attempts for the same key.
#[async_trait]
pub trait CodeCache: Send + Sync {
    /// Store a code, enforcing the resend cooldown
    ///
    /// Outcomes, by priority: no entry, or an entry past the cooldown,
    /// is overwritten with a fresh TTL; an entry still inside the
    /// cooldown yields `TooManySends`; an entry with no TTL at all
    /// yields `CodeIntegrity` and is never repaired.
    async fn store_code(&self, biz: &str, phone: &str, code: &str) -> DomainResult<()>;

    /// Compare a candidate code, counting the attempt
    ///
    /// Returns `Ok(true)` on a match, `Ok(false)` on a mismatch,
    /// `TooManyVerifyAttempts` once the attempt cap is spent or no code
    /// is stored. A successful match consumes the remaining attempts so
    /// the code cannot be verified twice.
    async fn verify_code(&self, biz: &str, phone: &str, code: &str) -> DomainResult<bool>;
}
