//! SMS provider implementations and delivery assembly

pub mod console_sms;
pub mod factory;

pub use console_sms::ConsoleSmsProvider;
pub use factory::{build_failover_chain, create_dispatcher};
