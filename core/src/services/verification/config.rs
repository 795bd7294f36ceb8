//! Configuration for the code service

/// Length of generated verification codes
pub const CODE_LENGTH: u32 = 6;

/// Configuration for the code service
#[derive(Debug, Clone)]
pub struct CodeServiceConfig {
    /// Provider template used for verification messages
    pub template_id: String,
}

impl Default for CodeServiceConfig {
    fn default() -> Self {
        Self {
            template_id: "login-code".to_string(),
        }
    }
}
