//! Configuration module
//!
//! Handles CLI configuration such as the server URL.

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the Express Animate server
    pub server_url: String,
}
