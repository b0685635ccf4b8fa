//! Error types for the Salesforce MCP bridge
//!
//! This module provides structured error definitions using thiserror and
//! classifies them for the MCP layer: validation problems are reported back to
//! the caller before any remote call, remote failures become error tool
//! results, and internal errors abort only the request that raised them.

use thiserror::Error;

/// Main error type for Salesforce MCP operations
#[derive(Error, Debug)]
pub enum SalesforceMcpError {
    /// Tool argument missing or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Tool name not present in the catalog
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Salesforce rejected the request (text preserved verbatim)
    #[error("{0}")]
    Remote(String),

    /// Login to Salesforce failed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Programming defect detected while serving a single request
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SalesforceMcpError {
    /// Shorthand for a validation error naming the offending field.
    pub fn invalid(field: &str, reason: impl std::fmt::Display) -> Self {
        SalesforceMcpError::Validation(format!("{}: {}", field, reason))
    }

    /// Whether the failure came from the Salesforce side of the session.
    ///
    /// These are surfaced as `status: error` tool results instead of protocol errors.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SalesforceMcpError::Remote(_) | SalesforceMcpError::Http(_) | SalesforceMcpError::Auth(_)
        )
    }
}

/// Result type alias for Salesforce MCP operations
pub type Result<T> = std::result::Result<T, SalesforceMcpError>;
