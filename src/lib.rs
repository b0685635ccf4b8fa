//! Salesforce MCP - Sales and Service Cloud tools for LLM agents
//!
//! A Model Context Protocol server that lets an agent work with Salesforce
//! through a fixed catalog of nine tools:
//! - Contact, account and opportunity lookups
//! - Activity logging
//! - Case lookup, creation and commenting
//! - Global search across the main objects
//!
//! # Architecture
//!
//! The system is organized into several layers:
//! - **Types**: Object catalog, record ids, structured tool results
//! - **Query**: Injection-safe SOQL/SOSL construction
//! - **Normalize**: Shaping record sets into `ok` / `not_found` / `ambiguous` results
//! - **Salesforce**: The `SessionHandle` seam and its REST implementation
//! - **MCP**: JSON-RPC server, typed tool arguments and handlers
//!
//! # Example
//!
//! ```ignore
//! use salesforce_mcp::{salesforce, ConfigOverrides, McpServer, SalesforceConfig, ToolHandler};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> salesforce_mcp::Result<()> {
//!     let config = SalesforceConfig::load(None, ConfigOverrides::default())?;
//!     let session = salesforce::login(&config).await?;
//!     let handler = ToolHandler::new(Arc::new(session));
//!     McpServer::new(handler).run().await
//! }
//! ```

pub mod config;
pub mod error;
pub mod mcp;
pub mod normalize;
pub mod query;
pub mod salesforce;
pub mod types;

// Re-export commonly used types
pub use crate::config::{ConfigOverrides, SalesforceConfig};
pub use error::{Result, SalesforceMcpError};
pub use mcp::{McpServer, ToolHandler};
pub use normalize::Normalizer;
pub use query::{QuerySpec, SearchSpec};
pub use salesforce::{RestSession, SessionHandle};
pub use types::{CandidateSummary, ObjectType, RecordId, RemoteRecord, ToolResult, ToolStatus};
