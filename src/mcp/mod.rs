//! Model Context Protocol (MCP) server implementation
//!
//! Provides a JSON-RPC 2.0 server over stdio (and optionally HTTP) exposing
//! nine Salesforce tools for sales and support work.

pub mod arguments;
pub mod http;
pub mod protocol;
pub mod server;
pub mod tools;

pub use arguments::{ToolCall, ToolName};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use server::McpServer;
pub use tools::{tool_catalog, Tool, ToolHandler};
