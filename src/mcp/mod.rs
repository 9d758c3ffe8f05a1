//! MCP (Model Context Protocol) implementation.

pub mod server;
mod tools;

pub use server::{create_mcp_server, McpServer};
pub use tools::{Tool, ToolHandler, ToolRegistry};
