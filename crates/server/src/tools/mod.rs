//! MCP tool implementations.
//!
//! This module contains all tools exposed by the mcp-swcache server.

pub mod cache;
pub mod sw_fetch;
pub mod sw_message;

use crate::error::ToolError;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

/// Encode `output` as the tool's single pretty-printed JSON text block.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, ToolError> {
    let json = serde_json::to_string_pretty(output)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
