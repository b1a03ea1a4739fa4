mod auth_error;
mod dispatch_error;
mod mcp_error;
mod tool_error;

pub use auth_error::AuthError;
pub use dispatch_error::DispatchError;
pub use mcp_error::ErrorCode;
pub use tool_error::{ToolError, ToolErrorKind};
