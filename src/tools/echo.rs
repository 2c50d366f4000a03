/// Echo Tool Implementation
///
/// The echo tool takes a `text` parameter and returns it, optionally with a
/// configurable prefix from the `tools.echo.prefix` configuration value.

use crate::core::error::ToolError;
use crate::core::registry::ToolRegistry;
use crate::core::schema::{Arguments, Signature, str_arg};
use crate::core::utils::{self, Config};

/// Register the echo tool with the tool registry.
pub fn register(registry: &mut ToolRegistry, config: &Config) {
    let prefix = utils::get_tool_config(config, "echo")
        .get("prefix")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    registry.register(
        "echo",
        "Echo a message back to the client.",
        Signature::new().arg::<String>("text"),
        move |args| echo(prefix.clone(), args),
    );
}

async fn echo(prefix: String, args: Arguments) -> Result<String, ToolError> {
    let text = str_arg(&args, "text")?;
    if prefix.is_empty() {
        return Ok(text.to_string());
    }
    let mut result = String::with_capacity(prefix.len() + text.len());
    result.push_str(&prefix);
    result.push_str(text);
    Ok(result)
}
