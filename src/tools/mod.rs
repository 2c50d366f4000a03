/// Tools Module
///
/// Each tool lives in its own module and exports a `register` function that
/// adds it to the registry during server initialization.

pub mod calc;
pub mod echo;

use std::sync::Arc;

use crate::core::registry::ToolRegistry;
use crate::core::utils::Config;

/// Create the tool registry and register all available tools.
///
/// Add new tool registrations here following this pattern:
/// `your_tool::register(&mut registry);`
pub fn initialize_tools(config: &Config) -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    echo::register(&mut registry, config);
    calc::register(&mut registry);
    Arc::new(registry)
}
