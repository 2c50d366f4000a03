/// Tool Registry
///
/// The registry owns every callable tool together with the metadata clients
/// discover through `getMetadata`. It is filled once during startup and then
/// shared read-only (behind an `Arc`) with whichever transport serves requests.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use crate::core::error::ToolError;
use crate::core::schema::{Arguments, ParameterSchema, Signature, introspect};

/// Future returned by a tool handler.
pub type ToolFuture = BoxFuture<'static, Result<String, ToolError>>;

/// Tool handler function type definition.
///
/// Handlers receive the bound argument map and resolve to the text shown to
/// the caller, or to a `ToolError` whose message is reported verbatim.
pub type ToolHandler = Box<dyn Fn(Arguments) -> ToolFuture + Send + Sync>;

/// Stored record for one registered tool.
pub struct ToolDescriptor {
    name: String,
    description: String,
    schema: ParameterSchema,
    handler: ToolHandler,
}

impl ToolDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    /// Parameter names without a default, in declaration order.
    pub fn required(&self) -> &[String] {
        self.schema.required()
    }

    /// Start the handler with already bound arguments.
    pub fn invoke(&self, args: Arguments) -> ToolFuture {
        (self.handler)(args)
    }

    /// Entry of the `getMetadata` tools list.
    pub fn to_metadata(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.schema.to_json_schema(),
        })
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Registry of available tools.
///
/// Descriptors are kept in registration order for discovery, with a name
/// index for `execute` lookups. Registering a name again replaces the whole
/// descriptor but keeps its original position in the listing.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// The parameter schema and required list are derived from `signature`
    /// here, once, and cached in the descriptor. The description is trimmed.
    pub fn register<F, Fut>(
        &mut self,
        name: impl Into<String>,
        description: &str,
        signature: Signature,
        handler: F,
    ) where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        let name = name.into();
        let descriptor = ToolDescriptor {
            name: name.clone(),
            description: description.trim().to_string(),
            schema: introspect(&signature),
            handler: Box::new(move |args| handler(args).boxed()),
        };
        match self.index.get(&name) {
            Some(&position) => {
                tracing::debug!(tool = %name, "replacing previously registered tool");
                self.tools[position] = descriptor;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(descriptor);
            }
        }
    }

    /// Find a tool by name.
    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&position| &self.tools[position])
    }

    /// All tools in registration order.
    pub fn list_all(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tools.iter().map(|t| t.name())).finish()
    }
}
