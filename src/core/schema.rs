/// Tool Parameter Schemas
///
/// Tools declare their parameter list once, at registration time, through a
/// `Signature`. `introspect` turns that declaration into the `ParameterSchema`
/// advertised by `getMetadata`:
/// - integer types map to `"integer"`, `bool` maps to `"boolean"`, and every
///   other declared type falls back to `"string"`
/// - a parameter is required iff it was declared without a default
/// - a parameter named `self` is never advertised
///
/// The schema is also used to bind incoming `execute` arguments before the
/// handler runs (defaults filled in, unknown or missing names rejected).

use serde::Serialize;
use serde_json::{Map, Value, json};
use std::any::TypeId;

use crate::core::error::ToolError;

/// Named arguments passed to a tool handler.
pub type Arguments = Map<String, Value>;

/// Primitive JSON Schema types a parameter can be advertised as.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Boolean,
}

impl ParamType {
    /// Map a declared Rust type to its advertised schema type.
    ///
    /// Only exact integer primitives and `bool` are recognised. Wrappers such
    /// as `Option<i64>` are not unwrapped and therefore advertise `"string"`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        let id = TypeId::of::<T>();
        let integers = [
            TypeId::of::<i8>(),
            TypeId::of::<i16>(),
            TypeId::of::<i32>(),
            TypeId::of::<i64>(),
            TypeId::of::<i128>(),
            TypeId::of::<isize>(),
            TypeId::of::<u8>(),
            TypeId::of::<u16>(),
            TypeId::of::<u32>(),
            TypeId::of::<u64>(),
            TypeId::of::<u128>(),
            TypeId::of::<usize>(),
        ];
        if integers.contains(&id) {
            ParamType::Integer
        } else if id == TypeId::of::<bool>() {
            ParamType::Boolean
        } else {
            ParamType::String
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
        }
    }
}

/// One declared parameter of a tool handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub kind: ParamType,
    pub default: Option<Value>,
}

/// The declared parameter list of a tool handler, in declaration order.
///
/// ```ignore
/// let signature = Signature::new()
///     .arg::<String>("site_url")
///     .arg_or::<u32>("days", 28);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<ParamDecl>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter without a default (required).
    #[must_use]
    pub fn arg<T: ?Sized + 'static>(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamDecl {
            name: name.into(),
            kind: ParamType::of::<T>(),
            default: None,
        });
        self
    }

    /// Declare a parameter with a default value (optional).
    #[must_use]
    pub fn arg_or<T: Serialize + 'static>(mut self, name: impl Into<String>, default: T) -> Self {
        let default = serde_json::to_value(default).unwrap_or(Value::Null);
        self.params.push(ParamDecl {
            name: name.into(),
            kind: ParamType::of::<T>(),
            default: Some(default),
        });
        self
    }

    pub fn params(&self) -> &[ParamDecl] {
        &self.params
    }
}

/// Advertised parameter schema of a registered tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSchema {
    /// Parameter name and type, in declaration order.
    properties: Vec<(String, ParamType)>,
    /// Names declared without a default, in declaration order.
    required: Vec<String>,
    /// Default values of the optional parameters.
    defaults: Vec<(String, Value)>,
}

/// Derive the advertised schema from a declared parameter list.
///
/// Total: every signature produces a schema. A name declared twice keeps its
/// first position and takes the later declaration's type and default.
pub fn introspect(signature: &Signature) -> ParameterSchema {
    let mut decls: Vec<&ParamDecl> = Vec::with_capacity(signature.params.len());
    for decl in &signature.params {
        if decl.name == "self" {
            continue;
        }
        match decls.iter().position(|d| d.name == decl.name) {
            Some(index) => decls[index] = decl,
            None => decls.push(decl),
        }
    }

    let mut schema = ParameterSchema::default();
    for decl in decls {
        schema.properties.push((decl.name.clone(), decl.kind));
        match &decl.default {
            Some(default) => schema.defaults.push((decl.name.clone(), default.clone())),
            None => schema.required.push(decl.name.clone()),
        }
    }
    schema
}

impl ParameterSchema {
    pub fn properties(&self) -> impl Iterator<Item = (&str, ParamType)> {
        self.properties.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.iter().any(|(n, _)| n == name)
    }

    pub fn default_for(&self, name: &str) -> Option<&Value> {
        self.defaults.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// The `parameters` object of a `getMetadata` entry.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .properties
            .iter()
            .map(|(name, kind)| (name.clone(), json!({ "type": kind.as_str() })))
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }

    /// Bind call arguments against the schema.
    ///
    /// Absent optional parameters receive their declared default. Arguments
    /// that are not declared, and required parameters that are absent, fail
    /// the call before the handler runs.
    pub fn bind(&self, mut args: Arguments) -> Result<Arguments, ToolError> {
        if let Some(unknown) = args.keys().find(|key| !self.contains(key)) {
            return Err(ToolError::UnexpectedArgument(unknown.clone()));
        }
        if let Some(missing) = self.required.iter().find(|name| !args.contains_key(*name)) {
            return Err(ToolError::MissingArgument(missing.clone()));
        }
        for (name, default) in &self.defaults {
            if !args.contains_key(name) {
                args.insert(name.clone(), default.clone());
            }
        }
        Ok(args)
    }
}

/// Read a string argument.
pub fn str_arg<'a>(args: &'a Arguments, name: &str) -> Result<&'a str, ToolError> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ToolError::InvalidArgument { name: name.to_string(), expected: "a string" }),
        None => Err(ToolError::MissingArgument(name.to_string())),
    }
}

/// Read an integer argument. Numeric strings such as `"28"` are accepted.
pub fn int_arg(args: &Arguments, name: &str) -> Result<i64, ToolError> {
    let invalid = || ToolError::InvalidArgument { name: name.to_string(), expected: "an integer" };
    match args.get(name) {
        Some(Value::Number(n)) => n.as_i64().ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
        None => Err(ToolError::MissingArgument(name.to_string())),
    }
}

/// Read a boolean argument. The strings `"true"` and `"false"` are accepted.
pub fn bool_arg(args: &Arguments, name: &str) -> Result<bool, ToolError> {
    let invalid = || ToolError::InvalidArgument { name: name.to_string(), expected: "a boolean" };
    match args.get(name) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(invalid()),
        },
        Some(_) => Err(invalid()),
        None => Err(ToolError::MissingArgument(name.to_string())),
    }
}
