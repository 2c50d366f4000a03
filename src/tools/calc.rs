/// Calculator Tool Implementation
///
/// Integer arithmetic on two operands. Shows integer, string and boolean
/// parameters, and parameters with defaults.

use crate::core::error::ToolError;
use crate::core::registry::ToolRegistry;
use crate::core::schema::{Arguments, Signature, bool_arg, int_arg, str_arg};

/// Register the calc tool with the tool registry.
pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        "calc",
        "Apply an arithmetic operation to two integers. operation is one of add, \
         subtract, multiply or divide (default: add). With verbose set, the whole \
         expression is returned instead of the value.",
        Signature::new()
            .arg::<i64>("a")
            .arg::<i64>("b")
            .arg_or("operation", "add")
            .arg_or("verbose", false),
        calc,
    );
}

async fn calc(args: Arguments) -> Result<String, ToolError> {
    let a = int_arg(&args, "a")?;
    let b = int_arg(&args, "b")?;
    let operation = str_arg(&args, "operation")?;
    let verbose = bool_arg(&args, "verbose")?;

    let (symbol, value) = match operation {
        "add" => ("+", a.checked_add(b)),
        "subtract" => ("-", a.checked_sub(b)),
        "multiply" => ("*", a.checked_mul(b)),
        "divide" if b == 0 => return Err(ToolError::failed("division by zero")),
        "divide" => ("/", a.checked_div(b)),
        other => {
            return Err(ToolError::failed(format!(
                "unknown operation '{other}', expected add, subtract, multiply or divide"
            )));
        }
    };
    let value = value.ok_or_else(|| ToolError::failed("integer overflow"))?;

    Ok(if verbose {
        format!("{a} {symbol} {b} = {value}")
    } else {
        value.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    async fn run(parameters: Value) -> Result<String, ToolError> {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let tool = registry.lookup("calc").unwrap();
        let Value::Object(map) = parameters else { panic!("parameters must be an object") };
        let bound = tool.schema().bind(map)?;
        tool.invoke(bound).await
    }

    #[tokio::test]
    async fn defaults_to_addition() {
        assert_eq!(run(json!({"a": 2, "b": 3})).await, Ok("5".to_string()));
    }

    #[tokio::test]
    async fn verbose_expression() {
        assert_eq!(
            run(json!({"a": 7, "b": 2, "operation": "multiply", "verbose": true})).await,
            Ok("7 * 2 = 14".to_string())
        );
    }

    #[tokio::test]
    async fn numeric_strings_are_accepted() {
        assert_eq!(run(json!({"a": "10", "b": "4", "operation": "subtract"})).await, Ok("6".to_string()));
    }

    #[tokio::test]
    async fn failures() {
        assert_eq!(
            run(json!({"a": 1, "b": 0, "operation": "divide"})).await,
            Err(ToolError::failed("division by zero"))
        );
        assert_eq!(
            run(json!({"a": i64::MAX, "b": 1})).await,
            Err(ToolError::failed("integer overflow"))
        );
        assert!(run(json!({"a": 1, "b": 2, "operation": "modulo"})).await.is_err());
    }

    #[test]
    fn schema_types() {
        let mut registry = ToolRegistry::new();
        register(&mut registry);
        let tool = registry.lookup("calc").unwrap();
        assert_eq!(
            tool.schema().to_json_schema(),
            json!({
                "type": "object",
                "properties": {
                    "a": { "type": "integer" },
                    "b": { "type": "integer" },
                    "operation": { "type": "string" },
                    "verbose": { "type": "boolean" }
                },
                "required": ["a", "b"]
            })
        );
        assert!(tool.description().starts_with("Apply an arithmetic operation"));
    }
}
