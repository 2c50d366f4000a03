/// JSON-RPC tool server.
///
/// Tools are registered once at startup with a declared parameter list, then
/// discovered with `getMetadata` and invoked with `execute` over a
/// newline-delimited stdin/stdout stream (or, alternatively, HTTP).

pub mod core;
pub mod tools;
