/// Core Server Framework Module
///
/// This module contains the protocol engine:
/// - schema.rs: declared tool signatures and the schemas derived from them
/// - registry.rs: the tool registry and handler types
/// - protocol.rs: JSON-RPC request/response envelopes and error codes
/// - dispatcher.rs: the stateless method dispatcher
/// - server.rs: STDIO and HTTP transports
/// - utils.rs: configuration loading
/// - error.rs: tool and server error types

pub mod dispatcher;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod schema;
pub mod server;
pub mod utils;
