//! RESP protocol support for the client side
//!
//! Only the reply types a server can send and the single frame shape a
//! client can send (arrays of bulk strings).

pub mod parser;
pub mod types;

pub use parser::Parser;
pub use types::{RespValue, encode_command};
