//! Configuration types and the machine file parser

pub mod schema;
pub mod toml;
pub mod types;

pub use self::toml::{parse_config, ParseError};
pub use types::*;
