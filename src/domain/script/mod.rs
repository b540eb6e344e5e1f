pub mod error;
pub mod parser;

pub use error::ScriptError;
pub use parser::parse_segments;
