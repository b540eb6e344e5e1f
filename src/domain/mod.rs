pub mod podcast;
pub mod script;
pub mod segment;
