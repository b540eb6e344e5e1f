#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("podcast script is empty")]
    Empty,
    #[error("could not parse podcast script as segment JSON: {preview}...")]
    Format { preview: String },
}
