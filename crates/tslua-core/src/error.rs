use rhizome_tslua_syntax_typescript::ParseError;
use rhizome_tslua_transform::TransformError;
use thiserror::Error;

/// Errors that stop a file from being transpiled.
#[derive(Debug, Error)]
pub enum TranspileError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("source map error: {0}")]
    SourceMap(#[from] serde_json::Error),
}
