//! Error types for each concern of the harness.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while sampling the flat render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HitTestError {
    #[error("sample rect ({x}, {y}, {width}x{height}) lies outside the {buffer_width}x{buffer_height} buffer")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        buffer_width: u32,
        buffer_height: u32,
    },
}

/// Failure while exporting a flat render.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("RGBA buffer of {len} bytes does not match {width}x{height}")]
    SizeMismatch { width: u32, height: u32, len: usize },
    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("log I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed log line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("log header is missing")]
    MissingHeader,
    #[error("logger already closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config schemaVersion: expected {expected}, got {actual}")]
    SchemaVersion { expected: u32, actual: u32 },
    #[error("unknown trial identifier: {0}")]
    UnknownTrial(String),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse script: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame {index} repeats {repeat} times, the limit is {max}")]
    RepeatTooLarge { index: usize, repeat: u32, max: u32 },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session directory already exists: {0}")]
    DirectoryExists(PathBuf),
    #[error("no output directory is available on this system")]
    NoOutputRoot,
    #[error("session I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Log(#[from] LogError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to export flat render {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: RenderError,
    },
    #[error("failed to construct trial {trial}: {reason}")]
    TrialConstruction { trial: String, reason: String },
    #[error("failed to load input script {path}: {source}")]
    InputScript {
        path: PathBuf,
        #[source]
        source: ScriptError,
    },
    #[error("failed to write session manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}
