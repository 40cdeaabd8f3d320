use std::path::PathBuf;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the application
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    ManifestError { file: PathBuf, message: String },
    InvalidArgument(String),
    SerializationError(String),
    /// An analyzer was asked to analyze a type that lacks its capability.
    /// This is a programming error at the call site, never a degraded case.
    CapabilityMismatch {
        identity: String,
        expected: &'static str,
        found: &'static str,
    },
    UnknownType(String),
    MissingMethod { controller: String, method: String },
    SourceUnavailable(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO 错误: {}", e),
            Error::ManifestError { file, message } => {
                write!(f, "清单解析错误 {}: {}", file.display(), message)
            }
            Error::InvalidArgument(msg) => write!(f, "无效参数: {}", msg),
            Error::SerializationError(msg) => write!(f, "序列化错误: {}", msg),
            Error::CapabilityMismatch {
                identity,
                expected,
                found,
            } => write!(
                f,
                "类型能力不匹配 {}: 需要 {}, 实际为 {}",
                identity, expected, found
            ),
            Error::UnknownType(identity) => write!(f, "未知类型: {}", identity),
            Error::MissingMethod { controller, method } => {
                write!(f, "找不到方法元数据: {}::{}", controller, method)
            }
            Error::SourceUnavailable(msg) => write!(f, "无法读取源码: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON 序列化错误: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML 序列化错误: {}", err))
    }
}
