//! 에러 타입 정의.

use std::fmt;

/// 파이프라인 에러 타입
#[derive(Debug)]
pub enum PipelineError {
    /// 데이터베이스 에러
    Database(sqlx::Error),
    /// 설정 에러
    Config(String),
    /// 데이터 소스 에러 (Alpha Vantage, Yahoo 등)
    DataSource(String),
    /// 일반 에러
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(e) => write!(f, "Database error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::DataSource(msg) => write!(f, "Data source error: {}", msg),
            Self::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

impl From<std::env::VarError> for PipelineError {
    fn from(err: std::env::VarError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<screener_data::DataError> for PipelineError {
    fn from(err: screener_data::DataError) -> Self {
        match err {
            screener_data::DataError::Connection(msg) => Self::Config(msg),
            screener_data::DataError::Query(msg) => {
                Self::Database(sqlx::Error::Protocol(msg))
            }
            screener_data::DataError::Upstream(msg) | screener_data::DataError::Parse(msg) => {
                Self::DataSource(msg)
            }
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for PipelineError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Other(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, PipelineError>;
