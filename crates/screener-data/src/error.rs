//! 데이터 계층 에러 타입.

use thiserror::Error;

/// 데이터 계층 에러.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("데이터베이스 연결 실패: {0}")]
    Connection(String),

    #[error("쿼리 실패: {0}")]
    Query(String),

    #[error("업스트림 요청 실패: {0}")]
    Upstream(String),

    #[error("업스트림 응답 파싱 실패: {0}")]
    Parse(String),
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        Self::Query(err.to_string())
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.to_string())
    }
}

/// Result 타입 별칭.
pub type Result<T> = std::result::Result<T, DataError>;
