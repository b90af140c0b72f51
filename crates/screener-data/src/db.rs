//! 데이터베이스 핸들.
//!
//! 전역 커넥션 객체 대신 명시적으로 생성해 전달하는 핸들입니다.
//! 커넥션 풀 설정을 중앙화하고, 각 저장소는 이 핸들의 풀을 받아
//! 작업 단위로 커넥션을 획득/반납합니다.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::{DataError, Result};

/// 커넥션 풀 설정.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// 접속 URL (postgres://...)
    pub url: String,
    /// 최대 커넥션 수
    pub max_connections: u32,
    /// 커넥션 획득 타임아웃 (초)
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    /// 배치 파이프라인용 기본 설정.
    ///
    /// 단일 프로세스 순차 파이프라인이므로 작은 풀로 충분합니다.
    pub fn for_pipeline(url: String) -> Self {
        Self {
            url,
            max_connections: 10,
            acquire_timeout_secs: 30,
        }
    }
}

/// 명시적으로 생성되는 데이터베이스 핸들.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 설정에 따라 풀을 생성하고 연결 검증까지 수행.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DataError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }

    /// 내부 풀 참조.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
