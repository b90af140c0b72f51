//! 업스트림 데이터 소스 인터페이스.
//!
//! 파이프라인은 이 트레이트들만 의존하므로 테스트 더블로 대체할 수
//! 있습니다. 바 소스의 실패는 로그 텍스트가 아니라 심볼별 구조화
//! 레코드(`BarFetchFailure`)로 전달되어 프로세스 내에서 분류됩니다.

pub mod alpha_vantage;
pub mod yahoo;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use screener_core::{DailyBar, QuarterlyNetIncome};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use alpha_vantage::AlphaVantageClient;
pub use yahoo::YahooBarProvider;

/// 업스트림 상장 목록의 한 행.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListedInstrument {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    pub ipo_date: Option<NaiveDate>,
    /// 업스트림이 보고한 상태 문자열 (예: "Active")
    pub status: String,
}

/// 심볼별 조회 실패의 종류.
///
/// 소스가 종류를 직접 구분해 주면 그대로 싣고, 텍스트만 주는 소스는
/// `Unknown` + 메시지로 전달하여 분류기가 시그니처 매칭으로 판별합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// 상장폐지 신호
    Delisted,
    /// 잘못된/미지원 심볼
    InvalidSymbol,
    /// 요청 한도 초과
    RateLimited,
    /// 요청 타임아웃
    Timeout,
    /// 네트워크/프록시 오류
    Network,
    /// 분류 불가 (메시지 시그니처로 후처리)
    Unknown,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Delisted => "delisted",
            Self::InvalidSymbol => "invalid_symbol",
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// 심볼별 구조화 실패 레코드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarFetchFailure {
    pub symbol: String,
    pub kind: FailureKind,
    pub message: String,
}

impl BarFetchFailure {
    pub fn new(symbol: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            kind,
            message: message.into(),
        }
    }
}

/// 배치 바 조회 결과.
///
/// 성공한 심볼의 바와 실패한 심볼의 레코드를 함께 반환합니다.
/// 일부 심볼의 실패가 배치 전체를 실패시키지 않습니다.
#[derive(Debug, Default)]
pub struct BarBatch {
    /// 심볼별 일봉 (날짜 오름차순)
    pub bars: HashMap<String, Vec<DailyBar>>,
    /// 심볼별 실패
    pub failures: Vec<BarFetchFailure>,
}

/// 상장 목록 소스.
#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// 지역별 상장 종목 목록 조회.
    async fn fetch_instruments(&self, region: &str) -> Result<Vec<ListedInstrument>>;
}

/// 일봉 소스.
#[async_trait]
pub trait BarProvider: Send + Sync {
    /// 심볼 배치의 [start, end] 구간 일봉 조회.
    ///
    /// 심볼별 실패는 `BarBatch::failures`로 구분 가능해야 합니다.
    async fn fetch_bars(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BarBatch>;
}

/// 펀더멘털 소스.
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    /// 분기 정규화 순이익 시계열 조회 (최신 분기가 앞쪽).
    async fn fetch_quarterly_net_income(&self, symbol: &str) -> Result<Vec<QuarterlyNetIncome>>;
}
