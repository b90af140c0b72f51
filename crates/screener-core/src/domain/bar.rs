//! 일봉(PriceBar) 도메인 타입.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 가격 저장소 모드.
///
/// realtime/history는 동일 스키마의 서로 분리된 두 저장소이며,
/// 모드 플래그로 선택합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceStore {
    /// 최근 구간용 (기본 룩백 365일)
    Realtime,
    /// 전체 이력용 (기본 시작점 2000-01-01)
    History,
}

impl PriceStore {
    /// 모드별 테이블명.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Realtime => "daily_prices_realtime",
            Self::History => "daily_prices_history",
        }
    }
}

impl std::fmt::Display for PriceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Realtime => write!(f, "realtime"),
            Self::History => write!(f, "history"),
        }
    }
}

/// 저장소에 기록되는 일봉.
///
/// (symbol, date)가 복합 키이며, 저장소마다 날짜당 최대 1개 바만 존재합니다.
/// 삽입 후 변경되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// 업스트림 바 소스가 반환하는 심볼 귀속 전의 일봉 행.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl DailyBar {
    /// 심볼을 부여하여 저장용 PriceBar로 변환.
    pub fn into_price_bar(self, symbol: &str) -> PriceBar {
        PriceBar {
            symbol: symbol.to_string(),
            date: self.date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}
