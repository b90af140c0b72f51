//! 집계 스냅샷 도메인 타입.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 종목별 집계 스냅샷 (최신 거래일 기준).
///
/// 이동평균은 캘린더 일수가 아니라 바 개수 기준이며, 200개 바가 없는
/// 종목은 스냅샷에서 제외되므로 세 이동평균은 항상 정의되어 있습니다.
/// 매 실행마다 truncate 후 전체 재계산됩니다 (증분 갱신 없음).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub symbol: String,
    /// 최신 저장 거래일
    pub date: NaiveDate,
    /// 최신 종가
    pub current_price: Decimal,
    pub ma_50: Decimal,
    pub ma_150: Decimal,
    pub ma_200: Decimal,
    /// 저장 이력 전체의 최고 종가 ("52주"는 전체 이력으로 해석)
    pub high_52w: Decimal,
    /// 저장 이력 전체의 최저 종가
    pub low_52w: Decimal,
}
