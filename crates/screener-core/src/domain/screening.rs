//! 스크리닝 상태 머신.
//!
//! 단계별 불리언 플래그 대신 명시적 유한 상태 enum으로 모델링하여
//! "단계별 생존 집합은 단조 감소한다"는 불변식을 타입 수준에서
//! 검사 가능하게 합니다. 영속 테이블의 플래그 컬럼은 이 상태의
//! 투영(projection)입니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 한 실행(run) 내 종목의 스크리닝 진행 상태.
///
/// `Unscreened → StructuralPass → TrendPass → GrowthPass → PatternPass`
/// 순서로만 전진하며, 어느 단계에서든 탈락(정지)할 수 있습니다.
/// 파생 순서(Ord)가 곧 통과 단계의 포함 관계입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningStage {
    /// 아직 어떤 필터도 통과하지 못함
    Unscreened,
    /// 1단계: 구조 필터 통과 (정배열 + 52주 고저 거리)
    StructuralPass,
    /// 2단계: MA200 추세 유의성 통과
    TrendPass,
    /// 3단계: 분기 순이익 성장 통과
    GrowthPass,
    /// 4단계: 컵앤핸들 패턴 통과
    PatternPass,
}

impl ScreeningStage {
    /// 플래그 투영: passed_structural 컬럼 값.
    pub fn passed_structural(&self) -> bool {
        *self >= Self::StructuralPass
    }

    /// 플래그 투영: ma_200_up_trend 컬럼 값.
    pub fn ma_200_up_trend(&self) -> bool {
        *self >= Self::TrendPass
    }

    /// 플래그 투영: profit_up_trend 컬럼 값.
    pub fn profit_up_trend(&self) -> bool {
        *self >= Self::GrowthPass
    }

    /// 플래그 투영: cup_with_handle 컬럼 값.
    pub fn cup_with_handle(&self) -> bool {
        *self >= Self::PatternPass
    }

    /// 플래그 4개로부터 상태 복원.
    ///
    /// 스토리지의 불리언 표현은 단조성을 강제하지 못하므로, 가장 높은
    /// 연속 통과 단계까지만 인정합니다 (하위 플래그가 꺼져 있으면 정지).
    pub fn from_flags(structural: bool, trend: bool, growth: bool, pattern: bool) -> Self {
        if !structural {
            return Self::Unscreened;
        }
        if !trend {
            return Self::StructuralPass;
        }
        if !growth {
            return Self::TrendPass;
        }
        if !pattern {
            return Self::GrowthPass;
        }
        Self::PatternPass
    }
}

/// 분기 순이익 관측치 (최신 분기가 앞쪽).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyNetIncome {
    /// 회계 분기 말일
    pub period: NaiveDate,
    /// 정규화 순이익
    pub value: Decimal,
}
