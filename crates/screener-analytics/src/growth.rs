//! 분기 순이익 성장 평가.

use rust_decimal::Decimal;
use screener_core::QuarterlyNetIncome;

/// 성장 필터 평가 결과.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrowthAssessment {
    /// YoY 성장률(%)과 최신 분기 흑자 여부가 모두 기준 충족
    Pass { growth_pct: Decimal },
    /// 성장률 계산은 됐으나 기준 미달 (성장률 ≤ 20% 또는 최신 분기 적자)
    Fail { growth_pct: Decimal },
    /// 성장률 정의 불가: 4분기 전 순이익이 0이거나, 분기 누락으로
    /// 기준 분기가 1년 전 근방이 아님 (실패 처리)
    CannotDetermine,
    /// 분기 데이터 5개 미만 (fail closed)
    InsufficientData,
}

impl GrowthAssessment {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Pass { .. })
    }
}

/// YoY 성장률 통과 기준 (%): 초과여야 통과 (경계값 탈락).
const MIN_GROWTH_PCT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// 기준 분기(4분기 전)로 인정할 최신 분기와의 최대 일수 차.
///
/// 업스트림이 값 없는 분기를 누락시키면 인덱스 4가 1년보다 훨씬
/// 과거일 수 있습니다. 52/53주 회계연도를 감안해 1년 + 약 5주까지
/// 허용합니다.
const MAX_BASE_QUARTER_GAP_DAYS: i64 = 400;

/// 분기 순이익 시계열(최신 분기가 앞쪽) 평가.
///
/// YoY 성장률 = (최신 − 4분기 전) / 4분기 전 × 100.
/// 통과 조건: 성장률 > 20% AND 최신 분기 순이익 > 0.
pub fn assess_profit_growth(quarters: &[QuarterlyNetIncome]) -> GrowthAssessment {
    if quarters.len() < 5 {
        return GrowthAssessment::InsufficientData;
    }

    let latest = quarters[0].value;
    let year_ago = quarters[4].value;

    // 분기 누락으로 기준 분기가 1년 전 근방이 아니면 YoY 비교 불가
    if (quarters[0].period - quarters[4].period).num_days() > MAX_BASE_QUARTER_GAP_DAYS {
        return GrowthAssessment::CannotDetermine;
    }

    if year_ago.is_zero() {
        return GrowthAssessment::CannotDetermine;
    }

    let growth_pct = (latest - year_ago) / year_ago * Decimal::ONE_HUNDRED;

    if growth_pct > MIN_GROWTH_PCT && latest > Decimal::ZERO {
        GrowthAssessment::Pass { growth_pct }
    } else {
        GrowthAssessment::Fail { growth_pct }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    /// 최신 분기가 앞에 오는 테스트 시계열 생성.
    fn quarters(values: &[Decimal]) -> Vec<QuarterlyNetIncome> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| QuarterlyNetIncome {
                period: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
                    - chrono::Duration::days(91 * i as i64),
                value: *v,
            })
            .collect()
    }

    /// 4분기 전 순이익 0: 산술 오류 없이 실패 처리.
    #[test]
    fn zero_base_quarter_fails_without_panic() {
        let q = quarters(&[dec!(50), dec!(40), dec!(30), dec!(20), dec!(0)]);
        assert_eq!(assess_profit_growth(&q), GrowthAssessment::CannotDetermine);
    }

    /// 정확히 20% 성장은 탈락 (엄격 부등호).
    #[test]
    fn exactly_twenty_percent_fails() {
        let q = quarters(&[dec!(120), dec!(110), dec!(105), dec!(102), dec!(100)]);
        let result = assess_profit_growth(&q);
        assert_eq!(
            result,
            GrowthAssessment::Fail {
                growth_pct: dec!(20)
            }
        );
    }

    /// 20.01% 성장 + 최신 분기 흑자는 통과.
    #[test]
    fn just_above_twenty_percent_passes() {
        let q = quarters(&[dec!(120.01), dec!(110), dec!(105), dec!(102), dec!(100)]);
        let result = assess_profit_growth(&q);
        assert!(result.passed());
        match result {
            GrowthAssessment::Pass { growth_pct } => assert_eq!(growth_pct, dec!(20.01)),
            other => panic!("예상 밖 결과: {:?}", other),
        }
    }

    /// 손실이 줄었어도 최신 분기 적자면 탈락.
    #[test]
    fn negative_latest_quarter_fails() {
        let q = quarters(&[dec!(-2), dec!(-4), dec!(-6), dec!(-8), dec!(-10)]);
        assert!(!assess_profit_growth(&q).passed());
    }

    /// 음수 기준 분기의 흑자 전환은 성장률 부호가 뒤집혀 탈락.
    #[test]
    fn negative_base_quarter_turnaround_fails() {
        // -10 → 50: 성장률 (50 − (−10)) / (−10) × 100 = −600% → 탈락
        let q = quarters(&[dec!(50), dec!(20), dec!(0), dec!(-5), dec!(-10)]);
        assert!(!assess_profit_growth(&q).passed());
    }

    /// 분기 누락으로 기준 분기가 1년보다 훨씬 과거면 판정 불가.
    #[test]
    fn gapped_base_quarter_cannot_determine() {
        let mut q = quarters(&[dec!(200), dec!(150), dec!(140), dec!(130), dec!(100)]);
        // 중간 분기 두 개가 빠져 기준 분기가 약 1년 반 전으로 밀린 상황
        q[4].period = q[0].period - chrono::Duration::days(91 * 6);
        assert_eq!(assess_profit_growth(&q), GrowthAssessment::CannotDetermine);
    }

    /// 분기 5개 미만은 fail closed.
    #[test]
    fn fewer_than_five_quarters_fails_closed() {
        let q = quarters(&[dec!(100), dec!(90), dec!(80), dec!(70)]);
        assert_eq!(assess_profit_growth(&q), GrowthAssessment::InsufficientData);
    }
}
