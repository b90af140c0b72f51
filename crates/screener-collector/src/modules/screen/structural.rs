//! 1단계: 구조 필터.
//!
//! 집계 스냅샷만으로 판정하는 저비용 필터입니다. 이동평균 정배열과
//! 이력 극값 대비 가격 위치를 검사하고, 통과 심볼로 판정 테이블을
//! 재시딩합니다.

use std::time::Instant;

use rust_decimal::Decimal;
use sqlx::PgPool;

use screener_core::AggregateSnapshot;
use screener_data::{AggregateStore, VerdictStore};

use crate::{Result, SyncStats};

/// 이력 최고가 대비 최소 가격 비율 (75% 이상).
const HIGH_PROXIMITY_RATIO: Decimal = Decimal::from_parts(75, 0, 0, false, 2);

/// 이력 최저가 대비 최소 상승 배수 (30% 이상).
const LOW_RECOVERY_MULTIPLE: Decimal = Decimal::from_parts(13, 0, 0, false, 1);

/// 구조 필터 판정
///
/// 통과 조건 (모두 만족):
/// - 현재가 > MA50 > MA150 > MA200 (정배열)
/// - 현재가 >= 이력 최고 종가의 75%
/// - 현재가 >= 이력 최저 종가의 130%
pub fn structural_pass(snapshot: &AggregateSnapshot) -> bool {
    let price = snapshot.current_price;

    let stacked = price > snapshot.ma_50
        && snapshot.ma_50 > snapshot.ma_150
        && snapshot.ma_150 > snapshot.ma_200;

    let near_high = price >= snapshot.high_52w * HIGH_PROXIMITY_RATIO;
    let off_low = price >= snapshot.low_52w * LOW_RECOVERY_MULTIPLE;

    stacked && near_high && off_low
}

/// 구조 필터 실행
pub async fn run_structural_filter(pool: &PgPool) -> Result<SyncStats> {
    let start = Instant::now();
    let mut stats = SyncStats::new();

    let aggregates = AggregateStore::new(pool.clone());
    let verdicts = VerdictStore::new(pool.clone());

    let snapshots = aggregates.load_all().await?;
    stats.total = snapshots.len();

    let survivors: Vec<String> = snapshots
        .iter()
        .filter(|s| structural_pass(s))
        .map(|s| s.symbol.clone())
        .collect();

    stats.success = survivors.len();

    verdicts.seed_structural(&survivors).await?;

    tracing::info!(
        candidates = snapshots.len(),
        survivors = survivors.len(),
        "구조 필터 완료"
    );

    stats.elapsed = start.elapsed();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn snapshot(
        price: Decimal,
        ma_50: Decimal,
        ma_150: Decimal,
        ma_200: Decimal,
        high: Decimal,
        low: Decimal,
    ) -> AggregateSnapshot {
        AggregateSnapshot {
            symbol: "TEST".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
            current_price: price,
            ma_50,
            ma_150,
            ma_200,
            high_52w: high,
            low_52w: low,
        }
    }

    /// 정배열 + 극값 조건을 모두 만족하면 통과
    #[test]
    fn stacked_averages_near_high_pass() {
        let s = snapshot(
            dec!(100),
            dec!(95),
            dec!(90),
            dec!(85),
            dec!(120),
            dec!(70),
        );
        assert!(structural_pass(&s));
    }

    /// 최저가 대비 상승 폭이 부족하면 탈락
    #[test]
    fn shallow_recovery_from_low_fails() {
        let s = snapshot(
            dec!(100),
            dec!(95),
            dec!(90),
            dec!(85),
            dec!(120),
            dec!(80),
        );
        // 100 < 80 * 1.3 = 104
        assert!(!structural_pass(&s));
    }

    /// 이동평균 역배열은 탈락
    #[test]
    fn inverted_average_stack_fails() {
        let s = snapshot(
            dec!(100),
            dec!(90),
            dec!(95),
            dec!(85),
            dec!(120),
            dec!(70),
        );
        assert!(!structural_pass(&s));
    }

    /// 최고가에서 너무 멀면 탈락
    #[test]
    fn deep_drawdown_from_high_fails() {
        let s = snapshot(
            dec!(100),
            dec!(95),
            dec!(90),
            dec!(85),
            dec!(140),
            dec!(70),
        );
        // 100 < 140 * 0.75 = 105
        assert!(!structural_pass(&s));
    }

    /// 경계값: 최고가의 정확히 75%는 통과 (이상 조건)
    #[test]
    fn exact_high_proximity_boundary_passes() {
        // 90 == 120 * 0.75
        let s = snapshot(dec!(90), dec!(85), dec!(80), dec!(75), dec!(120), dec!(60));
        assert!(structural_pass(&s));
    }

    /// 경계값: 최저가의 정확히 130%는 통과 (이상 조건)
    #[test]
    fn exact_low_recovery_boundary_passes() {
        // 130 == 100 * 1.3
        let s = snapshot(dec!(130), dec!(125), dec!(120), dec!(115), dec!(160), dec!(100));
        assert!(structural_pass(&s));
    }
}
