//! 2단계: 추세 유의성 필터.
//!
//! 구조 필터 생존자의 MA200 시계열 최근 20개 값에 선형 추세 검정을
//! 적용합니다. 기울기가 양수이고 p-value < 0.05일 때만 통과합니다.
//! MA200 시계열이 20개 미만인 심볼(원 이력 219바 미만)은 판정
//! 불가로 탈락입니다.

use std::time::Instant;

use rust_decimal::prelude::ToPrimitive;
use sqlx::PgPool;

use screener_analytics::{linear_trend, trailing_ma_series};
use screener_core::{PriceStore, ScreeningStage};
use screener_data::{PriceHistoryStore, VerdictStore};

use crate::{Result, SyncStats};

/// 추세 검정에 사용하는 MA200 시계열 길이.
const TREND_WINDOW: usize = 20;

/// 유의수준.
const ALPHA: f64 = 0.05;

/// 종가 이력 벌크 로드 시 한 번에 읽는 심볼 수.
const LOAD_CHUNK_SIZE: usize = 200;

/// MA200 시계열 꼬리 구간의 추세 통과 여부
///
/// 시계열은 시간순(오름차순)이어야 합니다.
fn ma_trend_passes(ma_series: &[rust_decimal::Decimal]) -> Option<bool> {
    if ma_series.len() < TREND_WINDOW {
        return None;
    }

    let tail: Vec<f64> = ma_series[ma_series.len() - TREND_WINDOW..]
        .iter()
        .map(|d| d.to_f64().unwrap_or(0.0))
        .collect();

    linear_trend(&tail).map(|test| test.is_significant_uptrend(ALPHA))
}

/// 추세 유의성 필터 실행
pub async fn run_trend_filter(pool: &PgPool) -> Result<SyncStats> {
    let start = Instant::now();
    let mut stats = SyncStats::new();

    let prices = PriceHistoryStore::new(pool.clone());
    let verdicts = VerdictStore::new(pool.clone());

    let candidates = verdicts.survivors(ScreeningStage::StructuralPass).await?;
    stats.total = candidates.len();

    if candidates.is_empty() {
        tracing::info!("구조 필터 생존자 없음 - 추세 단계 건너뜀");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    let mut passed: Vec<String> = Vec::new();

    for chunk in candidates.chunks(LOAD_CHUNK_SIZE) {
        let closes_by_symbol = prices.load_closes(PriceStore::Realtime, chunk).await?;

        for symbol in chunk {
            let Some(closes) = closes_by_symbol.get(symbol) else {
                stats.empty += 1;
                continue;
            };

            let ma_series = trailing_ma_series(closes, 200);
            match ma_trend_passes(&ma_series) {
                Some(true) => {
                    passed.push(symbol.clone());
                    stats.success += 1;
                }
                Some(false) => {}
                // 이력 부족: 판정 불가는 탈락
                None => stats.skipped += 1,
            }
        }
    }

    verdicts.mark_trend(&passed).await?;

    tracing::info!(
        candidates = candidates.len(),
        survivors = passed.len(),
        insufficient = stats.skipped,
        "추세 유의성 필터 완료"
    );

    stats.elapsed = start.elapsed();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn series(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|v| Decimal::from(*v)).collect()
    }

    /// 꾸준히 오르는 MA 시계열은 통과
    #[test]
    fn rising_ma_series_passes() {
        let ma: Vec<i64> = (100..120).collect();
        assert_eq!(ma_trend_passes(&series(&ma)), Some(true));
    }

    /// 평평한 MA 시계열은 탈락
    #[test]
    fn flat_ma_series_fails() {
        let ma = vec![100i64; 25];
        assert_eq!(ma_trend_passes(&series(&ma)), Some(false));
    }

    /// 하락 추세는 기울기 음수로 탈락
    #[test]
    fn falling_ma_series_fails() {
        let ma: Vec<i64> = (100..120).rev().collect();
        assert_eq!(ma_trend_passes(&series(&ma)), Some(false));
    }

    /// 20개 미만이면 판정 불가
    #[test]
    fn short_ma_series_is_indeterminate() {
        let ma: Vec<i64> = (100..115).collect();
        assert_eq!(ma_trend_passes(&series(&ma)), None);
    }
}
