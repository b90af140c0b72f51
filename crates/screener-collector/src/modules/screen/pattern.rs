//! 4단계: 컵앤핸들 패턴 필터.
//!
//! 이익 성장 생존자의 최근 일봉 윈도우에서 컵앤핸들 형태를
//! 검출합니다. 거래량 확인은 참고 지표로만 로그에 남기고 판정
//! 게이트로 쓰지 않습니다.

use std::time::Instant;

use sqlx::PgPool;

use screener_analytics::{detect_cup_with_handle, CupHandleParams};
use screener_core::{PriceStore, ScreeningStage};
use screener_data::{PriceHistoryStore, VerdictStore};

use crate::{Result, SyncStats};

/// 컵앤핸들 필터 실행
pub async fn run_pattern_filter(pool: &PgPool) -> Result<SyncStats> {
    let start = Instant::now();
    let mut stats = SyncStats::new();

    let prices = PriceHistoryStore::new(pool.clone());
    let verdicts = VerdictStore::new(pool.clone());
    let params = CupHandleParams::default();

    let candidates = verdicts.survivors(ScreeningStage::GrowthPass).await?;
    stats.total = candidates.len();

    if candidates.is_empty() {
        tracing::info!("이익 성장 생존자 없음 - 패턴 단계 건너뜀");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    // 최신순 바를 윈도우 크기만큼만 로드
    let bars_by_symbol = prices
        .load_recent_bars(PriceStore::Realtime, &candidates, params.window as i64)
        .await?;

    let mut passed: Vec<String> = Vec::new();

    for symbol in &candidates {
        let Some(bars) = bars_by_symbol.get(symbol) else {
            stats.empty += 1;
            continue;
        };

        match detect_cup_with_handle(bars, &params) {
            Ok(report) => {
                tracing::info!(
                    symbol = %symbol,
                    cup_retracement = format!("{:.3}", report.cup_retracement),
                    handle_retracement = format!("{:.3}", report.handle_retracement),
                    breakout_confirmed = report.volume.breakout_confirmed,
                    handle_dry_up = report.volume.handle_dry_up,
                    "컵앤핸들 검출"
                );
                passed.push(symbol.clone());
                stats.success += 1;
            }
            Err(reject) => {
                tracing::debug!(symbol = %symbol, reject = %reject, "컵앤핸들 불검출");
            }
        }
    }

    verdicts.mark_pattern(&passed).await?;

    tracing::info!(
        candidates = candidates.len(),
        survivors = passed.len(),
        "컵앤핸들 필터 완료"
    );

    stats.elapsed = start.elapsed();
    Ok(stats)
}
