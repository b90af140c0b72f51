//! 집계 스냅샷 재구축 모듈.
//!
//! Active 심볼의 종가 이력으로 이동평균/극값 스냅샷을 계산해
//! 스냅샷 테이블을 전체 재구축합니다. 이력이 200바 미만인 심볼은
//! 스냅샷에서 제외합니다 (구조 필터가 요구하는 최소 이력).

use std::time::Instant;

use sqlx::PgPool;

use screener_analytics::latest_snapshot_values;
use screener_core::{AggregateSnapshot, PriceStore};
use screener_data::{AggregateStore, InstrumentRegistry, PriceHistoryStore};

use crate::{Result, SyncStats};

/// 종가 이력 벌크 로드 시 한 번에 읽는 심볼 수.
const LOAD_CHUNK_SIZE: usize = 200;

/// 집계 스냅샷 재구축
pub async fn rebuild_aggregates(
    pool: &PgPool,
    store: PriceStore,
    regions: &[String],
) -> Result<SyncStats> {
    let start = Instant::now();
    let mut stats = SyncStats::new();

    let registry = InstrumentRegistry::new(pool.clone());
    let prices = PriceHistoryStore::new(pool.clone());
    let aggregates = AggregateStore::new(pool.clone());

    let symbols = registry.list_active_symbols(regions).await?;
    stats.total = symbols.len();

    if symbols.is_empty() {
        tracing::warn!("Active 심볼 없음 - 집계 재구축 건너뜀");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    tracing::info!(store = %store, symbols = symbols.len(), "집계 스냅샷 재구축 시작");

    let mut snapshots: Vec<AggregateSnapshot> = Vec::with_capacity(symbols.len());

    for chunk in symbols.chunks(LOAD_CHUNK_SIZE) {
        let closes_by_symbol = prices.load_closes(store, chunk).await?;
        let latest_dates = prices.latest_dates(store, chunk).await?;

        for symbol in chunk {
            let Some(closes) = closes_by_symbol.get(symbol) else {
                stats.empty += 1;
                continue;
            };
            let Some(date) = latest_dates.get(symbol).copied() else {
                stats.empty += 1;
                continue;
            };

            // 200바 미만은 스냅샷 제외 (skipped로 집계)
            let Some(values) = latest_snapshot_values(closes) else {
                stats.skipped += 1;
                continue;
            };

            snapshots.push(AggregateSnapshot {
                symbol: symbol.clone(),
                date,
                current_price: values.current_price,
                ma_50: values.ma_50,
                ma_150: values.ma_150,
                ma_200: values.ma_200,
                high_52w: values.high,
                low_52w: values.low,
            });
            stats.success += 1;
        }
    }

    let inserted = aggregates.rebuild(&snapshots).await?;
    stats.total_bars = inserted as usize;

    tracing::info!(
        snapshots = inserted,
        skipped = stats.skipped,
        empty = stats.empty,
        "집계 스냅샷 재구축 완료"
    );

    stats.elapsed = start.elapsed();
    Ok(stats)
}
