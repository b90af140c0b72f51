//! 종목 레지스트리 동기화 모듈.
//!
//! 상장 목록을 받아 신규 종목만 삽입하고, 이어서 레지스트리
//! 일관성 스윕(이름 기반 제외, 비활성 전이)을 수행합니다.

use std::time::Instant;

use sqlx::PgPool;

use screener_core::{Instrument, InstrumentStatus, PriceStore};
use screener_data::{InstrumentRegistry, ListingProvider, PriceHistoryStore};

use crate::config::RegistrySyncConfig;
use crate::error::PipelineError;
use crate::{Result, SyncStats};

/// 종목 레지스트리 동기화
///
/// 지역별로 상장 목록을 조회해 아직 없는 종목만 레지스트리에
/// 추가합니다. 기존 행의 상태는 절대 건드리지 않으므로 수동으로
/// Invalid/Exclude 처리한 종목이 상장 목록에 남아 있어도 되살아나지
/// 않습니다. 마지막에 제외/비활성 스윕을 실행합니다.
pub async fn sync_instruments(
    pool: &PgPool,
    provider: &dyn ListingProvider,
    config: &RegistrySyncConfig,
) -> Result<SyncStats> {
    let start = Instant::now();
    let mut stats = SyncStats::new();

    let registry = InstrumentRegistry::new(pool.clone());

    tracing::info!(regions = ?config.regions, "종목 레지스트리 동기화 시작");

    for region in &config.regions {
        stats.total += 1;

        let listed = match provider.fetch_instruments(region).await {
            Ok(listed) => listed,
            Err(e) => {
                stats.errors += 1;
                tracing::error!(region = region, error = %e, "상장 목록 조회 실패");
                continue;
            }
        };

        if listed.is_empty() {
            stats.empty += 1;
            tracing::warn!(region = region, "상장 목록이 비어 있음");
            continue;
        }

        let candidates: Vec<Instrument> = listed
            .into_iter()
            .map(|l| {
                let status = InstrumentStatus::parse_listing(&l.status);
                Instrument::from_listing(l.symbol, l.name, region, l.exchange, l.ipo_date, status)
            })
            .collect();

        let inserted = registry.upsert_new(&candidates).await?;
        stats.success += 1;
        tracing::info!(
            region = region,
            candidates = candidates.len(),
            inserted = inserted,
            "지역 레지스트리 동기화 완료"
        );
    }

    // 일관성 스윕: 이름 기반 제외 → 비활성 전이 순서
    let excluded = registry.sweep_excluded(&config.exclude_keywords).await?;
    let inactivated = registry
        .sweep_inactive(config.inactive_stale_days, config.inactive_min_bars)
        .await?;
    tracing::info!(excluded, inactivated, "레지스트리 스윕 완료");

    stats.elapsed = start.elapsed();
    Ok(stats)
}

/// 희박 이력 정리
///
/// 실시간 테이블 기준으로 바 수가 부족한 심볼을 찾아 해당 심볼의
/// 바를 삭제합니다. 다음 일봉 동기화가 처음부터 다시 채우게 됩니다.
/// 레지스트리 상태는 바꾸지 않습니다.
pub async fn sweep_sparse_histories(pool: &PgPool, min_bars: i64) -> Result<SyncStats> {
    let start = Instant::now();
    let mut stats = SyncStats::new();

    let prices = PriceHistoryStore::new(pool.clone());

    let sparse = prices
        .find_sparse_symbols(PriceStore::Realtime, min_bars)
        .await
        .map_err(PipelineError::from)?;

    stats.total = sparse.len();

    if sparse.is_empty() {
        tracing::info!(min_bars, "희박 이력 심볼 없음");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    let removed = prices.remove_symbols(PriceStore::Realtime, &sparse).await?;
    stats.success = sparse.len();
    stats.total_bars = removed as usize;

    tracing::info!(
        symbols = sparse.len(),
        removed_bars = removed,
        min_bars,
        "희박 이력 정리 완료"
    );

    stats.elapsed = start.elapsed();
    Ok(stats)
}
