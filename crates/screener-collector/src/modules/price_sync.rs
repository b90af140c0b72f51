//! 일봉 증분 동기화 모듈.
//!
//! 심볼별 마지막 바 다음 날부터만 조회하는 증분 동기화입니다.
//! 배치 단위로 업스트림을 호출하고, 배치 실패는 해당 배치의 일시
//! 실패로만 기록한 뒤 다음 배치를 계속 진행합니다. 쓰기는 항상
//! `(symbol, date)` 충돌 무시라 재실행해도 멱등합니다.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

use screener_core::{InstrumentStatus, PriceBar, PriceStore};
use screener_data::{BarProvider, InstrumentRegistry, PriceHistoryStore};

use super::classifier::classify_failures;
use crate::config::PriceSyncConfig;
use crate::{Result, SyncStats};

/// 일봉 동기화 실행 옵션
#[derive(Debug, Clone)]
pub struct PriceSyncOptions {
    /// 대상 테이블 (실시간/이력)
    pub store: PriceStore,
    /// 특정 심볼만 동기화 (None이면 Active 전체)
    pub symbols: Option<Vec<String>>,
    /// 시작일 강제 지정 (증분 계산 무시)
    pub start: Option<NaiveDate>,
    /// 종료일 (기본: 오늘)
    pub end: Option<NaiveDate>,
    /// 대상 지역 목록
    pub regions: Vec<String>,
}

impl PriceSyncOptions {
    pub fn realtime(regions: Vec<String>) -> Self {
        Self {
            store: PriceStore::Realtime,
            symbols: None,
            start: None,
            end: None,
            regions,
        }
    }
}

/// 심볼 하나의 조회 시작일 결정
///
/// 시작일이 명시되면 증분 커서를 무시하고 그대로 사용합니다
/// (과거 구간 재수집용, 쓰기 시 중복 제거로 멱등). 아니면 마지막
/// 바 다음 날, 바가 없으면 모드별 기본 시작일입니다. 시작일이
/// 종료일보다 뒤면 이미 최신이므로 None을 반환합니다.
fn resolve_fetch_range(
    explicit_start: Option<NaiveDate>,
    last_date: Option<NaiveDate>,
    default_start: NaiveDate,
    end: NaiveDate,
) -> Option<NaiveDate> {
    let start = match (explicit_start, last_date) {
        (Some(explicit), _) => explicit,
        (None, Some(last)) => last.succ_opt()?,
        (None, None) => default_start,
    };

    if start > end {
        None
    } else {
        Some(start)
    }
}

/// 모드별 기본 시작일 계산
fn default_start_for(store: PriceStore, config: &PriceSyncConfig, end: NaiveDate) -> NaiveDate {
    match store {
        PriceStore::Realtime => end - chrono::Duration::days(config.realtime_lookback_days),
        PriceStore::History => config.history_epoch,
    }
}

/// 일봉 증분 동기화
pub async fn sync_prices(
    pool: &PgPool,
    provider: &dyn BarProvider,
    config: &PriceSyncConfig,
    options: PriceSyncOptions,
) -> Result<SyncStats> {
    let start_time = Instant::now();
    let mut stats = SyncStats::new();

    let registry = InstrumentRegistry::new(pool.clone());
    let prices = PriceHistoryStore::new(pool.clone());

    let end = options.end.unwrap_or_else(|| Utc::now().date_naive());
    let default_start = default_start_for(options.store, config, end);

    // 대상 심볼 결정: 명시 목록 또는 Active 전체
    let symbols = match &options.symbols {
        Some(list) => list.clone(),
        None => registry.list_active_symbols(&options.regions).await?,
    };

    if symbols.is_empty() {
        tracing::warn!(store = %options.store, "동기화 대상 심볼 없음");
        stats.elapsed = start_time.elapsed();
        return Ok(stats);
    }

    tracing::info!(
        store = %options.store,
        symbols = symbols.len(),
        end = %end,
        "일봉 동기화 시작"
    );

    // 심볼별 마지막 바 날짜를 한 번에 조회 (심볼당 쿼리 금지).
    // 시작일이 명시되면 증분 커서를 쓰지 않으므로 조회를 생략합니다.
    let latest_dates = match options.start {
        Some(_) => HashMap::new(),
        None => prices.latest_dates(options.store, &symbols).await?,
    };

    let batch_count = symbols.len().div_ceil(config.batch_size);
    for (batch_idx, batch) in symbols.chunks(config.batch_size).enumerate() {
        // 배치 내 심볼별 시작일 계산, 이미 최신인 심볼은 건너뜀
        let mut batch_starts: Vec<(String, NaiveDate)> = Vec::with_capacity(batch.len());
        for symbol in batch {
            stats.total += 1;
            match resolve_fetch_range(
                options.start,
                latest_dates.get(symbol).copied(),
                default_start,
                end,
            ) {
                Some(fetch_start) => batch_starts.push((symbol.clone(), fetch_start)),
                None => stats.skipped += 1,
            }
        }

        if batch_starts.is_empty() {
            tracing::debug!(batch = batch_idx + 1, "배치 전체가 이미 최신");
            continue;
        }

        // 배치 조회는 가장 이른 시작일부터, 심볼별 필터는 쓰기 직전에
        let batch_min_start = batch_starts
            .iter()
            .map(|(_, s)| *s)
            .min()
            .unwrap_or(default_start);
        let fetch_symbols: Vec<String> =
            batch_starts.iter().map(|(s, _)| s.clone()).collect();

        let fetch = tokio::time::timeout(
            config.fetch_timeout(),
            provider.fetch_bars(&fetch_symbols, batch_min_start, end),
        )
        .await;

        let batch_result = match fetch {
            Ok(Ok(batch_result)) => batch_result,
            Ok(Err(e)) => {
                // 배치 전체 실패는 일시 실패로만 기록하고 계속 진행
                stats.errors += fetch_symbols.len();
                tracing::error!(
                    batch = batch_idx + 1,
                    batches = batch_count,
                    symbols = fetch_symbols.len(),
                    error = %e,
                    "배치 조회 실패 - 다음 배치 계속"
                );
                tokio::time::sleep(config.batch_delay()).await;
                continue;
            }
            Err(_) => {
                stats.errors += fetch_symbols.len();
                tracing::error!(
                    batch = batch_idx + 1,
                    batches = batch_count,
                    timeout_secs = config.fetch_timeout_secs,
                    "배치 조회 타임아웃 - 다음 배치 계속"
                );
                tokio::time::sleep(config.batch_delay()).await;
                continue;
            }
        };

        // 심볼별 저장: 시작일 이전 바 제거 + 기존 날짜 최종 중복 제거
        let mut bars_by_symbol = batch_result.bars;
        for (symbol, fetch_start) in &batch_starts {
            let Some(daily_bars) = bars_by_symbol.remove(symbol) else {
                // 실패 목록에도 없으면 조회 성공 + 데이터 없음
                if !batch_result.failures.iter().any(|f| &f.symbol == symbol) {
                    stats.empty += 1;
                }
                continue;
            };

            let existing = prices.existing_dates(options.store, symbol).await?;
            let new_bars: Vec<PriceBar> = daily_bars
                .into_iter()
                .filter(|bar| bar.date >= *fetch_start && !existing.contains(&bar.date))
                .map(|bar| bar.into_price_bar(symbol))
                .collect();

            if new_bars.is_empty() {
                stats.empty += 1;
                continue;
            }

            let inserted = prices.insert_bars(options.store, &new_bars).await?;
            stats.success += 1;
            stats.total_bars += inserted as usize;
        }

        // 실패 분류: 영구 실패는 상태 전이, 일시 실패는 로그만
        let classification = classify_failures(batch_result.failures);
        if !classification.delisted.is_empty() {
            registry
                .mark_status(InstrumentStatus::Delisted, &classification.delisted)
                .await?;
            tracing::info!(
                symbols = ?classification.delisted,
                "상장폐지 판정 - 레지스트리 상태 전이"
            );
        }
        if !classification.invalid.is_empty() {
            registry
                .mark_status(InstrumentStatus::Invalid, &classification.invalid)
                .await?;
            tracing::info!(
                symbols = ?classification.invalid,
                "무효 심볼 판정 - 레지스트리 상태 전이"
            );
        }
        for failure in &classification.transient {
            stats.errors += 1;
            tracing::warn!(
                symbol = %failure.symbol,
                kind = %failure.kind,
                message = %failure.message,
                "일시 실패 - 다음 실행에서 재시도"
            );
        }
        stats.errors += classification.delisted.len() + classification.invalid.len();

        if batch_idx + 1 < batch_count {
            tokio::time::sleep(config.batch_delay()).await;
        }
    }

    stats.elapsed = start_time.elapsed();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// 마지막 바가 있으면 다음 날부터 조회
    #[test]
    fn resumes_from_day_after_last_bar() {
        let start = resolve_fetch_range(
            None,
            Some(date(2024, 3, 14)),
            date(2000, 1, 1),
            date(2024, 3, 20),
        );
        assert_eq!(start, Some(date(2024, 3, 15)));
    }

    /// 바가 전혀 없으면 기본 시작일 사용
    #[test]
    fn empty_history_starts_at_default() {
        let start = resolve_fetch_range(None, None, date(2000, 1, 1), date(2024, 3, 20));
        assert_eq!(start, Some(date(2000, 1, 1)));
    }

    /// 이미 최신이면 조회하지 않음
    #[test]
    fn up_to_date_symbol_is_skipped() {
        let start = resolve_fetch_range(
            None,
            Some(date(2024, 3, 20)),
            date(2000, 1, 1),
            date(2024, 3, 20),
        );
        assert_eq!(start, None);
    }

    /// 마지막 바가 종료일 당일보다 과거면 딱 하루 구간도 조회
    #[test]
    fn single_day_gap_is_fetched() {
        let start = resolve_fetch_range(
            None,
            Some(date(2024, 3, 19)),
            date(2000, 1, 1),
            date(2024, 3, 20),
        );
        assert_eq!(start, Some(date(2024, 3, 20)));
    }

    /// 명시 시작일은 이력 유무와 무관하게 증분 커서를 무시
    #[test]
    fn explicit_start_overrides_incremental_cursor() {
        let start = resolve_fetch_range(
            Some(date(2020, 1, 1)),
            Some(date(2024, 3, 14)),
            date(2000, 1, 1),
            date(2024, 3, 20),
        );
        assert_eq!(start, Some(date(2020, 1, 1)));
    }

    /// 명시 시작일이 종료일보다 뒤면 건너뜀
    #[test]
    fn explicit_start_after_end_is_skipped() {
        let start = resolve_fetch_range(
            Some(date(2024, 4, 1)),
            None,
            date(2000, 1, 1),
            date(2024, 3, 20),
        );
        assert_eq!(start, None);
    }

    /// 실시간 모드 기본 시작일은 종료일 기준 되돌아봄
    #[test]
    fn realtime_default_start_looks_back() {
        let config = PriceSyncConfig {
            batch_size: 300,
            batch_delay_ms: 0,
            fetch_timeout_secs: 30,
            realtime_lookback_days: 365,
            history_epoch: date(2000, 1, 1),
        };
        let end = date(2024, 3, 20);
        assert_eq!(
            default_start_for(PriceStore::Realtime, &config, end),
            date(2023, 3, 21)
        );
        assert_eq!(
            default_start_for(PriceStore::History, &config, end),
            date(2000, 1, 1)
        );
    }
}
