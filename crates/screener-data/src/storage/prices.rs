//! 일봉 저장소.
//!
//! realtime/history 두 테이블은 스키마가 동일하고 이름만 다르며,
//! 모든 쿼리는 [`PriceStore`]로 대상 테이블을 선택합니다.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, QueryBuilder};
use tracing::debug;

use screener_core::{PriceBar, PriceStore};

use super::WRITE_BATCH_SIZE;
use crate::error::Result;

/// daily_prices_* 테이블 행.
#[derive(Debug, Clone, FromRow)]
struct PriceBarRow {
    symbol: String,
    date: NaiveDate,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
}

impl From<PriceBarRow> for PriceBar {
    fn from(row: PriceBarRow) -> Self {
        PriceBar {
            symbol: row.symbol,
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

/// 일봉 이력 저장소.
#[derive(Clone)]
pub struct PriceHistoryStore {
    pool: PgPool,
}

impl PriceHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 심볼별 최신 바 날짜를 한 번의 쿼리로 조회.
    ///
    /// 증분 동기화의 시작점 계산에 사용합니다. 바가 전혀 없는 심볼은
    /// 결과 맵에 나타나지 않습니다.
    pub async fn latest_dates(
        &self,
        store: PriceStore,
        symbols: &[String],
    ) -> Result<HashMap<String, NaiveDate>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT symbol, MAX(date) AS latest \
             FROM {} \
             WHERE symbol = ANY($1) \
             GROUP BY symbol",
            store.table_name()
        );

        let rows: Vec<(String, NaiveDate)> = sqlx::query_as(&sql)
            .bind(symbols)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// 한 심볼의 기존 바 날짜 집합.
    ///
    /// 쓰기 직전 최종 중복 제거에 사용합니다 (날짜 범위 필터와 별개로
    /// 이미 저장된 날짜는 건너뜁니다).
    pub async fn existing_dates(
        &self,
        store: PriceStore,
        symbol: &str,
    ) -> Result<HashSet<NaiveDate>> {
        let sql = format!(
            "SELECT date FROM {} WHERE symbol = $1",
            store.table_name()
        );

        let rows: Vec<(NaiveDate,)> = sqlx::query_as(&sql)
            .bind(symbol)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(d,)| d).collect())
    }

    /// 바 일괄 삽입.
    ///
    /// `(symbol, date)` 충돌은 무시하므로 같은 배치를 재실행해도
    /// 멱등합니다. 실제 삽입된 행 수를 반환합니다.
    pub async fn insert_bars(&self, store: PriceStore, bars: &[PriceBar]) -> Result<u64> {
        if bars.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0u64;
        for chunk in bars.chunks(WRITE_BATCH_SIZE) {
            let mut query_builder = QueryBuilder::new(format!(
                "INSERT INTO {} (symbol, date, open, high, low, close, volume) ",
                store.table_name()
            ));

            query_builder.push_values(chunk, |mut b, bar| {
                b.push_bind(&bar.symbol)
                    .push_bind(bar.date)
                    .push_bind(bar.open)
                    .push_bind(bar.high)
                    .push_bind(bar.low)
                    .push_bind(bar.close)
                    .push_bind(bar.volume);
            });

            query_builder.push(" ON CONFLICT (symbol, date) DO NOTHING");

            let result = query_builder.build().execute(&self.pool).await?;
            inserted += result.rows_affected();
        }

        debug!(store = %store, bars = bars.len(), inserted = inserted, "일봉 삽입 완료");
        Ok(inserted)
    }

    /// 심볼별 전체 종가 시계열 (날짜 오름차순).
    ///
    /// 집계 재구축용 벌크 읽기입니다. 메모리 조절은 호출자가 심볼을
    /// 청크로 나눠 호출하는 것으로 합니다.
    pub async fn load_closes(
        &self,
        store: PriceStore,
        symbols: &[String],
    ) -> Result<HashMap<String, Vec<Decimal>>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT symbol, close \
             FROM {} \
             WHERE symbol = ANY($1) \
             ORDER BY symbol, date ASC",
            store.table_name()
        );

        let rows: Vec<(String, Decimal)> = sqlx::query_as(&sql)
            .bind(symbols)
            .fetch_all(&self.pool)
            .await?;

        let mut closes: HashMap<String, Vec<Decimal>> = HashMap::new();
        for (symbol, close) in rows {
            closes.entry(symbol).or_default().push(close);
        }
        Ok(closes)
    }

    /// 심볼별 최근 바 `limit`개 (최신순).
    ///
    /// LATERAL 조인으로 심볼당 상위 N행만 끌어와 패턴 탐지 윈도우를
    /// 채웁니다.
    pub async fn load_recent_bars(
        &self,
        store: PriceStore,
        symbols: &[String],
        limit: i64,
    ) -> Result<HashMap<String, Vec<PriceBar>>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT p.symbol, p.date, p.open, p.high, p.low, p.close, p.volume \
             FROM unnest($1::text[]) AS s(symbol) \
             CROSS JOIN LATERAL ( \
                 SELECT symbol, date, open, high, low, close, volume \
                 FROM {} \
                 WHERE symbol = s.symbol \
                 ORDER BY date DESC \
                 LIMIT $2 \
             ) p",
            store.table_name()
        );

        let rows: Vec<PriceBarRow> = sqlx::query_as(&sql)
            .bind(symbols)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let mut bars: HashMap<String, Vec<PriceBar>> = HashMap::new();
        for row in rows {
            bars.entry(row.symbol.clone()).or_default().push(row.into());
        }
        Ok(bars)
    }

    /// 바 수가 `min_bars` 미만인 희박 심볼 조회.
    pub async fn find_sparse_symbols(
        &self,
        store: PriceStore,
        min_bars: i64,
    ) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT symbol \
             FROM {} \
             GROUP BY symbol \
             HAVING COUNT(*) < $1 \
             ORDER BY symbol",
            store.table_name()
        );

        let rows: Vec<(String,)> = sqlx::query_as(&sql)
            .bind(min_bars)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(s,)| s).collect())
    }

    /// 심볼 집합의 바 전체 삭제 (희박 이력 정리용).
    pub async fn remove_symbols(&self, store: PriceStore, symbols: &[String]) -> Result<u64> {
        if symbols.is_empty() {
            return Ok(0);
        }

        let sql = format!("DELETE FROM {} WHERE symbol = ANY($1)", store.table_name());

        let result = sqlx::query(&sql)
            .bind(symbols)
            .execute(&self.pool)
            .await?;

        debug!(
            store = %store,
            symbols = symbols.len(),
            removed = result.rows_affected(),
            "희박 이력 삭제 완료"
        );
        Ok(result.rows_affected())
    }
}
