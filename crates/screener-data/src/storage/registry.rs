//! 종목 레지스트리 저장소.
//!
//! Instrument 라이프사이클의 유일한 소유자입니다. 종목은 한 번
//! 관찰되면 물리적으로 삭제되지 않고 상태만 전이합니다.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, QueryBuilder};
use tracing::{debug, info};

use screener_core::{Instrument, InstrumentStatus};

use super::WRITE_BATCH_SIZE;
use crate::error::{DataError, Result};

/// instruments 테이블 행.
#[derive(Debug, Clone, FromRow)]
struct InstrumentRow {
    symbol: String,
    name: String,
    region: String,
    exchange: String,
    ipo_date: Option<NaiveDate>,
    status: String,
    created_at: Option<DateTime<Utc>>,
}

impl InstrumentRow {
    fn into_instrument(self) -> Result<Instrument> {
        let status: InstrumentStatus = self.status.parse().map_err(DataError::Parse)?;
        Ok(Instrument {
            symbol: self.symbol,
            name: self.name,
            region: self.region,
            exchange: self.exchange,
            ipo_date: self.ipo_date,
            status,
            created_at: self.created_at,
        })
    }
}

/// 종목 레지스트리.
#[derive(Clone)]
pub struct InstrumentRegistry {
    pool: PgPool,
}

impl InstrumentRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 지역별 Active 종목 조회.
    ///
    /// 다운스트림(동기화, 스크리닝)은 Active만 소비합니다.
    pub async fn list_by_region(&self, region: &str) -> Result<Vec<Instrument>> {
        let rows: Vec<InstrumentRow> = sqlx::query_as(
            r#"
            SELECT symbol, name, region, exchange, ipo_date, status, created_at
            FROM instruments
            WHERE region = $1 AND status = 'Active'
            ORDER BY symbol
            "#,
        )
        .bind(region)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(InstrumentRow::into_instrument).collect()
    }

    /// 여러 지역의 Active 심볼만 조회 (동기화 대상 결정용).
    pub async fn list_active_symbols(&self, regions: &[String]) -> Result<Vec<String>> {
        let symbols: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT symbol
            FROM instruments
            WHERE region = ANY($1) AND status = 'Active'
            ORDER BY symbol
            "#,
        )
        .bind(regions)
        .fetch_all(&self.pool)
        .await?;

        Ok(symbols.into_iter().map(|(s,)| s).collect())
    }

    /// 신규 종목만 삽입 (기존 행은 절대 덮어쓰지 않음).
    ///
    /// `ON CONFLICT (symbol) DO NOTHING`으로 집합 차를 DB에서 계산하므로
    /// 상장 목록 갱신을 반복 호출해도 멱등합니다. 삽입된 행 수를
    /// 반환합니다.
    pub async fn upsert_new(&self, candidates: &[Instrument]) -> Result<u64> {
        if candidates.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0u64;
        for chunk in candidates.chunks(WRITE_BATCH_SIZE) {
            let mut query_builder = QueryBuilder::new(
                "INSERT INTO instruments \
                 (symbol, name, region, exchange, ipo_date, status, created_at) ",
            );

            query_builder.push_values(chunk, |mut b, inst| {
                b.push_bind(&inst.symbol)
                    .push_bind(&inst.name)
                    .push_bind(&inst.region)
                    .push_bind(&inst.exchange)
                    .push_bind(inst.ipo_date)
                    .push_bind(inst.status.as_str())
                    .push("NOW()");
            });

            query_builder.push(" ON CONFLICT (symbol) DO NOTHING");

            let result = query_builder.build().execute(&self.pool).await?;
            inserted += result.rows_affected();
        }

        info!(
            candidates = candidates.len(),
            inserted = inserted,
            "신규 종목 삽입 완료"
        );
        Ok(inserted)
    }

    /// 심볼 집합의 상태 일괄 전이.
    ///
    /// 전이 합법성 검사는 하지 않습니다 (정책은 호출자 책임).
    pub async fn mark_status(&self, status: InstrumentStatus, symbols: &[String]) -> Result<u64> {
        if symbols.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE instruments
            SET status = $1
            WHERE symbol = ANY($2)
            "#,
        )
        .bind(status.as_str())
        .bind(symbols)
        .execute(&self.pool)
        .await?;

        debug!(
            status = %status,
            symbols = symbols.len(),
            affected = result.rows_affected(),
            "종목 상태 일괄 전이"
        );
        Ok(result.rows_affected())
    }

    /// 비활성 스윕 (예약형 일관성 패스).
    ///
    /// 최근 바가 `max_stale_days`일 이상 오래되고 전체 바가 `min_bars`개
    /// 이상인 심볼만 Inactive로 전이합니다. 이력이 희박한 신규 상장
    /// 종목은 건드리지 않습니다.
    pub async fn sweep_inactive(&self, max_stale_days: i32, min_bars: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE instruments
            SET status = 'Inactive'
            WHERE status = 'Active'
              AND symbol IN (
                  SELECT symbol
                  FROM daily_prices_realtime
                  GROUP BY symbol
                  HAVING MAX(date) < CURRENT_DATE - $1::int
                     AND COUNT(*) >= $2
              )
            "#,
        )
        .bind(max_stale_days)
        .bind(min_bars)
        .execute(&self.pool)
        .await?;

        info!(
            stale_days = max_stale_days,
            min_bars = min_bars,
            affected = result.rows_affected(),
            "비활성 스윕 완료"
        );
        Ok(result.rows_affected())
    }

    /// 이름 키워드 기반 제외 스윕.
    ///
    /// 표시명이 거부 목록 키워드를 (대소문자 무시) 포함하면 Exclude로
    /// 전이합니다. 키워드는 바인딩 배열로 전달하고 패턴은 서버에서
    /// 조립합니다 (문자열 연결 쿼리 금지).
    pub async fn sweep_excluded(&self, keywords: &[String]) -> Result<u64> {
        if keywords.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE instruments
            SET status = 'Exclude'
            WHERE status <> 'Exclude'
              AND name ILIKE ANY (
                  ARRAY(SELECT '%' || kw || '%' FROM unnest($1::text[]) AS kw)
              )
            "#,
        )
        .bind(keywords)
        .execute(&self.pool)
        .await?;

        info!(
            keywords = keywords.len(),
            affected = result.rows_affected(),
            "이름 기반 제외 스윕 완료"
        );
        Ok(result.rows_affected())
    }
}
