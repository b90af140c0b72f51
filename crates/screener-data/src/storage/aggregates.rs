//! 집계 스냅샷 저장소.
//!
//! 스냅샷 테이블은 파생 산출물이라 증분 갱신 대신 트랜잭션 안에서
//! 전체 재구축합니다. 실패하면 이전 스냅샷이 그대로 남습니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, QueryBuilder};
use tracing::info;

use screener_core::AggregateSnapshot;

use super::WRITE_BATCH_SIZE;
use crate::error::Result;

#[derive(Debug, Clone, FromRow)]
struct SnapshotRow {
    symbol: String,
    date: NaiveDate,
    current_price: Decimal,
    ma_50: Decimal,
    ma_150: Decimal,
    ma_200: Decimal,
    high_52w: Decimal,
    low_52w: Decimal,
}

impl From<SnapshotRow> for AggregateSnapshot {
    fn from(row: SnapshotRow) -> Self {
        AggregateSnapshot {
            symbol: row.symbol,
            date: row.date,
            current_price: row.current_price,
            ma_50: row.ma_50,
            ma_150: row.ma_150,
            ma_200: row.ma_200,
            high_52w: row.high_52w,
            low_52w: row.low_52w,
        }
    }
}

/// 집계 스냅샷 저장소.
#[derive(Clone)]
pub struct AggregateStore {
    pool: PgPool,
}

impl AggregateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 스냅샷 테이블 전체 재구축.
    ///
    /// TRUNCATE와 삽입을 한 트랜잭션으로 묶어 중간 실패 시 롤백합니다.
    /// 재구축을 반복 실행해도 결과는 입력 스냅샷 집합과 동일합니다.
    pub async fn rebuild(&self, snapshots: &[AggregateSnapshot]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("TRUNCATE TABLE aggregate_snapshots")
            .execute(&mut *tx)
            .await?;

        let mut inserted = 0u64;
        for chunk in snapshots.chunks(WRITE_BATCH_SIZE) {
            let mut query_builder = QueryBuilder::new(
                "INSERT INTO aggregate_snapshots \
                 (symbol, date, current_price, ma_50, ma_150, ma_200, high_52w, low_52w) ",
            );

            query_builder.push_values(chunk, |mut b, snap| {
                b.push_bind(&snap.symbol)
                    .push_bind(snap.date)
                    .push_bind(snap.current_price)
                    .push_bind(snap.ma_50)
                    .push_bind(snap.ma_150)
                    .push_bind(snap.ma_200)
                    .push_bind(snap.high_52w)
                    .push_bind(snap.low_52w);
            });

            let result = query_builder.build().execute(&mut *tx).await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;

        info!(snapshots = inserted, "집계 스냅샷 재구축 완료");
        Ok(inserted)
    }

    /// 전체 스냅샷 조회 (구조 필터 입력).
    pub async fn load_all(&self) -> Result<Vec<AggregateSnapshot>> {
        let rows: Vec<SnapshotRow> = sqlx::query_as(
            r#"
            SELECT symbol, date, current_price, ma_50, ma_150, ma_200, high_52w, low_52w
            FROM aggregate_snapshots
            ORDER BY symbol
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
