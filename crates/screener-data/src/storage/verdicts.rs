//! 스크리닝 판정 저장소.
//!
//! 판정 테이블은 단계별 불리언 4개를 가진 투영입니다. 행은 구조
//! 필터 통과 심볼로만 시딩되고, 이후 단계는 자기 플래그만 올립니다.
//! 플래그 단조성(뒤 단계 true면 앞 단계도 true)은 시딩과 생존자
//! 질의가 함께 보장합니다.

use sqlx::{PgPool, QueryBuilder};
use tracing::info;

use screener_core::ScreeningStage;

use super::WRITE_BATCH_SIZE;
use crate::error::{DataError, Result};

/// 스크리닝 판정 저장소.
#[derive(Clone)]
pub struct VerdictStore {
    pool: PgPool,
}

impl VerdictStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 구조 필터 통과 심볼로 판정 테이블 시딩.
    ///
    /// 이전 실행 결과를 모두 비우고 새 생존자만 남깁니다. TRUNCATE와
    /// 삽입은 한 트랜잭션입니다.
    pub async fn seed_structural(&self, symbols: &[String]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("TRUNCATE TABLE screening_verdicts")
            .execute(&mut *tx)
            .await?;

        let mut inserted = 0u64;
        for chunk in symbols.chunks(WRITE_BATCH_SIZE) {
            let mut query_builder = QueryBuilder::new(
                "INSERT INTO screening_verdicts \
                 (symbol, passed_structural, ma_200_up_trend, profit_up_trend, cup_with_handle) ",
            );

            query_builder.push_values(chunk, |mut b, symbol| {
                b.push_bind(symbol)
                    .push_bind(true)
                    .push_bind(false)
                    .push_bind(false)
                    .push_bind(false);
            });

            let result = query_builder.build().execute(&mut *tx).await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;

        info!(survivors = inserted, "구조 필터 생존자 시딩 완료");
        Ok(inserted)
    }

    /// 추세 단계 통과 플래그 일괄 갱신.
    pub async fn mark_trend(&self, symbols: &[String]) -> Result<u64> {
        if symbols.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE screening_verdicts SET ma_200_up_trend = true WHERE symbol = ANY($1)",
        )
        .bind(symbols)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// 이익 성장 단계 통과 플래그 일괄 갱신.
    pub async fn mark_growth(&self, symbols: &[String]) -> Result<u64> {
        if symbols.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE screening_verdicts SET profit_up_trend = true WHERE symbol = ANY($1)",
        )
        .bind(symbols)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// 패턴 단계 통과 플래그 일괄 갱신.
    pub async fn mark_pattern(&self, symbols: &[String]) -> Result<u64> {
        if symbols.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE screening_verdicts SET cup_with_handle = true WHERE symbol = ANY($1)",
        )
        .bind(symbols)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// 주어진 단계까지 통과한 생존자 심볼 조회.
    ///
    /// 다음 단계의 입력 집합입니다. `prior_stage`가 요구하는 플래그를
    /// 명시적 등치로 검사합니다.
    pub async fn survivors(&self, prior_stage: ScreeningStage) -> Result<Vec<String>> {
        let sql = match prior_stage {
            ScreeningStage::StructuralPass => {
                "SELECT symbol FROM screening_verdicts \
                 WHERE passed_structural = true \
                 ORDER BY symbol"
            }
            ScreeningStage::TrendPass => {
                "SELECT symbol FROM screening_verdicts \
                 WHERE passed_structural = true AND ma_200_up_trend = true \
                 ORDER BY symbol"
            }
            ScreeningStage::GrowthPass => {
                "SELECT symbol FROM screening_verdicts \
                 WHERE passed_structural = true AND ma_200_up_trend = true \
                   AND profit_up_trend = true \
                 ORDER BY symbol"
            }
            ScreeningStage::PatternPass => {
                "SELECT symbol FROM screening_verdicts \
                 WHERE passed_structural = true AND ma_200_up_trend = true \
                   AND profit_up_trend = true AND cup_with_handle = true \
                 ORDER BY symbol"
            }
            ScreeningStage::Unscreened => {
                return Err(DataError::Query(
                    "Unscreened 단계에는 생존자 집합이 없습니다".to_string(),
                ));
            }
        };

        let rows: Vec<(String,)> = sqlx::query_as(sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(s,)| s).collect())
    }

    /// 전체 판정을 단계로 환원해 조회.
    pub async fn load_all(&self) -> Result<Vec<(String, ScreeningStage)>> {
        let rows: Vec<(String, bool, bool, bool, bool)> = sqlx::query_as(
            r#"
            SELECT symbol, passed_structural, ma_200_up_trend, profit_up_trend, cup_with_handle
            FROM screening_verdicts
            ORDER BY symbol
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(symbol, structural, trend, growth, pattern)| {
                (symbol, ScreeningStage::from_flags(structural, trend, growth, pattern))
            })
            .collect())
    }
}
