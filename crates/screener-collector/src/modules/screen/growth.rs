//! 3단계: 이익 성장 필터.
//!
//! 추세 생존자의 분기 순이익을 조회해 전년 동기 대비 성장률을
//! 판정합니다. 조회 실패, 분기 부족, 기준 분기 0 등 판정 불가
//! 사유는 모두 탈락입니다.

use std::time::Instant;

use sqlx::PgPool;

use screener_analytics::{assess_profit_growth, GrowthAssessment};
use screener_core::ScreeningStage;
use screener_data::{FundamentalsProvider, VerdictStore};

use crate::config::GrowthConfig;
use crate::{Result, SyncStats};

/// 이익 성장 필터 실행
///
/// 분기 순이익은 심볼당 요청이 필요한 외부 API라 요청 간 딜레이를
/// 둡니다. 개별 심볼의 조회 실패는 해당 심볼 탈락으로만 처리하고
/// 단계 전체를 중단하지 않습니다.
pub async fn run_growth_filter(
    pool: &PgPool,
    fundamentals: &dyn FundamentalsProvider,
    config: &GrowthConfig,
) -> Result<SyncStats> {
    let start = Instant::now();
    let mut stats = SyncStats::new();

    let verdicts = VerdictStore::new(pool.clone());

    let candidates = verdicts.survivors(ScreeningStage::TrendPass).await?;
    stats.total = candidates.len();

    if candidates.is_empty() {
        tracing::info!("추세 필터 생존자 없음 - 이익 성장 단계 건너뜀");
        stats.elapsed = start.elapsed();
        return Ok(stats);
    }

    let mut passed: Vec<String> = Vec::new();

    for (idx, symbol) in candidates.iter().enumerate() {
        let quarters = match fundamentals.fetch_quarterly_net_income(symbol).await {
            Ok(quarters) => quarters,
            Err(e) => {
                stats.errors += 1;
                tracing::warn!(symbol = %symbol, error = %e, "분기 순이익 조회 실패 - 탈락");
                continue;
            }
        };

        match assess_profit_growth(&quarters) {
            GrowthAssessment::Pass { growth_pct } => {
                tracing::debug!(symbol = %symbol, growth_pct = %growth_pct, "이익 성장 통과");
                passed.push(symbol.clone());
                stats.success += 1;
            }
            GrowthAssessment::Fail { growth_pct } => {
                tracing::debug!(symbol = %symbol, growth_pct = %growth_pct, "이익 성장 미달");
            }
            GrowthAssessment::CannotDetermine => {
                stats.skipped += 1;
                tracing::debug!(symbol = %symbol, "기준 분기 순이익 0 - 판정 불가 탈락");
            }
            GrowthAssessment::InsufficientData => {
                stats.skipped += 1;
                tracing::debug!(symbol = %symbol, "분기 데이터 부족 - 탈락");
            }
        }

        if idx + 1 < candidates.len() {
            tokio::time::sleep(config.request_delay()).await;
        }
    }

    verdicts.mark_growth(&passed).await?;

    tracing::info!(
        candidates = candidates.len(),
        survivors = passed.len(),
        errors = stats.errors,
        indeterminate = stats.skipped,
        "이익 성장 필터 완료"
    );

    stats.elapsed = start.elapsed();
    Ok(stats)
}
