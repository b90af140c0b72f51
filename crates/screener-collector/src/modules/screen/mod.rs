//! 4단계 스크리닝 파이프라인.
//!
//! 구조 필터 → 추세 유의성 → 이익 성장 → 컵앤핸들 순서로 좁혀
//! 갑니다. 각 단계는 앞 단계 생존자만 입력으로 받고, 판정 테이블의
//! 자기 플래그만 올립니다. 데이터가 부족하거나 판정할 수 없는
//! 심볼은 통과시키지 않습니다.

pub mod growth;
pub mod pattern;
pub mod structural;
pub mod trend;

use sqlx::PgPool;

use screener_data::FundamentalsProvider;

use crate::config::GrowthConfig;
use crate::{Result, SyncStats};

/// 실행할 스크리닝 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenStage {
    /// 전체 파이프라인
    All,
    /// 구조 필터만 (판정 테이블 재시딩)
    Structural,
    /// 추세 유의성만
    Trend,
    /// 이익 성장만
    Growth,
    /// 컵앤핸들만
    Pattern,
}

impl std::str::FromStr for ScreenStage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "structural" => Ok(Self::Structural),
            "trend" => Ok(Self::Trend),
            "growth" => Ok(Self::Growth),
            "pattern" => Ok(Self::Pattern),
            other => Err(format!("알 수 없는 스크리닝 단계: {}", other)),
        }
    }
}

/// 스크리닝 파이프라인 실행
///
/// `All`은 네 단계를 순서대로 실행합니다. 단일 단계 실행은 기존
/// 판정 테이블 위에서 해당 단계만 다시 계산합니다 (구조 필터 단독
/// 실행은 테이블을 재시딩하므로 뒤 단계 플래그가 초기화됩니다).
pub async fn run_screen(
    pool: &PgPool,
    fundamentals: &dyn FundamentalsProvider,
    growth_config: &GrowthConfig,
    stage: ScreenStage,
) -> Result<SyncStats> {
    let mut combined = SyncStats::new();
    let start = std::time::Instant::now();

    if matches!(stage, ScreenStage::All | ScreenStage::Structural) {
        let stats = structural::run_structural_filter(pool).await?;
        stats.log_summary("구조 필터");
        merge(&mut combined, &stats);
    }

    if matches!(stage, ScreenStage::All | ScreenStage::Trend) {
        let stats = trend::run_trend_filter(pool).await?;
        stats.log_summary("추세 유의성");
        merge(&mut combined, &stats);
    }

    if matches!(stage, ScreenStage::All | ScreenStage::Growth) {
        let stats = growth::run_growth_filter(pool, fundamentals, growth_config).await?;
        stats.log_summary("이익 성장");
        merge(&mut combined, &stats);
    }

    if matches!(stage, ScreenStage::All | ScreenStage::Pattern) {
        let stats = pattern::run_pattern_filter(pool).await?;
        stats.log_summary("컵앤핸들");
        merge(&mut combined, &stats);
    }

    combined.elapsed = start.elapsed();
    Ok(combined)
}

fn merge(into: &mut SyncStats, from: &SyncStats) {
    into.total += from.total;
    into.success += from.success;
    into.errors += from.errors;
    into.skipped += from.skipped;
    into.empty += from.empty;
    into.total_bars += from.total_bars;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 단계 이름 파싱은 대소문자를 무시
    #[test]
    fn stage_parsing_is_case_insensitive() {
        assert_eq!("ALL".parse::<ScreenStage>(), Ok(ScreenStage::All));
        assert_eq!("Trend".parse::<ScreenStage>(), Ok(ScreenStage::Trend));
        assert!("momentum".parse::<ScreenStage>().is_err());
    }
}
