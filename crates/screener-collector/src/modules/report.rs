//! 스크리닝 결과 보고.
//!
//! 판정 테이블을 단계로 환원하고 지역별 Active 종목 정보와 합쳐
//! 단계별 깔때기 집계와 최종 통과 종목을 로그로 출력합니다.

use std::collections::HashMap;

use sqlx::PgPool;
use tracing::info;

use screener_core::{Instrument, ScreeningStage};
use screener_data::{InstrumentRegistry, VerdictStore};

use crate::Result;

/// 단계별 누적 생존자 수.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageCounts {
    pub structural: usize,
    pub trend: usize,
    pub growth: usize,
    pub pattern: usize,
}

/// 판정 시퀀스를 단계별 누적 생존자 수로 집계.
///
/// 뒤 단계 통과 심볼은 앞 단계 집계에도 포함됩니다 (깔때기 형태).
pub fn tally_stages(verdicts: &[(String, ScreeningStage)]) -> StageCounts {
    let mut counts = StageCounts::default();
    for (_, stage) in verdicts {
        if *stage >= ScreeningStage::StructuralPass {
            counts.structural += 1;
        }
        if *stage >= ScreeningStage::TrendPass {
            counts.trend += 1;
        }
        if *stage >= ScreeningStage::GrowthPass {
            counts.growth += 1;
        }
        if *stage >= ScreeningStage::PatternPass {
            counts.pattern += 1;
        }
    }
    counts
}

/// 현재 실행의 스크리닝 결과 보고.
pub async fn report_verdicts(pool: &PgPool, regions: &[String]) -> Result<StageCounts> {
    let registry = InstrumentRegistry::new(pool.clone());
    let verdicts = VerdictStore::new(pool.clone());

    // 지역별 Active 종목으로 심볼 → 이름/거래소 매핑
    let mut by_symbol: HashMap<String, Instrument> = HashMap::new();
    for region in regions {
        for inst in registry.list_by_region(region).await? {
            by_symbol.insert(inst.symbol.clone(), inst);
        }
    }

    let all = verdicts.load_all().await?;
    let counts = tally_stages(&all);

    info!(
        structural = counts.structural,
        trend = counts.trend,
        growth = counts.growth,
        pattern = counts.pattern,
        "단계별 생존자 집계"
    );

    for (symbol, stage) in &all {
        if *stage < ScreeningStage::PatternPass {
            continue;
        }
        match by_symbol.get(symbol) {
            Some(inst) => info!(
                symbol = %symbol,
                name = %inst.name,
                exchange = %inst.exchange,
                "최종 통과 종목"
            ),
            // 판정 후 상태가 전이된 심볼은 Active 목록에 없을 수 있음
            None => info!(symbol = %symbol, "최종 통과 종목 (Active 목록에 없음)"),
        }
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdicts(stages: &[ScreeningStage]) -> Vec<(String, ScreeningStage)> {
        stages
            .iter()
            .enumerate()
            .map(|(i, s)| (format!("SYM{}", i), *s))
            .collect()
    }

    /// 뒤 단계 통과는 앞 단계 집계에 누적됨
    #[test]
    fn counts_form_a_funnel() {
        let v = verdicts(&[
            ScreeningStage::StructuralPass,
            ScreeningStage::StructuralPass,
            ScreeningStage::TrendPass,
            ScreeningStage::GrowthPass,
            ScreeningStage::PatternPass,
        ]);
        let counts = tally_stages(&v);
        assert_eq!(counts.structural, 5);
        assert_eq!(counts.trend, 3);
        assert_eq!(counts.growth, 2);
        assert_eq!(counts.pattern, 1);
    }

    /// Unscreened만 있으면 모든 집계가 0
    #[test]
    fn unscreened_counts_nothing() {
        let v = verdicts(&[ScreeningStage::Unscreened]);
        assert_eq!(tally_stages(&v), StageCounts::default());
    }
}
