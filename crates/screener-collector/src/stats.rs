//! 동기화 통계 구조체.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 동기화 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStats {
    /// 총 시도 횟수
    pub total: usize,
    /// 성공 횟수
    pub success: usize,
    /// 에러 횟수
    pub errors: usize,
    /// 건너뛴 횟수 (이미 최신 데이터)
    pub skipped: usize,
    /// 빈 데이터 (조회 성공, 데이터 없음)
    pub empty: usize,
    /// 저장된 총 바 수
    pub total_bars: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl SyncStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    ///
    /// skipped(이미 최신 등 정상 건너뜀)는 분모에서 제외.
    /// 실제 처리 대상(total - skipped) 중 성공 비율을 반환.
    pub fn success_rate(&self) -> f64 {
        let attempted = self.total.saturating_sub(self.skipped);
        if attempted == 0 {
            0.0
        } else {
            (self.success as f64 / attempted as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            skipped = self.skipped,
            empty = self.empty,
            total_bars = self.total_bars,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "동기화 완료"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// skipped는 성공률 분모에서 제외
    #[test]
    fn success_rate_excludes_skipped() {
        let stats = SyncStats {
            total: 10,
            success: 4,
            skipped: 2,
            ..Default::default()
        };
        assert!((stats.success_rate() - 50.0).abs() < f64::EPSILON);
    }

    /// 전부 건너뛴 경우 0%를 반환 (0으로 나누지 않음)
    #[test]
    fn success_rate_handles_all_skipped() {
        let stats = SyncStats {
            total: 3,
            skipped: 3,
            ..Default::default()
        };
        assert_eq!(stats.success_rate(), 0.0);
    }
}
