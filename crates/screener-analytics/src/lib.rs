//! 스크리닝 수치 계산 크레이트.
//!
//! 가격 이력에 대한 순수 계산만 담당합니다 (I/O 없음):
//! - `rolling` - 바 개수 기준 이동평균, 이동평균 시계열, 전체 극값
//! - `regression` - 최소제곱 추세 기울기 + 양측 p-value
//! - `growth` - 분기 순이익 YoY 성장률 (0 나누기 가드 포함)
//! - `pattern` - 컵앤핸들 패턴 검출 (거래량 확인은 참고용)

pub mod growth;
pub mod pattern;
pub mod regression;
pub mod rolling;

pub use growth::{assess_profit_growth, GrowthAssessment};
pub use pattern::{detect_cup_with_handle, CupHandleParams, CupHandleReport, PatternReject};
pub use regression::{linear_trend, TrendTest};
pub use rolling::{latest_snapshot_values, trailing_ma_series, SnapshotValues};
