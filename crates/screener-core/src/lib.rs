//! 스크리너 공통 도메인 타입.
//!
//! 모든 크레이트에서 공유하는 순수 도메인 모델을 정의합니다.
//! I/O나 영속성 로직은 포함하지 않습니다.

pub mod domain;

pub use domain::{
    AggregateSnapshot, DailyBar, Instrument, InstrumentStatus, PriceBar, PriceStore,
    QuarterlyNetIncome, ScreeningStage,
};
