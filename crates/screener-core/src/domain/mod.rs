//! 도메인 모델.

pub mod aggregate;
pub mod bar;
pub mod instrument;
pub mod screening;

pub use aggregate::AggregateSnapshot;
pub use bar::{DailyBar, PriceBar, PriceStore};
pub use instrument::{Instrument, InstrumentStatus};
pub use screening::{QuarterlyNetIncome, ScreeningStage};
