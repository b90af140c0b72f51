//! 파이프라인 워크플로우 모듈.

pub mod aggregate_sync;
pub mod classifier;
pub mod price_sync;
pub mod registry_sync;
pub mod report;
pub mod screen;

pub use aggregate_sync::rebuild_aggregates;
pub use classifier::{classify_failures, Classification};
pub use price_sync::{sync_prices, PriceSyncOptions};
pub use registry_sync::{sweep_sparse_histories, sync_instruments};
pub use report::{report_verdicts, StageCounts};
pub use screen::{run_screen, ScreenStage};
