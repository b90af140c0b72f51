//! 스크리너 파이프라인 라이브러리.
//!
//! 바이너리(main.rs)와 통합 테스트가 공유하는 공개 표면입니다.

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::ScreenerConfig;
pub use error::{PipelineError, Result};
pub use stats::SyncStats;
