//! 영속성 계층과 업스트림 데이터 소스 인터페이스.
//!
//! - `db` - 명시적으로 생성/주입되는 데이터베이스 핸들
//! - `storage` - 종목 레지스트리, 가격 저장소, 집계/판정 테이블
//! - `provider` - 상장 목록/일봉/펀더멘털 소스 트레이트와 구현

pub mod db;
pub mod error;
pub mod provider;
pub mod storage;

pub use db::{Database, DatabaseConfig};
pub use error::{DataError, Result};
pub use provider::{
    AlphaVantageClient, BarBatch, BarFetchFailure, BarProvider, FailureKind, FundamentalsProvider,
    ListedInstrument, ListingProvider, YahooBarProvider,
};
pub use storage::{
    aggregates::AggregateStore, prices::PriceHistoryStore, registry::InstrumentRegistry,
    verdicts::VerdictStore,
};
