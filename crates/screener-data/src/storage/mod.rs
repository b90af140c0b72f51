//! 영속 저장소 모듈.

pub mod aggregates;
pub mod prices;
pub mod registry;
pub mod verdicts;

/// 배치 INSERT/UPSERT 시 한 쿼리에 담는 최대 행 수.
pub(crate) const WRITE_BATCH_SIZE: usize = 500;
