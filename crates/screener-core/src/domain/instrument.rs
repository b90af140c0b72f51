//! 종목(Instrument) 도메인 타입.
//!
//! 종목의 식별 정보와 라이프사이클 상태를 정의합니다:
//! - `InstrumentStatus` - 종목 상태 (Active, Delisted 등)
//! - `Instrument` - 종목 엔티티 (symbol이 유일 키)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 종목 라이프사이클 상태.
///
/// 상태 전이는 Synchronizer/Classifier만 수행하며, 전이 간 합법성 검사는
/// 호출자가 책임집니다 (임의 상태 → 임의 상태 전이 가능).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentStatus {
    /// 정상 거래 중 (동기화/스크리닝 대상)
    Active,
    /// 최근 30일 이상 바 없음 (일관성 스윕으로 전이)
    Inactive,
    /// 상장폐지 감지 (이후 동기화에서 제외)
    Delisted,
    /// 지원하지 않는/잘못된 심볼 (이후 동기화에서 제외)
    Invalid,
    /// 이름 기반 제외 (ETF, 펀드 등 비개별주 비히클)
    Exclude,
}

impl InstrumentStatus {
    /// DB 저장용 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Delisted => "Delisted",
            Self::Invalid => "Invalid",
            Self::Exclude => "Exclude",
        }
    }

    /// 업스트림 상장 목록의 상태 문자열 파싱 (알 수 없으면 Active).
    pub fn parse_listing(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "delisted" => Self::Delisted,
            "inactive" => Self::Inactive,
            _ => Self::Active,
        }
    }
}

impl std::fmt::Display for InstrumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for InstrumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Inactive" => Ok(Self::Inactive),
            "Delisted" => Ok(Self::Delisted),
            "Invalid" => Ok(Self::Invalid),
            "Exclude" => Ok(Self::Exclude),
            other => Err(format!("알 수 없는 종목 상태: {}", other)),
        }
    }
}

/// 거래 가능 종목.
///
/// 최초 상장 목록 관찰 시 생성되며 물리적으로 삭제되지 않습니다.
/// 가변 속성은 `status` 뿐입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    /// 종목 코드 (유일 키, 예: "AAPL")
    pub symbol: String,
    /// 종목명
    pub name: String,
    /// 지역 코드 (예: "us")
    pub region: String,
    /// 거래소 (예: "NASDAQ")
    pub exchange: String,
    /// 상장일 (업스트림이 제공하지 않을 수 있음)
    pub ipo_date: Option<NaiveDate>,
    /// 라이프사이클 상태
    pub status: InstrumentStatus,
    /// 최초 관찰 시각
    pub created_at: Option<DateTime<Utc>>,
}

impl Instrument {
    /// 상장 목록에서 관찰된 신규 종목 생성.
    pub fn from_listing(
        symbol: impl Into<String>,
        name: impl Into<String>,
        region: impl Into<String>,
        exchange: impl Into<String>,
        ipo_date: Option<NaiveDate>,
        status: InstrumentStatus,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            region: region.into(),
            exchange: exchange.into(),
            ipo_date,
            status,
            created_at: None,
        }
    }
}
