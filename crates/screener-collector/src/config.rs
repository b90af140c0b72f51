//! 환경변수 기반 설정 모듈.

use std::time::Duration;

use chrono::NaiveDate;

use crate::error::PipelineError;
use crate::Result;

/// 희박 이력 판정 기준 바 수 기본값 (1년 거래일 + 여유분).
const DEFAULT_SPARSE_MIN_BARS: i64 = 254;

/// 이름 기반 제외 키워드 기본값.
///
/// 개별 영업 실적이 없는 펀드, ETF, 신탁 등 집합 상품을 걸러냅니다.
const DEFAULT_EXCLUDE_KEYWORDS: &[&str] = &[
    "etf",
    "fund",
    "index",
    "trust",
    "mutual",
    "bond",
    "invesco",
    "vanguard",
    "fidelity",
    "portfolio",
    "shares",
    "commodity",
    "reit",
    "currency",
    "dividend",
    "growth",
    "income",
];

/// 스크리너 파이프라인 전체 설정
#[derive(Debug, Clone)]
pub struct ScreenerConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// Alpha Vantage API 키
    pub alpha_vantage_api_key: String,
    /// 레지스트리 동기화 설정
    pub registry_sync: RegistrySyncConfig,
    /// 일봉 동기화 설정
    pub price_sync: PriceSyncConfig,
    /// 이익 성장 단계 설정
    pub growth: GrowthConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 레지스트리 동기화 설정
#[derive(Debug, Clone)]
pub struct RegistrySyncConfig {
    /// 대상 지역 목록 (예: ["us"])
    pub regions: Vec<String>,
    /// 비활성 판정 기준 경과 일수
    pub inactive_stale_days: i32,
    /// 비활성 판정 시 요구하는 최소 바 수 (신규 상장 보호)
    pub inactive_min_bars: i64,
    /// 희박 이력 판정 기준 바 수
    pub sparse_min_bars: i64,
    /// 이름 기반 제외 키워드
    pub exclude_keywords: Vec<String>,
}

/// 일봉 동기화 설정
#[derive(Debug, Clone)]
pub struct PriceSyncConfig {
    /// 배치당 심볼 수
    pub batch_size: usize,
    /// 배치 간 딜레이 (밀리초)
    pub batch_delay_ms: u64,
    /// 배치 조회 타임아웃 (초)
    pub fetch_timeout_secs: u64,
    /// 실시간 모드 기본 조회 범위 (일) - 바가 전혀 없는 심볼용
    pub realtime_lookback_days: i64,
    /// 이력 모드 기본 시작일 - 바가 전혀 없는 심볼용
    pub history_epoch: NaiveDate,
}

/// 이익 성장 단계 설정
#[derive(Debug, Clone)]
pub struct GrowthConfig {
    /// API 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 워크플로우 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl ScreenerConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            PipelineError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })?;

        let alpha_vantage_api_key = std::env::var("ALPHA_VANTAGE_API_KEY").map_err(|_| {
            PipelineError::Config(
                "ALPHA_VANTAGE_API_KEY 환경변수가 설정되지 않았습니다".to_string(),
            )
        })?;

        let history_epoch = match std::env::var("PRICE_HISTORY_EPOCH") {
            Ok(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                PipelineError::Config(format!("PRICE_HISTORY_EPOCH 파싱 실패: {}", e))
            })?,
            // 2000-01-01은 유효한 날짜라 unwrap이 아닌 상수 생성이 가능
            Err(_) => NaiveDate::from_ymd_opt(2000, 1, 1).ok_or_else(|| {
                PipelineError::Config("기본 이력 시작일 생성 실패".to_string())
            })?,
        };

        Ok(Self {
            database_url,
            alpha_vantage_api_key,
            registry_sync: RegistrySyncConfig {
                regions: env_var_list_or_default("SCREENER_REGIONS", vec!["us".to_string()]),
                inactive_stale_days: env_var_parse("REGISTRY_INACTIVE_STALE_DAYS", 30),
                inactive_min_bars: env_var_parse("REGISTRY_INACTIVE_MIN_BARS", 200),
                sparse_min_bars: env_var_parse("REGISTRY_SPARSE_MIN_BARS", DEFAULT_SPARSE_MIN_BARS),
                exclude_keywords: env_var_list_or_default(
                    "REGISTRY_EXCLUDE_KEYWORDS",
                    DEFAULT_EXCLUDE_KEYWORDS
                        .iter()
                        .map(|k| k.to_string())
                        .collect(),
                ),
            },
            price_sync: PriceSyncConfig {
                batch_size: env_var_parse("PRICE_SYNC_BATCH_SIZE", 300),
                batch_delay_ms: env_var_parse("PRICE_SYNC_BATCH_DELAY_MS", 1500),
                fetch_timeout_secs: env_var_parse("PRICE_SYNC_FETCH_TIMEOUT_SECS", 30),
                realtime_lookback_days: env_var_parse("PRICE_SYNC_REALTIME_LOOKBACK_DAYS", 365),
                history_epoch,
            },
            growth: GrowthConfig {
                request_delay_ms: env_var_parse("GROWTH_REQUEST_DELAY_MS", 800),
            },
            daemon: DaemonConfig {
                interval_minutes: env_var_parse("DAEMON_INTERVAL_MINUTES", 1440),
            },
        })
    }
}

impl PriceSyncConfig {
    /// 배치 간 딜레이를 Duration으로 반환
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// 배치 조회 타임아웃을 Duration으로 반환
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl GrowthConfig {
    /// API 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl DaemonConfig {
    /// 워크플로우 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 쉼표로 구분된 리스트 파싱 (기본값 지원)
fn env_var_list_or_default(key: &str, default: Vec<String>) -> Vec<String> {
    std::env::var(key)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 기본 제외 키워드 목록이 소문자로만 구성되어 있는지 확인
    #[test]
    fn default_exclude_keywords_are_lowercase() {
        for kw in DEFAULT_EXCLUDE_KEYWORDS {
            assert_eq!(*kw, kw.to_lowercase());
        }
    }

    /// 환경변수가 없으면 기본값을 반환
    #[test]
    fn env_var_parse_falls_back_to_default() {
        let value: i64 = env_var_parse("SCREENER_TEST_MISSING_KEY", 42);
        assert_eq!(value, 42);
    }
}
