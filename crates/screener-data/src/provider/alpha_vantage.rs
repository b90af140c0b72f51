//! Alpha Vantage 클라이언트.
//!
//! - 상장 목록: `LISTING_STATUS` (CSV)
//! - 분기 순이익: `INCOME_STATEMENT` (JSON, quarterlyReports)

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use screener_core::QuarterlyNetIncome;
use tracing::debug;

use super::{ListedInstrument, ListingProvider};
use crate::error::{DataError, Result};
use crate::provider::FundamentalsProvider;

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage HTTP 클라이언트.
pub struct AlphaVantageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    /// 클라이언트 생성 (요청 타임아웃 30초).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// 베이스 URL 지정 생성 (테스트용).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::Upstream(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl ListingProvider for AlphaVantageClient {
    async fn fetch_instruments(&self, region: &str) -> Result<Vec<ListedInstrument>> {
        // Alpha Vantage 상장 목록은 US 전용
        if !region.eq_ignore_ascii_case("us") {
            return Err(DataError::Upstream(format!(
                "지원하지 않는 지역: {}",
                region
            )));
        }

        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("function", "LISTING_STATUS"),
                ("state", "active"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| DataError::Upstream(e.to_string()))?;

        let body = response.text().await?;
        parse_listing_csv(&body)
    }
}

#[async_trait]
impl FundamentalsProvider for AlphaVantageClient {
    async fn fetch_quarterly_net_income(&self, symbol: &str) -> Result<Vec<QuarterlyNetIncome>> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("function", "INCOME_STATEMENT"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| DataError::Upstream(e.to_string()))?;

        let body: serde_json::Value = response.json().await?;

        // Rate limit 초과 시 JSON에 Note/Information 필드만 내려옴
        if let Some(note) = body.get("Note").or_else(|| body.get("Information")) {
            return Err(DataError::Upstream(format!(
                "Alpha Vantage 응답 거절: {}",
                note
            )));
        }

        parse_quarterly_reports(&body)
    }
}

/// LISTING_STATUS CSV 파싱.
///
/// 헤더: symbol,name,exchange,assetType,ipoDate,delistingDate,status
fn parse_listing_csv(body: &str) -> Result<Vec<ListedInstrument>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DataError::Parse(e.to_string()))?;
        let symbol = record.get(0).unwrap_or("").trim();
        if symbol.is_empty() {
            continue;
        }
        let ipo_date = record
            .get(4)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());

        rows.push(ListedInstrument {
            symbol: symbol.to_string(),
            name: record.get(1).unwrap_or("").trim().to_string(),
            exchange: record.get(2).unwrap_or("").trim().to_string(),
            ipo_date,
            status: record.get(6).unwrap_or("Active").trim().to_string(),
        });
    }

    debug!(count = rows.len(), "상장 목록 CSV 파싱 완료");
    Ok(rows)
}

/// INCOME_STATEMENT 응답의 quarterlyReports 파싱 (최신 분기가 앞쪽).
///
/// 값이 "None"인 분기는 건너뛰므로 반환 시퀀스가 연속 분기를 보장하지
/// 않습니다. 인덱스로 분기 거리를 재는 소비자는 period를 확인해야 합니다.
fn parse_quarterly_reports(body: &serde_json::Value) -> Result<Vec<QuarterlyNetIncome>> {
    let reports = body
        .get("quarterlyReports")
        .and_then(|v| v.as_array())
        .ok_or_else(|| DataError::Parse("quarterlyReports 필드 없음".to_string()))?;

    let mut quarters = Vec::with_capacity(reports.len());
    for report in reports {
        let period = report
            .get("fiscalDateEnding")
            .and_then(|v| v.as_str())
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
        // "None" 문자열이 섞여 오는 필드이므로 파싱 실패는 건너뜀
        let value = report
            .get("netIncome")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<Decimal>().ok());

        if let (Some(period), Some(value)) = (period, value) {
            quarters.push(QuarterlyNetIncome { period, value });
        }
    }

    // 최신 분기가 앞에 오도록 정렬 보장
    quarters.sort_by(|a, b| b.period.cmp(&a.period));
    Ok(quarters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// 상장 목록 CSV 파싱: 빈 심볼/잘못된 ipoDate 허용.
    #[test]
    fn parse_listing_csv_rows() {
        let body = "symbol,name,exchange,assetType,ipoDate,delistingDate,status\n\
                    AAPL,Apple Inc,NASDAQ,Stock,1980-12-12,null,Active\n\
                    TEST,\"Some, Fund\",NYSE,ETF,,null,Active\n";
        let rows = parse_listing_csv(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "AAPL");
        assert_eq!(
            rows[0].ipo_date,
            Some(NaiveDate::from_ymd_opt(1980, 12, 12).unwrap())
        );
        assert_eq!(rows[1].name, "Some, Fund");
        assert_eq!(rows[1].ipo_date, None);
    }

    /// quarterlyReports 파싱: "None" 값 건너뛰고 최신 분기 우선 정렬.
    #[test]
    fn parse_quarterly_reports_skips_bad_values() {
        let body: serde_json::Value = serde_json::json!({
            "quarterlyReports": [
                {"fiscalDateEnding": "2025-03-31", "netIncome": "120"},
                {"fiscalDateEnding": "2025-06-30", "netIncome": "150"},
                {"fiscalDateEnding": "2024-12-31", "netIncome": "None"},
                {"fiscalDateEnding": "2024-09-30", "netIncome": "100"}
            ]
        });
        let quarters = parse_quarterly_reports(&body).unwrap();
        assert_eq!(quarters.len(), 3);
        assert_eq!(
            quarters[0].period,
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
        );
        assert_eq!(quarters[0].value, dec!(150));
    }
}
