//! Yahoo Finance 일봉 소스.
//!
//! chart API(v8)는 심볼 단위 조회이므로 배치 요청을 내부에서 심볼별
//! 호출로 풀어 처리하고, 실패는 심볼별 구조화 레코드로 수집합니다.
//! "possibly delisted" 류의 응답 메시지가 그대로 실패 레코드에 실려
//! 분류기로 전달됩니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use screener_core::DailyBar;
use tracing::debug;

use super::{BarBatch, BarFetchFailure, BarProvider, FailureKind};
use crate::error::{DataError, Result};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance 일봉 클라이언트.
pub struct YahooBarProvider {
    http: reqwest::Client,
    base_url: String,
    /// 심볼 간 호출 딜레이
    per_symbol_delay: Duration,
}

impl YahooBarProvider {
    /// 클라이언트 생성 (요청 타임아웃 30초).
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// 베이스 URL 지정 생성 (테스트용).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (compatible; screener/0.3)")
            .build()
            .map_err(|e| DataError::Upstream(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            per_symbol_delay: Duration::from_millis(200),
        })
    }

    /// 단일 심볼 일봉 조회.
    async fn fetch_symbol(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> std::result::Result<Vec<DailyBar>, BarFetchFailure> {
        let period1 = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);
        // 종료일 포함을 위해 다음날 0시까지
        let period2 = (end + chrono::Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);

        let url = format!("{}/{}", self.base_url, symbol);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await
            .map_err(|e| classify_transport_error(symbol, &e))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BarFetchFailure::new(symbol, FailureKind::Network, e.to_string()))?;

        // chart.error에 심볼 단위 오류 설명이 실려 옴
        if let Some(description) = body
            .pointer("/chart/error/description")
            .and_then(|v| v.as_str())
        {
            return Err(BarFetchFailure::new(
                symbol,
                FailureKind::Unknown,
                description.to_string(),
            ));
        }
        if status.as_u16() == 429 {
            return Err(BarFetchFailure::new(
                symbol,
                FailureKind::RateLimited,
                "HTTP 429",
            ));
        }
        if !status.is_success() {
            return Err(BarFetchFailure::new(
                symbol,
                FailureKind::Network,
                format!("HTTP {}", status),
            ));
        }

        parse_chart_result(symbol, &body)
    }
}

#[async_trait]
impl BarProvider for YahooBarProvider {
    async fn fetch_bars(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BarBatch> {
        let mut batch = BarBatch::default();

        for symbol in symbols {
            match self.fetch_symbol(symbol, start, end).await {
                Ok(bars) => {
                    batch.bars.insert(symbol.clone(), bars);
                }
                Err(failure) => {
                    debug!(symbol = %symbol, kind = %failure.kind, "심볼 조회 실패");
                    batch.failures.push(failure);
                }
            }
            tokio::time::sleep(self.per_symbol_delay).await;
        }

        Ok(batch)
    }
}

/// 전송 계층 에러 분류.
fn classify_transport_error(symbol: &str, err: &reqwest::Error) -> BarFetchFailure {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else {
        FailureKind::Network
    };
    BarFetchFailure::new(symbol, kind, err.to_string())
}

/// chart 응답에서 일봉 추출 (날짜 오름차순).
fn parse_chart_result(
    symbol: &str,
    body: &serde_json::Value,
) -> std::result::Result<Vec<DailyBar>, BarFetchFailure> {
    let result = body
        .pointer("/chart/result/0")
        .ok_or_else(|| BarFetchFailure::new(symbol, FailureKind::Unknown, "chart.result 없음"))?;

    let timestamps = match result.get("timestamp").and_then(|v| v.as_array()) {
        Some(t) => t,
        // 구간 내 거래일 없음: 성공이되 빈 데이터
        None => return Ok(Vec::new()),
    };
    let quote = result
        .pointer("/indicators/quote/0")
        .ok_or_else(|| BarFetchFailure::new(symbol, FailureKind::Unknown, "quote 없음"))?;

    let field = |name: &str| -> Vec<Option<f64>> {
        quote
            .get(name)
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().map(|x| x.as_f64()).collect())
            .unwrap_or_default()
    };
    let opens = field("open");
    let highs = field("high");
    let lows = field("low");
    let closes = field("close");
    let volumes = field("volume");

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let date = match ts
            .as_i64()
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .map(|dt| dt.date_naive())
        {
            Some(d) => d,
            None => continue,
        };
        // 휴장일 등 결측 행은 건너뜀
        let row = (
            opens.get(i).copied().flatten(),
            highs.get(i).copied().flatten(),
            lows.get(i).copied().flatten(),
            closes.get(i).copied().flatten(),
            volumes.get(i).copied().flatten(),
        );
        if let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = row {
            let to_dec = |v: f64| Decimal::from_f64(v).unwrap_or_default();
            bars.push(DailyBar {
                date,
                open: to_dec(open),
                high: to_dec(high),
                low: to_dec(low),
                close: to_dec(close),
                volume: to_dec(volume),
            });
        }
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// chart 응답 파싱: 결측 행 스킵, 날짜 오름차순.
    #[test]
    fn parse_chart_result_skips_null_rows() {
        let body = serde_json::json!({
            "chart": {
                "result": [{
                    "timestamp": [1735603200i64, 1735689600i64, 1735776000i64],
                    "indicators": { "quote": [{
                        "open":   [10.0, null, 12.0],
                        "high":   [11.0, null, 13.0],
                        "low":    [9.0,  null, 11.0],
                        "close":  [10.5, null, 12.5],
                        "volume": [1000.0, null, 2000.0]
                    }]}
                }],
                "error": null
            }
        });
        let bars = parse_chart_result("AAPL", &body).unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].date < bars[1].date);
    }

    /// 거래일 없는 구간: 실패가 아니라 빈 결과.
    #[test]
    fn empty_range_is_ok() {
        let body = serde_json::json!({
            "chart": { "result": [{ "indicators": { "quote": [{}] } }], "error": null }
        });
        let bars = parse_chart_result("AAPL", &body).unwrap();
        assert!(bars.is_empty());
    }

    /// 심볼 단위 오류 설명은 실패 레코드로 전달.
    #[test]
    fn chart_error_becomes_failure_record() {
        let body = serde_json::json!({
            "chart": {
                "result": null,
                "error": {
                    "code": "Not Found",
                    "description": "No data found, symbol may be delisted"
                }
            }
        });
        // fetch_symbol 경로의 분기를 단위 수준에서 재현
        let description = body
            .pointer("/chart/error/description")
            .and_then(|v| v.as_str())
            .unwrap();
        let failure = BarFetchFailure::new("GONE", FailureKind::Unknown, description);
        assert!(failure.message.contains("delisted"));
    }
}
