//! 조회 실패 분류 모듈.
//!
//! 일봉 조회 실패를 영구 실패(상장폐지, 무효 심볼)와 일시 실패로
//! 나눕니다. 영구 실패만 레지스트리 상태를 바꾸고, 일시 실패는
//! 다음 실행에서 자연히 재시도됩니다. 판별이 애매한 실패는 항상
//! 일시 실패로 취급합니다 (오분류로 종목을 잃는 쪽이 더 비쌈).

use screener_data::{BarFetchFailure, FailureKind};

/// 상장폐지 시그니처 (소문자 비교).
const DELISTED_SIGNATURES: &[&str] = &["delisted", "no data found"];

/// 무효 심볼 시그니처 (소문자 비교).
const INVALID_SIGNATURES: &[&str] = &["invalid", "not supported"];

/// 분류 결과
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// 상장폐지로 판정된 심볼
    pub delisted: Vec<String>,
    /// 무효 심볼로 판정된 심볼
    pub invalid: Vec<String>,
    /// 일시 실패 (상태 변경 없이 로그만)
    pub transient: Vec<BarFetchFailure>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.delisted.is_empty() && self.invalid.is_empty() && self.transient.is_empty()
    }
}

/// 실패 목록을 분류
///
/// 소스가 종류를 직접 보고하면 그것을 우선하고, `Unknown`은 메시지
/// 시그니처로 판별합니다.
pub fn classify_failures(failures: Vec<BarFetchFailure>) -> Classification {
    let mut result = Classification::default();

    for failure in failures {
        match failure.kind {
            FailureKind::Delisted => result.delisted.push(failure.symbol),
            FailureKind::InvalidSymbol => result.invalid.push(failure.symbol),
            FailureKind::RateLimited | FailureKind::Timeout | FailureKind::Network => {
                result.transient.push(failure);
            }
            FailureKind::Unknown => {
                let message = failure.message.to_lowercase();
                if DELISTED_SIGNATURES.iter().any(|sig| message.contains(sig)) {
                    result.delisted.push(failure.symbol);
                } else if INVALID_SIGNATURES.iter().any(|sig| message.contains(sig)) {
                    result.invalid.push(failure.symbol);
                } else {
                    result.transient.push(failure);
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use screener_data::{BarFetchFailure, FailureKind};

    fn unknown(symbol: &str, message: &str) -> BarFetchFailure {
        BarFetchFailure::new(symbol, FailureKind::Unknown, message)
    }

    /// 상장폐지 시그니처를 가진 메시지는 delisted로 분류
    #[test]
    fn delisted_signature_is_permanent() {
        let result = classify_failures(vec![unknown(
            "AACQ",
            "No data found, symbol may be delisted",
        )]);
        assert_eq!(result.delisted, vec!["AACQ"]);
        assert!(result.invalid.is_empty());
        assert!(result.transient.is_empty());
    }

    /// 무효 심볼 시그니처는 invalid로 분류
    #[test]
    fn invalid_signature_is_permanent() {
        let result = classify_failures(vec![unknown("BAD$SYM", "Invalid ticker requested")]);
        assert_eq!(result.invalid, vec!["BAD$SYM"]);
    }

    /// 시그니처가 없는 실패는 일시 실패로 남음
    #[test]
    fn unmatched_message_stays_transient() {
        let result = classify_failures(vec![unknown("MSFT", "connection reset by peer")]);
        assert_eq!(result.transient.len(), 1);
        assert!(result.delisted.is_empty());
        assert!(result.invalid.is_empty());
    }

    /// 소스가 보고한 종류는 메시지보다 우선
    #[test]
    fn reported_kind_takes_precedence_over_message() {
        // 메시지에 delisted가 있어도 RateLimited는 일시 실패
        let failure = BarFetchFailure::new(
            "AAPL",
            FailureKind::RateLimited,
            "too many requests (delisted cache miss)",
        );
        let result = classify_failures(vec![failure]);
        assert!(result.delisted.is_empty());
        assert_eq!(result.transient.len(), 1);
    }

    /// 한 배치에서 세 범주가 동시에 분류됨
    #[test]
    fn mixed_batch_splits_into_all_categories() {
        let result = classify_failures(vec![
            BarFetchFailure::new("GONE", FailureKind::Delisted, "upstream reported delisting"),
            unknown("WRONG", "symbol not supported by endpoint"),
            BarFetchFailure::new("SLOW", FailureKind::Timeout, "request timed out"),
        ]);
        assert_eq!(result.delisted, vec!["GONE"]);
        assert_eq!(result.invalid, vec!["WRONG"]);
        assert_eq!(result.transient.len(), 1);
        assert!(!result.is_empty());
    }
}
