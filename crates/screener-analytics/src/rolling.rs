//! 바 개수 기준 롤링 통계.
//!
//! 이동평균 윈도우는 캘린더 일수가 아니라 저장된 바 개수로 정의합니다.
//! 윈도우는 그만큼의 선행 바가 존재할 때만 유효하며, 부족하면 해당
//! 종목의 평균은 미정의(None)입니다.
//!
//! 큰 심볼 유니버스를 한 번의 패스로 처리할 수 있도록 누적합(prefix
//! sum) 기반으로 계산합니다.

use rust_decimal::Decimal;

/// 스냅샷용 값 묶음 (최신 거래일 기준).
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotValues {
    pub current_price: Decimal,
    pub ma_50: Decimal,
    pub ma_150: Decimal,
    pub ma_200: Decimal,
    /// 전체 이력 최고 종가
    pub high: Decimal,
    /// 전체 이력 최저 종가
    pub low: Decimal,
}

/// 최신 거래일 기준 스냅샷 값 계산.
///
/// `closes`는 날짜 오름차순 종가 시계열입니다. 바가 200개 미만이면
/// 가장 긴 윈도우가 미정의이므로 None을 반환하고, 해당 종목은
/// 스냅샷에서 제외됩니다.
pub fn latest_snapshot_values(closes: &[Decimal]) -> Option<SnapshotValues> {
    let n = closes.len();
    if n < 200 {
        return None;
    }

    let tail_mean = |window: usize| -> Decimal {
        let sum: Decimal = closes[n - window..].iter().copied().sum();
        sum / Decimal::from(window)
    };

    let mut high = closes[0];
    let mut low = closes[0];
    for c in &closes[1..] {
        if *c > high {
            high = *c;
        }
        if *c < low {
            low = *c;
        }
    }

    Some(SnapshotValues {
        current_price: closes[n - 1],
        ma_50: tail_mean(50),
        ma_150: tail_mean(150),
        ma_200: tail_mean(200),
        high,
        low,
    })
}

/// 트레일링 이동평균 시계열.
///
/// 날짜 오름차순 종가에 대해, 윈도우가 완성되는 시점부터의 이동평균을
/// 시간순(오름차순)으로 반환합니다. 길이는 `len - window + 1`이며,
/// 바가 윈도우보다 적으면 빈 벡터를 반환합니다.
pub fn trailing_ma_series(closes: &[Decimal], window: usize) -> Vec<Decimal> {
    let n = closes.len();
    if window == 0 || n < window {
        return Vec::new();
    }

    // 누적합: prefix[i] = closes[0..i] 합
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(Decimal::ZERO);
    let mut acc = Decimal::ZERO;
    for c in closes {
        acc += *c;
        prefix.push(acc);
    }

    let divisor = Decimal::from(window);
    (window..=n)
        .map(|end| (prefix[end] - prefix[end - window]) / divisor)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn closes(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|v| Decimal::from(*v)).collect()
    }

    /// 200개 미만이면 스냅샷 미정의.
    #[test]
    fn snapshot_requires_200_bars() {
        let series = closes(&vec![10; 199]);
        assert!(latest_snapshot_values(&series).is_none());
        let series = closes(&vec![10; 200]);
        assert!(latest_snapshot_values(&series).is_some());
    }

    /// 상수 시계열의 스냅샷 값 검증.
    #[test]
    fn snapshot_of_constant_series() {
        let series = closes(&vec![42; 250]);
        let snap = latest_snapshot_values(&series).unwrap();
        assert_eq!(snap.current_price, dec!(42));
        assert_eq!(snap.ma_50, dec!(42));
        assert_eq!(snap.ma_150, dec!(42));
        assert_eq!(snap.ma_200, dec!(42));
        assert_eq!(snap.high, dec!(42));
        assert_eq!(snap.low, dec!(42));
    }

    /// 극값은 전체 이력 기준.
    #[test]
    fn extrema_cover_full_history() {
        let mut series = closes(&vec![100; 220]);
        series[0] = dec!(7); // 아주 오래된 저점
        series[10] = dec!(500); // 아주 오래된 고점
        let snap = latest_snapshot_values(&series).unwrap();
        assert_eq!(snap.low, dec!(7));
        assert_eq!(snap.high, dec!(500));
    }

    /// 이동평균 시계열 길이와 값 검증.
    #[test]
    fn ma_series_values() {
        let series = closes(&[1, 2, 3, 4, 5]);
        let ma = trailing_ma_series(&series, 3);
        assert_eq!(ma, vec![dec!(2), dec!(3), dec!(4)]);
        assert!(trailing_ma_series(&series, 6).is_empty());
    }
}
