//! 추세 유의성 검정.
//!
//! 이동평균 시계열의 최근 구간을 0..n-1 시간 인덱스에 대해 최소제곱
//! 회귀하고, 기울기의 양측 p-value를 Student's t 분포로 계산합니다.
//! 양의 기울기만으로는 부족하고 통계적으로 유의한 상승 드리프트를
//! 요구합니다.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// 회귀 검정 결과.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendTest {
    /// 최소제곱 기울기 (인덱스 1 증가당 값 변화)
    pub slope: f64,
    /// 기울기 = 0 귀무가설에 대한 양측 p-value
    pub p_value: f64,
}

impl TrendTest {
    /// 유의한 상승 추세 여부 (slope > 0 AND p < alpha).
    pub fn is_significant_uptrend(&self, alpha: f64) -> bool {
        self.slope > 0.0 && self.p_value < alpha
    }
}

/// 시간순(오름차순) 시계열에 대한 선형 추세 검정.
///
/// 관측치가 3개 미만이면 자유도가 없어 검정 불가(None)입니다.
/// 완전한 직선(잔차 0)은 p-value 0 (기울기 0인 상수열은 p-value 1)로
/// 처리합니다.
pub fn linear_trend(values: &[f64]) -> Option<TrendTest> {
    let n = values.len();
    if n < 3 {
        return None;
    }

    let nf = n as f64;
    let x_mean = (nf - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxx += dx * dx;
        sxy += dx * (y - y_mean);
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    // 잔차 제곱합
    let mut sse = 0.0;
    for (i, y) in values.iter().enumerate() {
        let fitted = intercept + slope * i as f64;
        let r = y - fitted;
        sse += r * r;
    }

    let df = nf - 2.0;
    let variance = sse / df;
    let se = (variance / sxx).sqrt();

    // 잔차가 0이면 t 통계량이 발산: 기울기 유무로 판정
    if se == 0.0 || !se.is_finite() {
        let p_value = if slope == 0.0 { 1.0 } else { 0.0 };
        return Some(TrendTest { slope, p_value });
    }

    let t_stat = slope / se;
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p_value = 2.0 * (1.0 - dist.cdf(t_stat.abs()));

    Some(TrendTest { slope, p_value })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 완전 선형 증가 20점: 유의한 상승 추세.
    #[test]
    fn perfectly_linear_series_is_significant() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 + i as f64 * 0.5).collect();
        let test = linear_trend(&values).unwrap();
        assert!(test.slope > 0.0);
        assert!(test.p_value < 0.05);
        assert!(test.is_significant_uptrend(0.05));
    }

    /// 평탄한 시계열: 추세 없음.
    #[test]
    fn flat_series_is_not_significant() {
        let values = vec![100.0; 20];
        let test = linear_trend(&values).unwrap();
        assert_eq!(test.slope, 0.0);
        assert!(!test.is_significant_uptrend(0.05));
    }

    /// 무추세 잡음: 유의하지 않음.
    #[test]
    fn noisy_trendless_series_is_not_significant() {
        // 평균 100 주변을 오가는 교대 수열 (기울기 ~0)
        let values: Vec<f64> = (0..20)
            .map(|i| if i % 2 == 0 { 101.0 } else { 99.0 })
            .collect();
        let test = linear_trend(&values).unwrap();
        assert!(!test.is_significant_uptrend(0.05));
    }

    /// 유의한 하락 추세는 상승 판정에서 제외.
    #[test]
    fn downtrend_is_rejected() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let test = linear_trend(&values).unwrap();
        assert!(test.slope < 0.0);
        assert!(test.p_value < 0.05);
        assert!(!test.is_significant_uptrend(0.05));
    }

    /// 관측치 3개 미만은 검정 불가.
    #[test]
    fn too_few_observations() {
        assert!(linear_trend(&[1.0, 2.0]).is_none());
    }
}
