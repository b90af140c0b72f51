//! 컵앤핸들 패턴 검출.
//!
//! 최근 60개 일봉(최신 바가 인덱스 0)을 검사합니다. 인덱스가 커질수록
//! 과거입니다.
//!
//! - 컵 바닥: 윈도우 전체의 최저 종가
//! - 컵 천장: 바닥보다 최근 구간(인덱스 < 바닥)의 최고 종가
//! - 핸들 저점: 천장보다 최근 구간(인덱스 < 천장)의 최저 종가
//!
//! 즉 시간순으로 "바닥 → 회복 상승 → 천장 → 얕은 되돌림(핸들)"의
//! 우측 절반을 봅니다. 거래량 확인(돌파 거래량 vs 핸들/컵 평균)은
//! 계산하여 보고만 하고 게이트로 쓰지 않습니다.

use rust_decimal::prelude::ToPrimitive;
use screener_core::PriceBar;
use thiserror::Error;

/// 패턴 검출 파라미터.
#[derive(Debug, Clone, Copy)]
pub struct CupHandleParams {
    /// 검사 윈도우 (바 개수)
    pub window: usize,
    /// 컵 최소 폭 (천장→바닥 바 개수)
    pub min_cup_span: usize,
    /// 컵 최대 되돌림 비율 (천장 대비)
    pub max_cup_retracement: f64,
    /// 핸들 최소 폭 (천장→핸들 저점 바 개수)
    pub min_handle_span: usize,
    /// 핸들 최대 되돌림 비율 (천장 대비)
    pub max_handle_retracement: f64,
}

impl Default for CupHandleParams {
    fn default() -> Self {
        Self {
            window: 60,
            min_cup_span: 20,
            max_cup_retracement: 0.15,
            min_handle_span: 5,
            max_handle_retracement: 0.08,
        }
    }
}

/// 탈락 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PatternReject {
    /// 윈도우를 채울 바가 부족
    #[error("윈도우를 채울 바가 부족합니다")]
    NotEnoughBars,
    /// 바닥이 윈도우의 최신 바라 천장 후보 구간이 없음
    #[error("최저 종가가 최신 바라 컵 천장이 없습니다")]
    NoCupTop,
    /// 컵 폭이 최소 기준 미달
    #[error("컵 폭이 최소 기준에 미달합니다")]
    CupTooShort,
    /// 컵 되돌림이 최대 기준 초과
    #[error("컵 되돌림이 최대 기준을 초과합니다")]
    CupTooDeep,
    /// 핸들 폭이 최소 기준 미달
    #[error("핸들 폭이 최소 기준에 미달합니다")]
    HandleTooShort,
    /// 핸들 되돌림이 최대 기준 초과
    #[error("핸들 되돌림이 최대 기준을 초과합니다")]
    HandleTooDeep,
}

/// 패턴 통과 시 상세 보고.
#[derive(Debug, Clone, PartialEq)]
pub struct CupHandleReport {
    /// 컵 바닥 인덱스 (최신 바 = 0)
    pub bottom_idx: usize,
    /// 컵 천장 인덱스
    pub top_idx: usize,
    /// 핸들 저점 인덱스
    pub handle_idx: usize,
    /// 컵 되돌림 비율
    pub cup_retracement: f64,
    /// 핸들 되돌림 비율
    pub handle_retracement: f64,
    /// 거래량 확인 (참고용, 게이트 아님)
    pub volume: VolumeConfirmation,
}

/// 거래량 확인 지표.
///
/// 임계 배수는 최근 거래량 변동성(변동계수)에 맞춰 조정합니다:
/// 거래량이 출렁이는 종목일수록 낮은 돌파 배수를 요구합니다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeConfirmation {
    /// 최신 바(돌파 후보) 거래량
    pub breakout_volume: f64,
    /// 핸들 구간 평균 거래량
    pub handle_avg: f64,
    /// 컵 구간(천장→바닥) 평균 거래량
    pub cup_avg: f64,
    /// 적용된 돌파 배수 임계값
    pub breakout_multiple: f64,
    /// 돌파 거래량 ≥ 핸들 평균 × 배수
    pub breakout_confirmed: bool,
    /// 핸들 평균 ≤ 컵 평균 (핸들 거래량 수축)
    pub handle_dry_up: bool,
}

/// 최근 거래량 변동계수를 계산할 구간 길이.
const VOLUME_CV_WINDOW: usize = 20;

/// 컵앤핸들 검출.
///
/// `bars`는 최신 바가 앞(인덱스 0)인 일봉 시퀀스입니다.
pub fn detect_cup_with_handle(
    bars: &[PriceBar],
    params: &CupHandleParams,
) -> Result<CupHandleReport, PatternReject> {
    if bars.len() < params.window {
        return Err(PatternReject::NotEnoughBars);
    }
    let window = &bars[..params.window];

    // 컵 바닥: 윈도우 전체의 최저 종가
    let bottom_idx = argmin_close(window, 0, params.window);
    if bottom_idx == 0 {
        // 최저가가 최신 바: 그보다 최근의 천장이 존재할 수 없음
        return Err(PatternReject::NoCupTop);
    }

    // 컵 천장: 바닥보다 최근 구간의 최고 종가
    let top_idx = argmax_close(window, 0, bottom_idx);

    let cup_span = bottom_idx - top_idx;
    if cup_span < params.min_cup_span {
        return Err(PatternReject::CupTooShort);
    }

    let top = close_f64(&window[top_idx]);
    let bottom = close_f64(&window[bottom_idx]);
    let cup_retracement = (top - bottom) / top;
    if cup_retracement > params.max_cup_retracement {
        return Err(PatternReject::CupTooDeep);
    }

    // 핸들 저점: 천장보다 최근 구간의 최저 종가
    if top_idx == 0 {
        return Err(PatternReject::HandleTooShort);
    }
    let handle_idx = argmin_close(window, 0, top_idx);
    let handle_span = top_idx - handle_idx;
    if handle_span < params.min_handle_span {
        return Err(PatternReject::HandleTooShort);
    }

    let handle_low = close_f64(&window[handle_idx]);
    let handle_retracement = (top - handle_low) / top;
    if handle_retracement > params.max_handle_retracement {
        return Err(PatternReject::HandleTooDeep);
    }

    let volume = confirm_volume(window, top_idx, bottom_idx);

    Ok(CupHandleReport {
        bottom_idx,
        top_idx,
        handle_idx,
        cup_retracement,
        handle_retracement,
        volume,
    })
}

/// 거래량 확인 지표 계산 (참고용).
fn confirm_volume(window: &[PriceBar], top_idx: usize, bottom_idx: usize) -> VolumeConfirmation {
    let breakout_volume = volume_f64(&window[0]);
    let handle_avg = mean_volume(&window[..top_idx.max(1)]);
    let cup_avg = mean_volume(&window[top_idx..=bottom_idx]);

    // 최근 거래량 변동계수 기반 임계 배수 조정
    let cv_window = &window[..VOLUME_CV_WINDOW.min(window.len())];
    let recent_mean = mean_volume(cv_window);
    let recent_cv = if recent_mean > 0.0 {
        let var = cv_window
            .iter()
            .map(|b| {
                let d = volume_f64(b) - recent_mean;
                d * d
            })
            .sum::<f64>()
            / cv_window.len() as f64;
        var.sqrt() / recent_mean
    } else {
        0.0
    };
    let breakout_multiple = if recent_cv > 0.5 { 1.3 } else { 1.5 };

    VolumeConfirmation {
        breakout_volume,
        handle_avg,
        cup_avg,
        breakout_multiple,
        breakout_confirmed: handle_avg > 0.0 && breakout_volume >= handle_avg * breakout_multiple,
        handle_dry_up: handle_avg <= cup_avg,
    }
}

fn close_f64(bar: &PriceBar) -> f64 {
    bar.close.to_f64().unwrap_or(0.0)
}

fn volume_f64(bar: &PriceBar) -> f64 {
    bar.volume.to_f64().unwrap_or(0.0)
}

fn mean_volume(bars: &[PriceBar]) -> f64 {
    if bars.is_empty() {
        return 0.0;
    }
    bars.iter().map(volume_f64).sum::<f64>() / bars.len() as f64
}

/// [from, to) 구간 최저 종가 인덱스 (동률이면 가장 최신).
fn argmin_close(bars: &[PriceBar], from: usize, to: usize) -> usize {
    let mut best = from;
    for i in from + 1..to {
        if bars[i].close < bars[best].close {
            best = i;
        }
    }
    best
}

/// [from, to) 구간 최고 종가 인덱스 (동률이면 가장 최신).
fn argmax_close(bars: &[PriceBar], from: usize, to: usize) -> usize {
    let mut best = from;
    for i in from + 1..to {
        if bars[i].close > bars[best].close {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// 최신 바가 앞에 오는 60개 일봉 생성 (closes[0] = 최신 종가).
    fn bars_from_closes(closes: &[Decimal]) -> Vec<PriceBar> {
        let latest = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| PriceBar {
                symbol: "TEST".to_string(),
                date: latest - chrono::Duration::days(i as i64),
                open: *c,
                high: *c + dec!(1),
                low: *c - dec!(1),
                close: *c,
                volume: dec!(10000),
            })
            .collect()
    }

    /// 교과서형 컵앤핸들 형상 생성.
    ///
    /// 시간순: 바닥(55) → 35바 상승 → 천장(10) → 완만한 핸들 → 최신.
    fn textbook_closes() -> Vec<Decimal> {
        let mut closes = vec![dec!(0); 60];
        // 핸들: 인덱스 0..=10, 천장 100 대비 최대 -5% (저점 95, 인덱스 3)
        for (i, v) in [98, 97, 96, 95, 96, 96, 97, 97, 98, 99, 100]
            .iter()
            .enumerate()
        {
            closes[i] = Decimal::from(*v);
        }
        // 컵 우측: 인덱스 10(천장 100) → 55(바닥 88), 선형 하강(과거로 갈수록 낮음)
        for i in 11..=55 {
            let frac = Decimal::from(i as i64 - 10) / Decimal::from(45);
            closes[i] = dec!(100) - dec!(12) * frac;
        }
        // 바닥보다 과거 구간은 바닥 위에서 유지
        for c in closes.iter_mut().take(60).skip(56) {
            *c = dec!(90);
        }
        closes
    }

    /// 교과서형 형상은 통과.
    #[test]
    fn textbook_cup_with_handle_passes() {
        let bars = bars_from_closes(&textbook_closes());
        let report = detect_cup_with_handle(&bars, &CupHandleParams::default()).unwrap();
        assert_eq!(report.bottom_idx, 55);
        assert_eq!(report.top_idx, 10);
        assert!(report.cup_retracement <= 0.15);
        assert!(report.handle_retracement <= 0.08);
    }

    /// 최저 종가가 윈도우의 첫(최신) 바이면 천장이 없어 탈락 (패닉 없음).
    #[test]
    fn minimum_at_first_bar_is_rejected() {
        let mut closes = textbook_closes();
        closes[0] = dec!(1); // 최신 바가 전체 최저
        let bars = bars_from_closes(&closes);
        assert_eq!(
            detect_cup_with_handle(&bars, &CupHandleParams::default()),
            Err(PatternReject::NoCupTop)
        );
    }

    /// 컵 폭 20바 미만은 탈락.
    #[test]
    fn short_cup_is_rejected() {
        let mut closes = vec![dec!(100); 60];
        // 바닥을 인덱스 15에 둠: 천장(최대)이 인덱스 0쪽에 있어도 폭 < 20
        closes[15] = dec!(90);
        closes[0] = dec!(101);
        let bars = bars_from_closes(&closes);
        assert_eq!(
            detect_cup_with_handle(&bars, &CupHandleParams::default()),
            Err(PatternReject::CupTooShort)
        );
    }

    /// 컵 되돌림 15% 초과는 탈락.
    #[test]
    fn deep_cup_is_rejected() {
        let mut closes = textbook_closes();
        // 바닥을 훨씬 깊게 (100 → 70, 되돌림 30%)
        closes[55] = dec!(70);
        let bars = bars_from_closes(&closes);
        assert_eq!(
            detect_cup_with_handle(&bars, &CupHandleParams::default()),
            Err(PatternReject::CupTooDeep)
        );
    }

    /// 핸들 되돌림 8% 초과는 탈락.
    #[test]
    fn deep_handle_is_rejected() {
        let mut closes = textbook_closes();
        closes[3] = dec!(91); // 천장 100 대비 -9%, 컵 바닥(88)보다는 위
        let bars = bars_from_closes(&closes);
        assert_eq!(
            detect_cup_with_handle(&bars, &CupHandleParams::default()),
            Err(PatternReject::HandleTooDeep)
        );
    }

    /// 윈도우 미달은 탈락.
    #[test]
    fn not_enough_bars_is_rejected() {
        let bars = bars_from_closes(&vec![dec!(100); 30]);
        assert_eq!(
            detect_cup_with_handle(&bars, &CupHandleParams::default()),
            Err(PatternReject::NotEnoughBars)
        );
    }

    /// 거래량 확인 지표가 보고에 포함됨 (게이트 아님).
    #[test]
    fn volume_confirmation_is_advisory() {
        let mut bars = bars_from_closes(&textbook_closes());
        // 핸들 거래량 수축 + 돌파 거래량 급증 시나리오
        for bar in bars.iter_mut().take(10).skip(1) {
            bar.volume = dec!(5000);
        }
        bars[0].volume = dec!(20000);
        let report = detect_cup_with_handle(&bars, &CupHandleParams::default()).unwrap();
        assert!(report.volume.breakout_confirmed);
        assert!(report.volume.handle_dry_up);
    }
}
