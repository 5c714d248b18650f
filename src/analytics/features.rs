//! Feature Extractor
//!
//! Summary levels derived from a GEX curve:
//! - gamma flip: where cumulative exposure crosses zero (interpolated)
//! - call wall / put wall: strikes with the most positive / negative net exposure
//! - ATM IV: mean valid IV over the strikes nearest spot

use crate::domain::{valid_iv, StrikeRecord};

use super::curve::GexCurve;
use super::params::EngineParams;

/// How the gamma flip level was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipSource {
    /// Interpolated between two strikes whose cumulative values straddle zero
    Crossing,
    /// No crossing; strike whose cumulative value is closest to zero
    NearestZero,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaFlip {
    pub level: f64,
    pub source: FlipSource,
}

/// Levels extracted from a curve
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GexFeatures {
    pub gamma_flip: Option<GammaFlip>,
    pub call_wall: Option<f64>,
    pub put_wall: Option<f64>,
    pub atm_iv: Option<f64>,
    pub call_wall_iv: Option<f64>,
    pub put_wall_iv: Option<f64>,
}

/// Extract every feature from a curve
pub fn extract_features(curve: &GexCurve, spot: f64, params: &EngineParams) -> GexFeatures {
    let strikes = &curve.strikes;
    let eligible = wall_candidates(strikes, spot, params.wall_band_pct);

    let call_wall = select_wall(strikes, &eligible, |a, b| a > b);
    let put_wall = select_wall(strikes, &eligible, |a, b| a < b);

    GexFeatures {
        gamma_flip: gamma_flip(strikes, &curve.cumulative, spot),
        call_wall: call_wall.map(|r| r.strike),
        put_wall: put_wall.map(|r| r.strike),
        atm_iv: atm_iv(strikes, spot, params.atm_strike_window),
        call_wall_iv: call_wall.and_then(|r| r.call_iv).and_then(valid_iv).map(round2),
        put_wall_iv: put_wall.and_then(|r| r.put_iv).and_then(valid_iv).map(round2),
    }
}

/// Gamma flip level, rounded to two decimals.
///
/// Every adjacent pair where one cumulative value is `< 0` and the other
/// `>= 0` is a crossing; the flip is interpolated by magnitude between the
/// two strikes. With several crossings the one nearest spot wins (earliest
/// on ties). Without any crossing, falls back to the strike whose cumulative
/// value has the smallest magnitude.
pub fn gamma_flip(strikes: &[StrikeRecord], cumulative: &[f64], spot: f64) -> Option<GammaFlip> {
    let n = strikes.len().min(cumulative.len());
    if n == 0 {
        return None;
    }

    let mut best: Option<f64> = None;
    for i in 1..n {
        let (prev, curr) = (cumulative[i - 1], cumulative[i]);
        if !crosses_zero(prev, curr) {
            continue;
        }
        let level = interpolate(strikes[i - 1].strike, strikes[i].strike, prev, curr);
        let closer = match best {
            Some(b) => (level - spot).abs() < (b - spot).abs(),
            None => true,
        };
        if closer {
            best = Some(level);
        }
    }

    if let Some(level) = best {
        return Some(GammaFlip { level: round2(level), source: FlipSource::Crossing });
    }

    let mut nearest = 0;
    for i in 1..n {
        if cumulative[i].abs() < cumulative[nearest].abs() {
            nearest = i;
        }
    }
    Some(GammaFlip {
        level: round2(strikes[nearest].strike),
        source: FlipSource::NearestZero,
    })
}

fn crosses_zero(a: f64, b: f64) -> bool {
    (a < 0.0 && b >= 0.0) || (a >= 0.0 && b < 0.0)
}

fn interpolate(lo_strike: f64, hi_strike: f64, lo_cum: f64, hi_cum: f64) -> f64 {
    let (a, b) = (lo_cum.abs(), hi_cum.abs());
    // One side is strictly negative, so a + b > 0
    lo_strike + (a / (a + b)) * (hi_strike - lo_strike)
}

/// Indices eligible for wall selection; the whole range when the band is
/// disabled or excludes everything
fn wall_candidates(strikes: &[StrikeRecord], spot: f64, band: Option<f64>) -> Vec<usize> {
    let all = || (0..strikes.len()).collect::<Vec<_>>();
    let Some(band) = band else {
        return all();
    };

    let half_width = spot * band;
    let in_band: Vec<usize> = strikes
        .iter()
        .enumerate()
        .filter(|(_, r)| (r.strike - spot).abs() <= half_width)
        .map(|(i, _)| i)
        .collect();

    if in_band.is_empty() {
        tracing::debug!("No strikes within ±{:.0}% of spot {:.2}; walls use full range", band * 100.0, spot);
        all()
    } else {
        in_band
    }
}

/// First record whose net exposure beats every other candidate under `better`
fn select_wall<'a>(
    strikes: &'a [StrikeRecord],
    candidates: &[usize],
    better: impl Fn(f64, f64) -> bool,
) -> Option<&'a StrikeRecord> {
    let mut selected: Option<&StrikeRecord> = None;
    for &i in candidates {
        let record = &strikes[i];
        match selected {
            Some(current) if !better(record.net_gex, current.net_gex) => {}
            _ => selected = Some(record),
        }
    }
    selected
}

/// Mean of valid call and put IVs over the `window` strikes nearest spot
pub fn atm_iv(strikes: &[StrikeRecord], spot: f64, window: usize) -> Option<f64> {
    let mut by_distance: Vec<&StrikeRecord> = strikes.iter().collect();
    // Stable sort: equal distances keep ascending strike order
    by_distance.sort_by(|a, b| (a.strike - spot).abs().total_cmp(&(b.strike - spot).abs()));

    let readings: Vec<f64> = by_distance
        .into_iter()
        .take(window)
        .flat_map(|r| [r.call_iv, r.put_iv])
        .flatten()
        .filter_map(valid_iv)
        .collect();

    if readings.is_empty() {
        return None;
    }
    Some(round2(readings.iter().sum::<f64>() / readings.len() as f64))
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
