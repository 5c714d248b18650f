//! GEX Curve Builder
//!
//! Dollar gamma exposure per strike and side:
//!
//!   gex = gamma × OI × 100 × spot² × 0.01
//!
//! i.e. dollars of delta hedged per 1% move in the underlying. Call-side
//! exposure is summed as-is; put-side exposure goes through the active
//! `PutGammaPolicy`. The cumulative curve is the running sum of net
//! exposure from the lowest strike upward.

use crate::domain::{NormalizedChain, PutGammaPolicy, StrikeAggregate, StrikeRecord};

use super::params::{CONTRACT_MULTIPLIER, MOVE_FRACTION};

/// Per-strike records and their running sum
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GexCurve {
    /// Ascending, unique strikes
    pub strikes: Vec<StrikeRecord>,
    /// `cumulative[i] == cumulative[i-1] + strikes[i].net_gex`
    pub cumulative: Vec<f64>,
}

impl GexCurve {
    pub fn len(&self) -> usize {
        self.strikes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }

    /// Final cumulative value (total net exposure)
    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }
}

/// Dollar exposure per unit of gamma × open interest at `spot`
pub fn dollar_gamma_multiplier(spot: f64) -> f64 {
    CONTRACT_MULTIPLIER * spot * spot * MOVE_FRACTION
}

/// Build the per-strike exposure curve
pub fn build_curve(chain: &NormalizedChain, spot: f64, policy: PutGammaPolicy) -> GexCurve {
    let multiplier = dollar_gamma_multiplier(spot);

    let strikes: Vec<StrikeRecord> = chain
        .strikes()
        .map(|agg| strike_record(agg, multiplier, policy))
        .collect();

    let cumulative = strikes
        .iter()
        .scan(0.0_f64, |running, record| {
            *running += record.net_gex;
            Some(*running)
        })
        .collect();

    GexCurve { strikes, cumulative }
}

fn strike_record(agg: &StrikeAggregate, multiplier: f64, policy: PutGammaPolicy) -> StrikeRecord {
    let call_gex = agg.calls.gamma_oi * multiplier;
    let put_gex = policy.apply(agg.puts.gamma_oi * multiplier);

    let call_oi = agg.calls.open_interest;
    let put_oi = agg.puts.open_interest;
    let total_oi = call_oi.saturating_add(put_oi);
    let call_vol = agg.calls.volume;
    let put_vol = agg.puts.volume;
    let total_vol = call_vol.saturating_add(put_vol);

    StrikeRecord {
        strike: agg.strike,
        call_gex,
        put_gex,
        net_gex: call_gex + put_gex,
        call_oi,
        put_oi,
        total_oi,
        call_vol,
        put_vol,
        total_vol,
        volume_oi_ratio: (total_oi > 0).then(|| total_vol as f64 / total_oi as f64),
        call_iv: agg.calls.implied_volatility(),
        put_iv: agg.puts.implied_volatility(),
    }
}
