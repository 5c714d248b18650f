//! Normalized Option Chain
//!
//! Fixed internal shape the rest of the engine works on. The provider's
//! payload quirks (composite expiration keys, single-or-list contracts,
//! stringly numbers) never leak past the normalizer; everything downstream
//! sees per-strike call/put accumulators keyed by a numeric strike.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Exclusive upper bound for a usable implied volatility reading (percent)
pub const IV_CEILING: f64 = 500.0;

/// Filter an implied volatility reading to the open interval (0, 500).
///
/// Out-of-range readings are absent, never zero.
pub fn valid_iv(iv: f64) -> Option<f64> {
    (iv.is_finite() && iv > 0.0 && iv < IV_CEILING).then_some(iv)
}

/// Option side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionSide {
    Call,
    Put,
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionSide::Call => write!(f, "call"),
            OptionSide::Put => write!(f, "put"),
        }
    }
}

/// Sign convention for put-side gamma.
///
/// Upstream chains disagree on whether put gamma arrives already negative.
/// Exactly one policy is active per computation; mixing them double-negates
/// or never negates the put leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PutGammaPolicy {
    /// Put gamma already carries a negative sign; sum as-is
    #[default]
    Native,
    /// Put gamma is unsigned; negate the put-side exposure before summing
    Negate,
}

impl PutGammaPolicy {
    /// Apply the policy to a raw put-side exposure
    pub fn apply(&self, raw_put_exposure: f64) -> f64 {
        match self {
            PutGammaPolicy::Native => raw_put_exposure,
            PutGammaPolicy::Negate => -raw_put_exposure,
        }
    }
}

impl fmt::Display for PutGammaPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PutGammaPolicy::Native => write!(f, "native"),
            PutGammaPolicy::Negate => write!(f, "negate"),
        }
    }
}

/// Inputs of a single option contract after field defaulting
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContractLeg {
    /// Gamma as delivered; `None` when missing or non-numeric
    pub gamma: Option<f64>,
    pub open_interest: u64,
    pub volume: u64,
    /// Implied volatility in percent, already filtered to (0, 500)
    pub implied_volatility: Option<f64>,
}

impl ContractLeg {
    pub fn new(gamma: Option<f64>, open_interest: u64, volume: u64, iv: Option<f64>) -> Self {
        Self {
            gamma: gamma.filter(|g| g.is_finite()),
            open_interest,
            volume,
            implied_volatility: iv.and_then(valid_iv),
        }
    }

    /// gamma × open interest, zero when the leg has no gamma
    pub fn gamma_oi(&self) -> f64 {
        self.gamma
            .map(|g| g * self.open_interest as f64)
            .unwrap_or(0.0)
    }
}

/// Running totals for one side of one strike
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SideAccumulator {
    /// Σ gamma × OI over legs that carry gamma
    pub gamma_oi: f64,
    pub open_interest: u64,
    pub volume: u64,
    iv_sum: f64,
    iv_count: u32,
}

impl SideAccumulator {
    /// Fold a leg into the totals
    pub fn add(&mut self, leg: &ContractLeg) {
        self.gamma_oi += leg.gamma_oi();
        self.open_interest = self.open_interest.saturating_add(leg.open_interest);
        self.volume = self.volume.saturating_add(leg.volume);
        if let Some(iv) = leg.implied_volatility {
            self.iv_sum += iv;
            self.iv_count += 1;
        }
    }

    /// Representative IV: mean of the valid readings folded in
    pub fn implied_volatility(&self) -> Option<f64> {
        if self.iv_count == 0 {
            return None;
        }
        valid_iv(self.iv_sum / self.iv_count as f64)
    }

    /// Number of valid IV readings seen
    pub fn iv_readings(&self) -> u32 {
        self.iv_count
    }
}

/// Call and put accumulators at one strike
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StrikeAggregate {
    pub strike: f64,
    pub calls: SideAccumulator,
    pub puts: SideAccumulator,
}

impl StrikeAggregate {
    pub fn new(strike: f64) -> Self {
        Self {
            strike,
            ..Default::default()
        }
    }

    pub fn side(&self, side: OptionSide) -> &SideAccumulator {
        match side {
            OptionSide::Call => &self.calls,
            OptionSide::Put => &self.puts,
        }
    }

    pub fn side_mut(&mut self, side: OptionSide) -> &mut SideAccumulator {
        match side {
            OptionSide::Call => &mut self.calls,
            OptionSide::Put => &mut self.puts,
        }
    }
}

/// Output of chain normalization: strikes ascending and unique
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedChain {
    strikes: BTreeMap<OrderedFloat<f64>, StrikeAggregate>,
    expirations: BTreeSet<String>,
}

impl NormalizedChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a contract leg into the accumulator for its strike and side
    pub fn add_leg(&mut self, strike: f64, side: OptionSide, leg: &ContractLeg) {
        self.strikes
            .entry(OrderedFloat(strike))
            .or_insert_with(|| StrikeAggregate::new(strike))
            .side_mut(side)
            .add(leg);
    }

    pub fn add_expiration(&mut self, date: impl Into<String>) {
        self.expirations.insert(date.into());
    }

    /// Aggregates in ascending strike order
    pub fn strikes(&self) -> impl Iterator<Item = &StrikeAggregate> {
        self.strikes.values()
    }

    pub fn get(&self, strike: f64) -> Option<&StrikeAggregate> {
        self.strikes.get(&OrderedFloat(strike))
    }

    /// Distinct expiration dates, ascending
    pub fn expirations(&self) -> Vec<String> {
        self.expirations.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.strikes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }
}
