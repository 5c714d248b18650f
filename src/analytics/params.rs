//! Engine Parameters
//!
//! Tunables for the GEX pipeline. Defaults: native put-gamma sign, ±40%
//! wall band, 5-strike ATM window, every expiration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PutGammaPolicy;

/// Shares per option contract
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

/// Exposure is normalized per 1% move in the underlying
pub const MOVE_FRACTION: f64 = 0.01;

/// Default half-width of the wall search band, as a fraction of spot
pub const DEFAULT_WALL_BAND_PCT: f64 = 0.40;

/// Default number of strikes nearest spot sampled for ATM IV
pub const DEFAULT_ATM_STRIKE_WINDOW: usize = 5;

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("wall_band_pct must be > 0 and finite, got {0}")]
    InvalidWallBand(f64),
    #[error("atm_strike_window must be >= 1")]
    InvalidAtmWindow,
}

/// GEX engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineParams {
    /// Put-side gamma sign convention of the upstream chain
    #[serde(default)]
    pub put_gamma_policy: PutGammaPolicy,
    /// Restrict wall search to strikes within spot × (1 ± band); `None` searches all strikes
    #[serde(default = "default_wall_band")]
    pub wall_band_pct: Option<f64>,
    /// Strikes nearest spot used for ATM IV
    #[serde(default = "default_atm_window")]
    pub atm_strike_window: usize,
    /// Only include expirations with at most this many days to expiry (0 = 0DTE only)
    #[serde(default)]
    pub max_dte: Option<u32>,
}

fn default_wall_band() -> Option<f64> {
    Some(DEFAULT_WALL_BAND_PCT)
}

fn default_atm_window() -> usize {
    DEFAULT_ATM_STRIKE_WINDOW
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            put_gamma_policy: PutGammaPolicy::default(),
            wall_band_pct: default_wall_band(),
            atm_strike_window: DEFAULT_ATM_STRIKE_WINDOW,
            max_dte: None,
        }
    }
}

impl EngineParams {
    pub fn with_put_gamma_policy(mut self, policy: PutGammaPolicy) -> Self {
        self.put_gamma_policy = policy;
        self
    }

    /// Set the wall band; `None` disables it
    pub fn with_wall_band(mut self, band: Option<f64>) -> Self {
        self.wall_band_pct = band;
        self
    }

    pub fn with_atm_window(mut self, window: usize) -> Self {
        self.atm_strike_window = window;
        self
    }

    pub fn with_max_dte(mut self, max_dte: Option<u32>) -> Self {
        self.max_dte = max_dte;
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ParamsError> {
        if let Some(band) = self.wall_band_pct {
            if !band.is_finite() || band <= 0.0 {
                return Err(ParamsError::InvalidWallBand(band));
            }
        }
        if self.atm_strike_window == 0 {
            return Err(ParamsError::InvalidAtmWindow);
        }
        Ok(())
    }
}
