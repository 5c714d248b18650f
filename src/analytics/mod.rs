//! Analytics Layer - GEX computation
//!
//! Pure, synchronous pipeline with no shared state:
//!
//!   raw chain + spot → `normalizer` → `curve` → `features` → `GexProfile`
//!
//! Identical inputs produce bit-identical profiles.

pub mod params;
pub mod normalizer;
pub mod curve;
pub mod features;

pub use params::{
    EngineParams, ParamsError, CONTRACT_MULTIPLIER, DEFAULT_ATM_STRIKE_WINDOW, DEFAULT_WALL_BAND_PCT,
    MOVE_FRACTION,
};
pub use normalizer::{normalize, split_expiration_key};
pub use curve::{build_curve, dollar_gamma_multiplier, GexCurve};
pub use features::{atm_iv, extract_features, gamma_flip, FlipSource, GammaFlip, GexFeatures};

use crate::domain::{GexError, GexProfile, GexResult};
use crate::ports::RawOptionChain;

/// Compute a GEX profile from a provider chain and spot price
pub fn analyze(
    symbol: &str,
    chain: &RawOptionChain,
    spot: f64,
    params: &EngineParams,
) -> GexResult<GexProfile> {
    if !spot.is_finite() || spot <= 0.0 {
        return Err(GexError::MissingInput(format!(
            "spot price must be positive, got {}",
            spot
        )));
    }

    let normalized = normalize(chain, params.max_dte);
    if normalized.is_empty() {
        return Err(GexError::EmptyResult(symbol.to_string()));
    }

    let curve = build_curve(&normalized, spot, params.put_gamma_policy);
    let features = extract_features(&curve, spot, params);

    tracing::debug!(
        "{} spot {:.2}: {} strikes, {} expirations, put gamma policy {}",
        symbol,
        spot,
        curve.len(),
        normalized.expirations().len(),
        params.put_gamma_policy
    );

    Ok(GexProfile {
        symbol: symbol.to_string(),
        spot,
        put_gamma_policy: params.put_gamma_policy,
        strikes: curve.strikes,
        cumulative: curve.cumulative,
        gamma_flip: features.gamma_flip.map(|f| f.level),
        call_wall: features.call_wall,
        put_wall: features.put_wall,
        atm_iv: features.atm_iv,
        call_wall_iv: features.call_wall_iv,
        put_wall_iv: features.put_wall_iv,
        expirations: normalized.expirations(),
    })
}
