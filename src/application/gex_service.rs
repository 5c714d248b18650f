//! GEX Service
//!
//! Request orchestration: validate inputs, resolve spot, fetch the chain,
//! run the analytics pipeline and record the intraday IV sample.

use chrono::{DateTime, Utc};

use crate::analytics::{analyze, EngineParams};
use crate::domain::{GexError, GexProfile, GexResult, IvHistory};
use crate::ports::{KeyValueStore, MarketDataPort};

use super::history_recorder::HistoryRecorder;

/// Coordinates the market data provider, the analytics pipeline and the
/// history recorder for single-symbol requests
pub struct GexService<M, S> {
    market_data: M,
    recorder: HistoryRecorder<S>,
    params: EngineParams,
    record_history: bool,
}

impl<M: MarketDataPort, S: KeyValueStore> GexService<M, S> {
    pub fn new(market_data: M, recorder: HistoryRecorder<S>, params: EngineParams) -> Self {
        Self {
            market_data,
            recorder,
            params,
            record_history: true,
        }
    }

    /// Enable or disable the history side effect
    pub fn with_history(mut self, enabled: bool) -> Self {
        self.record_history = enabled;
        self
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn recorder(&self) -> &HistoryRecorder<S> {
        &self.recorder
    }

    /// Compute the profile for `symbol`; spot comes from `spot_override` or a quote lookup
    pub async fn compute_profile(
        &self,
        symbol: &str,
        spot_override: Option<f64>,
    ) -> GexResult<GexProfile> {
        self.compute_profile_at(symbol, spot_override, Utc::now()).await
    }

    /// As `compute_profile`, with an explicit clock for the history sample
    pub async fn compute_profile_at(
        &self,
        symbol: &str,
        spot_override: Option<f64>,
        now: DateTime<Utc>,
    ) -> GexResult<GexProfile> {
        let symbol = validate_symbol(symbol)?;
        let spot = self.resolve_spot(&symbol, spot_override).await?;

        let chain = self.market_data.get_option_chain(&symbol).await?;
        let profile = analyze(&symbol, &chain, spot, &self.params)?;

        tracing::info!(
            "{} @ {:.2} | {} strikes | flip {} | call wall {} | put wall {} | ATM IV {}",
            symbol,
            spot,
            profile.strikes.len(),
            fmt_level(profile.gamma_flip),
            fmt_level(profile.call_wall),
            fmt_level(profile.put_wall),
            fmt_level(profile.atm_iv),
        );

        if self.record_history {
            if let Err(e) = self.recorder.record(&symbol, &profile, now).await {
                tracing::warn!("Failed to record IV history for {}: {}", symbol, e);
            }
        }

        Ok(profile)
    }

    /// Today's IV history for `symbol`
    pub async fn iv_history(&self, symbol: &str) -> GexResult<IvHistory> {
        self.iv_history_at(symbol, Utc::now()).await
    }

    pub async fn iv_history_at(&self, symbol: &str, now: DateTime<Utc>) -> GexResult<IvHistory> {
        let symbol = validate_symbol(symbol)?;
        let records = self.recorder.read(&symbol, now).await?;
        Ok(IvHistory { symbol, records })
    }

    async fn resolve_spot(&self, symbol: &str, spot_override: Option<f64>) -> GexResult<f64> {
        if let Some(spot) = spot_override {
            if !spot.is_finite() || spot <= 0.0 {
                return Err(GexError::MissingInput(format!(
                    "spot price must be positive, got {}",
                    spot
                )));
            }
            return Ok(spot);
        }

        let quote = self.market_data.get_quote(symbol).await?;
        quote.spot().ok_or_else(|| {
            GexError::MissingInput(format!("no last, mark or close price for {}", symbol))
        })
    }
}

fn validate_symbol(symbol: &str) -> GexResult<String> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(GexError::MissingInput("symbol is required".to_string()));
    }
    Ok(symbol.to_uppercase())
}

fn fmt_level(level: Option<f64>) -> String {
    level.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}
