//! GEX Profile
//!
//! Per-request result of the analytics pipeline. Built fresh for every
//! request and never persisted; only its summary IVs reach the history log.

use serde::{Deserialize, Serialize};

use super::chain::PutGammaPolicy;

/// Per-strike exposure record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrikeRecord {
    pub strike: f64,
    pub call_gex: f64,
    pub put_gex: f64,
    pub net_gex: f64,
    #[serde(rename = "callOI")]
    pub call_oi: u64,
    #[serde(rename = "putOI")]
    pub put_oi: u64,
    #[serde(rename = "totalOI")]
    pub total_oi: u64,
    pub call_vol: u64,
    pub put_vol: u64,
    pub total_vol: u64,
    /// totalVol / totalOI, absent when there is no open interest
    #[serde(rename = "volumeOIRatio")]
    pub volume_oi_ratio: Option<f64>,
    #[serde(rename = "callIV")]
    pub call_iv: Option<f64>,
    #[serde(rename = "putIV")]
    pub put_iv: Option<f64>,
}

/// Gamma exposure profile for one symbol at one spot price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GexProfile {
    pub symbol: String,
    pub spot: f64,
    pub put_gamma_policy: PutGammaPolicy,
    /// Ascending, unique strikes
    pub strikes: Vec<StrikeRecord>,
    /// Running sum of `net_gex`, same length as `strikes`
    pub cumulative: Vec<f64>,
    pub gamma_flip: Option<f64>,
    pub call_wall: Option<f64>,
    pub put_wall: Option<f64>,
    #[serde(rename = "atmIV")]
    pub atm_iv: Option<f64>,
    #[serde(rename = "callWallIV")]
    pub call_wall_iv: Option<f64>,
    #[serde(rename = "putWallIV")]
    pub put_wall_iv: Option<f64>,
    pub expirations: Vec<String>,
}

impl GexProfile {
    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }

    /// Sum of net exposure over every strike
    pub fn total_net_gex(&self) -> f64 {
        self.strikes.iter().map(|s| s.net_gex).sum()
    }

    /// Look up the record at an exact strike
    pub fn record(&self, strike: f64) -> Option<&StrikeRecord> {
        self.strikes.iter().find(|s| s.strike == strike)
    }

    /// Lowest and highest strike
    pub fn strike_range(&self) -> Option<(f64, f64)> {
        Some((self.strikes.first()?.strike, self.strikes.last()?.strike))
    }

    /// Whether aggregate dealer gamma at spot is positive (dampening regime)
    pub fn is_long_gamma(&self) -> Option<bool> {
        self.gamma_flip.map(|flip| self.spot >= flip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(strike: f64, net: f64) -> StrikeRecord {
        StrikeRecord {
            strike,
            call_gex: net.max(0.0),
            put_gex: net.min(0.0),
            net_gex: net,
            call_oi: 1,
            put_oi: 1,
            total_oi: 2,
            call_vol: 0,
            put_vol: 0,
            total_vol: 0,
            volume_oi_ratio: Some(0.0),
            call_iv: None,
            put_iv: None,
        }
    }

    fn profile() -> GexProfile {
        GexProfile {
            symbol: "SPY".to_string(),
            spot: 102.0,
            put_gamma_policy: PutGammaPolicy::Native,
            strikes: vec![record(100.0, 10.0), record(105.0, -4.0)],
            cumulative: vec![10.0, 6.0],
            gamma_flip: Some(105.0),
            call_wall: Some(100.0),
            put_wall: Some(105.0),
            atm_iv: None,
            call_wall_iv: None,
            put_wall_iv: None,
            expirations: vec!["2024-01-19".to_string()],
        }
    }

    #[test]
    fn test_profile_helpers() {
        let p = profile();
        assert!(!p.is_empty());
        assert_eq!(p.total_net_gex(), 6.0);
        assert_eq!(p.strike_range(), Some((100.0, 105.0)));
        assert_eq!(p.record(105.0).unwrap().net_gex, -4.0);
        assert!(p.record(101.0).is_none());
        assert_eq!(p.is_long_gamma(), Some(false));
    }

    #[test]
    fn test_payload_field_names() {
        let json = serde_json::to_value(profile()).unwrap();
        assert!(json.get("gammaFlip").is_some());
        assert!(json.get("callWall").is_some());
        assert!(json.get("atmIV").is_some());
        assert!(json.get("putWallIV").is_some());
        assert_eq!(json["putGammaPolicy"], "native");

        let strike = &json["strikes"][0];
        assert_eq!(strike["netGex"], 10.0);
        assert_eq!(strike["totalOI"], 2);
        assert!(strike.get("volumeOIRatio").is_some());
        assert!(strike.get("callIV").is_some());
    }
}
