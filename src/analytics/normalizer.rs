//! Chain Normalizer
//!
//! Flattens the provider's nested chain (`side → "date:dte" → strike string →
//! contract | [contract]`) into per-strike call/put accumulators plus the
//! set of expiration dates.
//!
//! Tolerances:
//! - an absent call or put map is treated as empty
//! - only the first contract listed at a strike is used
//! - missing or non-numeric gamma/OI/volume default to absent/zero
//! - IV outside (0, 500) is absent
//! - unparseable strike keys and non-contract entries are skipped
//! - strike keys naming the same number within one expiration count once

use ordered_float::OrderedFloat;
use serde_json::Value;
use std::collections::HashSet;

use crate::domain::{ContractLeg, NormalizedChain, OptionSide};
use crate::ports::{ExpDateMap, RawContract, RawOptionChain};

/// Normalize a provider chain, optionally keeping only expirations with
/// days-to-expiry ≤ `max_dte`
pub fn normalize(chain: &RawOptionChain, max_dte: Option<u32>) -> NormalizedChain {
    let mut out = NormalizedChain::new();
    fold_side(&mut out, chain.call_exp_date_map.as_ref(), OptionSide::Call, max_dte);
    fold_side(&mut out, chain.put_exp_date_map.as_ref(), OptionSide::Put, max_dte);
    out
}

fn fold_side(
    out: &mut NormalizedChain,
    map: Option<&ExpDateMap>,
    side: OptionSide,
    max_dte: Option<u32>,
) {
    let Some(map) = map else {
        tracing::debug!("No {} map in chain", side);
        return;
    };

    // Sorted iteration keeps float summation order stable across runs
    let mut exp_keys: Vec<&String> = map.keys().collect();
    exp_keys.sort();

    for exp_key in exp_keys {
        let (date, dte) = split_expiration_key(exp_key);
        if let (Some(limit), Some(dte)) = (max_dte, dte) {
            if dte > limit {
                continue;
            }
        }
        out.add_expiration(date);

        let strikes = &map[exp_key];
        let mut strike_keys: Vec<&String> = strikes.keys().collect();
        strike_keys.sort();

        // "100" and "100.0" name the same strike; the first key in sorted order wins
        let mut taken: HashSet<OrderedFloat<f64>> = HashSet::new();

        for strike_key in strike_keys {
            let Some(strike) = parse_strike(strike_key) else {
                tracing::debug!("Skipping unparseable strike '{}' ({} {})", strike_key, side, exp_key);
                continue;
            };
            if !taken.insert(OrderedFloat(strike)) {
                tracing::trace!(
                    "Duplicate strike key '{}' for {} {}; keeping first",
                    strike_key, side, exp_key
                );
                continue;
            }
            let entry = &strikes[strike_key];
            if entry.len() > 1 {
                tracing::trace!(
                    "{} contracts at {} {} {}; using first",
                    entry.len(), side, date, strike_key
                );
            }
            match entry.primary() {
                Some(contract) => out.add_leg(strike, side, &leg_from_contract(contract)),
                None => tracing::debug!(
                    "No usable contract at {} {} {}", side, exp_key, strike_key
                ),
            }
        }
    }
}

/// Split `"2024-01-19:3"` into the date and the days-to-expiry suffix
pub fn split_expiration_key(key: &str) -> (&str, Option<u32>) {
    match key.split_once(':') {
        Some((date, suffix)) => (date, suffix.trim().parse().ok()),
        None => (key, None),
    }
}

fn parse_strike(key: &str) -> Option<f64> {
    key.trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s > 0.0)
}

/// Map a provider contract onto the fixed internal leg shape
pub fn leg_from_contract(contract: &RawContract) -> ContractLeg {
    ContractLeg::new(
        numeric(contract.gamma.as_ref()),
        count(contract.open_interest.as_ref()),
        count(contract.total_volume.as_ref()),
        numeric(contract.volatility.as_ref()),
    )
}

/// Finite number from a JSON number or numeric string
fn numeric(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Non-negative whole count; anything else is zero
fn count(value: Option<&Value>) -> u64 {
    match numeric(value) {
        Some(n) if n > 0.0 => n.trunc() as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn chain(value: serde_json::Value) -> RawOptionChain {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_split_expiration_key() {
        assert_eq!(split_expiration_key("2024-01-19:3"), ("2024-01-19", Some(3)));
        assert_eq!(split_expiration_key("2024-01-19:x"), ("2024-01-19", None));
        assert_eq!(split_expiration_key("2024-01-19"), ("2024-01-19", None));
    }

    #[test]
    fn test_normalize_basic_chain() {
        let raw = chain(json!({
            "callExpDateMap": {
                "2024-01-19:3": {
                    "100.0": [{"gamma": 0.05, "openInterest": 1000, "totalVolume": 250, "volatility": 18.0}],
                    "105.0": {"gamma": 0.03, "openInterest": 500, "totalVolume": 80, "volatility": 16.0}
                }
            },
            "putExpDateMap": {
                "2024-01-19:3": {
                    "100.0": [{"gamma": -0.04, "openInterest": 800, "totalVolume": 300, "volatility": 21.0}]
                }
            }
        }));

        let out = normalize(&raw, None);
        assert_eq!(out.len(), 2);
        assert_eq!(out.expirations(), vec!["2024-01-19".to_string()]);

        let s100 = out.get(100.0).unwrap();
        assert_relative_eq!(s100.calls.gamma_oi, 50.0, epsilon = 1e-9);
        assert_relative_eq!(s100.puts.gamma_oi, -32.0, epsilon = 1e-9);
        assert_eq!(s100.calls.volume, 250);
        assert_eq!(s100.puts.implied_volatility(), Some(21.0));

        let s105 = out.get(105.0).unwrap();
        assert_eq!(s105.puts.open_interest, 0);
        assert_eq!(s105.puts.implied_volatility(), None);
    }

    #[test]
    fn test_absent_put_map_is_empty() {
        let raw = chain(json!({
            "callExpDateMap": {"2024-01-19:0": {"50.0": {"gamma": 0.1, "openInterest": 1}}}
        }));
        let out = normalize(&raw, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out.get(50.0).unwrap().puts, Default::default());

        assert!(normalize(&RawOptionChain::default(), None).is_empty());
    }

    #[test]
    fn test_only_first_contract_used() {
        let raw = chain(json!({
            "callExpDateMap": {"2024-01-19:3": {"100": [
                {"gamma": 0.05, "openInterest": 10},
                {"gamma": 9.0, "openInterest": 9999}
            ]}}
        }));
        let acc = normalize(&raw, None).get(100.0).unwrap().calls;
        assert_eq!(acc.open_interest, 10);
        assert_relative_eq!(acc.gamma_oi, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_duplicate_strike_keys_count_once() {
        let raw = chain(json!({
            "callExpDateMap": {
                "2024-01-19:3": {
                    "100": {"gamma": 0.05, "openInterest": 10},
                    "100.0": {"gamma": 0.07, "openInterest": 20},
                    " 100.00": {"gamma": 0.09, "openInterest": 30}
                },
                "2024-01-26:10": {"100.0": {"gamma": 0.01, "openInterest": 5}}
            },
            "putExpDateMap": {
                "2024-01-19:3": {"100.0": {"gamma": -0.02, "openInterest": 40}}
            }
        }));
        let out = normalize(&raw, None);
        let s100 = out.get(100.0).unwrap();

        // " 100.00" sorts first; the later expiration still adds its own leg
        assert_eq!(s100.calls.open_interest, 35);
        assert_relative_eq!(s100.calls.gamma_oi, 2.75, epsilon = 1e-12);
        assert_eq!(s100.puts.open_interest, 40);
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let raw = chain(json!({
            "symbol": 12345,
            "underlyingPrice": "NaN",
            "callExpDateMap": {"2024-01-19:3": {
                "100.0": [{"symbol": 42, "gamma": 0.05, "openInterest": 1000}],
                "105.0": null,
                "110.0": "n/a",
                "115.0": [17, {"gamma": 0.01, "openInterest": 5}]
            }},
            "putExpDateMap": {"2024-01-19:3": {
                "105.0": {"gamma": -0.02, "openInterest": 300}
            }}
        }));
        let out = normalize(&raw, None);

        assert_eq!(out.len(), 2);
        assert_eq!(out.get(100.0).unwrap().calls.open_interest, 1000);
        let s105 = out.get(105.0).unwrap();
        assert_eq!(s105.calls, Default::default());
        assert_eq!(s105.puts.open_interest, 300);
        assert!(out.get(110.0).is_none());
        assert!(out.get(115.0).is_none());
    }

    #[test]
    fn test_malformed_fields_default() {
        let raw = chain(json!({
            "callExpDateMap": {"2024-01-19:3": {
                "100.0": {"gamma": "NaN", "openInterest": "1200", "totalVolume": null, "volatility": 900.0},
                "101.0": {"openInterest": -5, "totalVolume": 12.7, "volatility": "22.5"},
                "abc": {"gamma": 0.5, "openInterest": 10}
            }}
        }));
        let out = normalize(&raw, None);
        assert_eq!(out.len(), 2);

        let s100 = out.get(100.0).unwrap().calls;
        assert_eq!(s100.gamma_oi, 0.0);
        assert_eq!(s100.open_interest, 1200);
        assert_eq!(s100.volume, 0);
        assert_eq!(s100.implied_volatility(), None);

        let s101 = out.get(101.0).unwrap().calls;
        assert_eq!(s101.open_interest, 0);
        assert_eq!(s101.volume, 12);
        assert_eq!(s101.implied_volatility(), Some(22.5));
    }

    #[test]
    fn test_strikes_accumulate_across_expirations() {
        let raw = chain(json!({
            "callExpDateMap": {
                "2024-01-19:3": {"100.0": {"gamma": 0.01, "openInterest": 100, "volatility": 10.0}},
                "2024-01-26:10": {"100.0": {"gamma": 0.02, "openInterest": 100, "volatility": 20.0}}
            }
        }));
        let out = normalize(&raw, None);
        let acc = out.get(100.0).unwrap().calls;
        assert_eq!(acc.open_interest, 200);
        assert_relative_eq!(acc.gamma_oi, 3.0, epsilon = 1e-12);
        assert_relative_eq!(acc.implied_volatility().unwrap(), 15.0);
        assert_eq!(out.expirations(), vec!["2024-01-19".to_string(), "2024-01-26".to_string()]);
    }

    #[test]
    fn test_max_dte_filter() {
        let raw = chain(json!({
            "callExpDateMap": {
                "2024-01-16:0": {"100.0": {"gamma": 0.01, "openInterest": 100}},
                "2024-01-26:10": {"110.0": {"gamma": 0.02, "openInterest": 100}}
            },
            "putExpDateMap": {
                "2024-01-26:10": {"90.0": {"gamma": -0.02, "openInterest": 100}}
            }
        }));
        let zero_dte = normalize(&raw, Some(0));
        assert_eq!(zero_dte.len(), 1);
        assert!(zero_dte.get(100.0).is_some());
        assert_eq!(zero_dte.expirations(), vec!["2024-01-16".to_string()]);

        assert_eq!(normalize(&raw, Some(10)).len(), 3);
    }
}
