//! Quote response wire types
//!
//! `/quotes?symbols=SPY` returns a map keyed by symbol:
//! `{"SPY": {"symbol": "SPY", "quote": {"lastPrice": .., "mark": .., "closePrice": ..}}}`

use serde::Deserialize;
use std::collections::HashMap;

use crate::ports::{MarketDataError, Quote};

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(default)]
    quote: Option<QuoteFields>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteFields {
    #[serde(default)]
    last_price: Option<f64>,
    #[serde(default)]
    mark: Option<f64>,
    #[serde(default)]
    close_price: Option<f64>,
}

/// Extract the quote for `symbol` from a `/quotes` response body
pub fn parse_quote(symbol: &str, body: &str) -> Result<Quote, MarketDataError> {
    let envelopes: HashMap<String, QuoteEnvelope> = serde_json::from_str(body)
        .map_err(|e| MarketDataError::ParseError(format!("quote response: {}", e)))?;

    let fields = envelopes
        .into_iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(symbol))
        .and_then(|(_, envelope)| envelope.quote)
        .ok_or_else(|| MarketDataError::NotFound(symbol.to_string()))?;

    Ok(Quote {
        symbol: symbol.to_string(),
        last_price: fields.last_price,
        mark: fields.mark,
        close_price: fields.close_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quote() {
        let body = r#"{"SPY": {"symbol": "SPY", "quote": {"lastPrice": 451.2, "mark": 451.1, "closePrice": 449.0, "bidPrice": 451.0}}}"#;
        let quote = parse_quote("SPY", body).unwrap();
        assert_eq!(quote.last_price, Some(451.2));
        assert_eq!(quote.spot(), Some(451.2));
    }

    #[test]
    fn test_parse_quote_partial_fields() {
        let body = r#"{"$SPX": {"quote": {"closePrice": 5000.5}}}"#;
        let quote = parse_quote("$spx", body).unwrap();
        assert_eq!(quote.last_price, None);
        assert_eq!(quote.spot(), Some(5000.5));
    }

    #[test]
    fn test_parse_quote_missing_symbol() {
        let err = parse_quote("QQQ", r#"{"SPY": {"quote": {}}}"#).unwrap_err();
        assert!(matches!(err, MarketDataError::NotFound(_)));

        let err = parse_quote("QQQ", "not json").unwrap_err();
        assert!(matches!(err, MarketDataError::ParseError(_)));
    }
}
