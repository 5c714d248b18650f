//! Schwab Market Data Client
//!
//! HTTP client for the Schwab market data API (`/quotes`, `/chains`).
//! Bearer token acquisition and refresh happen elsewhere; this client is
//! handed a ready access token. Rate limits and server errors are retried
//! here so the engine never has to.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};

use crate::ports::{MarketDataError, MarketDataPort, Quote, RawOptionChain};
use super::quote::parse_quote;

/// Schwab client configuration
#[derive(Debug, Clone)]
pub struct SchwabConfig {
    /// Base URL for the market data API
    pub api_base_url: String,
    /// OAuth bearer token
    pub access_token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Number of attempts per request
    pub max_retries: u32,
    /// Strikes requested around the money (`None` = full chain)
    pub strike_count: Option<u32>,
}

impl Default for SchwabConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.schwabapi.com/marketdata/v1".to_string(),
            access_token: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            strike_count: None,
        }
    }
}

/// Schwab market data client
#[derive(Debug, Clone)]
pub struct SchwabClient {
    config: SchwabConfig,
    http: Client,
}

impl SchwabClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self, MarketDataError> {
        Self::with_config(SchwabConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: SchwabConfig) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MarketDataError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Get the configured API base URL
    pub fn api_base_url(&self) -> &str {
        &self.config.api_base_url
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match self.config.access_token {
            Some(ref token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn quote_request(&self, symbol: &str) -> RequestBuilder {
        let url = format!("{}/quotes", self.config.api_base_url);
        self.authorized(self.http.get(&url).query(&[("symbols", symbol), ("fields", "quote")]))
    }

    fn chain_request(&self, symbol: &str) -> RequestBuilder {
        let url = format!("{}/chains", self.config.api_base_url);
        let mut req = self.http.get(&url).query(&[
            ("symbol", symbol),
            ("contractType", "ALL"),
            ("includeUnderlyingQuote", "false"),
        ]);
        if let Some(count) = self.config.strike_count {
            req = req.query(&[("strikeCount", count.to_string())]);
        }
        self.authorized(req)
    }

    /// Send with retry on transport errors, 429 and 5xx; returns the body of a 2xx response
    async fn send_with_retry(&self, req: RequestBuilder) -> Result<String, MarketDataError> {
        let attempts = self.config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            let request = req
                .try_clone()
                .ok_or_else(|| MarketDataError::Http("Failed to clone request".into()))?;
            let last_attempt = attempt + 1 == attempts;

            let backoff = match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return response
                            .text()
                            .await
                            .map_err(|e| MarketDataError::Http(e.to_string()));
                    }

                    // Exponential backoff on rate limiting
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(MarketDataError::RateLimited(attempt + 1));
                        let backoff = Duration::from_secs(2u64.pow(attempt + 1)); // 2s, 4s, 8s
                        if !last_attempt {
                            tracing::warn!(
                                "Rate limited (429), backing off for {:?} (attempt {}/{})",
                                backoff, attempt + 1, attempts
                            );
                        }
                        backoff
                    } else {
                        let body = response.text().await.unwrap_or_default();
                        let error = MarketDataError::Status { status: status.as_u16(), body };

                        if !status.is_server_error() {
                            return Err(error);
                        }
                        last_error = Some(error);
                        Duration::from_millis(500 * (attempt as u64 + 1))
                    }
                }
                Err(e) => {
                    last_error = Some(MarketDataError::Http(e.to_string()));
                    Duration::from_millis(500 * (attempt as u64 + 1))
                }
            };

            if !last_attempt {
                tokio::time::sleep(backoff).await;
            }
        }

        Err(last_error.unwrap_or_else(|| MarketDataError::Http("Max retries exceeded".into())))
    }
}

#[async_trait]
impl MarketDataPort for SchwabClient {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let body = self.send_with_retry(self.quote_request(symbol)).await?;
        parse_quote(symbol, &body)
    }

    async fn get_option_chain(&self, symbol: &str) -> Result<RawOptionChain, MarketDataError> {
        let body = self.send_with_retry(self.chain_request(symbol)).await?;
        let chain: RawOptionChain = serde_json::from_str(&body)
            .map_err(|e| MarketDataError::ParseError(format!("chain response: {}", e)))?;

        if chain.status.as_deref() == Some("FAILED") {
            return Err(MarketDataError::NotFound(symbol.to_string()));
        }
        Ok(chain)
    }
}
