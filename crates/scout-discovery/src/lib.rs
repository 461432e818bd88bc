//! Scout Discovery - candidate wallet discovery against upstream
//! blockchain-data APIs.
//!
//! Composes two upstream calls (seed tokens, then per-token wallets) into
//! one deduplicated candidate list. Transient upstream failures are
//! retried with exponential backoff and jitter; the Moralis upstream
//! additionally rotates through fallback API keys on 401, with the first
//! working key becoming sticky for the client's lifetime.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod credentials;
pub mod error;
mod retry;

pub use credentials::CredentialRing;
pub use error::{DiscoveryError, Result};

use retry::HttpResponse;
use scout_core::{DiscoveryConfig, TokenSource, WalletId};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DEFAULT_BIRDEYE_BASE_URL: &str = "https://public-api.birdeye.so";
const DEFAULT_MORALIS_BASE_URL: &str = "https://solana-gateway.moralis.io";

/// Upstream request timeout.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// How many wallets to pull per token.
const WALLETS_PER_TOKEN: usize = 100;

/// Client for the token and wallet discovery upstreams.
pub struct DiscoveryClient {
    http: reqwest::Client,
    config: DiscoveryConfig,
    moralis_keys: CredentialRing,
    birdeye_base_url: String,
    moralis_base_url: String,
}

impl DiscoveryClient {
    /// Build a client from discovery settings.
    pub fn new(config: DiscoveryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;

        let moralis_keys = CredentialRing::new(
            config.moralis_api_key.clone(),
            config.moralis_fallback_keys.clone(),
        );

        Ok(Self {
            http,
            config,
            moralis_keys,
            birdeye_base_url: DEFAULT_BIRDEYE_BASE_URL.to_string(),
            moralis_base_url: DEFAULT_MORALIS_BASE_URL.to_string(),
        })
    }

    /// Point the client at different upstream hosts. Used by tests and
    /// self-hosted gateways.
    #[must_use]
    pub fn with_base_urls(
        mut self,
        birdeye_base_url: impl Into<String>,
        moralis_base_url: impl Into<String>,
    ) -> Self {
        self.birdeye_base_url = birdeye_base_url.into();
        self.moralis_base_url = moralis_base_url.into();
        self
    }

    /// Produce the candidate wallet set: seed tokens from the configured
    /// source, then the top wallets of each token, deduplicated in
    /// first-seen order.
    pub async fn fetch_candidates(&self, token: &CancellationToken) -> Result<Vec<WalletId>> {
        let tokens = match self.config.token_source {
            TokenSource::Birdeye => self.fetch_birdeye_tokens(token).await?,
            TokenSource::Moralis => self.fetch_graduated_tokens(token).await?,
        };
        tracing::info!("Discovered {} seed tokens", tokens.len());

        let mut wallets = Vec::new();
        let mut seen = HashSet::new();
        for mint in &tokens {
            let owners = if self.config.fetch_traders {
                self.fetch_top_traders(token, mint).await?
            } else {
                self.fetch_top_holders(token, mint).await?
            };
            for owner in owners {
                if !owner.is_empty() && seen.insert(owner.clone()) {
                    wallets.push(WalletId::new(owner));
                }
            }
        }

        tracing::info!(
            "Discovered {} candidate wallets across {} tokens",
            wallets.len(),
            tokens.len()
        );
        Ok(wallets)
    }

    /// Trending tokens from Birdeye, filtered by liquidity band.
    async fn fetch_birdeye_tokens(&self, token: &CancellationToken) -> Result<Vec<String>> {
        let url = format!(
            "{}/defi/tokenlist?sort_by=liquidity&sort_type=desc&offset=0&limit={}&min_liquidity=100000&max_liquidity=500000",
            self.birdeye_base_url, self.config.token_limit
        );
        let body = self.get_birdeye(token, &url).await?;

        #[derive(Deserialize)]
        struct TokenList {
            success: bool,
            #[serde(default)]
            data: TokenListData,
        }
        #[derive(Deserialize, Default)]
        struct TokenListData {
            #[serde(default)]
            tokens: Vec<TokenEntry>,
        }
        #[derive(Deserialize)]
        struct TokenEntry {
            address: String,
        }

        let parsed: TokenList = serde_json::from_slice(&body)?;
        if !parsed.success {
            tracing::warn!("Birdeye token list reported failure");
        }
        Ok(parsed.data.tokens.into_iter().map(|t| t.address).collect())
    }

    /// Graduated pump.fun tokens from Moralis, with key rotation.
    async fn fetch_graduated_tokens(&self, token: &CancellationToken) -> Result<Vec<String>> {
        let url = format!(
            "{}/token/mainnet/exchange/pumpfun/graduated?limit={}",
            self.moralis_base_url, self.config.token_limit
        );
        let body = self.get_moralis_rotating(token, &url).await?;

        #[derive(Deserialize)]
        struct Graduated {
            #[serde(default)]
            result: Vec<GraduatedEntry>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct GraduatedEntry {
            token_address: String,
        }

        let parsed: Graduated = serde_json::from_slice(&body)?;
        Ok(parsed.result.into_iter().map(|t| t.token_address).collect())
    }

    /// Top traders of one token by 24h volume, from Birdeye.
    async fn fetch_top_traders(
        &self,
        token: &CancellationToken,
        mint: &str,
    ) -> Result<Vec<String>> {
        let url = format!(
            "{}/defi/v2/tokens/top_traders?address={}&time_frame=24h&sort_by=volume&sort_type=desc&offset=0&limit={}",
            self.birdeye_base_url, mint, WALLETS_PER_TOKEN
        );
        let body = self.get_birdeye(token, &url).await?;

        #[derive(Deserialize)]
        struct TopTraders {
            #[serde(default)]
            data: TopTradersData,
        }
        #[derive(Deserialize, Default)]
        struct TopTradersData {
            #[serde(default)]
            items: Vec<TraderEntry>,
        }
        #[derive(Deserialize)]
        struct TraderEntry {
            #[serde(default)]
            owner: String,
        }

        let parsed: TopTraders = serde_json::from_slice(&body)?;
        Ok(parsed.data.items.into_iter().map(|t| t.owner).collect())
    }

    /// Top holders of one token, from Moralis (sticky key, no rotation
    /// retry here: the active key was already proven by the token fetch).
    async fn fetch_top_holders(
        &self,
        token: &CancellationToken,
        mint: &str,
    ) -> Result<Vec<String>> {
        let url = format!(
            "{}/token/mainnet/{}/top-holders?limit={}",
            self.moralis_base_url, mint, WALLETS_PER_TOKEN
        );

        let active = self.moralis_keys.active_index();
        let key = self
            .moralis_keys
            .key_at(active)
            .unwrap_or_default()
            .to_string();
        let http = &self.http;
        let url = url.as_str();
        let key = key.as_str();
        let body = retry::with_retry(token, self.config.max_retries, move || async move {
            let resp = http
                .get(url)
                .header("accept", "application/json")
                .header("X-API-Key", key)
                .send()
                .await?;
            let status = resp.status().as_u16();
            let body = resp.bytes().await?.to_vec();
            Ok(HttpResponse { status, body })
        })
        .await?;

        #[derive(Deserialize)]
        struct Holders {
            #[serde(default)]
            result: Vec<HolderEntry>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct HolderEntry {
            #[serde(default)]
            owner_address: String,
        }

        let parsed: Holders = serde_json::from_slice(&body)?;
        Ok(parsed.result.into_iter().map(|h| h.owner_address).collect())
    }

    /// GET a Birdeye endpoint through the generic retrying call.
    async fn get_birdeye(&self, token: &CancellationToken, url: &str) -> Result<Vec<u8>> {
        let http = &self.http;
        let api_key = self.config.birdeye_api_key.as_str();
        retry::with_retry(token, self.config.max_retries, move || async move {
            let resp = http
                .get(url)
                .header("X-API-KEY", api_key)
                .header("accept", "application/json")
                .header("x-chain", "solana")
                .send()
                .await?;
            let status = resp.status().as_u16();
            let body = resp.bytes().await?.to_vec();
            Ok(HttpResponse { status, body })
        })
        .await
    }

    /// GET a Moralis endpoint, rotating through fallback keys on 401.
    ///
    /// Rotation is its own policy: one plain request per credential, no
    /// backoff between attempts, first non-401 response stops the walk. A
    /// success on a fallback commits it as the sticky active key.
    async fn get_moralis_rotating(
        &self,
        token: &CancellationToken,
        url: &str,
    ) -> Result<Vec<u8>> {
        if token.is_cancelled() {
            return Err(DiscoveryError::Cancelled);
        }

        let start = self.moralis_keys.active_index();
        for index in start..self.moralis_keys.len() {
            let Some(key) = self.moralis_keys.key_at(index) else {
                break;
            };

            let resp = self
                .http
                .get(url)
                .header("accept", "application/json")
                .header("X-API-Key", key)
                .send()
                .await?;
            let status = resp.status().as_u16();
            let body = resp.bytes().await?.to_vec();

            if status == 401 {
                tracing::warn!(
                    "Moralis {} key failed (401), trying {}",
                    CredentialRing::label(index),
                    CredentialRing::label(index + 1)
                );
                continue;
            }
            if !(200..300).contains(&status) {
                return Err(DiscoveryError::Terminal {
                    status,
                    body: format!("(tried {})", CredentialRing::label(index)),
                });
            }

            self.moralis_keys.commit(index);
            return Ok(body);
        }

        Err(DiscoveryError::AllCredentialsFailed)
    }
}
