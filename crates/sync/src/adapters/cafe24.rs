//! Cafe24 reference adapter.
//!
//! Implements the general adapter contract against the Cafe24 admin API:
//! bearer-authenticated product listing, bounded retries with exponential
//! backoff, and a token-refresh round on 401 responses. Credentials are
//! re-read from the shop store on every attempt so a refresh performed by
//! this or any concurrent invocation is picked up automatically.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use stocklink_core::{LogLevel, ShopId};

use crate::logging::SyncLogger;
use crate::store::ShopStore;

use super::protocol::{AttemptOutcome, RetryPolicy, Sleeper, TokioSleeper, Transition};
use super::types::ExternalProduct;
use super::{AdapterError, ProductFetcher};

/// Platform name this adapter registers under.
pub const PLATFORM: &str = "cafe24";

/// Product-listing path on the Cafe24 admin API.
const PRODUCTS_PATH: &str = "/api/v2/admin/products";

/// Cafe24 endpoint configuration.
#[derive(Debug, Clone)]
pub struct Cafe24Config {
    /// Base URL of the shop's admin API (e.g. `https://acme.cafe24api.com`).
    pub base_url: String,
    /// Token-refresh endpoint; POSTing `{ "shop_id": ... }` here updates the
    /// credential store before the call returns.
    pub token_refresh_url: String,
    /// Development shortcut: skip the network and return a fixed catalog.
    /// Refused by config loading when the environment is production.
    pub fixture_catalog: bool,
}

/// Adapter for the Cafe24 commerce platform.
pub struct Cafe24Adapter {
    client: reqwest::Client,
    config: Cafe24Config,
    shops: Arc<dyn ShopStore>,
    logger: SyncLogger,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    cancel: CancellationToken,
}

impl Cafe24Adapter {
    /// Create an adapter with the default retry policy and tokio sleeping.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created. This should never happen
    /// under normal circumstances as we use standard TLS configuration.
    #[must_use]
    pub fn new(config: Cafe24Config, shops: Arc<dyn ShopStore>, logger: SyncLogger) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config,
            shops,
            logger,
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            cancel: CancellationToken::new(),
        }
    }

    /// Override the retry policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the backoff sleeper (tests use [`super::NoopSleeper`]).
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Attach a cancellation token, honored at the top of each attempt and
    /// during each backoff sleep.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// One attempt against the product-listing endpoint.
    ///
    /// Hard errors (unknown shop, missing access token) abort the protocol;
    /// everything else is folded into an [`AttemptOutcome`] for the retry
    /// schedule to judge.
    async fn attempt(&self, shop_id: ShopId) -> Result<AttemptOutcome, AdapterError> {
        // Re-read credentials every attempt so a concurrent refresh is
        // observed rather than a stale cached token.
        let shop = self
            .shops
            .get_shop(shop_id)
            .await?
            .ok_or(AdapterError::ShopNotFound(shop_id))?;
        let token = shop
            .credentials
            .access_token()
            .ok_or_else(|| AdapterError::MissingCredential("access_token".to_string()))?;

        let url = format!(
            "{}{PRODUCTS_PATH}",
            self.config.base_url.trim_end_matches('/')
        );
        let response = match self
            .client
            .get(&url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                return Ok(AttemptOutcome::Transient {
                    error: error.to_string(),
                });
            }
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Ok(AttemptOutcome::AuthExpired { body });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(AttemptOutcome::Transient {
                error: format!("HTTP {status}: {body}"),
            });
        }

        match response.json::<ProductsPayload>().await {
            Ok(payload) => Ok(AttemptOutcome::Success(
                payload.products.into_iter().map(normalize_product).collect(),
            )),
            Err(error) => Ok(AttemptOutcome::Transient {
                error: format!("malformed products payload: {error}"),
            }),
        }
    }

    /// Invoke the external token-refresh operation for a shop. On success
    /// the credential store holds fresh tokens by the time this returns.
    async fn refresh_token(&self, shop_id: ShopId) -> Result<(), AdapterError> {
        let response = self
            .client
            .post(&self.config.token_refresh_url)
            .json(&serde_json::json!({ "shop_id": shop_id }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(AdapterError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait::async_trait]
impl ProductFetcher for Cafe24Adapter {
    fn platform(&self) -> &str {
        PLATFORM
    }

    #[instrument(skip(self), fields(shop_id = %shop_id))]
    async fn fetch(&self, shop_id: ShopId) -> Result<Vec<ExternalProduct>, AdapterError> {
        if self.config.fixture_catalog {
            let catalog = fixture_catalog();
            self.logger
                .log(
                    shop_id,
                    PLATFORM,
                    LogLevel::Info,
                    "fixture catalog shortcut taken, network bypassed",
                    serde_json::json!({ "count": catalog.len() }),
                )
                .await;
            return Ok(catalog);
        }

        let mut attempt: u32 = 1;
        let mut last_error: Option<String> = None;

        loop {
            if self.cancel.is_cancelled() {
                self.logger
                    .log(
                        shop_id,
                        PLATFORM,
                        LogLevel::Warn,
                        "fetch cancelled",
                        serde_json::json!({ "attempt": attempt }),
                    )
                    .await;
                return Err(AdapterError::Cancelled);
            }

            let outcome = self.attempt(shop_id).await?;
            let state = outcome.state();

            match outcome {
                AttemptOutcome::Success(products) => {
                    self.logger
                        .log(
                            shop_id,
                            PLATFORM,
                            LogLevel::Info,
                            format!("fetched {} products", products.len()),
                            serde_json::json!({
                                "attempt": attempt,
                                "state": state,
                                "count": products.len(),
                            }),
                        )
                        .await;
                    return Ok(products);
                }
                AttemptOutcome::AuthExpired { body } => {
                    // The rejection itself is the last known cause; a
                    // successful refresh does not erase it.
                    last_error = Some(format!("HTTP 401: {body}"));
                    self.logger
                        .log(
                            shop_id,
                            PLATFORM,
                            LogLevel::Warn,
                            "access token rejected, attempting refresh",
                            serde_json::json!({
                                "attempt": attempt,
                                "state": state,
                                "response": body,
                            }),
                        )
                        .await;

                    match self.refresh_token(shop_id).await {
                        Ok(()) => {
                            self.logger
                                .log(
                                    shop_id,
                                    PLATFORM,
                                    LogLevel::Info,
                                    "access token refreshed",
                                    serde_json::json!({ "attempt": attempt }),
                                )
                                .await;
                        }
                        // The next attempt may still succeed if the 401 was
                        // a false negative, so the failure is recorded and
                        // the schedule continues.
                        Err(error) => {
                            last_error =
                                Some(format!("token refresh failed after HTTP 401: {error}"));
                            self.logger
                                .log(
                                    shop_id,
                                    PLATFORM,
                                    LogLevel::Warn,
                                    "token refresh failed, retrying anyway",
                                    serde_json::json!({
                                        "attempt": attempt,
                                        "error": error.to_string(),
                                    }),
                                )
                                .await;
                        }
                    }
                }
                AttemptOutcome::Transient { error } => {
                    self.logger
                        .log(
                            shop_id,
                            PLATFORM,
                            LogLevel::Warn,
                            "attempt failed",
                            serde_json::json!({
                                "attempt": attempt,
                                "state": state,
                                "error": error.clone(),
                            }),
                        )
                        .await;
                    last_error = Some(error);
                }
            }

            // Only failed attempts reach the schedule; success returned above.
            match self.policy.decide(attempt) {
                Transition::RetryAfter(delay) => {
                    self.logger
                        .log(
                            shop_id,
                            PLATFORM,
                            LogLevel::Debug,
                            "retrying after backoff",
                            serde_json::json!({
                                "attempt": attempt,
                                "delay_ms": delay.as_millis(),
                            }),
                        )
                        .await;
                    tokio::select! {
                        () = self.cancel.cancelled() => {
                            self.logger
                                .log(
                                    shop_id,
                                    PLATFORM,
                                    LogLevel::Warn,
                                    "fetch cancelled during backoff",
                                    serde_json::json!({ "attempt": attempt }),
                                )
                                .await;
                            return Err(AdapterError::Cancelled);
                        }
                        () = self.sleeper.sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Transition::Exhausted => {
                    let last_error =
                        last_error.unwrap_or_else(|| "no error recorded".to_string());
                    self.logger
                        .log(
                            shop_id,
                            PLATFORM,
                            LogLevel::Error,
                            format!("catalog fetch exhausted after {attempt} attempts"),
                            serde_json::json!({
                                "attempts": attempt,
                                "last_error": last_error.clone(),
                            }),
                        )
                        .await;
                    return Err(AdapterError::Exhausted {
                        attempts: attempt,
                        last_error,
                    });
                }
            }
        }
    }
}

// =============================================================================
// Payload normalization
// =============================================================================

/// Success shape of the product-listing endpoint.
#[derive(Debug, Deserialize)]
struct ProductsPayload {
    #[serde(default)]
    products: Vec<Cafe24Product>,
}

/// One raw Cafe24 product record.
#[derive(Debug, Deserialize)]
struct Cafe24Product {
    product_no: i64,
    #[serde(default)]
    product_code: Option<String>,
    product_name: String,
    /// Cafe24 reports prices as decimal strings.
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    quantity: i64,
    /// "T"/"F" selling flag; absent means selling.
    #[serde(default)]
    selling: Option<String>,
    #[serde(default)]
    options: Vec<Cafe24Option>,
    #[serde(default)]
    barcode: Option<String>,
    #[serde(default)]
    detail_image: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    brand_name: Option<String>,
    #[serde(default)]
    origin_place: Option<String>,
    #[serde(default)]
    summary_description: Option<String>,
    #[serde(default)]
    updated_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct Cafe24Option {
    name: String,
    value: String,
}

fn normalize_product(raw: Cafe24Product) -> ExternalProduct {
    let option_map = if raw.options.is_empty() {
        None
    } else {
        Some(
            raw.options
                .into_iter()
                .map(|option| (option.name, option.value))
                .collect(),
        )
    };

    ExternalProduct {
        external_id: raw.product_no.to_string(),
        code: raw.product_code,
        name: raw.product_name,
        price: raw
            .price
            .as_deref()
            .and_then(|price| price.parse().ok())
            .unwrap_or(Decimal::ZERO),
        inventory_quantity: raw.quantity,
        is_selling: raw.selling.as_deref() != Some("F"),
        option_map,
        barcodes: raw.barcode.into_iter().collect(),
        image_url: raw.detail_image,
        category: raw.category,
        brand: raw.brand_name,
        origin: raw.origin_place,
        description: raw.summary_description,
        last_updated: raw.updated_date,
    }
}

/// Small fixed catalog returned by the development shortcut.
fn fixture_catalog() -> Vec<ExternalProduct> {
    vec![
        ExternalProduct::new("9001", "Fixture Tee", Decimal::new(19_900, 0))
            .with_quantity(12)
            .with_options([("color", "black"), ("size", "L")]),
        ExternalProduct::new("9002", "Fixture Mug", Decimal::new(8_500, 0)).with_quantity(40),
    ]
}
