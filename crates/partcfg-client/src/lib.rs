//! Async client for the CAD generation and order endpoints.
//!
//! Each action carries its own [`InFlight`] flag: a second call while the first
//! is still running fails fast with [`ClientError::Busy`]. CAD generation falls
//! back to locally written STEP/DXF files when the backend is unreachable.

pub mod config;
pub mod error;
pub mod wire;

pub use config::ClientConfig;
pub use error::ClientError;

use chrono::Utc;
use partcfg_core::model::PartConfig;
use partcfg_core::quote::{PartMetadata, QUANTITY_RANGE};
use partcfg_core::step::fallback_step;
use partcfg_core::validate::{validate_step, StepValidation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use wire::{CadRequest, CadResponse, OrderRequest, OrderResponse};

pub const CAD_GENERATE_PATH: &str = "/api/cad/generate";
pub const ORDERS_PATH: &str = "/api/orders";

/// Shared busy flag for one kind of request.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<AtomicBool>);

impl InFlight {
    pub fn try_begin(&self) -> Option<InFlightGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(self.0.clone()))
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Clears the flag on drop, including when the request future is dropped.
#[derive(Debug)]
pub struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Locally generated stand-ins for the backend's CAD files.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackFiles {
    pub step: String,
    pub dxf: String,
    pub metadata: PartMetadata,
    pub validation: StepValidation,
    /// Why the backend result could not be used.
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CadOutcome {
    Remote(CadResponse),
    Fallback(FallbackFiles),
}

impl CadOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, CadOutcome::Fallback(_))
    }

    pub fn metadata(&self) -> &PartMetadata {
        match self {
            CadOutcome::Remote(r) => &r.metadata,
            CadOutcome::Fallback(f) => &f.metadata,
        }
    }
}

pub fn fallback_files(part: &PartConfig, reason: impl Into<String>) -> Result<FallbackFiles, ClientError> {
    let generated_at = Utc::now();
    let step = fallback_step(part, generated_at);
    let dxf = partcfg_export_dxf::fallback_dxf(part)
        .map_err(|err| ClientError::Export(format!("{err:#}")))?;
    let validation = validate_step(&step, part);
    Ok(FallbackFiles {
        step,
        dxf,
        metadata: PartMetadata::for_config(part, generated_at),
        validation,
        reason: reason.into(),
    })
}

#[derive(Debug, Clone)]
pub struct CadClient {
    http: reqwest::Client,
    config: ClientConfig,
    cad_busy: InFlight,
    order_busy: InFlight,
}

impl CadClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            config,
            cad_busy: InFlight::default(),
            order_busy: InFlight::default(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cad_in_flight(&self) -> bool {
        self.cad_busy.is_active()
    }

    pub fn order_in_flight(&self) -> bool {
        self.order_busy.is_active()
    }

    pub async fn generate_cad_files(&self, part: &PartConfig) -> Result<CadOutcome, ClientError> {
        let _guard = self.cad_busy.try_begin().ok_or(ClientError::Busy)?;
        let url = self.config.endpoint(CAD_GENERATE_PATH);
        info!(%url, holes = part.holes.len(), "requesting CAD files");

        match self
            .post_json::<_, CadResponse>(&url, &CadRequest::both(part))
            .await
        {
            Ok(response) => Ok(CadOutcome::Remote(response)),
            Err(err) if err.is_remote() && self.config.fallback_on_error => {
                warn!(error = %err, "CAD backend unavailable, writing fallback files");
                Ok(CadOutcome::Fallback(fallback_files(part, err.to_string())?))
            }
            Err(err) => Err(err),
        }
    }

    pub async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResponse, ClientError> {
        check_order(order)?;
        let _guard = self.order_busy.try_begin().ok_or(ClientError::Busy)?;
        let url = self.config.endpoint(ORDERS_PATH);
        info!(%url, quantity = order.quantity, "submitting order");

        let response: OrderResponse = self.post_json(&url, order).await?;
        if !wire::is_order_number(&response.order_number) {
            warn!(order = %response.order_number, "backend returned a malformed order number");
            return Err(ClientError::InvalidResponse(format!(
                "order number {:?}",
                response.order_number
            )));
        }
        info!(order = %response.order_number, status = %response.status, "order accepted");
        Ok(response)
    }

    /// Downloads a file linked from a backend response.
    pub async fn fetch_file(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let url = self.config.resolve(url);
        let response = self.http.get(&url).send().await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.http.post(url).json(body).send().await?;
        let response = check_status(response).await?;
        let parsed = response.json::<R>().await?;
        debug!(%url, "response parsed");
        Ok(parsed)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or(body);
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

fn check_order(order: &OrderRequest) -> Result<(), ClientError> {
    let (min, max) = QUANTITY_RANGE;
    if !(min..=max).contains(&order.quantity) {
        return Err(ClientError::InvalidOrder(format!(
            "quantity must be between {min} and {max}"
        )));
    }
    let email = order.customer_email.trim();
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(ClientError::InvalidOrder(format!(
            "invalid customer email {email:?}"
        )));
    }
    if order.customer_name.trim().is_empty() {
        return Err(ClientError::InvalidOrder(
            "customer name is required".to_string(),
        ));
    }
    Ok(())
}
