use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use rate_card::acquisition::{AcquisitionChain, RateTableStore};
use rate_card::error::AppError;
use rate_card::pricing::{PositionBook, PricingMode, ValidationError};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Everything the pricing endpoints share: the current rate table, the chain
/// used to refresh it, and the session's position book.
#[derive(Debug)]
pub(crate) struct PricingState {
    pub(crate) store: Arc<RateTableStore>,
    pub(crate) chain: Arc<AcquisitionChain>,
    pub(crate) mode: PricingMode,
    positions: Mutex<PositionBook>,
}

impl PricingState {
    pub(crate) fn new(
        store: Arc<RateTableStore>,
        chain: Arc<AcquisitionChain>,
        mode: PricingMode,
    ) -> Self {
        Self {
            store,
            chain,
            mode,
            positions: Mutex::new(PositionBook::new()),
        }
    }

    pub(crate) fn positions(&self) -> MutexGuard<'_, PositionBook> {
        self.positions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `Json` extractor whose rejections become validation errors, so malformed
/// bodies get the same `{"error": ...}` response as invalid fields.
#[derive(Debug)]
pub(crate) struct ValidJson<T>(pub(crate) T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ValidationError::MalformedRequest(rejection.body_text()).into()),
        }
    }
}
