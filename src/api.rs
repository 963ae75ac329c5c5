//! HTTP API for the Rent Engine.
//!
//! This module exposes the calculators and the stored calculation
//! records over a small JSON API built with
//! [`axum`](https://crates.io/crates/axum).  Pricing tables are loaded
//! once when the router is built and shared read-only across requests.

use crate::config::Settings;
use crate::engine::{compute_rent_batch, compute_rent_with, compute_trip_cost};
use crate::error::{Error, ValidationError};
use crate::form::{RentCalculationForm, TripCostForm};
use crate::models::{RentCalculationInput, RentCalculationResult, TripCostInput, TripCostResult};
use crate::rates::{load_pricing_config, PricingConfig};
use crate::service::CalculationService;
use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Application state shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub service: CalculationService,
}

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Wrapper that turns crate errors and unreadable request bodies into
/// HTTP responses.
pub enum ApiError {
    Engine(Error),
    Body(JsonRejection),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Engine(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Engine(Error::Validation(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if let JsonRejection::JsonDataError(_) = &rejection {
            let text = rejection.body_text();
            if let Some((field, reason)) = rejected_field(&text) {
                return ApiError::Engine(Error::Validation(ValidationError::new(field, reason)));
            }
        }
        ApiError::Body(rejection)
    }
}

/// Splits axum's data-error text, `"<prefix>: <path>: <reason> at line
/// L column C"`, into the serde path and the reason.
fn rejected_field(text: &str) -> Option<(&str, &str)> {
    let (_, detail) = text.split_once(": ")?;
    let (path, reason) = detail.split_once(": ")?;
    let is_path = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
    let reason = reason
        .rsplit_once(" at line ")
        .map_or(reason, |(reason, _)| reason);
    is_path.then_some((path, reason))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Engine(err) => err,
            ApiError::Body(rejection) => {
                let body = ErrorResponse {
                    error_type: "invalid_body",
                    message: rejection.body_text(),
                    field: None,
                };
                return (rejection.status(), Json(body)).into_response();
            }
        };
        let (status, body) = match err {
            Error::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    error_type: "validation_error",
                    message: err.to_string(),
                    field: Some(err.field),
                },
            ),
            err @ Error::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error_type: "not_found",
                    message: err.to_string(),
                    field: None,
                },
            ),
            err @ Error::Storage(_) => {
                tracing::error!(error = %err, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error_type: "storage_error",
                        message: err.to_string(),
                        field: None,
                    },
                )
            }
            err @ Error::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error_type: "configuration_error",
                    message: err.to_string(),
                    field: None,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// JSON body extractor whose rejections use the [`ErrorResponse`] shape.
///
/// A value of the wrong type is reported as a `validation_error` naming
/// the offending field; any other unreadable body is `invalid_body` with
/// axum's status code.
pub struct FormJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for FormJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(FormJson(value))
    }
}

/// One entry of a batch response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchItem {
    Ok(RentCalculationResult),
    Error(ValidationError),
}

/// Build the API router around an existing service.
pub fn build_router(service: CalculationService) -> Router {
    let state = Arc::new(AppState { service });
    Router::new()
        .route("/health", get(health))
        .route("/api/rates", get(rates_handler))
        .route("/api/trip-cost", post(trip_cost_handler))
        .route("/api/rent", post(rent_handler))
        .route("/api/rent/batch", post(rent_batch_handler))
        .route(
            "/api/calculations/trip",
            get(list_trip_costs).post(create_trip_cost),
        )
        .route(
            "/api/calculations/trip/:id",
            get(get_trip_cost)
                .put(update_trip_cost)
                .delete(delete_trip_cost),
        )
        .route(
            "/api/calculations/rent",
            get(list_rents).post(create_rent),
        )
        .route(
            "/api/calculations/rent/:id",
            get(get_rent).put(update_rent).delete(delete_rent),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "rent-engine",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn rates_handler(State(state): State<Arc<AppState>>) -> Json<PricingConfig> {
    Json(state.service.pricing().clone())
}

/// Handler for POST /api/trip-cost
async fn trip_cost_handler(
    FormJson(form): FormJson<TripCostForm>,
) -> Result<Json<TripCostResult>, ApiError> {
    let input = TripCostInput::try_from(form)?;
    Ok(Json(compute_trip_cost(&input)?))
}

/// Handler for POST /api/rent
async fn rent_handler(
    State(state): State<Arc<AppState>>,
    FormJson(form): FormJson<RentCalculationForm>,
) -> Result<Json<RentCalculationResult>, ApiError> {
    let input = RentCalculationInput::try_from(form)?;
    let pricing = state.service.pricing();
    Ok(Json(compute_rent_with(
        &input,
        &pricing.machine_rates,
        &pricing.tariff,
    )?))
}

/// Handler for POST /api/rent/batch
///
/// Each form is answered independently, in request order.
async fn rent_batch_handler(
    State(state): State<Arc<AppState>>,
    FormJson(forms): FormJson<Vec<RentCalculationForm>>,
) -> Json<Vec<BatchItem>> {
    let mut items: Vec<Option<BatchItem>> = Vec::with_capacity(forms.len());
    let mut slots = Vec::new();
    let mut valid = Vec::new();
    for (idx, form) in forms.into_iter().enumerate() {
        match RentCalculationInput::try_from(form) {
            Ok(input) => {
                slots.push(idx);
                valid.push(input);
                items.push(None);
            }
            Err(err) => items.push(Some(BatchItem::Error(err))),
        }
    }

    let pricing = state.service.pricing();
    let computed = compute_rent_batch(valid, &pricing.machine_rates, &pricing.tariff);
    for (idx, result) in slots.into_iter().zip(computed) {
        items[idx] = Some(match result {
            Ok(result) => BatchItem::Ok(result),
            Err(err) => BatchItem::Error(err),
        });
    }
    Json(items.into_iter().flatten().collect())
}

async fn list_trip_costs(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.service.list_trip_costs().await?))
}

async fn create_trip_cost(
    State(state): State<Arc<AppState>>,
    FormJson(form): FormJson<TripCostForm>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.service.create_trip_cost(form).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_trip_cost(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.service.get_trip_cost(id).await?))
}

async fn update_trip_cost(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    FormJson(form): FormJson<TripCostForm>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.service.update_trip_cost(id, form).await?))
}

async fn delete_trip_cost(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_trip_cost(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_rents(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.service.list_rents().await?))
}

async fn create_rent(
    State(state): State<Arc<AppState>>,
    FormJson(form): FormJson<RentCalculationForm>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.service.create_rent(form).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_rent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.service.get_rent(id).await?))
}

async fn update_rent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    FormJson(form): FormJson<RentCalculationForm>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.service.update_rent(id, form).await?))
}

async fn delete_rent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_rent(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Launch the API server.  Loads the pricing tables named in
/// `settings`, binds to the configured address and blocks until the
/// server terminates.
pub async fn serve(settings: &Settings) -> Result<()> {
    let pricing = load_pricing_config(&settings.rates_file)?;
    let service = CalculationService::in_memory(Arc::new(pricing));
    let router = build_router(service);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!(addr = %settings.bind_addr, "server listening");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router() -> Router {
        build_router(CalculationService::in_memory(Arc::new(
            PricingConfig::default(),
        )))
    }

    /// Decimals are serialized as strings; compare by value, not scale.
    fn amount(value: &Value) -> Decimal {
        value.as_str().unwrap().parse().unwrap()
    }

    fn reference_form() -> Value {
        json!({
            "order_type": "large",
            "machine_type": "crane_model_a",
            "hours_per_day": 0,
            "day_night": "day",
            "shift": "single",
            "sunday_working": "no",
            "usage_profile": "light",
            "deal_type": "no_advance",
            "gst_billing": "no_gst",
            "risk_factor": "low",
            "contract_days": 60
        })
    }

    async fn send(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_rent_endpoint_reference_total() {
        let (status, body) = send(router(), "POST", "/api/rent", Some(reference_form())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(amount(&body["total_rent"]), dec!(533500));
        assert_eq!(amount(&body["components"]["h3"]), dec!(52));
        assert_eq!(body["used_default_rate"], false);
    }

    #[tokio::test]
    async fn test_trip_cost_validation_error_names_field() {
        let form = json!({
            "distance_km": 10,
            "toll_charges": -5,
            "fuel_cost": 0,
            "operator_cost": 0,
            "maintenance_cost": 0,
            "additional_costs": 0
        });
        let (status, body) = send(router(), "POST", "/api/trip-cost", Some(form)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error_type"], "validation_error");
        assert_eq!(body["field"], "toll_charges");
    }

    #[tokio::test]
    async fn test_wrong_json_type_is_validation_error() {
        let form = json!({ "distance_km": "ten", "toll_charges": 0 });
        let (status, body) = send(router(), "POST", "/api/trip-cost", Some(form)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error_type"], "validation_error");
        assert_eq!(body["field"], "distance_km");

        let mut form = reference_form();
        form["contract_days"] = json!([60]);
        let (status, body) = send(router(), "POST", "/api/calculations/rent", Some(form)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["field"], "contract_days");
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/rent")
            .header("content-type", "application/json")
            .body(Body::from("{\"order_type\": "))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error_type"], "invalid_body");
        assert!(body.get("field").is_none());
    }

    #[test]
    fn test_rejected_field_parses_serde_path() {
        let text = "Failed to deserialize the JSON body into the target type: \
                    [1].hours_per_day: invalid type: string \"x\", expected f64 at line 1 column 42";
        assert_eq!(
            rejected_field(text),
            Some(("[1].hours_per_day", "invalid type: string \"x\", expected f64"))
        );
        let text = "Failed to deserialize the JSON body into the target type: \
                    invalid type: map, expected a sequence at line 1 column 0";
        assert_eq!(rejected_field(text), None);
    }

    #[tokio::test]
    async fn test_batch_answers_each_form() {
        let mut bad = reference_form();
        bad["shift"] = json!("triple");
        let forms = json!([reference_form(), bad, reference_form()]);
        let (status, body) = send(router(), "POST", "/api/rent/batch", Some(forms)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(amount(&body[0]["ok"]["total_rent"]), dec!(533500));
        assert_eq!(body[1]["error"]["field"], "shift");
        assert_eq!(amount(&body[2]["ok"]["total_rent"]), dec!(533500));
    }

    #[tokio::test]
    async fn test_rent_record_lifecycle() {
        let app = router();
        let (status, created) = send(
            app.clone(),
            "POST",
            "/api/calculations/rent",
            Some(reference_form()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["machine_type"], "crane_model_a");
        assert_eq!(amount(&created["total_rent"]), dec!(533500));

        let mut edited = reference_form();
        edited["gst_billing"] = json!("gst");
        let uri = format!("/api/calculations/rent/{id}");
        let (status, updated) = send(app.clone(), "PUT", &uri, Some(edited)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], created["id"]);
        assert_eq!(amount(&updated["total_rent"]), dec!(629530));

        let (status, _) = send(app.clone(), "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error_type"], "not_found");
    }

    #[tokio::test]
    async fn test_rates_endpoint_exposes_default_machine() {
        let (status, body) = send(router(), "GET", "/api/rates", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(amount(&body["machine_rates"]["default"]), dec!(6000));
        assert_eq!(amount(&body["tariff"]["gst_rate"]), dec!(0.18));
    }
}
