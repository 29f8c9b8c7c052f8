//! REST server built on axum.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::{ApiError, ApiResponse, AppState};
use crate::calculation::RiskCalculationInput;
use crate::export::{DateRange, ExportFormat, ExportOptions, export, invalid_format};
use crate::register::{NewRiskEntry, RiskEntryPatch, RiskFilter};

type ApiResult<T> = Result<T, ApiError>;

/// Build the router with every API route.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/calculate", post(calculate_handler))
        .route("/api/risks", get(list_risks).post(create_risk))
        .route(
            "/api/risks/{id}",
            get(get_risk).put(update_risk).delete(delete_risk),
        )
        .route("/api/export", get(quick_export).post(export_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Unwrap a JSON body, turning decode failures into a 400 envelope.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value).map_err(|rejection| {
        ApiError::BadRequest(format!(
            "Cuerpo de la solicitud no válido: {}",
            rejection.body_text()
        ))
    })
}

/// Health check endpoint.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let risks = match state.register.all() {
        Ok(entries) => entries.len(),
        Err(e) => {
            warn!(error = %e, "Health check could not read the risk register");
            0
        }
    };
    Json(serde_json::json!({
        "status": "ok",
        "risks": risks,
        "uptime_secs": state.uptime_secs(),
    }))
}

async fn calculate_handler(
    State(state): State<AppState>,
    body: Result<Json<RiskCalculationInput>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let input = json_body(body)?;
    let result = state.calculator.calculate(input)?;
    Ok(Json(ApiResponse::ok(
        result,
        "Cálculo de riesgo completado exitosamente",
    )))
}

async fn list_risks(
    State(state): State<AppState>,
    Query(filter): Query<RiskFilter>,
) -> ApiResult<impl IntoResponse> {
    let risks = state.register.list(&filter)?;
    let message = format!("{} riesgos encontrados", risks.len());
    Ok(Json(ApiResponse::ok(risks, message)))
}

async fn create_risk(
    State(state): State<AppState>,
    body: Result<Json<NewRiskEntry>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let entry = state.register.create(json_body(body)?)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(entry, "Riesgo creado exitosamente")),
    ))
}

async fn get_risk(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let entry = state.register.get(&id)?;
    Ok(Json(ApiResponse::ok(entry, "Riesgo encontrado")))
}

async fn update_risk(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<RiskEntryPatch>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let entry = state.register.update(&id, json_body(body)?)?;
    Ok(Json(ApiResponse::ok(
        entry,
        "Riesgo actualizado exitosamente",
    )))
}

async fn delete_risk(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let entry = state.register.delete(&id)?;
    Ok(Json(ApiResponse::ok(entry, "Riesgo eliminado exitosamente")))
}

/// Body of `POST /api/export`. The format is checked after decoding so a
/// missing or unknown value gets the export-specific message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ExportRequest {
    format: Option<String>,
    include_calculations: bool,
    include_recommendations: bool,
    date_range: Option<DateRange>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExportQuery {
    format: Option<String>,
}

/// Format for the quick export; absent means the configured default.
fn resolve_format(state: &AppState, format: Option<&str>) -> ApiResult<ExportFormat> {
    match format {
        Some(name) => Ok(name.parse::<ExportFormat>()?),
        None => Ok(state.config.export.default_format),
    }
}

fn download(state: &AppState, options: &ExportOptions) -> ApiResult<Response> {
    let entries = state.register.all()?;
    let doc = export(entries, options, Utc::now())?;
    info!(filename = %doc.filename, "Serving export");
    Ok((
        [
            (header::CONTENT_TYPE, doc.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", doc.filename),
            ),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        doc.content,
    )
        .into_response())
}

async fn export_handler(
    State(state): State<AppState>,
    body: Result<Json<ExportRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let request = json_body(body)?;
    let format = request
        .format
        .as_deref()
        .ok_or_else(invalid_format)?
        .parse::<ExportFormat>()?;
    let options = ExportOptions {
        format,
        include_calculations: request.include_calculations,
        include_recommendations: request.include_recommendations,
        date_range: request.date_range,
    };
    download(&state, &options)
}

/// Unfiltered export of the whole register.
async fn quick_export(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let options = ExportOptions {
        format: resolve_format(&state, query.format.as_deref())?,
        include_calculations: true,
        include_recommendations: true,
        date_range: None,
    };
    download(&state, &options)
}

/// Start the server on the configured address.
///
/// Runs until cancelled or until Ctrl-C is received.
pub async fn run(state: AppState) -> Result<(), std::io::Error> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Riskwise API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiskwiseConfig;
    use crate::error::RegisterError;
    use crate::register::{RiskRegister, RiskRegisterEntry, RiskRepository};
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn make_state() -> AppState {
        AppState::new(RiskwiseConfig::default(), RiskRegister::in_memory())
    }

    #[test]
    fn test_router_builds() {
        let _app = router(make_state());
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = router(make_state());
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["risks"], 0);
        assert!(json["uptime_secs"].is_number());
    }

    struct UnreadableRepository;

    impl RiskRepository for UnreadableRepository {
        fn add(&self, _: RiskRegisterEntry) -> Result<(), RegisterError> {
            Err(RegisterError::LockPoisoned)
        }

        fn update(
            &self,
            _: &str,
            _: RiskEntryPatch,
        ) -> Result<Option<RiskRegisterEntry>, RegisterError> {
            Err(RegisterError::LockPoisoned)
        }

        fn delete(&self, _: &str) -> Result<Option<RiskRegisterEntry>, RegisterError> {
            Err(RegisterError::LockPoisoned)
        }

        fn find(&self, _: &str) -> Result<Option<RiskRegisterEntry>, RegisterError> {
            Err(RegisterError::LockPoisoned)
        }

        fn list(&self) -> Result<Vec<RiskRegisterEntry>, RegisterError> {
            Err(RegisterError::LockPoisoned)
        }
    }

    #[tokio::test]
    async fn test_health_survives_register_failure() {
        let register = RiskRegister::new(Arc::new(UnreadableRepository));
        let app = router(AppState::new(RiskwiseConfig::default(), register));
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["risks"], 0);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = router(make_state());
        let resp = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_resolve_format_uses_configured_default() {
        let mut config = RiskwiseConfig::default();
        config.export.default_format = ExportFormat::Csv;
        let state = AppState::new(config, RiskRegister::in_memory());
        assert_eq!(resolve_format(&state, None).unwrap(), ExportFormat::Csv);
        assert_eq!(
            resolve_format(&state, Some("json")).unwrap(),
            ExportFormat::Json
        );
        assert!(resolve_format(&state, Some("xml")).is_err());
    }
}
