use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

pub mod views;

use crate::predictor::aggregate::validate_single;
use crate::predictor::{predict_aggregate, predict_single, Observation};
use crate::store::SnapshotStore;
use views::{
    AggregateRequest, AggregateView, HealthResponse, PredictRequest, PredictionView, RacesQuery,
};

#[derive(Clone)]
pub struct AppState {
    pub store: SnapshotStore,
}

type ApiResult<T> = Result<T, (StatusCode, String)>;

/// Build the Axum router for the prediction API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/races", get(races_handler))
        .route("/api/races/:name", get(race_detail_handler))
        .route("/api/countries", get(countries_handler))
        .route("/api/predict", post(predict_handler))
        .route("/api/predict/aggregate", post(aggregate_handler))
        .route("/api/refresh", post(refresh_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// GET /health
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snap = state.store.snapshot().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        races: snap.race_count(),
        eu_races: snap.eu_race_count(),
        loaded_at: snap.loaded_at(),
    })
}

/// GET /api/races?mode=euWinner&country=FRA
async fn races_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RacesQuery>,
) -> impl IntoResponse {
    let snap = state.store.snapshot().await;
    Json(snap.list_race_names(query.mode, query.country.as_deref()))
}

/// GET /api/races/:name
async fn race_detail_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let snap = state.store.snapshot().await;
    let detail = snap.race_detail(&name).cloned();
    detail
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("No details for race '{}'", name)))
}

/// GET /api/countries
async fn countries_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.snapshot().await.list_countries())
}

/// POST /api/predict
async fn predict_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PredictRequest>,
) -> ApiResult<impl IntoResponse> {
    let obs = validate_single(&Observation::new(&req.source, &req.time), &req.target).map_err(
        |e| {
            warn!("Rejected prediction request: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        },
    )?;

    let snap = state.store.snapshot().await;
    let result = predict_single(&snap, &obs.time, &obs.race, &req.target, req.mode);
    Ok(Json(PredictionView::from(result)))
}

/// POST /api/predict/aggregate
async fn aggregate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AggregateRequest>,
) -> ApiResult<impl IntoResponse> {
    let snap = state.store.snapshot().await;
    match predict_aggregate(&snap, &req.observations, &req.target, req.mode) {
        Ok(Some(agg)) => {
            if !agg.has_estimate() {
                warn!("No variant produced a time for {}", req.target.trim());
            }
            Ok(Json(AggregateView::from(&agg)))
        }
        Ok(None) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "No valid predictions available".to_string(),
        )),
        Err(e) => {
            warn!("Rejected aggregate request: {}", e);
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}

/// POST /api/refresh
async fn refresh_handler(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    state.store.refresh().await.map(Json).map_err(|e| {
        error!("Race data refresh failed: {}", e);
        (StatusCode::BAD_GATEWAY, e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::StubSource;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const DEFAULT_CSV: &str = "\
source,target,ratio_avg,ratio_median,ratio_winner
RaceA,RaceB,1.1,,
RaceA,RaceC,,1.25,
";

    const EU_CSV: &str = "\
country,event,name,dist_km,year,finishers,duration
FRA,UTMB,Ultra-Trail du Mont-Blanc,171,2023,1700,20:00:00
ITA,Lavaredo,Lavaredo Ultra Trail,120,2023,1200,10:00:00
FRA,Grand Raid,Diagonale des Fous,165,2023,900,25:00:00
";

    async fn app() -> Router {
        let store = SnapshotStore::new(Arc::new(StubSource::new(vec![StubSource::ok(
            DEFAULT_CSV,
            Some(EU_CSV),
        )])));
        store.refresh().await.unwrap();
        router(AppState { store })
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        read(resp).await
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        read(resp).await
    }

    async fn read(resp: axum::response::Response) -> (StatusCode, Value) {
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(app().await, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["eu_races"], 3);
    }

    #[tokio::test]
    async fn test_list_races_default_and_eu() {
        let (_, body) = get_json(app().await, "/api/races").await;
        assert_eq!(
            body,
            json!(["Grand Raid", "Lavaredo", "RaceA", "RaceB", "RaceC", "UTMB"])
        );

        let (_, body) = get_json(app().await, "/api/races?mode=euWinner&country=FRA").await;
        assert_eq!(body, json!(["Grand Raid", "UTMB"]));
    }

    #[tokio::test]
    async fn test_countries_and_detail() {
        let (_, body) = get_json(app().await, "/api/countries").await;
        assert_eq!(body, json!(["FRA", "ITA"]));

        let (status, body) = get_json(app().await, "/api/races/Grand%20Raid").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Diagonale des Fous");
        assert_eq!(body["duration"], "25:00:00");

        let (status, _) = get_json(app().await, "/api/races/Nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_predict_single() {
        let (status, body) = post_json(
            app().await,
            "/api/predict",
            json!({"time": "2:00:00", "source": "RaceA", "target": "RaceB"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["avg"]["status"], "predicted");
        assert_eq!(body["avg"]["time"], "01:49:05");
        assert_eq!(body["median"]["status"], "unavailable");
        assert_eq!(body["median"]["message"], "No median data");
    }

    #[tokio::test]
    async fn test_predict_eu_winner_mode() {
        let (_, body) = post_json(
            app().await,
            "/api/predict",
            json!({"time": "12:00:00", "source": "UTMB", "target": "Lavaredo", "mode": "euWinner"}),
        )
        .await;
        assert_eq!(body["winner"]["time"], "06:00:00");
        assert_eq!(body["avg"]["reason"], "not_in_mode");
    }

    #[tokio::test]
    async fn test_predict_rejects_bad_time() {
        let (status, _) = post_json(
            app().await,
            "/api/predict",
            json!({"time": "two hours", "source": "RaceA", "target": "RaceB"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_aggregate_with_partial_failure() {
        let (status, body) = post_json(
            app().await,
            "/api/predict/aggregate",
            json!({
                "target": "RaceB",
                "observations": [
                    {"race": "RaceA", "time": "02:00:00"},
                    {"race": "RaceC", "time": "01:00:00"}
                ]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["avg"]["status"], "estimate");
        assert_eq!(body["avg"]["time"], "01:49:05");
        assert_eq!(body["avg"]["min"], "01:49:05");
        assert_eq!(body["avg"]["max"], "01:49:05");
        assert_eq!(body["excluded"], 1);
        assert_eq!(
            body["warning"],
            "1 of 2 prediction(s) could not be calculated due to missing data"
        );
    }

    #[tokio::test]
    async fn test_aggregate_rejects_missing_target() {
        let (status, _) = post_json(
            app().await,
            "/api/predict/aggregate",
            json!({"target": "", "observations": [{"race": "RaceA", "time": "1:00:00"}]}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_refresh_failure_is_bad_gateway() {
        // The stub has no more responses queued after the initial load.
        let (status, _) = post_json(app().await, "/api/refresh", json!({})).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
