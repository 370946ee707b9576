//! Telemetry endpoint.
//!
//! Handlers only ever take `SharedTank::snapshot()`; the lock is held for a
//! memory copy and never across an await.
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tank_core::{SharedTank, TelemetrySnapshot};
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub ts: String,
    pub action: String,
}

/// Body of `GET /data`.
#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub level: f32,
    pub tank: &'static str,
    pub pump: &'static str,
    pub last: String,
    pub monthly: u32,
    pub history: Vec<HistoryItem>,
}

impl From<&TelemetrySnapshot> for DataResponse {
    fn from(s: &TelemetrySnapshot) -> Self {
        Self {
            level: s.level_rounded(),
            tank: s.tank.as_str(),
            pump: s.pump.as_str(),
            last: s.last_filled_or_placeholder().to_string(),
            monthly: s.monthly_fills,
            history: s
                .history
                .iter()
                .map(|e| HistoryItem {
                    ts: e.ts().to_string(),
                    action: e.action().to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn data(State(shared): State<SharedTank>) -> Json<DataResponse> {
    Json(DataResponse::from(&shared.snapshot()))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(shared: SharedTank) -> Router {
    Router::new()
        .route("/data", get(data))
        .route("/health", get(health))
        .with_state(shared)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tank_core::{LogEntry, NEVER_FILLED, PumpStatus, TankStatus};
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn data_before_first_fill() {
        let shared = SharedTank::new();
        shared.append_event(LogEntry::new("00:00:01", "System boot"));
        let (status, json) = get_json(router(shared), "/data").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["tank"], "UNKNOWN");
        assert_eq!(json["pump"], "OFF");
        assert_eq!(json["last"], NEVER_FILLED);
        assert_eq!(json["monthly"], 0);
        assert_eq!(json["history"][0]["action"], "System boot");
        assert_eq!(json["history"][0]["ts"], "00:00:01");
    }

    #[tokio::test]
    async fn data_reflects_committed_state() {
        let shared = SharedTank::new();
        shared.update(|st| {
            st.set_level(81.26);
            st.set_status(TankStatus::Full, PumpStatus::Off);
            st.record_fill("14:02:09".into(), 3);
            st.append(LogEntry::new("14:01:00", "Pump ON (low level)"));
            st.append(LogEntry::new("14:02:09", "Tank FULL, pump OFF"));
        });
        let (_, json) = get_json(router(shared), "/data").await;
        assert!((json["level"].as_f64().unwrap() - 81.3).abs() < 1e-4);
        assert_eq!(json["tank"], "FULL");
        assert_eq!(json["last"], "14:02:09");
        assert_eq!(json["monthly"], 3);
        let history = json["history"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["action"], "Tank FULL, pump OFF");
    }

    #[tokio::test]
    async fn health_reports_version() {
        let (status, json) = get_json(router(SharedTank::new()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (status, _) = get_json(router(SharedTank::new()), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
