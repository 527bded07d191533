//! `GET /status` - one-shot config plus upstream metrics and health

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use envelope::format_iso;
use ingestion::{HEALTH_PATH, METRICS_PATH};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct StatusConfig {
    pub seller_id: String,
    pub pi_base: String,
    pub lat: f64,
    pub lon: f64,
    pub label: String,
}

/// Response body; upstream parts are omitted when they could not be fetched
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub config: StatusConfig,
    pub time_iso: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pi_metrics: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pi_health: Option<Value>,
}

pub async fn status(State(state): State<AppState>) -> Json<StatusReport> {
    let (metrics, health) = tokio::join!(
        state.source.fetch_json(METRICS_PATH),
        state.source.fetch_json(HEALTH_PATH),
    );

    let pi_metrics = metrics
        .inspect_err(|e| warn!(error = %e, "Status: upstream metrics unavailable"))
        .ok();
    let pi_health = health
        .inspect_err(|e| warn!(error = %e, "Status: upstream health unavailable"))
        .ok();

    let seller = &state.config.seller;
    Json(StatusReport {
        config: StatusConfig {
            seller_id: seller.seller_id.clone(),
            pi_base: state.source.base_url().to_string(),
            lat: seller.lat,
            lon: seller.lon,
            label: seller.label.clone(),
        },
        time_iso: format_iso(Utc::now()),
        pi_metrics,
        pi_health,
    })
}

#[cfg(test)]
mod tests {
    use crate::server::test_support::{spawn_app, spawn_upstream};
    use serde_json::Value;

    #[tokio::test]
    async fn test_status_includes_upstream() {
        let upstream = spawn_upstream().await;
        let (addr, _shutdown) = spawn_app(format!("http://{upstream}")).await;

        let body: Value = reqwest::get(format!("http://{addr}/status"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["config"]["seller_id"], "pi-1");
        assert_eq!(body["config"]["label"], "Kitchen");
        assert_eq!(body["config"]["pi_base"], format!("http://{upstream}"));
        assert_eq!(body["pi_metrics"]["brightness"], 0.5);
        assert_eq!(body["pi_health"]["ok"], true);
        assert!(body["time_iso"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_status_omits_unreachable_upstream() {
        let (addr, _shutdown) = spawn_app("http://127.0.0.1:9".to_string()).await;

        let response = reqwest::get(format!("http://{addr}/status")).await.unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();

        assert_eq!(body["config"]["seller_id"], "pi-1");
        assert!(body.get("pi_metrics").is_none());
        assert!(body.get("pi_health").is_none());
    }
}
