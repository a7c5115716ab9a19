use axum::Router;

use crate::state::AppState;

pub mod leaderboard;
pub mod recalculation;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/leaderboard", leaderboard::routes::routes())
        .nest("/api/participants", leaderboard::routes::participant_routes())
        .nest("/api/admin", recalculation::routes::routes())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use storage::{
        models::{Points, ResultKind},
        repository::{MemoryStore, RecalculationScope, ResultStore},
        services::{LinearPoints, RecalculationConfig},
    };
    use tower::ServiceExt;

    use super::*;

    fn state(store: &Arc<MemoryStore>) -> AppState {
        AppState::new(
            store.clone(),
            store.clone(),
            Arc::new(LinearPoints::default()),
            RecalculationConfig {
                max_attempts: 2,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(2),
            },
        )
    }

    fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_race(1, "Trail Lyon", None);
        store.add_race(2, "Marathon Paris", None);
        store.add_participant(1, "User", "A", true);
        store.add_participant(2, "User", "B", true);
        store.add_participant(3, "Hidden", "C", false);
        store.add_individual_result(1, 1, 3600, 0);
        store.add_individual_result(2, 1, 3700, 30);
        store.add_individual_result(3, 1, 3000, 0);
        store.add_individual_result(1, 2, 9000, 0);
        store
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let (status, body) = send(app, Request::get(uri).body(Body::empty()).unwrap()).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_public_leaderboard_hides_private_profiles() {
        let store = seeded();
        let app = router(state(&store));

        let (status, body) = get_json(app, "/api/leaderboard?race_id=1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "individual");
        assert_eq!(body["total"], 2);
        let names: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["User A", "User B"]);
        assert_eq!(body["data"][1]["total_time"], 3730);
        assert_eq!(body["data"][1]["points"], Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_race_is_bad_request() {
        let store = seeded();

        let (status, body) = get_json(router(state(&store)), "/api/leaderboard?race_id=99").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("99"));
    }

    #[tokio::test]
    async fn test_invalid_pagination_is_bad_request() {
        let store = seeded();

        let (status, _) = get_json(router(state(&store)), "/api/leaderboard?per_page=0").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_participant_results_include_private_profile() {
        let store = seeded();

        let (status, body) =
            get_json(router(state(&store)), "/api/participants/3/results?race_id=1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["name"], "Hidden C");
        assert_eq!(body["data"][0]["rank"], 1);
    }

    #[tokio::test]
    async fn test_list_races() {
        let store = seeded();

        let (status, body) = get_json(router(state(&store)), "/api/leaderboard/races").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_export_csv_attachment() {
        let store = seeded();
        let request = Request::get("/api/leaderboard/export?race_id=1&type=individual")
            .body(Body::empty())
            .unwrap();

        let response = router(state(&store)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"leaderboard-1-individual.csv\""
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            String::from_utf8(body.to_vec()).unwrap(),
            "rank,name,total_time,points\n1,User A,3600,\n2,User B,3730,\n"
        );
    }

    #[tokio::test]
    async fn test_recalculate_then_read_points() {
        let store = seeded();
        let app = router(state(&store));

        let (status, body) = send(
            app.clone(),
            post_json("/api/admin/recalculate", json!({ "race_id": 1, "type": "individual" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let report: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(report["total"], 3);
        assert_eq!(report["written"], 3);
        assert_eq!(report["updated"], 3);

        let (_, board) = get_json(app, "/api/leaderboard?race_id=1").await;
        assert_eq!(board["data"][0]["points"], 99);
        assert_eq!(board["data"][1]["points"], 98);
    }

    #[tokio::test]
    async fn test_recalculate_rejects_non_positive_race() {
        let store = seeded();

        let (status, _) = send(
            router(state(&store)),
            post_json("/api/admin/recalculate", json!({ "race_id": 0 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recalculate_busy_scope_is_conflict() {
        let store = seeded();
        let state = state(&store);
        let scope = RecalculationScope {
            race_id: 1,
            kind: ResultKind::Individual,
        };
        let _lease = store.try_lock_scope(scope).await.unwrap().unwrap();

        let (status, body) = send(
            router(state),
            post_json("/api/admin/recalculate", json!({ "race_id": 1, "type": "individual" })),
        )
        .await;
        let body: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["retryable"], true);
        assert_eq!(store.points(1), Some(Points::Unset));
    }

    #[tokio::test]
    async fn test_unknown_result_type_is_rejected() {
        let store = seeded();

        let request = Request::get("/api/leaderboard?type=relay")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(router(state(&store)), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recalculate_unknown_type_is_rejected() {
        let store = seeded();

        let (status, _) = send(
            router(state(&store)),
            post_json("/api/admin/recalculate", json!({ "race_id": 1, "type": "relay" })),
        )
        .await;

        assert!(status.is_client_error());
        assert_eq!(store.points(1), Some(Points::Unset));
    }
}
