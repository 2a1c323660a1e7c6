//! Integration test: server API endpoints

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use diabeval::server::{create_router, AppState, ServerConfig};
use tempfile::TempDir;
use tower::ServiceExt;

fn write_dataset(dir: &TempDir) -> String {
    let path = dir.path().join("pima.csv");
    let mut csv = String::from(
        "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome\n",
    );
    for i in 0..40 {
        let outcome = i % 2;
        csv.push_str(&format!(
            "{},{:.1},{},{},{:.1},{:.1},{:.2},{},{}\n",
            i % 6,
            90.0 + 60.0 * outcome as f64 + (i % 7) as f64,
            62 + (i % 9),
            18 + (i % 7),
            70.0 + 90.0 * outcome as f64 + (i % 5) as f64,
            24.0 + 9.0 * outcome as f64 + (i % 4) as f64 * 0.3,
            0.2 + (i % 6) as f64 * 0.05,
            25 + (i % 20),
            outcome
        ));
    }
    std::fs::write(&path, csv).unwrap();
    path.to_string_lossy().to_string()
}

fn test_config(dir: &TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        data_path: write_dataset(dir),
        models_dir: dir.path().join("models").to_string_lossy().to_string(),
    }
}

async fn test_app(dir: &TempDir) -> axum::Router {
    let state = Arc::new(AppState::new(test_config(dir)).unwrap());
    state.load_dataset().await.unwrap();
    create_router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_startup_reports_dataset_shape() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let response = app.oneshot(get("/api/startup")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "Dataset loaded successfully");
    assert_eq!(json["rows"], 40);
    assert_eq!(json["features"], 8);
}

#[tokio::test]
async fn test_startup_fails_without_dataset() {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        data_path: dir.path().join("missing.csv").to_string_lossy().to_string(),
        models_dir: dir.path().join("models").to_string_lossy().to_string(),
    };
    let state = Arc::new(AppState::new(config).unwrap());
    let app = create_router(state);

    let response = app.oneshot(get("/api/startup")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"], true);
}

#[tokio::test]
async fn test_train_three_fold_returns_all_families() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let response = app
        .oneshot(post_json(
            "/api/train",
            serde_json::json!({"validation_method": "3-fold"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    for family in ["kNN", "Bayesian", "SVM", "Neural Network"] {
        assert!(json[family]["accuracy"].is_number(), "missing {}", family);
        assert!(json[family]["f1_score"].is_number());
    }
    // SVM has no probability output, the others keep a numeric AUC here.
    assert!(json["SVM"]["roc_auc"].is_null());
    assert!(json["kNN"]["roc_auc"].is_number());
}

#[tokio::test]
async fn test_train_rejects_unknown_method() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let response = app
        .oneshot(post_json(
            "/api/train",
            serde_json::json!({"validation_method": "bootstrap"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], true);
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn test_predict_trains_on_demand() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let row = vec![3.0, 155.0, 66.0, 20.0, 165.0, 33.5, 0.3, 38.0];
    let response = app
        .oneshot(post_json(
            "/api/predict",
            serde_json::json!({"data_row": row, "model_type": "bayesian"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["model"], "Bayesian");
    assert_eq!(json["prediction"], 1.0);
}

#[tokio::test]
async fn test_predict_neural_network_returns_probability() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let row = vec![2.0, 92.0, 64.0, 19.0, 72.0, 24.5, 0.25, 28.0];
    let response = app
        .oneshot(post_json(
            "/api/predict",
            serde_json::json!({"data_row": row, "model_type": "neural network"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["model"], "Neural Network");
    let p = json["prediction"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&p), "raw probability out of range: {}", p);
}

#[tokio::test]
async fn test_predict_rejects_wrong_width() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let response = app
        .oneshot(post_json(
            "/api/predict",
            serde_json::json!({"data_row": [1.0, 2.0], "model_type": "knn"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], true);
}

#[tokio::test]
async fn test_predict_rejects_unknown_model() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let row = vec![1.0; 8];
    let response = app
        .oneshot(post_json(
            "/api/predict",
            serde_json::json!({"data_row": row, "model_type": "random forest"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_predict_recovers_from_corrupt_blob() {
    let dir = TempDir::new().unwrap();
    let models_dir = dir.path().join("models");
    std::fs::create_dir_all(&models_dir).unwrap();
    std::fs::write(models_dir.join("knn.bin"), b"garbage").unwrap();

    let app = test_app(&dir).await;
    let row = vec![3.0, 155.0, 66.0, 20.0, 165.0, 33.5, 0.3, 38.0];
    let response = app
        .oneshot(post_json(
            "/api/predict",
            serde_json::json!({"data_row": row, "model_type": "knn"}),
        ))
        .await
        .unwrap();

    // The unreadable blob is treated as absent and the model retrained.
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["model"], "kNN");
}

#[tokio::test]
async fn test_models_empty_then_populated() {
    let dir = TempDir::new().unwrap();
    let state = Arc::new(AppState::new(test_config(&dir)).unwrap());
    state.load_dataset().await.unwrap();
    let app = create_router(state);

    let response = app.clone().oneshot(get("/api/models")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["models"], serde_json::json!([]));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/train",
            serde_json::json!({"validation_method": "holdout"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/models")).await.unwrap();
    let json = body_json(response).await;
    let models = json["models"].as_array().unwrap();
    assert_eq!(models.len(), 4);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let response = app.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_train_leave_one_out_small_table() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir).await;

    let response = app
        .oneshot(post_json(
            "/api/train",
            serde_json::json!({"validation_method": "leave-one-out"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    // Singleton test folds leave every family without an AUC.
    for family in ["kNN", "Bayesian", "SVM", "Neural Network"] {
        assert!(json[family]["roc_auc"].is_null(), "{} kept an AUC", family);
    }
}
