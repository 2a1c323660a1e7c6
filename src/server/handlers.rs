//! HTTP request handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use ndarray::{Array1, Axis};
use serde::Deserialize;
use tracing::{info, warn};

use crate::training::{ClassifierKind, ValidationStrategy};

use super::error::{Result, ServerError};
use super::state::AppState;

#[derive(Deserialize)]
pub struct TrainRequest {
    validation_method: String,
}

#[derive(Deserialize)]
pub struct PredictRequest {
    data_row: Vec<f64>,
    model_type: String,
}

///// Readiness: the dataset is loaded and the preprocessing pipeline runs.
pub async fn startup_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>> {
    let prepared = state.prepared_dataset().await?;
    Ok(Json(serde_json::json!({
        "status": "Dataset loaded successfully",
        "rows": prepared.n_samples(),
        "features": prepared.n_features(),
    })))
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Run one evaluation over all classifier families.
///
/// Responds with the raw name-to-metrics mapping; roc_auc is null for
/// families without a probability output.
pub async fn train(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TrainRequest>,
) -> Result<Json<serde_json::Value>> {
    let strategy = ValidationStrategy::parse(&request.validation_method)?;
    let prepared = state.prepared_dataset().await?;

    info!(
        strategy = %strategy,
        rows = prepared.n_samples(),
        "Evaluation run requested"
    );

    let results = state
        .engine
        .evaluate(&prepared.x, &prepared.y, strategy, &state.store)?;

    Ok(Json(serde_json::json!(results)))
}

/// Predict one feature row with a stored classifier, training it on
/// demand under the holdout strategy when no blob exists.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<serde_json::Value>> {
    let kind = ClassifierKind::parse(&request.model_type)?;
    let prepared = state.prepared_dataset().await?;

    if request.data_row.len() != prepared.n_features() {
        return Err(ServerError::BadRequest(format!(
            "Expected {} features, got {}",
            prepared.n_features(),
            request.data_row.len()
        )));
    }

    // A corrupt blob is logged and treated as absent, then retrained.
    let stored = match state.store.load(kind.canonical_name()) {
        Ok(found) => found,
        Err(e) => {
            warn!(
                model = kind.canonical_name(),
                error = %e,
                "Stored model unreadable, retraining"
            );
            None
        }
    };

    let classifier = match stored {
        Some(classifier) => classifier,
        None => {
            info!(
                model = kind.canonical_name(),
                "No stored model, training on demand"
            );
            state
                .engine
                .train_for_prediction(kind, &prepared.x, &prepared.y, &state.store)?
        }
    };

    let row = Array1::from_vec(request.data_row);
    let scaled = prepared.scaler.transform_row(&row)?;
    let x = scaled.insert_axis(Axis(0));

    // The network reports its raw probability; the others a class label.
    let prediction = match kind {
        ClassifierKind::NeuralNetwork => match classifier.predict_proba(&x)? {
            Some(proba) => proba[0],
            None => classifier.predict(&x)?[0],
        },
        _ => classifier.predict(&x)?[0],
    };

    Ok(Json(serde_json::json!({
        "prediction": prediction,
        "model": kind.canonical_name(),
    })))
}

/// Names of the classifier families with a persisted model.
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let models: Vec<&str> = ClassifierKind::all()
        .iter()
        .filter(|kind| state.store.exists(kind.canonical_name()))
        .map(|kind| kind.canonical_name())
        .collect();

    Json(serde_json::json!({ "models": models }))
}
