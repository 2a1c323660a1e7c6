//! Integration test: sentinel imputation and scaling over the full table

use diabeval::data;
use diabeval::preprocessing::Preprocessor;
use ndarray::Array1;
use tempfile::TempDir;

fn write_csv(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("data.csv");
    std::fs::write(&path, content).unwrap();
    path
}

fn pima_header() -> &'static str {
    "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome\n"
}

#[test]
fn test_sentinel_zero_imputed_with_nonzero_mean() {
    let dir = TempDir::new().unwrap();
    let mut csv = pima_header().to_string();
    // Glucose column is [0, 100, 140]; its non-zero mean is 120.
    csv.push_str("1,0,70,20,80,25.0,0.5,30,0\n");
    csv.push_str("2,100,72,22,85,26.0,0.4,35,1\n");
    csv.push_str("3,140,74,24,90,27.0,0.3,40,0\n");
    let path = write_csv(&dir, &csv);

    let df = data::load_csv(&path).unwrap();
    let prepared = Preprocessor::new().fit_transform(&df).unwrap();

    // After imputation the Glucose column is [120, 100, 140], whose mean
    // is 120, so the imputed cell standardizes to exactly 0.
    assert_eq!(prepared.x[[0, 1]], 0.0);
    assert_eq!(prepared.n_samples(), 3);
    assert_eq!(prepared.n_features(), 8);
}

#[test]
fn test_nonsentinel_zero_survives_imputation() {
    let dir = TempDir::new().unwrap();
    let mut csv = pima_header().to_string();
    // Pregnancies zero is a legitimate value, not a missing marker.
    csv.push_str("0,90,70,20,80,25.0,0.5,30,0\n");
    csv.push_str("2,100,72,22,85,26.0,0.4,35,1\n");
    csv.push_str("4,140,74,24,90,27.0,0.3,40,0\n");
    let path = write_csv(&dir, &csv);

    let df = data::load_csv(&path).unwrap();
    let prepared = Preprocessor::new().fit_transform(&df).unwrap();

    // Pregnancies [0, 2, 4] standardizes around mean 2; the zero maps to
    // a strictly negative value instead of the column mean.
    assert!(prepared.x[[0, 0]] < 0.0);
    assert!((prepared.x[[1, 0]]).abs() < 1e-12);
}

#[test]
fn test_scaled_columns_are_centered() {
    let dir = TempDir::new().unwrap();
    let mut csv = pima_header().to_string();
    for i in 0..20 {
        let outcome = i % 2;
        csv.push_str(&format!(
            "{},{},{},{},{},{:.1},{:.2},{},{}\n",
            i % 5,
            90 + i * 3,
            60 + i,
            20 + i % 7,
            70 + i * 4,
            22.0 + i as f64 * 0.4,
            0.2 + (i % 6) as f64 * 0.1,
            25 + i,
            outcome
        ));
    }
    let path = write_csv(&dir, &csv);

    let df = data::load_csv(&path).unwrap();
    let prepared = Preprocessor::new().fit_transform(&df).unwrap();

    for col in 0..prepared.n_features() {
        let mean = prepared.x.column(col).mean().unwrap();
        assert!(mean.abs() < 1e-9, "column {} mean {} not centered", col, mean);
    }
}

#[test]
fn test_fitted_scaler_reproduces_training_rows() {
    let dir = TempDir::new().unwrap();
    let mut csv = pima_header().to_string();
    csv.push_str("1,95,70,20,80,25.0,0.50,30,0\n");
    csv.push_str("2,110,72,22,85,26.0,0.40,35,1\n");
    csv.push_str("3,140,74,24,90,27.0,0.30,40,0\n");
    csv.push_str("4,120,76,26,95,28.0,0.20,45,1\n");
    let path = write_csv(&dir, &csv);

    let df = data::load_csv(&path).unwrap();
    let prepared = Preprocessor::new().fit_transform(&df).unwrap();

    // Re-scaling the raw second row through the persisted scaler must land
    // exactly on the matrix row produced at fit time.
    let raw = Array1::from_vec(vec![2.0, 110.0, 72.0, 22.0, 85.0, 26.0, 0.40, 35.0]);
    let scaled = prepared.scaler.transform_row(&raw).unwrap();
    for col in 0..8 {
        assert!((scaled[col] - prepared.x[[1, col]]).abs() < 1e-12);
    }
}

#[test]
fn test_transform_row_rejects_wrong_width() {
    let dir = TempDir::new().unwrap();
    let mut csv = pima_header().to_string();
    csv.push_str("1,95,70,20,80,25.0,0.5,30,0\n");
    csv.push_str("2,110,72,22,85,26.0,0.4,35,1\n");
    let path = write_csv(&dir, &csv);

    let df = data::load_csv(&path).unwrap();
    let prepared = Preprocessor::new().fit_transform(&df).unwrap();

    let short = Array1::from_vec(vec![1.0, 2.0, 3.0]);
    assert!(prepared.scaler.transform_row(&short).is_err());
}

#[test]
fn test_feature_names_exclude_label() {
    let dir = TempDir::new().unwrap();
    let mut csv = pima_header().to_string();
    csv.push_str("1,95,70,20,80,25.0,0.5,30,0\n");
    csv.push_str("2,110,72,22,85,26.0,0.4,35,1\n");
    let path = write_csv(&dir, &csv);

    let df = data::load_csv(&path).unwrap();
    let prepared = Preprocessor::new().fit_transform(&df).unwrap();

    assert_eq!(prepared.feature_names.len(), 8);
    assert_eq!(prepared.feature_names[0], "Pregnancies");
    assert_eq!(prepared.feature_names[7], "Age");
    assert!(!prepared.feature_names.contains(&"Outcome".to_string()));
}
