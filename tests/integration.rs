//! Integration tests for ChurnGuard

use churnguard::{
    build_model, clean, load_csv, pick_threshold, split_stratified, ChurnModel, ChurnPipeline,
    CostModel, DecisionPolicy, MetricReport, Preprocessor, ProbabilityModel,
};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

/// Create a test CSV in the shape of the telco churn dataset, including a
/// blank TotalCharges entry and both label spellings.
fn create_test_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "customerID,tenure,MonthlyCharges,TotalCharges,Contract,Churn").unwrap();
    writeln!(file, "c01,1,70.0,70.0,Month-to-month,Yes").unwrap();
    writeln!(file, "c02,2,85.5,171.0,Month-to-month,Yes").unwrap();
    writeln!(file, "c03,1,90.0, ,Month-to-month,yes").unwrap();
    writeln!(file, "c04,3,75.0,225.0,Month-to-month,Yes").unwrap();
    writeln!(file, "c05,4,80.0,320.0,Month-to-month,Yes").unwrap();
    writeln!(file, "c06,48,20.0,960.0,Two year,No").unwrap();
    writeln!(file, "c07,60,25.5,1530.0,Two year,No").unwrap();
    writeln!(file, "c08,36,30.0,1080.0,One year,no").unwrap();
    writeln!(file, "c09,50,22.0,1100.0,Two year,No").unwrap();
    writeln!(file, "c10,24,35.0,840.0,One year,No").unwrap();
    writeln!(file, "c11,55,19.5,1072.5,Two year,No").unwrap();
    writeln!(file, "c12,40,28.0,1120.0,One year,No").unwrap();
    file
}

#[test]
fn test_end_to_end_training_pipeline() {
    let test_file = create_test_csv();
    let file_path = test_file.path().to_str().unwrap();

    let df = load_csv(file_path).unwrap();
    let (x, y) = clean(&df, "Churn", &["customerID".to_string()]).unwrap();

    assert_eq!(x.height(), 12);
    assert_eq!(y.iter().filter(|&&v| v == 1).count(), 5);
    assert!(!x.get_column_names().contains(&"customerID"));

    let split = split_stratified(&x, &y, 0.3, 42).unwrap();
    assert!(split.y_test.contains(&0) && split.y_test.contains(&1));

    let preprocessor = Preprocessor::fit(&split.x_train).unwrap();
    let x_train = preprocessor.transform(&split.x_train).unwrap();
    let x_test = preprocessor.transform(&split.x_test).unwrap();

    build_model("logreg").unwrap();
    let model = ChurnModel::fit(
        &x_train,
        &split.y_train,
        preprocessor.feature_names(),
        500,
    )
    .unwrap();

    let probabilities = model.predict_probability(&x_test).unwrap();
    assert_eq!(probabilities.len(), split.y_test.len());
    assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));

    let metrics = MetricReport::from_scores(&split.y_test, &probabilities).unwrap();
    assert!((0.0..=1.0).contains(&metrics.roc_auc));
    assert!((0.0..=1.0).contains(&metrics.pr_auc));
    assert!((0.0..=1.0).contains(&metrics.brier));

    let decision = pick_threshold(&split.y_test, &probabilities, &CostModel::default()).unwrap();
    assert!((0.05..=0.95 + 1e-9).contains(&decision.threshold));
    assert!(decision.utility.is_finite());
}

#[test]
fn test_bundle_save_load_and_predict() {
    let test_file = create_test_csv();
    let file_path = test_file.path().to_str().unwrap();

    let df = load_csv(file_path).unwrap();
    let (x, y) = clean(&df, "Churn", &["customerID".to_string()]).unwrap();
    let split = split_stratified(&x, &y, 0.3, 42).unwrap();

    let preprocessor = Preprocessor::fit(&split.x_train).unwrap();
    let x_train = preprocessor.transform(&split.x_train).unwrap();
    let model = ChurnModel::fit(
        &x_train,
        &split.y_train,
        preprocessor.feature_names(),
        500,
    )
    .unwrap();

    let x_test = preprocessor.transform(&split.x_test).unwrap();
    let probabilities = model.predict_probability(&x_test).unwrap();
    let decision = pick_threshold(&split.y_test, &probabilities, &CostModel::default()).unwrap();

    let pipeline = ChurnPipeline {
        preprocessor,
        model,
        decision,
    };

    let dir = TempDir::new().unwrap();
    let bundle_path = dir.path().join("artifacts").join("model.json");
    pipeline.save(&bundle_path).unwrap();
    assert!(bundle_path.exists());

    let rehydrated = ChurnPipeline::load(&bundle_path).unwrap();
    assert_eq!(rehydrated.decision, decision);

    // Score label-less data through the rehydrated bundle. The raw frame
    // still carries customerID; fitted transforms ignore extra columns.
    let fresh = load_csv(file_path).unwrap();
    let fresh = fresh.drop("Churn").unwrap();

    let original_scores = pipeline.predict_probability(&fresh).unwrap();
    let rehydrated_scores = rehydrated.predict_probability(&fresh).unwrap();
    assert_eq!(original_scores, rehydrated_scores);

    let policy = DecisionPolicy::new(rehydrated, &decision).unwrap();
    let risk = policy.risk_score(&fresh).unwrap();
    let contact = policy.decide(&fresh).unwrap();
    assert_eq!(risk.len(), fresh.height());
    assert_eq!(contact.len(), fresh.height());
    for (score, flagged) in risk.iter().zip(contact.iter()) {
        assert_eq!(*flagged, *score >= decision.threshold);
    }
}

#[test]
fn test_split_reproducibility_across_runs() {
    // Training and evaluation must see the same test partition when they
    // re-derive the split from the same config values.
    let test_file = create_test_csv();
    let file_path = test_file.path().to_str().unwrap();

    let df = load_csv(file_path).unwrap();
    let (x, y) = clean(&df, "Churn", &["customerID".to_string()]).unwrap();

    let first = split_stratified(&x, &y, 0.3, 42).unwrap();
    let second = split_stratified(&x, &y, 0.3, 42).unwrap();

    assert_eq!(first.y_test, second.y_test);
    let tenure_a: Vec<i64> = first
        .x_test
        .column("tenure")
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    let tenure_b: Vec<i64> = second
        .x_test
        .column("tenure")
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(tenure_a, tenure_b);
}

#[test]
fn test_error_handling_bad_target_values() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "tenure,Churn").unwrap();
    writeln!(file, "1,Yes").unwrap();
    writeln!(file, "2,perhaps").unwrap();

    let df = load_csv(file.path().to_str().unwrap()).unwrap();
    let err = clean(&df, "Churn", &[]).unwrap_err();
    assert!(err.to_string().contains("perhaps"));
}
