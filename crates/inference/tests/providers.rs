use absa_analysis::{AnalysisConfig, Analyzer, AspectThreshold, InferenceProvider};
use absa_inference::{AbsaService, InferenceMode, OrtClassifier, ASPECT_MODEL_DIR};
use std::path::PathBuf;
use std::sync::Arc;

fn stub_service() -> AbsaService {
    AbsaService::new(InferenceMode::Stub, PathBuf::from("/nonexistent/absa-models"))
        .expect("stub service")
}

#[tokio::test]
async fn stub_service_drives_the_analyzer() {
    let service: Arc<dyn InferenceProvider> = Arc::new(stub_service());
    let config = AnalysisConfig::default().with_threshold(AspectThreshold::new(0.1).unwrap());
    let analyzer = Analyzer::new(service, config);

    let result = analyzer
        .analyze_text("Giá rẻ nhưng pin yếu")
        .await
        .expect("analysis");

    assert!(result.aspects.iter().all(|a| a.score >= 0.1));
    assert!(result.aspects.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(result.aspects.iter().all(|a| a.sentiment().is_some()));

    let again = analyzer
        .analyze_text("Giá rẻ nhưng pin yếu")
        .await
        .expect("analysis");
    assert_eq!(result, again);
}

#[tokio::test]
async fn stub_batch_matches_single_analysis() {
    let analyzer = Analyzer::new(
        Arc::new(stub_service()),
        AnalysisConfig::default().with_workers(4),
    );
    let texts = ["Màn hình đẹp", "Pin trâu", "", "Camera chụp mờ"];

    let batch = analyzer
        .analyze_batch(texts.iter().map(|t| Some((*t).to_string())))
        .await;
    for (text, result) in texts.iter().zip(batch) {
        let single = analyzer.analyze_text(text).await.expect("single");
        assert_eq!(result.expect("batch row"), single);
    }
}

#[test]
#[ignore = "requires exported ONNX models under ./models (set ABSA_MODEL_DIR)"]
fn onnx_aspect_head_loads() {
    let dir = absa_inference::model_dir().join(ASPECT_MODEL_DIR);
    let classifier = OrtClassifier::load(&dir).expect("load aspect model");
    let logits = classifier
        .logits_blocking(&["Giá rẻ nhưng pin yếu".to_string()])
        .expect("logits");
    assert_eq!(logits.len(), 1);
    assert_eq!(logits[0].len(), classifier.labels().class_count());
}

#[tokio::test]
#[ignore = "requires exported ONNX models under ./models (set ABSA_MODEL_DIR)"]
async fn onnx_service_scores_review() {
    let service = AbsaService::new(InferenceMode::Onnx, absa_inference::model_dir())
        .expect("onnx service");
    let scores = service
        .predict_aspect_scores("Giá rẻ nhưng pin yếu")
        .await
        .expect("aspect scores");
    assert!(!scores.is_empty());
    let sentiment = service
        .predict_sentiment("Giá rẻ nhưng pin yếu", Some("PRICE"))
        .await
        .expect("sentiment");
    assert!((0.0..=1.0).contains(&sentiment.score()));
}
