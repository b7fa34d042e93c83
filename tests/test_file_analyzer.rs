mod common;

use common::{filler, logging::init_test_logging};
use mock_fraud_checker::{FileAnalyzer, MockKind, Severity, TestTier};

fn analyzer() -> FileAnalyzer {
    init_test_logging();
    FileAnalyzer::standard().expect("standard analyzer")
}

#[test]
fn module_mock_in_system_test_is_single_critical() {
    let analysis = analyzer().analyze("jest.mock('database')", "app.stest.ts", TestTier::System);

    assert_eq!(analysis.detections.len(), 1);
    let d = &analysis.detections[0];
    assert_eq!(d.severity, Severity::Critical);
    assert_eq!(d.mock_kind, MockKind::Module);
    assert_eq!(d.test_tier, TestTier::System);
    assert_eq!(analysis.fraud_score, 25);
}

#[test]
fn http_interception_in_integration_test_is_low() {
    let analysis = analyzer().analyze(
        "const scope = nock('https://api.example.com');",
        "orders.itest.ts",
        TestTier::Integration,
    );

    let d = analysis
        .detections
        .iter()
        .find(|d| d.mock_kind == MockKind::Api)
        .expect("api detection");
    assert_eq!(d.severity, Severity::Low);
    assert_eq!(d.pattern, "http-interception");
}

#[test]
fn timer_fakes_are_medium_in_external_tests() {
    let analysis = analyzer().analyze("jest.useFakeTimers();", "billing.etest.ts", TestTier::External);
    let timer = analysis
        .detections
        .iter()
        .find(|d| d.mock_kind == MockKind::Timer)
        .expect("timer detection");
    assert_eq!(timer.severity, Severity::Medium);
}

#[test]
fn repeated_analysis_is_stable() {
    let content = "describe('svc', () => {\n  beforeEach(() => { sinon.stub(api, 'get'); });\n  it('a', () => { const db = mockDatabase(); });\n});\n";
    let analyzer = analyzer();
    let key = |a: &mock_fraud_checker::FileAnalysis| {
        a.detections
            .iter()
            .map(|d| (d.location.line, d.location.column, d.severity, d.pattern.clone()))
            .collect::<Vec<_>>()
    };

    let first = analyzer.analyze(content, "svc.stest.ts", TestTier::System);
    let second = analyzer.analyze(content, "svc.stest.ts", TestTier::System);
    assert!(!first.detections.is_empty());
    assert_eq!(key(&first), key(&second));
}

#[test]
fn mock_free_window_spans_five_before_to_fifteen_after() {
    let analyzer = analyzer();
    let test_block = "it('works', () => {});\n";

    // test block alone on line 10
    let clean = format!("{}{}", filler(9), test_block);
    let analysis = analyzer.analyze(&clean, "w.utest.ts", TestTier::Unit);
    assert_eq!(analysis.total_tests, 1);
    assert_eq!(analysis.mock_free_sections, 1);

    // detection on line 12
    let near = format!("{}{}{}const cb = jest.fn();\n", filler(9), test_block, filler(1));
    let analysis = analyzer.analyze(&near, "w.utest.ts", TestTier::Unit);
    assert_eq!(analysis.detections[0].location.line, 12);
    assert_eq!(analysis.mock_free_sections, 0);

    // detection on line 50
    let far = format!("{}{}{}const cb = jest.fn();\n", filler(9), test_block, filler(39));
    let analysis = analyzer.analyze(&far, "w.utest.ts", TestTier::Unit);
    assert_eq!(analysis.detections[0].location.line, 50);
    assert_eq!(analysis.mock_free_sections, 1);
}

#[test]
fn nested_declarations_count_independently() {
    let content = "describe('x', () => { it('y', () => {}); });\n";
    let analysis = analyzer().analyze(content, "x.utest.ts", TestTier::Unit);
    assert_eq!(analysis.total_tests, 2);
}

#[test]
fn snippet_marks_the_matched_line() {
    let content = "const a = 1;\nconst b = 2;\nconst repo = mockRepository();\nconst c = 3;\n";
    let analysis = analyzer().analyze(content, "r.itest.ts", TestTier::Integration);
    let d = analysis
        .detections
        .iter()
        .find(|d| d.pattern == "database-mock")
        .expect("database detection");
    assert_eq!((d.location.line, d.location.column), (3, 14));
    assert!(d.location.snippet.contains(">    3 | const repo = mockRepository();"));
    assert!(d.location.snippet.contains("     1 | const a = 1;"));
}

#[test]
fn recommendations_follow_detections() {
    let analyzer = analyzer();
    let clean = analyzer.analyze("it('ok', () => {});", "ok.stest.ts", TestTier::System);
    assert_eq!(clean.recommendations.len(), 1);

    let dirty = analyzer.analyze("jest.mock('../db');", "bad.stest.ts", TestTier::System);
    assert!(dirty.recommendations.iter().any(|r| r.starts_with("1 critical violation")));
    assert!(dirty.recommendations.iter().any(|r| r.contains("real application stack")));
}
