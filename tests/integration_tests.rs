//! Integration tests for Research Integrity
//!
//! These tests drive the engine and the MCP tool layer end to end, with mock
//! or local HTTP collaborators standing in for the external services.

use research_integrity::config::{load_config, GovernorConfig, SourceLimitConfig};
use research_integrity::engine::IntegrityEvent;
use research_integrity::mcp::ToolRegistry;
use research_integrity::models::{
    Citation, CitationBuilder, CitationType, ExternalSources, IssueCode, Severity,
};
use research_integrity::sources::mock::MockBehavior;
#[cfg(feature = "http-sources")]
use research_integrity::sources::DoiOrgResolver;
use research_integrity::sources::{InMemoryIndex, MockDoiResolver, MockSourceIndex, SourceRegistry};
use research_integrity::{
    CheckStatus, Config, Document, IntegrityEngine, IntegrityError, ReportFormat,
    ValidationContext,
};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

fn engine() -> IntegrityEngine {
    IntegrityEngine::with_sources(Config::default(), SourceRegistry::new())
}

fn citation(id: &str, title: &str, doi: &str) -> Citation {
    CitationBuilder::new(id, CitationType::Journal)
        .authors("Smith, J.; Doe, A. B.")
        .title(title)
        .year(2019)
        .journal("Journal of Sleep Research")
        .volume("28")
        .pages("1-12")
        .doi(doi)
        .build()
}

fn doi_only() -> ExternalSources {
    ExternalSources {
        doi: true,
        ..Default::default()
    }
}

fn paper() -> Document {
    Document::new(
        "Sleep supports memory consolidation (Smith, 2019). We recruited 40 participants \
         and measured recall after a night of sleep.\n\n\
         Results showed improved recall compared with the wake group.",
    )
    .with_title("Sleep and recall")
    .with_citations(vec![citation("ref1", "Sleep and memory consolidation", "10.1111/jsr.12345")])
}

#[tokio::test]
async fn test_full_check_overall_score_is_weighted_mean() {
    let engine = engine();
    let id = engine
        .validate_document(paper(), ValidationContext::new("paper-1"))
        .unwrap();

    let check = engine.wait_for_completion(&id).await.unwrap();
    assert_eq!(check.status, CheckStatus::Completed);
    assert!(check.updated_at >= check.created_at);
    assert!(check.issues.is_empty());

    let report = check.report.expect("completed check has a report");
    let rules = engine.list_rules();
    assert_eq!(report.results.len(), rules.len());

    let (weighted, total) = report.results.iter().fold((0.0, 0.0), |(w, t), result| {
        let weight = rules
            .iter()
            .find(|r| r.id == result.rule_id)
            .map(|r| r.weight)
            .unwrap();
        (w + weight * result.score, t + weight)
    });
    assert!((report.overall_score - weighted / total).abs() < 1e-9);

    let counted = report.critical_issues + report.major_issues + report.minor_issues + report.warning_issues;
    assert_eq!(counted, report.total_issues);
    assert_eq!(report.issues().count(), report.total_issues);
    assert!(!report.recommendations.is_empty());
}

#[tokio::test]
async fn test_disabled_rule_is_skipped_and_ids_are_prefixed() {
    let engine = engine();
    engine.set_rule_enabled("format", false).unwrap();

    let id = engine
        .submit_check(paper(), ValidationContext::new("paper-2"), Default::default())
        .unwrap();
    let check = engine.wait_for_completion(&id).await.unwrap();
    let report = check.report.unwrap();

    assert_eq!(report.results.len(), 5);
    assert!(report.results.iter().all(|r| r.rule_id != "format"));
    assert!(!check.metadata.rules_run.contains(&"format".to_string()));
    for result in &report.results {
        for issue in &result.issues {
            assert!(issue.id.starts_with(&format!("{}-", result.rule_id)), "{}", issue.id);
        }
    }
}

#[tokio::test]
async fn test_events_follow_check_lifecycle() {
    let engine = engine();
    let mut events = engine.subscribe();

    let id = engine
        .validate_document(paper(), ValidationContext::new("paper-3"))
        .unwrap();

    let mut seen = Vec::new();
    loop {
        let event = events.recv().await.unwrap();
        assert_eq!(event.check_id(), id);
        let terminal = event.is_terminal();
        seen.push(event);
        if terminal {
            break;
        }
    }

    assert!(matches!(seen.first(), Some(IntegrityEvent::CheckSubmitted { .. })));
    assert!(matches!(seen.get(1), Some(IntegrityEvent::CheckStarted { .. })));
    let rule_events = seen
        .iter()
        .filter(|e| matches!(e, IntegrityEvent::RuleCompleted { .. }))
        .count();
    assert_eq!(rule_events, 6);
    assert!(matches!(seen.last(), Some(IntegrityEvent::CheckCompleted { .. })));
}

#[tokio::test]
async fn test_unknown_check_and_unfinished_report() {
    let engine = engine();
    assert!(matches!(
        engine.get_integrity_results("missing"),
        Err(IntegrityError::CheckNotFound(_))
    ));

    let id = engine
        .validate_document(paper(), ValidationContext::new("paper-4"))
        .unwrap();
    let pending = engine.get_integrity_results(&id).unwrap();
    assert_eq!(pending.status, CheckStatus::Pending);
    assert!(matches!(
        engine.generate_integrity_report(&id, ReportFormat::Json),
        Err(IntegrityError::CheckNotReady(_))
    ));

    engine.wait_for_completion(&id).await.unwrap();
    let exported = engine.generate_integrity_report(&id, ReportFormat::Json).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&exported.content).unwrap();
    assert_eq!(parsed["id"], id.as_str());
}

#[tokio::test]
async fn test_html_report_escapes_document_text() {
    let engine = engine();
    let id = engine
        .validate_document(
            Document::new("Short note."),
            ValidationContext::new("<script>alert(1)</script>"),
        )
        .unwrap();
    engine.wait_for_completion(&id).await.unwrap();

    let html = engine.generate_integrity_report(&id, ReportFormat::Html).unwrap();
    assert!(html.content_type.starts_with("text/html"));
    assert!(html.content.contains("&lt;script&gt;"));
    assert!(!html.content.contains("<script>"));
}

#[tokio::test]
async fn test_remote_index_failure_does_not_fail_check() {
    let index = Arc::new(MockSourceIndex::new());
    index.set_behavior(MockBehavior::Fail);
    let engine = IntegrityEngine::with_sources(
        Config::default(),
        SourceRegistry::new().with_plagiarism_index(index.clone()),
    );
    let context = ValidationContext::new("paper-5").external_sources(ExternalSources {
        plagiarism_index: true,
        ..Default::default()
    });

    let id = engine.validate_document(paper(), context).unwrap();
    let check = engine.wait_for_completion(&id).await.unwrap();

    assert!(index.calls() > 0);
    assert_eq!(check.status, CheckStatus::Completed);
    let plagiarism = check
        .report
        .unwrap()
        .results
        .into_iter()
        .find(|r| r.rule_id == "plagiarism")
        .unwrap();
    assert!(plagiarism.confidence < 100.0);
}

#[tokio::test]
async fn test_plagiarism_against_local_index() {
    let source = "Rivers carry sediment from mountain slopes down to the coast where it \
                  settles into deltas that shift slowly as currents and tides rework the deposits";
    let index = InMemoryIndex::new(50, 5);
    index.add_source("geo-notes", Some("Notes on deltas".to_string()), source);
    let engine = IntegrityEngine::with_sources(
        Config::default(),
        SourceRegistry::new().with_local_index(Arc::new(index)),
    );

    let copied = engine
        .detect_plagiarism(source, &ValidationContext::default())
        .await
        .unwrap();
    assert!(!copied.passed);
    assert!(copied.issues.iter().any(|i| i.severity == Severity::Critical));

    let original = engine
        .detect_plagiarism(
            "Glaciers grind bedrock into fine flour that turns meltwater lakes a milky turquoise color",
            &ValidationContext::default(),
        )
        .await
        .unwrap();
    assert_eq!(original.score, 100.0);
    assert!(original.passed);
}

fn issue_signature(report: &research_integrity::IntegrityReport) -> Vec<(String, &'static str, Severity)> {
    let mut issues: Vec<_> = report
        .issues()
        .map(|i| (i.id.clone(), i.code.id(), i.severity))
        .collect();
    issues.sort();
    issues
}

#[tokio::test]
async fn test_repeated_check_is_idempotent() {
    let resolver = Arc::new(MockDoiResolver::with_dois(&["10.1111/jsr.12345"]));
    let local = Arc::new(InMemoryIndex::default());
    local.add_source(
        "sleep-review",
        None,
        "Sleep supports memory consolidation and we recruited forty participants for the study",
    );
    let engine = IntegrityEngine::with_sources(
        Config::default(),
        SourceRegistry::new()
            .with_local_index(local)
            .with_doi_resolver(resolver.clone()),
    );

    let document = paper().with_citations(vec![
        citation("ref1", "Sleep and memory consolidation", "10.1111/jsr.12345"),
        citation("ref2", "Napping and recall", "10.9999/unknown.1"),
    ]);
    let context = ValidationContext::new("paper-idem").external_sources(doi_only());

    let mut reports = Vec::new();
    for _ in 0..2 {
        let id = engine
            .validate_document(document.clone(), context.clone())
            .unwrap();
        let check = engine.wait_for_completion(&id).await.unwrap();
        assert_eq!(check.status, CheckStatus::Completed);
        reports.push(check.report.unwrap());
    }

    let (first, second) = (&reports[0], &reports[1]);
    assert!(first.total_issues > 0);
    assert_eq!(first.overall_score, second.overall_score);
    assert_eq!(first.category_scores, second.category_scores);
    assert_eq!(first.passed, second.passed);
    assert_eq!(first.fabrication_risk, second.fabrication_risk);
    assert_eq!(issue_signature(first), issue_signature(second));
}

#[tokio::test]
async fn test_rate_limited_doi_lookups_are_inconclusive() {
    let resolver = Arc::new(MockDoiResolver::with_dois(&[
        "10.1000/a1",
        "10.1000/a2",
        "10.1000/a3",
    ]));
    let mut config = Config::default();
    config.governor.source_limits.push(SourceLimitConfig {
        source: "doi".to_string(),
        quota: 1,
        window_secs: 60,
    });
    let engine = IntegrityEngine::with_sources(
        config,
        SourceRegistry::new().with_doi_resolver(resolver.clone()),
    );

    let citations = vec![
        citation("ref1", "Sleep and memory consolidation", "10.1000/a1"),
        citation("ref2", "Napping and motor learning", "10.1000/a2"),
        citation("ref3", "Dreams and emotional memory", "10.1000/a3"),
    ];
    let context = ValidationContext::default().external_sources(doi_only());
    let result = engine.validate_citations(citations, &context).await.unwrap();

    assert_eq!(resolver.calls(), 1);
    let limited: Vec<_> = result
        .issues
        .iter()
        .filter(|i| i.code == IssueCode::RateLimitExceeded)
        .collect();
    assert_eq!(limited.len(), 2);
    assert!(limited.iter().all(|i| i.severity == Severity::Warning));
    assert_eq!(result.metadata.inconclusive_lookups, 2);
    assert_eq!(result.confidence, 90.0);
    assert_eq!(result.score, 100.0);
}

#[tokio::test(start_paused = true)]
async fn test_failing_resolver_opens_circuit() {
    let resolver = Arc::new(MockDoiResolver::new());
    resolver.set_behavior(MockBehavior::Fail);
    let mut config = Config::default();
    config.governor = GovernorConfig {
        failure_threshold: 2,
        ..GovernorConfig::default()
    };
    let engine = IntegrityEngine::with_sources(
        config,
        SourceRegistry::new().with_doi_resolver(resolver.clone()),
    );

    let citations = vec![
        citation("ref1", "Sleep and memory consolidation", "10.1000/b1"),
        citation("ref2", "Napping and motor learning", "10.1000/b2"),
        citation("ref3", "Dreams and emotional memory", "10.1000/b3"),
        citation("ref4", "Sleep spindles in adolescence", "10.1000/b4"),
    ];
    let context = ValidationContext::default().external_sources(doi_only());
    let result = engine.validate_citations(citations, &context).await.unwrap();

    assert_eq!(resolver.calls(), 2);
    let open = result
        .issues
        .iter()
        .filter(|i| i.code == IssueCode::CircuitOpen)
        .count();
    assert_eq!(open, 2);
    assert_eq!(result.metadata.inconclusive_lookups, 4);
    assert_eq!(result.confidence, 80.0);

    // After the cooldown the resolver is tried again
    tokio::time::advance(Duration::from_secs(61)).await;
    resolver.set_behavior(MockBehavior::Normal);
    let retry = engine
        .validate_citations(
            vec![citation("ref5", "Sleep and glymphatic clearance", "10.1000/b5")],
            &context,
        )
        .await
        .unwrap();
    assert_eq!(resolver.calls(), 3);
    assert_eq!(retry.metadata.inconclusive_lookups, 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_resolver_times_out() {
    let resolver = Arc::new(MockDoiResolver::with_dois(&["10.1000/slow"]));
    resolver.set_behavior(MockBehavior::Delay(Duration::from_secs(30)));
    let engine = IntegrityEngine::with_sources(
        Config::default(),
        SourceRegistry::new().with_doi_resolver(resolver.clone()),
    );

    let context = ValidationContext::default().external_sources(doi_only());
    let result = engine
        .validate_citations(
            vec![citation("ref1", "Sleep and memory consolidation", "10.1000/slow")],
            &context,
        )
        .await
        .unwrap();

    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].code, IssueCode::LookupTimeout);
    assert_eq!(result.score, 100.0);

    let status = engine.governor_status();
    assert!(status.breakers.iter().all(|b| b.failures == 0));
}

#[tokio::test]
async fn test_doi_lookups_are_cached() {
    let resolver = Arc::new(MockDoiResolver::with_dois(&["10.1111/jsr.12345"]));
    let engine = IntegrityEngine::with_sources(
        Config::default(),
        SourceRegistry::new().with_doi_resolver(resolver.clone()),
    );
    let context = ValidationContext::default().external_sources(doi_only());

    for _ in 0..3 {
        let result = engine
            .validate_citations(
                vec![citation("ref1", "Sleep and memory consolidation", "10.1111/jsr.12345")],
                &context,
            )
            .await
            .unwrap();
        assert!(result.issues.is_empty());
    }
    assert_eq!(resolver.calls(), 1);
}

#[cfg(feature = "http-sources")]
#[tokio::test]
async fn test_unresolved_doi_over_http() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", mockito::Matcher::Regex(r"^/api/handles/".to_string()))
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"responseCode":100}"#)
        .create_async()
        .await;

    let resolver = DoiOrgResolver::with_base_url(&server.url()).unwrap();
    let engine = IntegrityEngine::with_sources(
        Config::default(),
        SourceRegistry::new().with_doi_resolver(Arc::new(resolver)),
    );

    let context = ValidationContext::default().external_sources(doi_only());
    let result = engine
        .validate_citations(
            vec![citation("ref1", "Sleep and memory consolidation", "10.9999/invented")],
            &context,
        )
        .await
        .unwrap();

    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].code, IssueCode::CitationInvalidDoi);
    assert_eq!(result.issues[0].id, "citations-001");
    assert_eq!(result.score, 85.0);
}

#[test]
fn test_config_file_applies_rule_overrides() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        r#"
[scoring]
pass_threshold = 85.0

[scoring.penalties]
critical = 30.0

[[rules]]
id = "methodology"
enabled = false

[[rules]]
id = "format"
weight = 0.02
"#
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.scoring.pass_threshold, 85.0);
    assert_eq!(config.scoring.penalties.critical, 30.0);
    assert_eq!(config.scoring.penalties.major, 15.0);

    let engine = IntegrityEngine::with_sources(config, SourceRegistry::new());
    let rules = engine.list_rules();
    let methodology = rules.iter().find(|r| r.id == "methodology").unwrap();
    assert!(!methodology.enabled);
    let format = rules.iter().find(|r| r.id == "format").unwrap();
    assert_eq!(format.weight, 0.02);
}

#[tokio::test]
async fn test_known_sources_dir_with_custom_segmentation() {
    let corpus = tempfile::tempdir().unwrap();
    let known: String = (0..120)
        .map(|i| format!("finding{}", i))
        .collect::<Vec<_>>()
        .join(" ");
    std::fs::write(corpus.path().join("thesis-2019.txt"), &known).unwrap();

    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        "[plagiarism]\nsegment_words = 30\nshingle_size = 3\n\n[sources]\nknown_sources_dir = '{}'\n",
        corpus.path().display()
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    let engine = IntegrityEngine::new(config).unwrap();
    assert_eq!(engine.sources().local_index().params(), (30, 3));
    assert_eq!(engine.sources().local_index().len(), 1);

    let result = engine
        .detect_plagiarism(&known, &ValidationContext::default())
        .await
        .unwrap();
    assert!(result.score < 1.0);
    assert!(result.issues.iter().any(|i| i.severity == Severity::Critical));
}

#[test]
fn test_invalid_config_file_rejected() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(file, "[scoring]\npass_threshold = 150.0\n").unwrap();

    assert!(load_config(file.path()).is_err());
}

#[tokio::test]
async fn test_mcp_tools_end_to_end() {
    let engine = Arc::new(engine());
    let tools = ToolRegistry::from_engine(engine.clone());

    let submitted = tools
        .execute(
            "validate_document",
            json!({
                "document": {
                    "content": "Sleep supports memory (Smith, 2019).",
                    "citations": [{
                        "id": "ref1",
                        "type": "journal",
                        "authors": "Smith, J.",
                        "title": "Sleep and memory",
                        "year": 2019,
                        "journal": "Journal of Sleep Research",
                        "volume": "28"
                    }]
                },
                "context": {"document_id": "mcp-doc"}
            }),
        )
        .await
        .unwrap();
    assert_eq!(submitted["status"], "pending");
    let check_id = submitted["check_id"].as_str().unwrap().to_string();

    engine.wait_for_completion(&check_id).await.unwrap();

    let results = tools
        .execute("get_integrity_results", json!({"check_id": check_id}))
        .await
        .unwrap();
    assert_eq!(results["status"], "completed");
    assert_eq!(results["document_id"], "mcp-doc");

    let report = tools
        .execute(
            "generate_integrity_report",
            json!({"check_id": check_id, "format": "pdf"}),
        )
        .await
        .unwrap();
    assert_eq!(report["format"], "pdf");
    assert!(report["content"].as_str().unwrap().contains("mcp-doc"));

    let quick = tools
        .execute("quick_integrity_score", json!({"content": "Tides follow the moon."}))
        .await
        .unwrap();
    assert_eq!(quick["score"], 75.0);
    assert_eq!(quick["risk_level"], "medium");
}
