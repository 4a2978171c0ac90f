//! End-to-end lab runs against the in-memory repository
//!
//! Drives the repository workbench through `WorkbenchRunner` the way the
//! `conformance-lab run` command does, then writes and re-reads reports.

use conformance_workbench::config::{ConfigOrigin, EffectiveConfig, LabSettings};
use conformance_workbench::mock::{workbench, MockRepository};
use conformance_workbench::report::{
    self, ReportIndex, CONFIG_FILE, INDEX_FILE, RESULTS_FILE, SUMMARY_FILE,
};
use conformance_workbench::{ConformanceStatus, TestLab, WorkPad, WorkbenchRunner};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Run {
    lab: TestLab,
    runner: WorkbenchRunner,
    repository: Arc<MockRepository>,
}

fn start(repository: MockRepository, settings: &LabSettings) -> Run {
    start_timed(repository, settings, Duration::from_millis(50), Duration::from_secs(2))
}

fn start_timed(
    repository: MockRepository,
    settings: &LabSettings,
    quiescence: Duration,
    event_timeout: Duration,
) -> Run {
    let repository = Arc::new(repository);
    let pad = Arc::new(
        WorkPad::new(workbench::workbench_identity(), workbench::profile_catalog())
            .with_tut(settings.tut.clone())
            .with_max_page_size(settings.max_page_size)
            .with_quiescence(quiescence),
    );
    let cases = workbench::test_cases(&pad, repository.clone(), event_timeout).unwrap();
    let runner = WorkbenchRunner::new(Arc::clone(&pad), cases)
        .with_filter(settings.filter.clone())
        .with_poll_interval(Duration::from_millis(10));

    let mut lab = TestLab::new(Some(settings.tut.server_name.clone()));
    lab.add_work_pad(pad);
    Run {
        lab,
        runner,
        repository,
    }
}

fn default_settings() -> LabSettings {
    LabSettings::from_effective(&EffectiveConfig::build(None, None).unwrap()).unwrap()
}

#[test]
fn test_conformant_repository_run() {
    let run = start(MockRepository::default(), &default_settings());

    let tally = run.runner.run();
    assert_eq!(tally.selected, 5);
    assert_eq!(tally.failed, 0);

    assert!(run.runner.wait_for_completion(Duration::from_secs(10)));
    run.runner.clean_up();
    assert_eq!(run.repository.entity_count(), 0);

    let summary = run.lab.test_lab_summary();
    assert!(summary.passed(), "{:?}", run.lab.failed_test_case_report());
    assert_eq!(summary.test_case_count(), 5);
    assert!(summary.workbench_summaries[0].workbench_complete);
    for profile in &summary.workbench_summaries[0].profile_summaries {
        assert_eq!(
            profile.conformance_status,
            ConformanceStatus::ConformantFullSupport,
            "{}",
            profile.name
        );
    }

    let result = run
        .lab
        .test_case_report("repo-find-entities-001")
        .unwrap()
        .unwrap();
    assert_eq!(result.discovered_properties["maxPageSize"], 100);
}

#[test]
fn test_broken_paging_fails_mandatory_profile() {
    let run = start(MockRepository::default().with_broken_paging(), &default_settings());
    run.runner.run();
    run.runner.wait_for_completion(Duration::from_secs(10));
    run.runner.clean_up();

    let summary = run.lab.test_lab_summary();
    assert!(!summary.passed());
    assert_eq!(summary.exit_code(), 1);

    let failed = run.lab.failed_test_case_report().unwrap();
    assert!(failed
        .iter()
        .any(|tc| tc.test_case_id == "repo-find-entities-001"));
}

#[test]
fn test_pending_event_listener_holds_off_completion() {
    // event wait outlasts the quiet period several times over
    let run = start_timed(
        MockRepository::default().without_events(),
        &default_settings(),
        Duration::from_millis(100),
        Duration::from_millis(600),
    );
    run.runner.run();
    assert!(run.runner.wait_for_completion(Duration::from_secs(5)));

    let result = run
        .lab
        .test_case_report("event-new-entity-001")
        .unwrap()
        .expect("listener finished before completion");
    assert_eq!(result.unsuccessful_assertions.len(), 1);

    run.runner.clean_up();
    let results = run.lab.test_lab_results();
    assert!(results.workbench_results[0].workbench_complete);
    assert_eq!(results.summary().exit_code(), 1);
}

#[test]
fn test_filtered_run_skips_unselected() {
    let overrides = serde_json::json!({
        "filter": { "include": ["^repo-"], "exclude": ["type-defs"] }
    });
    let config = EffectiveConfig::build(None, Some(overrides)).unwrap();
    let settings = LabSettings::from_effective(&config).unwrap();

    let run = start(MockRepository::default(), &settings);
    let tally = run.runner.run();
    run.runner.clean_up();

    assert_eq!(tally.selected, 3);
    assert_eq!(tally.filtered_out, 2);

    let results = run.lab.workbench_report(workbench::WORKBENCH_ID).unwrap();
    assert_eq!(results.passed_test_cases.len(), 3);
    assert_eq!(results.skipped_test_cases.len(), 2);

    let events = run.lab.profile_report("Event notification").unwrap();
    assert_eq!(events.conformance_status, ConformanceStatus::Unknown);
}

#[test]
fn test_reports_written_and_reloaded() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("lab.toml");
    fs::write(
        &config_path,
        r#"
max_page_size = 25

[tut]
server_name = "staging-repository"
"#,
    )
    .unwrap();

    let overrides = serde_json::json!({
        "output_dir": dir.path().join("out").to_string_lossy()
    });
    let config = EffectiveConfig::build(Some(&config_path), Some(overrides)).unwrap();
    assert_eq!(config.sources.len(), 3);
    assert_eq!(config.sources[1].origin, ConfigOrigin::File);
    let settings = LabSettings::from_effective(&config).unwrap();
    assert_eq!(settings.max_page_size, 25);
    assert_eq!(settings.tut.server_name, "staging-repository");

    let run = start(MockRepository::new("staging-repository"), &settings);
    run.runner.run();
    assert!(run.runner.wait_for_completion(Duration::from_secs(10)));
    run.runner.clean_up();

    let results = run.lab.test_lab_results();
    let config = config.with_run_id(run.lab.test_run_id());
    let index = report::write_reports(&settings.output_dir, &results, &config).unwrap();

    for file in [RESULTS_FILE, SUMMARY_FILE, CONFIG_FILE, INDEX_FILE] {
        assert!(settings.output_dir.join(file).exists(), "{}", file);
    }
    assert_eq!(index.run_id.as_deref(), Some(run.lab.test_run_id()));

    let on_disk = ReportIndex::load(&settings.output_dir.join(INDEX_FILE)).unwrap();
    assert_eq!(on_disk.reports, index.reports);

    let reloaded = report::load_results(&settings.output_dir.join(RESULTS_FILE)).unwrap();
    assert_eq!(reloaded, results);
    assert_eq!(reloaded.tut_name.as_deref(), Some("staging-repository"));

    let find = reloaded.workbench_results[0]
        .passed_test_cases
        .iter()
        .find(|tc| tc.test_case_id == "repo-find-entities-001")
        .unwrap();
    assert_eq!(find.discovered_properties["maxPageSize"], 25);
    assert_eq!(find.discovered_properties["serverName"], "staging-repository");

    let text = report::render_summary(&reloaded.summary());
    assert!(text.contains("Status: PASS"));
    assert!(text.contains("staging-repository"));
}
