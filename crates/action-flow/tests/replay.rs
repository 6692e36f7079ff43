use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use action_flow::{
    DefaultWorkflowExecutor, ExecutorOptions, FlowError, RecordRequest, RecordTarget, RunReport, RunRequest,
    StepRecorder, WorkflowExecutor,
};
use action_primitives::{
    ActionError, DriverCall, DriverError, DriverErrorKind, ElementFixture, ElementSnapshot,
    FetchedImage, FileStore, ImageFetcher, ScriptedOp, ScriptedPage,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use retrace_core_types::{SelectorSet, StepAction, StepDraft, WorkflowId};
use retrace_workflow_store::{InMemoryWorkflowStore, JsonFileWorkflowStore, WorkflowStore};
use stealth::{DelaySpec, MicroPausePlan, TempoPlan, TimingModel};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct MemoryFiles {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
}

#[async_trait]
impl FileStore for MemoryFiles {
    async fn save_file(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, ActionError> {
        self.saved.lock().push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from("/mem").join(filename))
    }

    async fn save_temporary_file(&self, bytes: &[u8], mime: &str) -> Result<PathBuf, ActionError> {
        let name = format!("upload-{}.{}", self.saved.lock().len(), mime.replace('/', "-"));
        self.saved.lock().push((name.clone(), bytes.to_vec()));
        Ok(PathBuf::from("/mem/tmp").join(name))
    }
}

struct StubFetcher {
    result: Result<FetchedImage, ActionError>,
}

impl StubFetcher {
    fn ok() -> Self {
        Self {
            result: Ok(FetchedImage {
                bytes: vec![1, 2, 3],
                mime: "image/png".into(),
            }),
        }
    }

    fn failing() -> Self {
        Self {
            result: Err(ActionError::download(
                "https://img.example/cat.png",
                "HTTP 404 Not Found",
            )),
        }
    }
}

#[async_trait]
impl ImageFetcher for StubFetcher {
    async fn fetch(&self, _url: &str) -> Result<FetchedImage, ActionError> {
        self.result.clone()
    }
}

/// Every pause exact: thinking 100ms, post-action 1000ms, nothing else.
fn fixed_plan() -> TempoPlan {
    let zero = DelaySpec::new(0.0, 0.0);
    TempoPlan {
        name: "fixed".into(),
        thinking: DelaySpec::new(100.0, 0.0),
        post_action: DelaySpec::new(1000.0, 0.0),
        per_char: zero,
        micro_pause: MicroPausePlan {
            probability: 0.0,
            delay: zero,
        },
        hover_settle: zero,
        scroll_pause: zero,
        nav_settle: zero,
        hover_hold: zero,
        wait_variance: 0.0,
        ..TempoPlan::default()
    }
}

fn silent_plan() -> TempoPlan {
    TempoPlan {
        speed: 0.0,
        ..TempoPlan::default()
    }
}

struct Harness {
    store: Arc<InMemoryWorkflowStore>,
    page: Arc<ScriptedPage>,
    files: Arc<MemoryFiles>,
    workflow: WorkflowId,
}

impl Harness {
    async fn new(page: ScriptedPage) -> Self {
        let store = Arc::new(InMemoryWorkflowStore::new());
        let workflow = store.create_workflow("demo", None).await.unwrap().id;
        Self {
            store,
            page: Arc::new(page),
            files: Arc::new(MemoryFiles::default()),
            workflow,
        }
    }

    async fn step(&self, order: u32, action: StepAction, value: Option<&str>, css: Option<&str>) {
        let mut draft = StepDraft::new(self.workflow.clone(), order, action);
        if let Some(value) = value {
            draft = draft.with_value(value);
        }
        if let Some(css) = css {
            draft = draft.with_selectors(SelectorSet::from_css(css));
        }
        self.store.upsert_step(draft).await.unwrap();
    }

    fn executor(&self, plan: TempoPlan, fetcher: StubFetcher) -> DefaultWorkflowExecutor {
        DefaultWorkflowExecutor::new(
            self.store.clone(),
            self.page.clone(),
            self.files.clone(),
            Arc::new(fetcher),
            Arc::new(TimingModel::seeded(plan, 9)),
        )
    }

    async fn run(&self, plan: TempoPlan) -> RunReport {
        self.executor(plan, StubFetcher::ok())
            .run(RunRequest::new(self.workflow.clone()))
            .await
            .unwrap()
    }
}

fn assert_elapsed(start: Instant, expected_ms: u64) {
    let elapsed = start.elapsed();
    let expected = Duration::from_millis(expected_ms);
    assert!(
        elapsed >= expected && elapsed <= expected + Duration::from_millis(10),
        "elapsed {:?}, expected about {:?}",
        elapsed,
        expected
    );
}

#[tokio::test(start_paused = true)]
async fn failed_step_does_not_stop_later_steps() {
    let page = ScriptedPage::new()
        .with_css("#a", ElementFixture::new("a"))
        .with_css("#c", ElementFixture::new("c"));
    let h = Harness::new(page).await;
    h.step(1, StepAction::Click, None, Some("#a")).await;
    h.step(2, StepAction::Click, None, Some("#b")).await;
    h.step(3, StepAction::Click, None, Some("#c")).await;

    let report = h.run(silent_plan()).await;

    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.failed, 1);
    assert!(report.results[0].success);
    assert!(!report.results[1].success);
    assert!(report.results[2].success);
    assert!(report.aborted.is_none());
    assert!(!report.is_success());
    let calls = h.page.calls();
    assert!(calls.contains(&DriverCall::Click("a".into())));
    assert!(calls.contains(&DriverCall::Click("c".into())));
    assert!(report.render().ends_with("Summary: 3 total, 2 succeeded, 1 failed"));
}

#[tokio::test(start_paused = true)]
async fn post_action_pause_only_follows_success() {
    let h = Harness::new(ScriptedPage::new()).await;
    h.step(1, StepAction::Click, None, Some("#gone")).await;
    h.step(2, StepAction::Wait, Some("0"), None).await;

    let start = Instant::now();
    let report = h.run(fixed_plan()).await;

    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.succeeded, 1);
    // think + think + post-action for the wait only
    assert_elapsed(start, 100 + 100 + 1000);
}

#[tokio::test(start_paused = true)]
async fn click_hovers_before_clicking() {
    let page = ScriptedPage::new().with_css("#go", ElementFixture::new("go"));
    let h = Harness::new(page).await;
    h.step(1, StepAction::Click, None, Some("#go")).await;

    let report = h.run(silent_plan()).await;
    assert!(report.is_success());

    let calls: Vec<DriverCall> = h
        .page
        .calls()
        .into_iter()
        .filter(|c| !matches!(c, DriverCall::QuerySelector(_)))
        .collect();
    assert_eq!(
        calls,
        vec![
            DriverCall::Hover("go".into()),
            DriverCall::Click("go".into()),
            DriverCall::Settle(action_primitives::ActionKind::Click),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn step_timeout_fails_only_that_step() {
    let page = ScriptedPage::new().with_latency(ScriptedOp::Navigate, Duration::from_secs(30));
    let h = Harness::new(page).await;
    h.step(1, StepAction::Nav, Some("https://slow.example"), None).await;
    h.step(2, StepAction::Wait, Some("10"), None).await;

    let report = h
        .executor(silent_plan(), StubFetcher::ok())
        .with_options(ExecutorOptions {
            step_timeout: Some(Duration::from_secs(1)),
            ..ExecutorOptions::default()
        })
        .run(RunRequest::new(h.workflow.clone()))
        .await
        .unwrap();

    assert_eq!(report.results[0].detail, "step timed out after 1000 ms");
    assert!(report.results[1].success);
}

#[tokio::test(start_paused = true)]
async fn run_timeout_keeps_partial_results() {
    let h = Harness::new(ScriptedPage::new()).await;
    h.step(1, StepAction::Wait, Some("1000"), None).await;
    h.step(2, StepAction::Wait, Some("1000"), None).await;
    h.step(3, StepAction::Wait, Some("1000"), None).await;

    let plan = TempoPlan {
        post_action: DelaySpec::new(0.0, 0.0),
        thinking: DelaySpec::new(0.0, 0.0),
        ..fixed_plan()
    };
    let report = h
        .executor(plan, StubFetcher::ok())
        .with_options(ExecutorOptions {
            run_timeout: Some(Duration::from_millis(1500)),
            ..ExecutorOptions::default()
        })
        .run(RunRequest::new(h.workflow.clone()))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.aborted.as_deref(), Some("run timed out after 1500 ms"));
    assert!(!report.is_success());
    assert!(report.render().ends_with("(aborted: run timed out after 1500 ms)"));
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_before_next_step() {
    let h = Harness::new(ScriptedPage::new()).await;
    for order in 1..=3 {
        h.step(order, StepAction::Wait, Some("1000"), None).await;
    }
    let plan = TempoPlan {
        post_action: DelaySpec::new(0.0, 0.0),
        thinking: DelaySpec::new(0.0, 0.0),
        ..fixed_plan()
    };

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        trigger.cancel();
    });

    let report = h
        .executor(plan, StubFetcher::ok())
        .run(RunRequest::new(h.workflow.clone()).with_cancellation(cancel))
        .await
        .unwrap();

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.aborted.as_deref(), Some("run cancelled"));
}

#[tokio::test(start_paused = true)]
async fn upload_assigns_file_directly() {
    let page = ScriptedPage::new().with_css("#file", ElementFixture::new("file"));
    let h = Harness::new(page).await;
    h.step(1, StepAction::UploadImage, Some("https://img.example/cat.png"), Some("#file"))
        .await;

    let report = h.run(silent_plan()).await;

    assert!(report.results[0].success, "{}", report.results[0].detail);
    assert!(report.results[0].detail.contains("via file input"));
    assert!(!h
        .page
        .calls()
        .iter()
        .any(|c| matches!(c, DriverCall::FileChooser { .. })));
    assert_eq!(h.files.saved.lock()[0].1, vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn upload_falls_back_to_file_chooser() {
    let page = ScriptedPage::new()
        .with_css("#drop", ElementFixture::new("drop"))
        .failing(
            ScriptedOp::SetInputFiles,
            DriverError::new(DriverErrorKind::Unsupported).with_hint("not an input"),
        );
    let h = Harness::new(page).await;
    h.step(1, StepAction::UploadImage, Some("https://img.example/cat.png"), Some("#drop"))
        .await;

    let report = h.run(silent_plan()).await;

    assert!(report.results[0].success);
    assert!(report.results[0].detail.contains("via file chooser"));
    assert!(h.page.calls().iter().any(|c| matches!(
        c,
        DriverCall::FileChooser { trigger, .. } if trigger == "drop"
    )));
}

#[tokio::test(start_paused = true)]
async fn upload_reports_both_failures() {
    let page = ScriptedPage::new()
        .with_css("#drop", ElementFixture::new("drop"))
        .failing(
            ScriptedOp::SetInputFiles,
            DriverError::new(DriverErrorKind::Unsupported),
        )
        .failing(
            ScriptedOp::FileChooser,
            DriverError::new(DriverErrorKind::FileChooserTimeout),
        );
    let h = Harness::new(page).await;
    h.step(1, StepAction::UploadImage, Some("https://img.example/cat.png"), Some("#drop"))
        .await;

    let report = h.run(silent_plan()).await;

    assert_eq!(
        report.results[0].detail,
        "upload failed: direct assignment (operation not supported); \
         file chooser (file chooser did not open)"
    );
}

#[tokio::test(start_paused = true)]
async fn upload_download_failure_fails_step() {
    let page = ScriptedPage::new().with_css("#file", ElementFixture::new("file"));
    let h = Harness::new(page).await;
    h.step(1, StepAction::UploadImage, Some("https://img.example/cat.png"), Some("#file"))
        .await;

    let report = h
        .executor(silent_plan(), StubFetcher::failing())
        .run(RunRequest::new(h.workflow.clone()))
        .await
        .unwrap();

    assert!(!report.results[0].success);
    assert!(report.results[0].detail.contains("HTTP 404"));
    assert!(!h
        .page
        .calls()
        .iter()
        .any(|c| matches!(c, DriverCall::SetInputFiles { .. })));
}

#[tokio::test(start_paused = true)]
async fn unknown_action_is_a_step_failure() {
    let h = Harness::new(ScriptedPage::new()).await;
    h.step(1, StepAction::parse("drag"), Some("x"), None).await;
    h.step(2, StepAction::Wait, Some("5"), None).await;

    let report = h.run(silent_plan()).await;

    assert_eq!(report.results[0].detail, "unknown action type: drag");
    assert_eq!(report.results[0].action, "drag");
    assert!(report.results[1].success);
}

#[tokio::test(start_paused = true)]
async fn type_substitutes_dummy_values() {
    let h = Harness::new(ScriptedPage::new()).await;
    h.step(1, StepAction::Type, Some("{{username}}"), None).await;

    let report = h.run(silent_plan()).await;

    assert_eq!(h.page.typed_text(), "testuser");
    assert_eq!(report.dummy_variables, vec!["username"]);
    assert_eq!(report.results[0].detail, "typed 8 characters");
    assert!(report
        .transcript
        .iter()
        .any(|line| line == "Using dummy value for {{username}}"));
}

#[tokio::test(start_paused = true)]
async fn type_uses_bound_variables() {
    let h = Harness::new(ScriptedPage::new()).await;
    h.step(1, StepAction::Type, Some("{{username}}"), None).await;

    let report = h
        .executor(silent_plan(), StubFetcher::ok())
        .run(RunRequest::new(h.workflow.clone()).with_variable("username", "alice"))
        .await
        .unwrap();

    assert_eq!(h.page.typed_text(), "alice");
    assert!(report.dummy_variables.is_empty());
}

#[tokio::test(start_paused = true)]
async fn extract_truncates_text() {
    let long = "x".repeat(150);
    let page = ScriptedPage::new().with_css("#t", ElementFixture::new("t").with_text(long.clone()));
    let h = Harness::new(page).await;
    h.step(1, StepAction::Extract, None, Some("#t")).await;

    let report = h.run(silent_plan()).await;

    assert_eq!(report.results[0].detail, format!("extracted: {}", "x".repeat(50)));
    assert!(report
        .transcript
        .iter()
        .any(|line| *line == format!("Extracted text: {}", "x".repeat(100))));
}

#[tokio::test(start_paused = true)]
async fn screenshot_uses_default_filename() {
    let h = Harness::new(ScriptedPage::new()).await;
    h.step(4, StepAction::Screenshot, None, None).await;

    let report = h.run(silent_plan()).await;

    assert!(report.results[0].success);
    let saved = h.files.saved.lock();
    assert_eq!(saved[0].0, format!("workflow_{}_step_4.png", h.workflow));
    assert_eq!(saved[0].1, action_primitives::SCRIPTED_PNG.to_vec());
}

#[tokio::test(start_paused = true)]
async fn scroll_moves_in_increments() {
    let h = Harness::new(ScriptedPage::new()).await;
    h.step(1, StepAction::Scroll, Some("-250"), None).await;

    let report = h.run(silent_plan()).await;

    assert!(report.results[0].success);
    let deltas: Vec<i32> = h
        .page
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            DriverCall::ScrollBy { dy, .. } => Some(dy),
            _ => None,
        })
        .collect();
    assert_eq!(deltas, vec![-100, -100, -50]);
}

#[tokio::test(start_paused = true)]
async fn extreme_scroll_delta_does_not_stop_the_run() {
    let h = Harness::new(ScriptedPage::new()).await;
    h.step(1, StepAction::Scroll, Some("-2147483648"), None).await;
    h.step(2, StepAction::Wait, Some("0"), None).await;

    let plan = TempoPlan {
        scroll_step_px: 1_000_000_000,
        ..silent_plan()
    };
    let report = h.run(plan).await;

    assert_eq!(report.results.len(), 2);
    assert!(report.results.iter().all(|r| r.success));
    let total: i64 = h
        .page
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            DriverCall::ScrollBy { dy, .. } => Some(i64::from(dy)),
            _ => None,
        })
        .sum();
    assert_eq!(total, i64::from(i32::MIN));
}

#[tokio::test(start_paused = true)]
async fn single_order_and_empty_workflows() {
    let h = Harness::new(ScriptedPage::new()).await;
    h.step(1, StepAction::Wait, Some("1"), None).await;
    h.step(2, StepAction::Wait, Some("2"), None).await;

    let only_second = h
        .executor(silent_plan(), StubFetcher::ok())
        .run(RunRequest::new(h.workflow.clone()).with_order(2))
        .await
        .unwrap();
    assert_eq!(only_second.results.len(), 1);
    assert_eq!(only_second.results[0].step_order, 2);

    let missing = h
        .executor(silent_plan(), StubFetcher::ok())
        .run(RunRequest::new(WorkflowId::from("nope")))
        .await
        .unwrap();
    assert_eq!(missing.summary.total, 0);
    assert!(missing.is_success());
    assert_eq!(missing.transcript, vec!["No steps found for workflow nope"]);
}

#[tokio::test]
async fn recorder_captures_element_selectors() {
    let snapshot = ElementSnapshot::new("button")
        .with_attr("id", "submit")
        .with_text("Sign in");
    let page = ScriptedPage::new()
        .with_css("#submit", ElementFixture::new("submit").with_snapshot(snapshot));
    let h = Harness::new(page).await;
    let recorder = StepRecorder::new(h.store.clone()).with_page(h.page.clone());

    let step = recorder
        .record(
            RecordRequest::new(h.workflow.clone(), 1, StepAction::Click)
                .with_description("submit the form")
                .with_target(RecordTarget::Element(action_primitives::ElementHandle::new(
                    "submit",
                ))),
        )
        .await
        .unwrap();

    let selectors = step.selector_set.expect("selectors captured");
    assert_eq!(selectors.best_selector, "#submit");

    // re-recording the same order replaces the step
    let again = recorder
        .record(
            RecordRequest::new(h.workflow.clone(), 1, StepAction::Nav)
                .with_value("https://example.com")
                .with_target(RecordTarget::Selectors(SelectorSet::from_css("#ignored"))),
        )
        .await
        .unwrap();
    assert_eq!(again.id, step.id);
    assert!(again.selector_set.is_none());
    assert_eq!(h.store.list_steps(&h.workflow, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unreadable_store_aborts_before_any_step() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workflows.json");
    std::fs::write(&path, "{ not json").unwrap();

    let page = Arc::new(ScriptedPage::new());
    let executor = DefaultWorkflowExecutor::new(
        Arc::new(JsonFileWorkflowStore::new(path)),
        page.clone(),
        Arc::new(MemoryFiles::default()),
        Arc::new(StubFetcher::ok()),
        Arc::new(TimingModel::seeded(silent_plan(), 9)),
    );

    let err = executor
        .run(RunRequest::new(WorkflowId::from("demo")))
        .await
        .unwrap_err();

    assert!(matches!(err, FlowError::Storage(_)));
    assert!(page.calls().is_empty());
}
