use std::sync::Arc;

use action_flow::{DefaultWorkflowExecutor, RecordRequest, RecordTarget, RunRequest, StepRecorder, WorkflowExecutor};
use action_primitives::{HttpImageFetcher, LocalFileStore, ScriptedPage};
use retrace_cli::cli::rehearse::rehearsal_plan;
use retrace_core_types::{SelectorSet, StepAction};
use retrace_workflow_store::{JsonFileWorkflowStore, WorkflowStore};
use stealth::{TempoPlan, TimingModel};

#[test]
fn recorded_workflow_rehearses_from_disk() {
    tokio_test::block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("workflows.json");
        let output = dir.path().join("out");

        let store = Arc::new(JsonFileWorkflowStore::new(&catalog));
        let workflow = store.create_workflow("signup", None).await.unwrap();
        let recorder = StepRecorder::new(store.clone());
        for request in [
            RecordRequest::new(workflow.id.clone(), 1, StepAction::Nav)
                .with_value("https://example.com/signup"),
            RecordRequest::new(workflow.id.clone(), 2, StepAction::Type)
                .with_value("{{email}}")
                .with_target(RecordTarget::Selectors(SelectorSet::from_css("#email"))),
            RecordRequest::new(workflow.id.clone(), 3, StepAction::Click)
                .with_target(RecordTarget::Selectors(SelectorSet::from_css("button.submit"))),
            RecordRequest::new(workflow.id.clone(), 4, StepAction::Screenshot),
        ] {
            recorder.record(request).await.unwrap();
        }

        // a fresh store instance reads what the recorder persisted
        let reopened: Arc<dyn WorkflowStore> = Arc::new(JsonFileWorkflowStore::new(&catalog));
        let page = Arc::new(ScriptedPage::dry_run());
        let plan = rehearsal_plan(&TempoPlan::default(), Some(0.0), Some(3)).unwrap();
        let executor = DefaultWorkflowExecutor::new(
            reopened,
            page.clone(),
            Arc::new(LocalFileStore::new(&output)),
            Arc::new(HttpImageFetcher::new(std::time::Duration::from_secs(1)).unwrap()),
            Arc::new(TimingModel::new(plan)),
        );

        let report = executor.run(RunRequest::new(workflow.id.clone())).await.unwrap();

        assert!(report.is_success(), "{}", report.render());
        assert_eq!(report.summary.total, 4);
        assert_eq!(page.typed_text(), "test@example.com");
        assert_eq!(report.dummy_variables, vec!["email"]);
        let shot = output.join(format!("workflow_{}_step_4.png", workflow.id));
        assert!(shot.exists(), "missing {}", shot.display());
    });
}
