//! Deterministic page driver answering from a fixture table.
//!
//! Used for dry-run rehearsal of workflows and as the driver double in tests.
//! Every primitive call is recorded so callers can assert on the sequence.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::driver::{DriverError, DriverErrorKind, PageDriver};
use crate::types::{ActionKind, ElementHandle, ElementSnapshot, NodeStep, ScrollBehavior};

/// Minimal PNG signature returned by scripted screenshots
pub const SCRIPTED_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Primitive selectable for injected failures or latency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptedOp {
    Query,
    Hover,
    Click,
    PressCharacter,
    TextContent,
    Describe,
    Navigate,
    Scroll,
    Screenshot,
    SetInputFiles,
    FileChooser,
    Settle,
}

/// Call observed by a [`ScriptedPage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    QuerySelector(String),
    QueryXpath(String),
    Hover(String),
    Click(String),
    PressCharacter(char),
    TextContent(String),
    Describe(String),
    Navigate(String),
    ScrollBy { dx: i32, dy: i32 },
    Screenshot { full_page: bool },
    SetInputFiles { element: String, files: Vec<PathBuf> },
    FileChooser { trigger: String, files: Vec<PathBuf> },
    Settle(ActionKind),
}

/// Element known to the scripted page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementFixture {
    pub handle: ElementHandle,
    pub text: Option<String>,
    pub snapshot: Option<ElementSnapshot>,
}

impl ElementFixture {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            handle: ElementHandle::new(id),
            text: None,
            snapshot: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_snapshot(mut self, snapshot: ElementSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }
}

#[derive(Default)]
struct ScriptState {
    resolve_all: bool,
    css: HashMap<String, ElementFixture>,
    xpath: HashMap<String, ElementFixture>,
    broken_queries: HashSet<String>,
    failures: HashMap<ScriptedOp, DriverError>,
    latency: HashMap<ScriptedOp, Duration>,
    calls: Vec<DriverCall>,
}

#[derive(Default)]
pub struct ScriptedPage {
    state: Mutex<ScriptState>,
}

impl ScriptedPage {
    /// Only selectors registered as fixtures resolve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every selector resolves to a synthetic element.
    pub fn dry_run() -> Self {
        let page = Self::default();
        page.state.lock().resolve_all = true;
        page
    }

    pub fn with_css(self, selector: impl Into<String>, fixture: ElementFixture) -> Self {
        self.state.lock().css.insert(selector.into(), fixture);
        self
    }

    pub fn with_xpath(self, xpath: impl Into<String>, fixture: ElementFixture) -> Self {
        self.state.lock().xpath.insert(xpath.into(), fixture);
        self
    }

    /// Queries for `selector` (CSS or XPath) fail with an invalid-selector error.
    pub fn with_broken_query(self, selector: impl Into<String>) -> Self {
        self.state.lock().broken_queries.insert(selector.into());
        self
    }

    pub fn failing(self, op: ScriptedOp, error: DriverError) -> Self {
        self.state.lock().failures.insert(op, error);
        self
    }

    /// Delay `op` on the tokio clock before answering.
    pub fn with_latency(self, op: ScriptedOp, latency: Duration) -> Self {
        self.state.lock().latency.insert(op, latency);
        self
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Characters typed so far, in order
    pub fn typed_text(&self) -> String {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                DriverCall::PressCharacter(ch) => Some(*ch),
                _ => None,
            })
            .collect()
    }

    async fn enter(&self, op: ScriptedOp, call: DriverCall) -> Result<(), DriverError> {
        let (latency, failure) = {
            let mut state = self.state.lock();
            debug!(?call, "scripted driver call");
            state.calls.push(call);
            (
                state.latency.get(&op).copied(),
                state.failures.get(&op).cloned(),
            )
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn lookup(&self, selector: &str, xpath: bool) -> Result<Option<ElementHandle>, DriverError> {
        let state = self.state.lock();
        if state.broken_queries.contains(selector) {
            return Err(DriverError::new(DriverErrorKind::InvalidSelector).with_hint(selector));
        }
        let table = if xpath { &state.xpath } else { &state.css };
        if let Some(fixture) = table.get(selector) {
            return Ok(Some(fixture.handle.clone()));
        }
        if state.resolve_all {
            return Ok(Some(ElementHandle::new(format!("dry:{}", selector))));
        }
        Ok(None)
    }

    fn fixture_for(&self, handle: &ElementHandle) -> Option<ElementFixture> {
        let state = self.state.lock();
        state
            .css
            .values()
            .chain(state.xpath.values())
            .find(|f| f.handle == *handle)
            .cloned()
    }
}

#[async_trait]
impl PageDriver for ScriptedPage {
    async fn query_selector(&self, css: &str) -> Result<Option<ElementHandle>, DriverError> {
        self.enter(ScriptedOp::Query, DriverCall::QuerySelector(css.to_string()))
            .await?;
        self.lookup(css, false)
    }

    async fn query_xpath(&self, xpath: &str) -> Result<Option<ElementHandle>, DriverError> {
        self.enter(ScriptedOp::Query, DriverCall::QueryXpath(xpath.to_string()))
            .await?;
        self.lookup(xpath, true)
    }

    async fn hover(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.enter(ScriptedOp::Hover, DriverCall::Hover(element.id.clone()))
            .await
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.enter(ScriptedOp::Click, DriverCall::Click(element.id.clone()))
            .await
    }

    async fn press_character(&self, ch: char) -> Result<(), DriverError> {
        self.enter(ScriptedOp::PressCharacter, DriverCall::PressCharacter(ch))
            .await
    }

    async fn text_content(&self, element: &ElementHandle) -> Result<Option<String>, DriverError> {
        self.enter(
            ScriptedOp::TextContent,
            DriverCall::TextContent(element.id.clone()),
        )
        .await?;
        Ok(self
            .fixture_for(element)
            .map(|f| f.text)
            .unwrap_or_else(|| Some(String::new())))
    }

    async fn describe_element(
        &self,
        element: &ElementHandle,
    ) -> Result<ElementSnapshot, DriverError> {
        self.enter(ScriptedOp::Describe, DriverCall::Describe(element.id.clone()))
            .await?;
        match self.fixture_for(element).and_then(|f| f.snapshot) {
            Some(snapshot) => Ok(snapshot),
            None => Ok(ElementSnapshot::new("div").with_lineage(vec![
                NodeStep::single("div"),
                NodeStep::single("body"),
                NodeStep::single("html"),
            ])),
        }
    }

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.enter(ScriptedOp::Navigate, DriverCall::Navigate(url.to_string()))
            .await
    }

    async fn scroll_by(
        &self,
        dx: i32,
        dy: i32,
        _behavior: ScrollBehavior,
    ) -> Result<(), DriverError> {
        self.enter(ScriptedOp::Scroll, DriverCall::ScrollBy { dx, dy })
            .await
    }

    async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>, DriverError> {
        self.enter(ScriptedOp::Screenshot, DriverCall::Screenshot { full_page })
            .await?;
        Ok(SCRIPTED_PNG.to_vec())
    }

    async fn set_input_files(
        &self,
        element: &ElementHandle,
        files: &[PathBuf],
    ) -> Result<(), DriverError> {
        self.enter(
            ScriptedOp::SetInputFiles,
            DriverCall::SetInputFiles {
                element: element.id.clone(),
                files: files.to_vec(),
            },
        )
        .await
    }

    async fn upload_via_file_chooser(
        &self,
        trigger: &ElementHandle,
        files: &[PathBuf],
        _timeout: Duration,
    ) -> Result<(), DriverError> {
        self.enter(
            ScriptedOp::FileChooser,
            DriverCall::FileChooser {
                trigger: trigger.id.clone(),
                files: files.to_vec(),
            },
        )
        .await
    }

    async fn wait_for_action_events(&self, kind: ActionKind) -> Result<(), DriverError> {
        self.enter(ScriptedOp::Settle, DriverCall::Settle(kind)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixtures_resolve_and_others_do_not() {
        let page = ScriptedPage::new()
            .with_css("#go", ElementFixture::new("go").with_text("Go"))
            .with_broken_query("##");

        let go = page.query_selector("#go").await.unwrap().unwrap();
        assert_eq!(go.id, "go");
        assert!(page.query_selector("#missing").await.unwrap().is_none());
        assert!(page.query_xpath("#go").await.unwrap().is_none());
        let err = page.query_selector("##").await.unwrap_err();
        assert_eq!(err.kind, DriverErrorKind::InvalidSelector);
        assert_eq!(
            page.text_content(&go).await.unwrap().as_deref(),
            Some("Go")
        );
    }

    #[test]
    fn dry_run_resolves_everything() {
        let page = ScriptedPage::dry_run();
        tokio_test::block_on(async {
            let el = page.query_xpath("//button").await.unwrap().unwrap();
            assert_eq!(el.id, "dry://button");
            let snapshot = page.describe_element(&el).await.unwrap();
            assert_eq!(snapshot.lineage.len(), 3);
        });
    }

    #[tokio::test]
    async fn records_calls_and_injects_failures() {
        let page = ScriptedPage::new().failing(
            ScriptedOp::Navigate,
            DriverError::new(DriverErrorKind::NavTimeout),
        );
        page.press_character('h').await.unwrap();
        page.press_character('i').await.unwrap();
        assert!(page.navigate("https://example.com").await.is_err());

        assert_eq!(page.typed_text(), "hi");
        assert_eq!(
            page.calls().last(),
            Some(&DriverCall::Navigate("https://example.com".into()))
        );
        page.clear_calls();
        assert!(page.calls().is_empty());
    }
}
