//! The viewer session.
//!
//! [`Viewer`] is the single owner of the content store, the tree navigator and the search
//! orchestrator. User actions ([`Viewer::click`], [`Viewer::type_query`],
//! [`Viewer::submit_query`]) are synchronous transitions that may start background work:
//! content API requests run as tokio tasks and report back as [`ViewerEvent`]s on a channel.
//! The viewer owns a single debounce timer; every search trigger resets it, and a blank query
//! cancels it. Events are applied one at a time by [`Viewer::handle`], each to completion, so
//! no state is ever shared with the tasks.
//!
//! Ordering between a timer event and a fetch completion is not guaranteed. The search
//! orchestrator's query-equality check keeps late responses from replacing newer ones.
//!
//! A failed request is recorded against the panel that issued it and never disturbs data
//! that is already loaded. Nothing is retried.
//!
//! Every method that starts background work must be called from within a tokio runtime.

use crate::api::ContentApi;
use crate::config::ViewerConfig;
use crate::navigator::{NavigationPath, TreeNavigator, TreeRow};
use crate::sanitize::{HtmlSanitizer, Sanitize};
use crate::search::{Acceptance, DebounceTicket, SearchOrchestrator};
use crate::store::ContentStore;
use crate::view::{self, DetailView, MainPane, SearchPanel};
use crate::WikiResult;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Instant, Sleep};
use wiki_types::{Node, NodeId, SearchQuery, SearchResult, Variable};

/// Areas of the UI that report their own failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Sidebar,
    Variables,
    Details,
    Search,
}

/// Completion of a piece of background work.
#[derive(Debug)]
pub enum ViewerEvent {
    NodesLoaded(WikiResult<Vec<Node>>),
    VariablesLoaded(WikiResult<Vec<Variable>>),
    NodeLoaded {
        id: NodeId,
        result: WikiResult<Node>,
    },
    DebounceElapsed(DebounceTicket),
    SearchCompleted {
        query: SearchQuery,
        result: WikiResult<Vec<Node>>,
    },
}

struct DebounceTimer {
    ticket: DebounceTicket,
    sleep: Pin<Box<Sleep>>,
}

enum Wake {
    Event(Option<ViewerEvent>),
    Debounce,
}

pub struct Viewer<A: ContentApi> {
    api: Arc<A>,
    sanitizer: Arc<dyn Sanitize>,
    store: ContentStore,
    navigator: TreeNavigator,
    search: SearchOrchestrator,
    failures: HashMap<Panel, String>,
    events_tx: mpsc::UnboundedSender<ViewerEvent>,
    events_rx: mpsc::UnboundedReceiver<ViewerEvent>,
    outstanding: usize,
    debounce_timer: Option<DebounceTimer>,
}

impl<A: ContentApi> Viewer<A> {
    pub fn new(api: A, config: &ViewerConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api: Arc::new(api),
            sanitizer: Arc::new(HtmlSanitizer::new()),
            store: ContentStore::new(),
            navigator: TreeNavigator::new(),
            search: SearchOrchestrator::new(config.search_debounce()),
            failures: HashMap::new(),
            events_tx,
            events_rx,
            outstanding: 0,
            debounce_timer: None,
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn Sanitize>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Requests the node list and the variable dictionary.
    pub fn start(&mut self) {
        tracing::info!("loading nodes and variables");

        let api = Arc::clone(&self.api);
        self.spawn(async move { ViewerEvent::NodesLoaded(api.list_nodes().await) });

        let api = Arc::clone(&self.api);
        self.spawn(async move { ViewerEvent::VariablesLoaded(api.list_variables().await) });
    }

    /// Selects the row for `id` reached via `path` and fetches the node's detail.
    ///
    /// Selection hides any visible search results.
    ///
    /// # Errors
    ///
    /// Returns `WikiError::InvalidInput` if `path` is not a valid row address for `id`; the
    /// previous selection is kept in that case.
    pub fn click(&mut self, id: NodeId, path: NavigationPath) -> WikiResult<()> {
        let id = self.navigator.click(id, path)?;
        self.search.on_node_selected();
        self.failures.remove(&Panel::Details);

        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.get_node(id).await;
            ViewerEvent::NodeLoaded { id, result }
        });
        Ok(())
    }

    /// Records a new value of the search box.
    pub fn type_query(&mut self, raw: &str) {
        let ticket = self.search.on_query_change(raw, Instant::now());
        self.schedule(ticket);
    }

    /// Handles a submit of the search box.
    pub fn submit_query(&mut self, raw: &str) {
        let ticket = self.search.on_submit(raw, Instant::now());
        self.schedule(ticket);
    }

    fn schedule(&mut self, ticket: Option<DebounceTicket>) {
        let Some(ticket) = ticket else {
            if self.debounce_timer.take().is_some() {
                tracing::debug!("debounce timer cancelled");
            }
            return;
        };
        if let Some(timer) = self.debounce_timer.as_mut() {
            timer.sleep.as_mut().reset(ticket.deadline());
            timer.ticket = ticket;
            return;
        }
        self.debounce_timer = Some(DebounceTimer {
            ticket,
            sleep: Box::pin(tokio::time::sleep_until(ticket.deadline())),
        });
    }

    fn spawn<F>(&mut self, work: F)
    where
        F: Future<Output = ViewerEvent> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        self.outstanding += 1;
        tokio::spawn(async move {
            let event = work.await;
            // The receiver lives as long as the viewer; a send error means it was dropped.
            let _ = tx.send(event);
        });
    }

    /// Applies one completed piece of background work.
    pub fn handle(&mut self, event: ViewerEvent) {
        match event {
            ViewerEvent::NodesLoaded(Ok(nodes)) => {
                tracing::info!(count = nodes.len(), "node list loaded");
                self.store.ingest_list(nodes);
                self.failures.remove(&Panel::Sidebar);
            }
            ViewerEvent::NodesLoaded(Err(e)) => self.fail(Panel::Sidebar, e),
            ViewerEvent::VariablesLoaded(Ok(variables)) => {
                tracing::info!(count = variables.len(), "variables loaded");
                self.store.ingest_variables(variables);
                self.failures.remove(&Panel::Variables);
            }
            ViewerEvent::VariablesLoaded(Err(e)) => self.fail(Panel::Variables, e),
            ViewerEvent::NodeLoaded { result: Ok(node), .. } => {
                self.store.ingest_one(node);
            }
            ViewerEvent::NodeLoaded { id, result: Err(e) } => {
                tracing::warn!(id, "node detail fetch failed");
                self.fail(Panel::Details, e);
            }
            ViewerEvent::DebounceElapsed(ticket) => {
                if let Some(query) = self.search.fire(ticket) {
                    self.failures.remove(&Panel::Search);
                    let api = Arc::clone(&self.api);
                    self.spawn(async move {
                        let result = api.search(&query).await;
                        ViewerEvent::SearchCompleted { query, result }
                    });
                }
            }
            ViewerEvent::SearchCompleted {
                query,
                result: Ok(nodes),
            } => {
                let result = SearchResult {
                    query: query.into_inner(),
                    results: nodes,
                };
                // Hydrate entries the sidebar already shows; unknown ids stay out of the tree.
                let known: Vec<Node> = result
                    .results
                    .iter()
                    .filter(|n| self.store.get(n.id).is_some())
                    .cloned()
                    .collect();
                if self.search.accept(result) == Acceptance::Accepted {
                    for node in known {
                        self.store.ingest_one(node);
                    }
                }
            }
            ViewerEvent::SearchCompleted {
                query,
                result: Err(e),
            } => {
                self.search.fail(&query);
                self.fail(Panel::Search, e);
            }
        }
    }

    fn fail(&mut self, panel: Panel, error: crate::WikiError) {
        tracing::warn!(?panel, "request failed: {error}");
        self.failures.insert(panel, error.to_string());
    }

    /// Waits for the next completion or debounce expiry, or returns `None` when no work is
    /// outstanding.
    pub async fn next_event(&mut self) -> Option<ViewerEvent> {
        if self.is_idle() {
            return None;
        }

        let wake = tokio::select! {
            event = self.events_rx.recv(), if self.outstanding > 0 => Wake::Event(event),
            () = wait_for(&mut self.debounce_timer), if self.debounce_timer.is_some() => {
                Wake::Debounce
            }
        };

        match wake {
            Wake::Event(event) => {
                let event = event?;
                self.outstanding -= 1;
                Some(event)
            }
            Wake::Debounce => {
                let timer = self.debounce_timer.take()?;
                Some(ViewerEvent::DebounceElapsed(timer.ticket))
            }
        }
    }

    /// Applies every completion that has already arrived, and an expired debounce timer,
    /// without waiting.
    pub fn drain(&mut self) {
        let expired = self
            .debounce_timer
            .as_ref()
            .is_some_and(|timer| Instant::now() >= timer.ticket.deadline());
        if expired {
            if let Some(timer) = self.debounce_timer.take() {
                self.handle(ViewerEvent::DebounceElapsed(timer.ticket));
            }
        }

        while let Ok(event) = self.events_rx.try_recv() {
            self.outstanding = self.outstanding.saturating_sub(1);
            self.handle(event);
        }
    }

    /// Handles events until no background work remains.
    pub async fn run_until_idle(&mut self) {
        while let Some(event) = self.next_event().await {
            self.handle(event);
        }
    }

    pub fn is_idle(&self) -> bool {
        self.outstanding == 0 && self.debounce_timer.is_none()
    }

    /// The visible sidebar rows.
    pub fn tree(&self) -> Vec<TreeRow> {
        self.navigator.rows(&self.store)
    }

    /// The detail pane of the selected node, if one is selected and known.
    pub fn detail_view(&self) -> Option<DetailView> {
        let node = self.store.get(self.navigator.active_node()?)?;
        Some(view::detail_view(
            node,
            self.store.variables(),
            self.sanitizer.as_ref(),
        ))
    }

    /// The highlighted search results, if they are shown and still match the input.
    pub fn search_panel(&self) -> Option<SearchPanel> {
        let result = self.search.visible_results()?;
        Some(view::search_panel(
            result,
            self.store.variables(),
            self.sanitizer.as_ref(),
        ))
    }

    /// Decides what the main pane shows.
    ///
    /// Visible search results win. Otherwise the selected node is shown unless a search is
    /// displayed for a query that is being edited, in which case the pane waits for it.
    pub fn main_pane(&self) -> MainPane {
        if let Some(panel) = self.search_panel() {
            return MainPane::Search(panel);
        }

        let showing = self.search.is_showing() && !self.search.live_input().trim().is_empty();
        if !showing {
            if let Some(detail) = self.detail_view() {
                return MainPane::Details(detail);
            }
            if self.navigator.active_node().is_none() {
                return MainPane::Prompt;
            }
        }
        MainPane::Waiting
    }

    /// The last failure reported by `panel`, if it has not recovered since.
    pub fn failure(&self, panel: Panel) -> Option<&str> {
        self.failures.get(&panel).map(String::as_str)
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn navigator(&self) -> &TreeNavigator {
        &self.navigator
    }

    pub fn search(&self) -> &SearchOrchestrator {
        &self.search
    }
}

async fn wait_for(timer: &mut Option<DebounceTimer>) {
    if let Some(timer) = timer {
        timer.sleep.as_mut().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StaticContentApi;
    use crate::bundle::ContentBundle;
    use std::time::Duration;
    use wiki_types::ContentBlock;

    fn bundle() -> ContentBundle {
        ContentBundle::new(
            vec![
                Node::summary(1, "Node 1 title")
                    .with_connections(vec![2])
                    .with_content(vec![ContentBlock::text("alpha")]),
                Node::summary(2, "Node 2 title")
                    .with_connections(vec![])
                    .with_content(vec![ContentBlock::text("alphabet")]),
            ],
            vec![],
        )
    }

    fn viewer(api: StaticContentApi) -> Viewer<StaticContentApi> {
        Viewer::new(api, &ViewerConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_typing_fires_one_request() {
        let api = StaticContentApi::new(bundle());
        let mut viewer = viewer(api.clone());

        viewer.type_query("a");
        tokio::time::sleep(Duration::from_millis(100)).await;
        viewer.type_query("ab");
        viewer.run_until_idle().await;

        assert_eq!(api.search_log(), vec!["ab".to_string()]);
        assert_eq!(viewer.search_panel().unwrap().query, "ab");
    }

    #[tokio::test(start_paused = true)]
    async fn overtaken_response_is_discarded() {
        let api = StaticContentApi::new(bundle()).with_search_latency("a", Duration::from_secs(2));
        let mut viewer = viewer(api.clone());

        viewer.type_query("a");
        tokio::time::sleep(Duration::from_millis(600)).await;
        viewer.drain();
        assert_eq!(viewer.search().in_flight().len(), 1);

        viewer.type_query("al");
        viewer.run_until_idle().await;

        assert_eq!(api.search_log(), vec!["a".to_string(), "al".to_string()]);
        let panel = viewer.search_panel().unwrap();
        assert_eq!(panel.query, "al");
        assert!(viewer.search().in_flight().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn retrigger_restarts_the_single_timer() {
        let mut viewer = viewer(StaticContentApi::new(bundle()));
        let start = Instant::now();

        viewer.type_query("a");
        tokio::time::sleep(Duration::from_millis(100)).await;
        viewer.type_query("ab");

        match viewer.next_event().await {
            Some(ViewerEvent::DebounceElapsed(ticket)) => {
                assert_eq!(ticket.deadline(), start + Duration::from_millis(600));
            }
            other => panic!("expected debounce expiry, got {other:?}"),
        }
        // The superseded timer left nothing behind.
        assert!(viewer.is_idle());
        assert!(viewer.next_event().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn blank_query_cancels_the_timer() {
        let api = StaticContentApi::new(bundle());
        let mut viewer = viewer(api.clone());

        viewer.type_query("alpha");
        assert!(!viewer.is_idle());
        viewer.type_query("");
        assert!(viewer.is_idle());

        viewer.run_until_idle().await;
        assert!(api.search_log().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn custom_sanitizer_is_used_for_details() {
        struct Shouting;

        impl Sanitize for Shouting {
            fn sanitize(&self, html: &str) -> String {
                html.to_uppercase()
            }
        }

        let mut viewer =
            viewer(StaticContentApi::new(bundle())).with_sanitizer(Arc::new(Shouting));
        viewer.start();
        viewer.click(1, vec![1]).unwrap();
        viewer.run_until_idle().await;

        assert_eq!(viewer.detail_view().unwrap().plain_text(), "ALPHA");
    }

    #[tokio::test(start_paused = true)]
    async fn blank_query_never_fires() {
        let api = StaticContentApi::new(bundle());
        let mut viewer = viewer(api.clone());

        viewer.submit_query("   ");
        viewer.run_until_idle().await;

        assert!(api.search_log().is_empty());
        assert!(viewer.is_idle());
        assert_eq!(viewer.main_pane(), MainPane::Prompt);
    }

    #[tokio::test(start_paused = true)]
    async fn selection_takes_precedence_over_results() {
        let mut viewer = viewer(StaticContentApi::new(bundle()));
        viewer.start();
        viewer.run_until_idle().await;

        viewer.type_query("alpha");
        viewer.run_until_idle().await;
        assert!(matches!(viewer.main_pane(), MainPane::Search(_)));

        viewer.click(2, vec![2]).unwrap();
        assert!(viewer.search_panel().is_none());
        viewer.run_until_idle().await;
        match viewer.main_pane() {
            MainPane::Details(detail) => assert_eq!(detail.plain_text(), "alphabet"),
            other => panic!("expected details, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_detail_fetch_is_reported_per_panel() {
        let mut viewer = viewer(StaticContentApi::new(bundle()));
        viewer.start();
        viewer.run_until_idle().await;

        viewer.click(2, vec![2]).unwrap();
        viewer.run_until_idle().await;
        // A stale sidebar entry pointing at a node the source no longer serves.
        viewer.handle(ViewerEvent::NodesLoaded(Ok(vec![Node::summary(9, "gone")])));
        viewer.click(9, vec![9]).unwrap();
        viewer.run_until_idle().await;

        assert!(viewer.failure(Panel::Details).unwrap().contains("malformed"));
        assert!(viewer.failure(Panel::Sidebar).is_none());
        assert_eq!(viewer.tree().len(), 3);

        viewer.click(1, vec![1]).unwrap();
        assert!(viewer.failure(Panel::Details).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_click_keeps_selection() {
        let mut viewer = viewer(StaticContentApi::new(bundle()));
        viewer.click(1, vec![1]).unwrap();
        assert!(viewer.click(2, vec![1]).is_err());
        assert_eq!(viewer.navigator().active_path(), &[1]);
        viewer.run_until_idle().await;
    }
}
