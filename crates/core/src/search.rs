//! Debounced search coordination.
//!
//! Query edits and submits both funnel into one debounce trigger. Each trigger replaces the
//! pending timer, so only the last input inside the quiet window fires a request. Blank input
//! never fires and hides the results panel.
//!
//! Completed searches are tagged with the trimmed query that produced them and are accepted
//! only if that query still equals the trimmed live input at acceptance time. Arrival order
//! and request sequence play no part: a slow response for an overtaken query is dropped even
//! if it arrives last.
//!
//! The orchestrator holds no timers itself. Triggers hand back a [`DebounceTicket`]; the
//! driver sleeps until the ticket's deadline and then calls [`SearchOrchestrator::fire`],
//! which yields a query only if that ticket is still the pending one.

use std::time::Duration;
use tokio::time::Instant;
use wiki_types::{SearchQuery, SearchResult};

/// Handle for one scheduled debounce timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTicket {
    generation: u64,
    deadline: Instant,
}

impl DebounceTicket {
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

/// What happened to a completed search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    Accepted,
    /// The live query moved on; the result was discarded.
    Stale,
}

#[derive(Debug, Clone)]
struct Pending {
    generation: u64,
    query: SearchQuery,
}

#[derive(Debug)]
pub struct SearchOrchestrator {
    debounce: Duration,
    live_input: String,
    generation: u64,
    pending: Option<Pending>,
    in_flight: Vec<SearchQuery>,
    result: Option<SearchResult>,
    showing: bool,
}

impl SearchOrchestrator {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            live_input: String::new(),
            generation: 0,
            pending: None,
            in_flight: Vec::new(),
            result: None,
            showing: false,
        }
    }

    /// Records a new value of the search box and restarts the debounce timer.
    ///
    /// # Returns
    ///
    /// The ticket to wait on, or `None` when the trimmed input is blank (nothing will fire
    /// and any visible results are hidden).
    pub fn on_query_change(&mut self, raw: &str, now: Instant) -> Option<DebounceTicket> {
        self.trigger(raw, now)
    }

    /// Handles an explicit submit. Submits are debounced exactly like edits.
    pub fn on_submit(&mut self, raw: &str, now: Instant) -> Option<DebounceTicket> {
        self.trigger(raw, now)
    }

    fn trigger(&mut self, raw: &str, now: Instant) -> Option<DebounceTicket> {
        self.live_input = raw.to_string();
        self.generation += 1;

        let Ok(query) = SearchQuery::new(raw) else {
            if self.pending.take().is_some() {
                tracing::debug!("blank query cancelled pending search");
            }
            self.showing = false;
            return None;
        };

        if let Some(previous) = self.pending.replace(Pending {
            generation: self.generation,
            query,
        }) {
            tracing::debug!(query = %previous.query, "debounce restarted");
        }

        Some(DebounceTicket {
            generation: self.generation,
            deadline: now + self.debounce,
        })
    }

    /// Called when a ticket's deadline passes.
    ///
    /// # Returns
    ///
    /// The query to send, or `None` when a later trigger superseded this ticket.
    pub fn fire(&mut self, ticket: DebounceTicket) -> Option<SearchQuery> {
        if self.pending.as_ref().map(|p| p.generation) != Some(ticket.generation) {
            return None;
        }

        let pending = self.pending.take()?;
        tracing::debug!(query = %pending.query, "search fired");
        self.in_flight.push(pending.query.clone());
        Some(pending.query)
    }

    /// Offers a completed search for display.
    pub fn accept(&mut self, result: SearchResult) -> Acceptance {
        self.settle(&result.query);

        if result.query != self.live_input.trim() {
            tracing::debug!(
                query = %result.query,
                live = %self.live_input.trim(),
                "discarded stale search result"
            );
            return Acceptance::Stale;
        }

        tracing::debug!(query = %result.query, count = result.results.len(), "search accepted");
        self.result = Some(result);
        self.showing = true;
        Acceptance::Accepted
    }

    /// Records that the request for `query` failed.
    pub fn fail(&mut self, query: &SearchQuery) {
        self.settle(query.as_str());
    }

    fn settle(&mut self, query: &str) {
        if let Some(pos) = self.in_flight.iter().position(|q| q.as_str() == query) {
            self.in_flight.remove(pos);
        }
    }

    /// A sidebar selection always takes precedence over search results.
    pub fn on_node_selected(&mut self) {
        self.showing = false;
    }

    /// The results to display, if the panel is shown and still matches the live input.
    pub fn visible_results(&self) -> Option<&SearchResult> {
        let result = self.result.as_ref()?;
        (self.showing && result.query == self.live_input.trim()).then_some(result)
    }

    pub fn is_showing(&self) -> bool {
        self.showing
    }

    /// The search box contents exactly as typed.
    pub fn live_input(&self) -> &str {
        &self.live_input
    }

    /// The query waiting for its debounce timer, if any.
    pub fn pending_query(&self) -> Option<&SearchQuery> {
        self.pending.as_ref().map(|p| &p.query)
    }

    /// Queries fired but not yet completed.
    pub fn in_flight(&self) -> &[SearchQuery] {
        &self.in_flight
    }
}
