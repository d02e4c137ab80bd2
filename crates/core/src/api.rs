//! The content API collaborator.
//!
//! The viewer treats the content API as a black box answering four operations:
//!
//! | Operation | Request | Response |
//! |---|---|---|
//! | List nodes | `GET /nodes` | nodes in summary form |
//! | Get node | `GET /nodes/{id}` | a one-element array holding the hydrated node |
//! | List variables | `GET /variables` | variables |
//! | Search | `POST /nodes/search` with `{"query": ...}` | matching nodes |
//!
//! [`HttpContentApi`] speaks that contract over HTTP. [`StaticContentApi`] answers it in
//! process from a [`ContentBundle`], optionally delaying selected responses.

use crate::bundle::ContentBundle;
use crate::config::ViewerConfig;
use crate::{WikiError, WikiResult};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiki_types::{Node, NodeId, SearchQuery, SearchReq, Variable};

pub trait ContentApi: Send + Sync + 'static {
    fn list_nodes(&self) -> impl Future<Output = WikiResult<Vec<Node>>> + Send;

    /// Fetches one hydrated node.
    ///
    /// # Errors
    ///
    /// Returns `WikiError::MalformedResponse` when the source answers with anything other
    /// than exactly one node.
    fn get_node(&self, id: NodeId) -> impl Future<Output = WikiResult<Node>> + Send;

    fn list_variables(&self) -> impl Future<Output = WikiResult<Vec<Variable>>> + Send;

    fn search(&self, query: &SearchQuery) -> impl Future<Output = WikiResult<Vec<Node>>> + Send;
}

/// Enforces the single-node invariant of the get-node response.
pub fn expect_single(id: NodeId, mut nodes: Vec<Node>) -> WikiResult<Node> {
    if nodes.len() != 1 {
        tracing::error!(id, count = nodes.len(), "get node returned malformed response");
        return Err(WikiError::MalformedResponse {
            id,
            count: nodes.len(),
        });
    }
    nodes.pop().ok_or(WikiError::MalformedResponse { id, count: 0 })
}

/// HTTP implementation of the content API.
#[derive(Clone, Debug)]
pub struct HttpContentApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpContentApi {
    /// Builds a client for the API at `config.api_url()`.
    ///
    /// # Errors
    ///
    /// Returns `WikiError::Network` if the HTTP client cannot be constructed.
    pub fn new(config: &ViewerConfig) -> WikiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl ContentApi for HttpContentApi {
    async fn list_nodes(&self) -> WikiResult<Vec<Node>> {
        let nodes = self
            .client
            .get(self.url("/nodes"))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Node>>()
            .await?;
        Ok(nodes)
    }

    async fn get_node(&self, id: NodeId) -> WikiResult<Node> {
        let nodes = self
            .client
            .get(self.url(&format!("/nodes/{id}")))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Node>>()
            .await?;
        expect_single(id, nodes)
    }

    async fn list_variables(&self) -> WikiResult<Vec<Variable>> {
        let variables = self
            .client
            .get(self.url("/variables"))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Variable>>()
            .await?;
        Ok(variables)
    }

    async fn search(&self, query: &SearchQuery) -> WikiResult<Vec<Node>> {
        let body = SearchReq {
            query: query.as_str().to_string(),
        };
        let nodes = self
            .client
            .post(self.url("/nodes/search"))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Node>>()
            .await?;
        Ok(nodes)
    }
}

/// In-process content API backed by a [`ContentBundle`].
///
/// Search and detail responses can be delayed per query or per id, which makes response
/// ordering reproducible under a paused tokio clock.
#[derive(Clone, Debug, Default)]
pub struct StaticContentApi {
    bundle: Arc<ContentBundle>,
    search_latency: HashMap<String, Duration>,
    detail_latency: HashMap<NodeId, Duration>,
    search_log: Arc<Mutex<Vec<String>>>,
}

impl StaticContentApi {
    pub fn new(bundle: ContentBundle) -> Self {
        Self {
            bundle: Arc::new(bundle),
            ..Self::default()
        }
    }

    pub fn with_search_latency(mut self, query: impl Into<String>, latency: Duration) -> Self {
        self.search_latency.insert(query.into(), latency);
        self
    }

    pub fn with_detail_latency(mut self, id: NodeId, latency: Duration) -> Self {
        self.detail_latency.insert(id, latency);
        self
    }

    fn record_search(&self, query: &SearchQuery) {
        if let Ok(mut log) = self.search_log.lock() {
            log.push(query.as_str().to_string());
        }
    }

    /// Every query received so far, in arrival order.
    pub fn search_log(&self) -> Vec<String> {
        self.search_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

impl ContentApi for StaticContentApi {
    async fn list_nodes(&self) -> WikiResult<Vec<Node>> {
        Ok(self.bundle.summaries())
    }

    async fn get_node(&self, id: NodeId) -> WikiResult<Node> {
        if let Some(latency) = self.detail_latency.get(&id) {
            tokio::time::sleep(*latency).await;
        }
        expect_single(id, self.bundle.detail(id))
    }

    async fn list_variables(&self) -> WikiResult<Vec<Variable>> {
        Ok(self.bundle.variables.clone())
    }

    async fn search(&self, query: &SearchQuery) -> WikiResult<Vec<Node>> {
        self.record_search(query);
        if let Some(latency) = self.search_latency.get(query.as_str()) {
            tokio::time::sleep(*latency).await;
        }
        Ok(self.bundle.search(query.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiki_types::ContentBlock;

    fn api() -> StaticContentApi {
        StaticContentApi::new(ContentBundle::new(
            vec![
                Node::summary(1, "one").with_content(vec![ContentBlock::text("first")]),
                Node::summary(2, "two"),
                Node::summary(2, "two again"),
            ],
            vec![Variable::new("v1", "Variable 1")],
        ))
    }

    #[test]
    fn single_node_invariant() {
        assert_eq!(expect_single(1, vec![Node::summary(1, "a")]).unwrap().id, 1);
        assert!(matches!(
            expect_single(1, vec![]),
            Err(WikiError::MalformedResponse { id: 1, count: 0 })
        ));
        assert!(matches!(
            expect_single(1, vec![Node::summary(1, "a"), Node::summary(1, "b")]),
            Err(WikiError::MalformedResponse { id: 1, count: 2 })
        ));
    }

    #[tokio::test]
    async fn static_api_answers_contract() {
        let api = api();
        assert_eq!(api.list_nodes().await.unwrap().len(), 3);
        assert!(api.get_node(1).await.unwrap().is_hydrated());
        assert!(matches!(
            api.get_node(2).await,
            Err(WikiError::MalformedResponse { count: 2, .. })
        ));
        assert!(matches!(
            api.get_node(9).await,
            Err(WikiError::MalformedResponse { count: 0, .. })
        ));
        assert_eq!(api.list_variables().await.unwrap().len(), 1);

        let query = SearchQuery::new("FIRST").unwrap();
        assert_eq!(api.search(&query).await.unwrap().len(), 1);
        assert_eq!(api.search_log(), vec!["FIRST".to_string()]);
    }

    #[test]
    fn http_api_builds_urls_from_config() {
        let cfg = ViewerConfig::new(
            "http://127.0.0.1:9/api/",
            Duration::from_millis(500),
            Duration::from_secs(1),
        )
        .unwrap();
        let api = HttpContentApi::new(&cfg).unwrap();
        assert_eq!(api.url("/nodes/3"), "http://127.0.0.1:9/api/nodes/3");
    }
}
