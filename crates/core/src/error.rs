use wiki_types::NodeId;

#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("malformed response for node {id}: expected exactly one node, got {count}")]
    MalformedResponse { id: NodeId, count: usize },
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("failed to read content file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to deserialize content: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("search query cannot be empty")]
    EmptyQuery,
}

impl From<wiki_types::QueryError> for WikiError {
    fn from(_: wiki_types::QueryError) -> Self {
        WikiError::EmptyQuery
    }
}

pub type WikiResult<T> = std::result::Result<T, WikiError>;
