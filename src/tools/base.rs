use crate::error::SearchError;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Output of one tool call
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    /// Human-readable rendering
    pub text: String,
    /// The same result as data
    pub structured: serde_json::Value,
}

impl ToolResult {
    pub fn new(text: impl Into<String>, structured: serde_json::Value) -> Self {
        Self {
            text: text.into(),
            structured,
        }
    }

    /// Render `value` with `text` as its textual form
    pub fn from_serialize<T: Serialize>(text: String, value: &T) -> Result<Self, ToolError> {
        Ok(Self::new(text, serde_json::to_value(value)?))
    }
}

/// Tool execution errors
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ToolError {
    /// Whether the caller sent something wrong
    pub fn is_client_error(&self) -> bool {
        match self {
            ToolError::UnknownTool(_) | ToolError::InvalidParams(_) => true,
            ToolError::Search(err) => err.is_client_error(),
            ToolError::Encode(_) => false,
        }
    }
}

/// A callable operation exposed to tool clients
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool identifier, also the REST path segment
    fn id(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema for tool parameters
    fn input_schema(&self) -> serde_json::Value;

    async fn execute(
        &self,
        params: serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<ToolResult, ToolError>;
}

/// Decode tool parameters; `null` means no parameters
pub fn parse_params<T: serde::de::DeserializeOwned + Default>(
    params: serde_json::Value,
) -> Result<T, ToolError> {
    if params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(params).map_err(|e| ToolError::InvalidParams(e.to_string()))
}
