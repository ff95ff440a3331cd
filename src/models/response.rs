//! Response envelope used by the listing endpoints.

use crate::error::ApiError;
use serde::{Deserialize, Deserializer};

/// `{ message }` error detail.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

/// `{ success, data, error? }` wrapper returned by every domain endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

impl<T> ApiEnvelope<T> {
    /// Validate the envelope into a typed result.
    pub fn into_result(self) -> Result<T, ApiError> {
        let message = self
            .error
            .map(|e| e.message)
            .filter(|m| !m.is_empty());

        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(ApiError::Api(
                message.unwrap_or_else(|| "Response contained no data".to_string()),
            )),
            (false, _) => Err(ApiError::Api(
                message.unwrap_or_else(|| "Request failed".to_string()),
            )),
        }
    }
}

/// Accept an identifier sent either as a JSON string or a number.
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

/// Like [`id_string`] but for optional references.
pub(crate) fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(i64),
    }

    Ok(Option::<Id>::deserialize(deserializer)?.map(|id| match id {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    }))
}
