use serde::{Deserialize, Deserializer, Serialize};

/// One financial event reported by a backend source.
///
/// Every field is kept as the backend sent it. `amount` is never interpreted
/// and `timestamp` is only compared as a string when merging.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Transaction {
    #[serde(default, deserialize_with = "nullable_string")]
    pub id: String,
    #[serde(
        rename = "serverId",
        alias = "sourceId",
        default,
        deserialize_with = "nullable_string"
    )]
    pub source_id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub account: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub amount: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub timestamp: String,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        source_id: impl Into<String>,
        account: impl Into<String>,
        amount: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            account: account.into(),
            amount: amount.into(),
            timestamp: timestamp.into(),
        }
    }
}

// Backends may send explicit nulls; those read as empty strings.
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
