use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ItemKind, TransactionType};

/// Everything a provider reply may ask for, validated at the boundary into a
/// closed shape. Anything the deserializer or the shape checks reject never
/// reaches a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentReply {
    #[serde(flatten)]
    pub operation: IntentOperation,
    #[serde(default)]
    pub chat_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum IntentOperation {
    #[serde(rename_all = "camelCase")]
    Create {
        title: String,
        kind: ItemKind,
        #[serde(default)]
        category: String,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        due_date: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Complete {
        /// Item id or exact title; resolution happens at dispatch.
        target: String,
    },
    Chat,
    #[serde(rename_all = "camelCase")]
    Transaction {
        description: String,
        amount: f64,
        #[serde(rename = "type")]
        tx_type: TransactionType,
        /// Account name or id.
        account: String,
        #[serde(default)]
        date: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ModuleEntry {
        /// Module name or id.
        module: String,
        title: String,
        #[serde(default)]
        values: BTreeMap<String, Value>,
    },
}

#[derive(Debug)]
pub enum ReplyParseError {
    Json(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ReplyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyParseError::Json(err) => write!(f, "reply did not match any operation: {}", err),
            ReplyParseError::Invalid(reason) => write!(f, "reply rejected: {}", reason),
        }
    }
}

impl Error for ReplyParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReplyParseError::Json(err) => Some(err),
            ReplyParseError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ReplyParseError {
    fn from(value: serde_json::Error) -> Self {
        ReplyParseError::Json(value)
    }
}

/// Parses and shape-checks a raw provider reply.
pub fn parse_reply(raw: Value) -> Result<IntentReply, ReplyParseError> {
    let reply: IntentReply = serde_json::from_value(raw)?;
    match &reply.operation {
        IntentOperation::Create { title, .. } if title.trim().is_empty() => {
            return Err(ReplyParseError::Invalid("create with empty title".to_string()));
        }
        IntentOperation::Complete { target } if target.trim().is_empty() => {
            return Err(ReplyParseError::Invalid(
                "complete with empty target".to_string(),
            ));
        }
        IntentOperation::Transaction { amount, .. } if !amount.is_finite() => {
            return Err(ReplyParseError::Invalid(
                "transaction with non-finite amount".to_string(),
            ));
        }
        IntentOperation::ModuleEntry { module, title, .. }
            if module.trim().is_empty() || title.trim().is_empty() =>
        {
            return Err(ReplyParseError::Invalid(
                "module entry missing module or title".to_string(),
            ));
        }
        _ => {}
    }
    Ok(reply)
}
