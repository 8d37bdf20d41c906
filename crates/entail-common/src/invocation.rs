use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROJECT_ID: &str = "textual-entailment";

/// The single shared "last invocation" row, keyed by project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvocationRecord {
    #[serde(rename = "projectName")]
    pub project_id: String,
    #[serde(rename = "lastInvocation", with = "crate::timestamp::serde_format")]
    pub last_invocation: NaiveDateTime,
}

impl InvocationRecord {
    pub fn store_key(project_id: &str) -> String {
        format!("/global_items/{project_id}")
    }
}
