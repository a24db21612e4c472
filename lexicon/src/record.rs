use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::AnalysisOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Case-database artifact posted for a flagged file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
}

pub const ARTIFACT_NAME: &str = "Flagged Content";
pub const ATTR_NAME: &str = "TSK_NAME";
pub const ATTR_COMMENT: &str = "TSK_COMMENT";
pub const ATTR_MATCHED_TERMS: &str = "TSK_MATCHED_TERMS";

impl Artifact {
    pub fn flagged(matches: &[String]) -> Self {
        let joined = matches.join(", ");
        let mut attributes = BTreeMap::new();
        attributes.insert(ATTR_NAME.to_string(), "Keyword Match".to_string());
        attributes.insert(ATTR_COMMENT.to_string(), format!("Matched terms: {joined}"));
        attributes.insert(ATTR_MATCHED_TERMS.to_string(), joined);
        Self { name: ARTIFACT_NAME.to_string(), attributes }
    }
}

/// Record the host parses for each file.
///
/// `status`, `matches` and `message` are the stable contract; `artifacts` is
/// only present when something matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub status: Status,
    #[serde(default)]
    pub matches: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
}

impl HostRecord {
    pub fn from_outcome(outcome: &AnalysisOutcome) -> Self {
        match outcome {
            AnalysisOutcome::Ok(m) => Self {
                status: Status::Ok,
                matches: m.terms.clone(),
                message: None,
                artifacts: if m.is_empty() { Vec::new() } else { vec![Artifact::flagged(&m.terms)] },
            },
            AnalysisOutcome::Error(reason) => Self::error(reason.clone()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            matches: Vec::new(),
            message: Some(message.into()),
            artifacts: Vec::new(),
        }
    }

    /// No-op success for files the gate declined to analyze.
    pub fn skipped(reason: &str) -> Self {
        Self {
            status: Status::Ok,
            matches: Vec::new(),
            message: Some(format!("skipped: {reason}")),
            artifacts: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
