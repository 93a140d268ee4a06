//! Ingestion report: one outcome per input document plus batch metadata.

use crate::error::KgResult;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DocumentStatus {
    Loaded {
        capabilities: usize,
        agents: usize,
        capability_links: usize,
        relationships: usize,
        /// Capability links and relationships whose endpoints did not exist.
        skipped_links: usize,
    },
    Rejected {
        message: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Serialize, Clone, Debug)]
pub struct DocumentOutcome {
    pub source: String,
    pub domain: Option<String>,
    #[serde(flatten)]
    pub status: DocumentStatus,
}

impl DocumentOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, DocumentStatus::Loaded { .. })
    }

    pub fn message(&self) -> String {
        match &self.status {
            DocumentStatus::Loaded { .. } => format!(
                "Successfully loaded KG: {}",
                self.domain.as_deref().unwrap_or(&self.source)
            ),
            DocumentStatus::Rejected { .. } => format!("Invalid KG structure in {}", self.source),
            DocumentStatus::Failed { message } => {
                format!("Error processing {}: {}", self.source, message)
            }
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct IngestionReport {
    pub batch_id: String,
    pub started: DateTime<Utc>,
    pub ended: Option<DateTime<Utc>>,
    /// Nodes removed by the pre-load wipe.
    pub wiped: usize,
    pub outcomes: Vec<DocumentOutcome>,
}

impl IngestionReport {
    pub fn new(batch_id: &str) -> Self {
        Self {
            batch_id: batch_id.into(),
            started: Utc::now(),
            ended: None,
            wiped: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: DocumentOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self) {
        self.ended = Some(Utc::now());
    }

    pub fn loaded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_loaded()).count()
    }

    pub fn loaded_domains(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_loaded())
            .filter_map(|o| o.domain.as_deref())
            .collect()
    }

    /// Operator-facing lines, one per document, framed by the wipe and the total.
    pub fn messages(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.outcomes.len() + 2);
        lines.push("Cleaned existing nodes".to_string());
        lines.extend(self.outcomes.iter().map(DocumentOutcome::message));
        lines.push(format!("Total KGs loaded: {}", self.loaded()));
        lines
    }

    pub fn to_yaml(&self) -> KgResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(source: &str, domain: Option<&str>, status: DocumentStatus) -> DocumentOutcome {
        DocumentOutcome {
            source: source.into(),
            domain: domain.map(str::to_string),
            status,
        }
    }

    #[test]
    fn messages_cover_every_status() {
        let mut report = IngestionReport::new("b1");
        report.push(outcome(
            "Ethics_KG.json",
            Some("Ethics"),
            DocumentStatus::Loaded {
                capabilities: 1,
                agents: 1,
                capability_links: 0,
                relationships: 0,
                skipped_links: 0,
            },
        ));
        report.push(outcome(
            "Bad_KG.json",
            None,
            DocumentStatus::Rejected {
                message: "agents[0] is missing `description`".into(),
            },
        ));
        report.push(outcome(
            "Broken_KG.json",
            None,
            DocumentStatus::Failed {
                message: "expected value at line 1 column 1".into(),
            },
        ));
        assert_eq!(
            report.messages(),
            vec![
                "Cleaned existing nodes",
                "Successfully loaded KG: Ethics",
                "Invalid KG structure in Bad_KG.json",
                "Error processing Broken_KG.json: expected value at line 1 column 1",
                "Total KGs loaded: 1",
            ]
        );
        assert_eq!(report.loaded_domains(), vec!["Ethics"]);
    }

    #[test]
    fn yaml_carries_status_tags() {
        let mut report = IngestionReport::new("b2");
        report.push(outcome(
            "x.json",
            None,
            DocumentStatus::Failed {
                message: "boom".into(),
            },
        ));
        report.finish();
        let yaml = report.to_yaml().unwrap();
        assert!(yaml.contains("batch_id: b2"));
        assert!(yaml.contains("status: failed"));
        assert!(yaml.contains("message: boom"));
    }
}
