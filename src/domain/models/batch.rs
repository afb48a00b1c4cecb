use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub index: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub success: bool,
}

impl BatchItem {
    pub fn succeeded(index: usize, message: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
            response: Some(response.into()),
            error: None,
            success: true,
        }
    }

    pub fn failed(index: usize, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
            response: None,
            error: Some(error.into()),
            success: false,
        }
    }
}

/// Outcome of a sequential batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub elapsed_secs: f64,
}

impl BatchReport {
    pub fn new(items: Vec<BatchItem>, elapsed_secs: f64) -> Self {
        Self {
            items,
            elapsed_secs,
        }
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn successful(&self) -> usize {
        self.items.iter().filter(|i| i.success).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.successful()
    }
}
