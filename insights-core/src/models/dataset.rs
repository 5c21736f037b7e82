use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    #[serde(deserialize_with = "super::string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date_added: Option<String>,
    #[serde(default)]
    pub last_used: Option<String>,
}

/// Body of `GET /api/datasets`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetListing {
    #[serde(default)]
    pub datasets: Vec<Dataset>,
    #[serde(default)]
    pub current_dataset: Option<Dataset>,
}

impl DatasetListing {
    pub fn is_active(&self, id: &str) -> bool {
        self.current_dataset.as_ref().is_some_and(|d| d.id == id)
    }

    pub fn find(&self, id: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.id == id)
    }
}
