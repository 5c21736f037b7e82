use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hypothesis {
    #[serde(deserialize_with = "super::string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub importance: String,
    #[serde(default)]
    pub confidence: Option<String>,
}

impl Hypothesis {
    pub fn importance_level(&self) -> Importance {
        Importance::classify(&self.importance)
    }

    pub fn confidence_label(&self) -> &str {
        self.confidence.as_deref().filter(|c| !c.is_empty()).unwrap_or("Medium")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    High,
    Medium,
    Low,
    Other,
}

impl Importance {
    pub fn classify(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "high" => Importance::High,
            "medium" => Importance::Medium,
            "low" => Importance::Low,
            _ => Importance::Other,
        }
    }
}

/// A hypothesis plus the backend's test result, as sent to
/// `/api/synthesize_insights`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestedHypothesis {
    pub id: String,
    pub title: String,
    pub description: String,
    pub result: String,
}

impl TestedHypothesis {
    pub fn from_result(hypothesis: &Hypothesis, result: String) -> Self {
        Self {
            id: hypothesis.id.clone(),
            title: hypothesis.title.clone(),
            description: hypothesis.description.clone(),
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ids_are_read_as_strings() {
        let h: Hypothesis = serde_json::from_value(serde_json::json!({
            "id": 3,
            "title": "Discounts erode profit",
            "description": "Higher discounts correlate with lower profit",
            "importance": "HIGH"
        }))
        .unwrap();
        assert_eq!(h.id, "3");
        assert_eq!(h.importance_level(), Importance::High);
        assert_eq!(h.confidence_label(), "Medium");
    }

    #[test]
    fn test_importance_classification() {
        assert_eq!(Importance::classify("Medium"), Importance::Medium);
        assert_eq!(Importance::classify(" low "), Importance::Low);
        assert_eq!(Importance::classify("critical"), Importance::Other);
        assert_eq!(Importance::classify(""), Importance::Other);
    }
}
