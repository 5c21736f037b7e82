use serde::Deserialize;

use super::Dataset;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub total_sales: f64,
    #[serde(default)]
    pub total_profit: f64,
    #[serde(default)]
    pub current_dataset: Option<Dataset>,
}
