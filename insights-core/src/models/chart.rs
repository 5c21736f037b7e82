use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Only charts of this type carry a displayable image.
pub const BASE64_IMAGE: &str = "base64_image";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartData {
    pub chart_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image_data: Option<String>,
}

impl ChartData {
    pub fn is_image(&self) -> bool {
        self.chart_type == BASE64_IMAGE && self.image_data.is_some()
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or("Chart")
    }

    /// Decoded PNG bytes, or `None` when the chart is not an image.
    pub fn png_bytes(&self) -> Option<Result<Vec<u8>, base64::DecodeError>> {
        if self.chart_type != BASE64_IMAGE {
            return None;
        }
        self.image_data.as_deref().map(|data| STANDARD.decode(data.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_bytes_decodes_image_charts() {
        let chart = ChartData {
            chart_type: BASE64_IMAGE.to_string(),
            title: None,
            image_data: Some(STANDARD.encode(b"\x89PNG")),
        };
        assert!(chart.is_image());
        assert_eq!(chart.display_title(), "Chart");
        assert_eq!(chart.png_bytes().unwrap().unwrap(), b"\x89PNG".to_vec());
    }

    #[test]
    fn test_non_image_chart_has_no_bytes() {
        let chart = ChartData {
            chart_type: "plotly".to_string(),
            title: Some("Sales by Region".to_string()),
            image_data: Some("abc".to_string()),
        };
        assert!(!chart.is_image());
        assert!(chart.png_bytes().is_none());
        assert_eq!(chart.display_title(), "Sales by Region");
    }
}
