//! Feature statistics returned alongside the annotated image.
//!
//! Everything except the keypoint count depends on the detection method and
//! on whether any keypoint was found, so absent fields mean "not applicable"
//! and are never rendered as zero.

use serde::{Deserialize, Serialize};

/// Closed interval reported for keypoint sizes and responses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureStatistics {
    #[serde(rename = "num_keypoints")]
    pub keypoint_count: u64,
    #[serde(default)]
    pub descriptor_shape: Option<Vec<u64>>,
    #[serde(default, rename = "descriptor_dtype")]
    pub descriptor_element_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_response: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_response: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_range: Option<ValueRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_range: Option<ValueRange>,
}

/// One labelled line of the statistics panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRow {
    pub label: &'static str,
    pub value: String,
}

impl StatRow {
    fn new(label: &'static str, value: String) -> Self {
        Self { label, value }
    }
}

impl FeatureStatistics {
    pub fn with_keypoints(keypoint_count: u64) -> Self {
        Self {
            keypoint_count,
            ..Default::default()
        }
    }

    /// Rows for the fields that are present, in display order.
    ///
    /// Sizes use two decimals and responses four, since responses are
    /// typically much smaller than sizes.
    pub fn display_rows(&self) -> Vec<StatRow> {
        let mut rows = vec![StatRow::new("Keypoints", self.keypoint_count.to_string())];

        if let Some(shape) = &self.descriptor_shape {
            let dims: Vec<String> = shape.iter().map(u64::to_string).collect();
            rows.push(StatRow::new("Descriptor shape", dims.join(" x ")));
        }
        if let Some(dtype) = &self.descriptor_element_type {
            rows.push(StatRow::new("Descriptor type", dtype.clone()));
        }
        if let Some(v) = self.avg_size {
            rows.push(StatRow::new("Avg size", format!("{v:.2}")));
        }
        if let Some(v) = self.std_size {
            rows.push(StatRow::new("Std size", format!("{v:.2}")));
        }
        if let Some(r) = self.size_range {
            rows.push(StatRow::new("Size range", format!("{:.2} - {:.2}", r.min, r.max)));
        }
        if let Some(v) = self.avg_response {
            rows.push(StatRow::new("Avg response", format!("{v:.4}")));
        }
        if let Some(v) = self.std_response {
            rows.push(StatRow::new("Std response", format!("{v:.4}")));
        }
        if let Some(r) = self.response_range {
            rows.push(StatRow::new(
                "Response range",
                format!("{:.4} - {:.4}", r.min, r.max),
            ));
        }

        rows
    }
}
