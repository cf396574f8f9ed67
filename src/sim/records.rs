use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Exposure of one planning area at one time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureRecord {
    pub area: String,
    pub timestamp: NaiveDateTime,
    pub exposure_percentage: f64,
    pub building_count: usize,
    pub total_area: f64,
}

impl ExposureRecord {
    /// Record for an area that was not processed.
    pub fn empty(area: &str, timestamp: NaiveDateTime) -> Self {
        Self {
            area: area.to_string(),
            timestamp,
            exposure_percentage: 0.,
            building_count: 0,
            total_area: 0.,
        }
    }
}

/// Shadow percentage of a single location at one time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowDataPoint {
    pub timestamp: NaiveDateTime,
    /// Graph label, `"M/D hour:H"`.
    pub label: String,
    pub shadow_percentage: f64,
}

impl ShadowDataPoint {
    pub fn new(timestamp: NaiveDateTime, shadow_percentage: f64) -> Self {
        let label = format!(
            "{}/{} hour:{}",
            timestamp.month(),
            timestamp.day(),
            timestamp.hour()
        );
        Self {
            timestamp,
            label,
            shadow_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_shadow_label() {
        let t = NaiveDate::from_ymd_opt(2025, 3, 7)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let p = ShadowDataPoint::new(t, 12.5);
        assert_eq!(p.label, "3/7 hour:9");
    }
}
