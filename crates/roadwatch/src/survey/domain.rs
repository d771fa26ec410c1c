use serde::{Deserialize, Serialize};

/// Physical lane positions a survey vehicle can report for one segment.
///
/// L1-L4 cover the left carriageway, R1-R4 the right. The slot order is
/// fixed because the spreadsheet layout addresses lanes positionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneSlot {
    L1,
    L2,
    L3,
    L4,
    R1,
    R2,
    R3,
    R4,
}

impl LaneSlot {
    pub const ALL: [LaneSlot; 8] = [
        LaneSlot::L1,
        LaneSlot::L2,
        LaneSlot::L3,
        LaneSlot::L4,
        LaneSlot::R1,
        LaneSlot::R2,
        LaneSlot::R3,
        LaneSlot::R4,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LaneSlot::L1 => "L1",
            LaneSlot::L2 => "L2",
            LaneSlot::L3 => "L3",
            LaneSlot::L4 => "L4",
            LaneSlot::R1 => "R1",
            LaneSlot::R2 => "R2",
            LaneSlot::R3 => "R3",
            LaneSlot::R4 => "R4",
        }
    }

    /// Position of the slot in the fixed fan-out order, 0..8.
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|slot| *slot == self)
            .unwrap_or_default()
    }
}

/// Pavement defect categories measured by the survey vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistressType {
    #[serde(rename = "roughness")]
    Roughness,
    #[serde(rename = "rutdepth")]
    RutDepth,
    #[serde(rename = "crackarea")]
    CrackArea,
    #[serde(rename = "ravelling")]
    Ravelling,
}

impl DistressType {
    pub const ALL: [DistressType; 4] = [
        DistressType::Roughness,
        DistressType::RutDepth,
        DistressType::CrackArea,
        DistressType::Ravelling,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DistressType::Roughness => "roughness",
            DistressType::RutDepth => "rutdepth",
            DistressType::CrackArea => "crackarea",
            DistressType::Ravelling => "ravelling",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "roughness" => Some(DistressType::Roughness),
            "rutdepth" => Some(DistressType::RutDepth),
            "crackarea" => Some(DistressType::CrackArea),
            "ravelling" => Some(DistressType::Ravelling),
            _ => None,
        }
    }
}

/// Ordered condition classification, worst last.
///
/// The derived `Ord` follows declaration order, which is what worst-of
/// aggregation across a segment's lanes relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Excellent => "excellent",
            Severity::Good => "good",
            Severity::Fair => "fair",
            Severity::Poor => "poor",
            Severity::Critical => "critical",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "excellent" => Some(Severity::Excellent),
            "good" => Some(Severity::Good),
            "fair" => Some(Severity::Fair),
            "poor" => Some(Severity::Poor),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

/// One lane's worth of survey readings for a chainage interval.
///
/// Produced by the decoder, one record per (admitted row, populated lane
/// slot). Distress fields are `None` when the cell was blank or not
/// numeric; "not measured" is distinct from a zero reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneMeasurement {
    pub highway_code: String,
    pub chainage_start: f64,
    pub chainage_end: f64,
    pub lane: LaneSlot,
    pub latitude: f64,
    pub longitude: f64,
    pub roughness: Option<f64>,
    pub rut_depth: Option<f64>,
    pub crack_area: Option<f64>,
    pub ravelling: Option<f64>,
}

impl LaneMeasurement {
    /// Reading for one distress type, `None` when not measured.
    pub fn value(&self, distress: DistressType) -> Option<f64> {
        match distress {
            DistressType::Roughness => self.roughness,
            DistressType::RutDepth => self.rut_depth,
            DistressType::CrackArea => self.crack_area,
            DistressType::Ravelling => self.ravelling,
        }
    }

    pub fn length_km(&self) -> f64 {
        self.chainage_end - self.chainage_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_slots_keep_fan_out_order() {
        let labels: Vec<&str> = LaneSlot::ALL.iter().map(|slot| slot.label()).collect();
        assert_eq!(labels, ["L1", "L2", "L3", "L4", "R1", "R2", "R3", "R4"]);
        assert_eq!(LaneSlot::L1.index(), 0);
        assert_eq!(LaneSlot::R4.index(), 7);
    }

    #[test]
    fn severity_order_ranks_critical_worst() {
        assert!(Severity::Critical > Severity::Poor);
        assert!(Severity::Poor > Severity::Fair);
        assert!(Severity::Fair > Severity::Good);
        assert!(Severity::Good > Severity::Excellent);
    }

    #[test]
    fn distress_labels_round_trip() {
        for distress in DistressType::ALL {
            assert_eq!(DistressType::from_label(distress.label()), Some(distress));
        }
        assert_eq!(DistressType::from_label("potholes"), None);
    }

    #[test]
    fn measurement_exposes_values_by_distress() {
        let measurement = LaneMeasurement {
            highway_code: "NH-44".to_string(),
            chainage_start: 10.0,
            chainage_end: 10.5,
            lane: LaneSlot::L1,
            latitude: 28.1,
            longitude: 77.2,
            roughness: Some(2900.0),
            rut_depth: None,
            crack_area: None,
            ravelling: None,
        };

        assert_eq!(measurement.value(DistressType::Roughness), Some(2900.0));
        assert_eq!(measurement.value(DistressType::RutDepth), None);
        assert!((measurement.length_km() - 0.5).abs() < 1e-9);
    }
}
