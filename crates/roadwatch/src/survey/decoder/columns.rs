use serde::Serialize;

use crate::survey::domain::DistressType;

/// Declarative description of the survey spreadsheet layout.
///
/// Every positional offset the decoder touches lives here, so vendor
/// format drift is corrected in one table instead of scattered index
/// arithmetic. Diagnostics render this same structure.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    /// Mandatory leading cells: highway code, chainage start, chainage end.
    pub highway_code: usize,
    pub chainage_start: usize,
    pub chainage_end: usize,
    /// First coordinate column of lane slot 0; each slot occupies
    /// `gps_stride` columns of which the first two are start lat/lng.
    pub gps_base: usize,
    pub gps_stride: usize,
    pub roughness_base: usize,
    pub rut_depth_base: usize,
    pub crack_area_base: usize,
    pub ravelling_base: usize,
    /// Header detection scans this many leading rows for a highway code.
    pub header_scan_rows: usize,
}

/// Resolved offsets for one lane slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneColumns {
    pub latitude: usize,
    pub longitude: usize,
    pub roughness: usize,
    pub rut_depth: usize,
    pub crack_area: usize,
    pub ravelling: usize,
}

impl ColumnMap {
    /// The NSV export layout observed across survey vendors.
    pub fn standard() -> Self {
        Self {
            highway_code: 0,
            chainage_start: 1,
            chainage_end: 2,
            gps_base: 5,
            gps_stride: 4,
            roughness_base: 31,
            rut_depth_base: 40,
            crack_area_base: 49,
            ravelling_base: 58,
            header_scan_rows: 10,
        }
    }

    /// Offsets for the lane slot at fan-out position `lane_index` (0..8).
    pub fn lane(&self, lane_index: usize) -> LaneColumns {
        let gps = self.gps_base + self.gps_stride * lane_index;
        LaneColumns {
            latitude: gps,
            longitude: gps + 1,
            roughness: self.roughness_base + lane_index,
            rut_depth: self.rut_depth_base + lane_index,
            crack_area: self.crack_area_base + lane_index,
            ravelling: self.ravelling_base + lane_index,
        }
    }

    pub fn distress_column(&self, lane_index: usize, distress: DistressType) -> usize {
        let lane = self.lane(lane_index);
        match distress {
            DistressType::Roughness => lane.roughness,
            DistressType::RutDepth => lane.rut_depth,
            DistressType::CrackArea => lane.crack_area,
            DistressType::Ravelling => lane.ravelling,
        }
    }

    /// Human-readable rendering of the layout for upload diagnostics.
    pub fn legend(&self) -> ColumnLegend {
        let lanes = crate::survey::domain::LaneSlot::ALL.len();
        let span = |base: usize| format!("columns {}-{}", base, base + lanes - 1);
        ColumnLegend {
            highway_code: format!("column {}", self.highway_code),
            chainage_start: format!("column {}", self.chainage_start),
            chainage_end: format!("column {}", self.chainage_end),
            gps: format!(
                "columns {}-{} ({} per lane, start lat/lng first)",
                self.gps_base,
                self.gps_base + self.gps_stride * lanes - 1,
                self.gps_stride
            ),
            roughness: span(self.roughness_base),
            rut_depth: span(self.rut_depth_base),
            crack_area: span(self.crack_area_base),
            ravelling: span(self.ravelling_base),
        }
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self::standard()
    }
}

/// Serializable legend entry set, one line per mapped field group.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ColumnLegend {
    pub highway_code: String,
    pub chainage_start: String,
    pub chainage_end: String,
    pub gps: String,
    pub roughness: String,
    pub rut_depth: String,
    pub crack_area: String,
    pub ravelling: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_matches_nsv_export() {
        let map = ColumnMap::standard();

        let l1 = map.lane(0);
        assert_eq!(l1.latitude, 5);
        assert_eq!(l1.longitude, 6);
        assert_eq!(l1.roughness, 31);
        assert_eq!(l1.rut_depth, 40);
        assert_eq!(l1.crack_area, 49);
        assert_eq!(l1.ravelling, 58);

        let r4 = map.lane(7);
        assert_eq!(r4.latitude, 33);
        assert_eq!(r4.longitude, 34);
        assert_eq!(r4.roughness, 38);
        assert_eq!(r4.ravelling, 65);
    }

    #[test]
    fn legend_renders_column_spans() {
        let legend = ColumnMap::standard().legend();
        assert_eq!(legend.highway_code, "column 0");
        assert_eq!(legend.roughness, "columns 31-38");
        assert_eq!(legend.rut_depth, "columns 40-47");
        assert_eq!(legend.crack_area, "columns 49-56");
        assert_eq!(legend.ravelling, "columns 58-65");
    }
}
