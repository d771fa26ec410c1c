mod columns;

pub use columns::{ColumnLegend, ColumnMap, LaneColumns};

use serde::Serialize;
use tracing::debug;

use crate::survey::domain::{LaneMeasurement, LaneSlot};
use crate::survey::table::RawTable;

/// Coordinate used when a lane row carries readings but no GPS fix.
/// Survey contractors around the Delhi control room leave GPS blank for
/// depot calibration runs.
pub const FALLBACK_LATITUDE: f64 = 28.7041;
pub const FALLBACK_LONGITUDE: f64 = 77.1025;

/// Decoder knobs that vary per deployment rather than per vendor format.
#[derive(Debug, Clone)]
pub struct DecoderSettings {
    pub fallback_latitude: f64,
    pub fallback_longitude: f64,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            fallback_latitude: FALLBACK_LATITUDE,
            fallback_longitude: FALLBACK_LONGITUDE,
        }
    }
}

/// Why admitted-row filtering dropped input rows. Skips are policy, not
/// errors, but they must stay countable so silent data loss is visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    /// One of the three mandatory leading cells was blank.
    pub missing_mandatory: usize,
    /// Chainage cells present but not usable as an increasing positive
    /// kilometre interval.
    pub invalid_chainage: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.missing_mandatory + self.invalid_chainage
    }
}

/// Everything one decode pass learned about a table.
#[derive(Debug, Clone, Default)]
pub struct DecodeSummary {
    pub measurements: Vec<LaneMeasurement>,
    /// Row index decoding started from after header detection.
    pub data_start_row: usize,
    /// Rows considered after the data start row.
    pub rows_seen: usize,
    pub skipped: SkipCounts,
}

/// Positional decoder for the multi-header NSV spreadsheet layout.
///
/// Single pass, infallible per row: malformed cells degrade to absent
/// values and defective rows are counted and dropped. The only fatal
/// condition in the ingest path lives upstream in the table reader.
#[derive(Debug, Clone, Default)]
pub struct SurveyDecoder {
    columns: ColumnMap,
    settings: DecoderSettings,
}

impl SurveyDecoder {
    pub fn new(columns: ColumnMap, settings: DecoderSettings) -> Self {
        Self { columns, settings }
    }

    pub fn standard() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// First row whose leading cell looks like a highway code, scanning at
    /// most the configured header window. `None` means no code was seen;
    /// decoding then degrades to treating the whole table as data.
    pub fn find_data_start(&self, table: &RawTable) -> Option<usize> {
        let window = table.row_count().min(self.columns.header_scan_rows);
        (0..window).find(|&index| {
            table
                .cell(index, self.columns.highway_code)
                .as_text()
                .is_some_and(|text| text.contains("NH"))
        })
    }

    pub fn decode(&self, table: &RawTable) -> DecodeSummary {
        let data_start_row = self.find_data_start(table).unwrap_or(0);
        let mut summary = DecodeSummary {
            data_start_row,
            ..DecodeSummary::default()
        };

        for row in data_start_row..table.row_count() {
            summary.rows_seen += 1;
            self.decode_row(table, row, &mut summary);
        }

        debug!(
            rows = summary.rows_seen,
            measurements = summary.measurements.len(),
            skipped = summary.skipped.total(),
            "decoded survey table"
        );

        summary
    }

    fn decode_row(&self, table: &RawTable, row: usize, summary: &mut DecodeSummary) {
        let highway = table.cell(row, self.columns.highway_code);
        let start_cell = table.cell(row, self.columns.chainage_start);
        let end_cell = table.cell(row, self.columns.chainage_end);

        if highway.is_blank() || start_cell.is_blank() || end_cell.is_blank() {
            summary.skipped.missing_mandatory += 1;
            return;
        }

        let highway_code = highway.display();
        let (chainage_start, chainage_end) = match (start_cell.as_f64(), end_cell.as_f64()) {
            (Some(start), Some(end)) if end > start && start > 0.0 => (start, end),
            _ => {
                summary.skipped.invalid_chainage += 1;
                return;
            }
        };

        for slot in LaneSlot::ALL {
            let lane = self.columns.lane(slot.index());
            let latitude = table.cell(row, lane.latitude).as_f64();
            let longitude = table.cell(row, lane.longitude).as_f64();
            let roughness = table.cell(row, lane.roughness).as_f64();
            let rut_depth = table.cell(row, lane.rut_depth).as_f64();
            let crack_area = table.cell(row, lane.crack_area).as_f64();
            let ravelling = table.cell(row, lane.ravelling).as_f64();

            // A slot with nothing measured is an unsurveyed physical lane,
            // not a defect; drop it without counting.
            let populated = [latitude, longitude, roughness, rut_depth, crack_area, ravelling]
                .iter()
                .any(Option::is_some);
            if !populated {
                continue;
            }

            summary.measurements.push(LaneMeasurement {
                highway_code: highway_code.clone(),
                chainage_start,
                chainage_end,
                lane: slot,
                latitude: latitude.unwrap_or(self.settings.fallback_latitude),
                longitude: longitude.unwrap_or(self.settings.fallback_longitude),
                roughness,
                rut_depth,
                crack_area,
                ravelling,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::domain::LaneSlot;
    use crate::survey::table::Cell;

    fn text(value: &str) -> Cell {
        Cell::Text(value.to_string())
    }

    fn number(value: f64) -> Cell {
        Cell::Number(value)
    }

    /// Builds a row wide enough to address every mapped column, with the
    /// mandatory cells populated and the given (column, value) overrides.
    fn data_row(code: &str, start: f64, end: f64, cells: &[(usize, Cell)]) -> Vec<Cell> {
        let mut row = vec![Cell::Empty; 66];
        row[0] = text(code);
        row[1] = number(start);
        row[2] = number(end);
        for (column, cell) in cells {
            row[*column] = cell.clone();
        }
        row
    }

    #[test]
    fn header_rows_before_first_highway_code_are_skipped() {
        let table = RawTable::new(vec![
            vec![text("National Survey Report")],
            vec![text("Chainage"), text("Lane Details")],
            data_row("NH-148N", 10.0, 10.5, &[(31, number(1000.0))]),
        ]);

        let decoder = SurveyDecoder::standard();
        assert_eq!(decoder.find_data_start(&table), Some(2));

        let summary = decoder.decode(&table);
        assert_eq!(summary.data_start_row, 2);
        assert_eq!(summary.measurements.len(), 1);
        assert_eq!(summary.skipped.total(), 0);
    }

    #[test]
    fn missing_header_degrades_to_row_zero() {
        let table = RawTable::new(vec![
            vec![text("Survey Summary")],
            vec![text("Totals"), number(12.0)],
        ]);

        let decoder = SurveyDecoder::standard();
        assert_eq!(decoder.find_data_start(&table), None);

        let summary = decoder.decode(&table);
        assert_eq!(summary.data_start_row, 0);
        assert!(summary.measurements.is_empty());
        // Header noise rows fail mandatory-cell admission, not decoding.
        assert_eq!(summary.skipped.missing_mandatory, 2);
    }

    #[test]
    fn rows_missing_mandatory_cells_never_emit_measurements() {
        let table = RawTable::new(vec![
            data_row("NH-44", 10.0, 10.5, &[(31, number(2000.0))]),
            {
                let mut row = data_row("NH-44", 10.5, 11.0, &[(31, number(2000.0))]);
                row[1] = Cell::Empty;
                row
            },
            {
                let mut row = data_row("NH-44", 11.0, 11.5, &[(31, number(2000.0))]);
                row[0] = text("   ");
                row
            },
        ]);

        let summary = SurveyDecoder::standard().decode(&table);
        assert_eq!(summary.measurements.len(), 1);
        assert_eq!(summary.skipped.missing_mandatory, 2);
    }

    #[test]
    fn unparsable_or_inverted_chainage_skips_the_row() {
        let table = RawTable::new(vec![
            {
                let mut row = data_row("NH-44", 10.0, 10.5, &[(31, number(2000.0))]);
                row[1] = text("ten");
                row
            },
            // End before start violates the interval invariant.
            data_row("NH-44", 12.0, 11.5, &[(31, number(2000.0))]),
        ]);

        let summary = SurveyDecoder::standard().decode(&table);
        assert!(summary.measurements.is_empty());
        assert_eq!(summary.skipped.invalid_chainage, 2);
    }

    #[test]
    fn single_populated_slot_yields_exactly_one_lane() {
        // Scenario: only L1 carries GPS and a roughness reading.
        let table = RawTable::new(vec![data_row(
            "NH-44",
            10.0,
            10.5,
            &[(5, number(28.1)), (6, number(77.2)), (31, number(2900.0))],
        )]);

        let summary = SurveyDecoder::standard().decode(&table);
        assert_eq!(summary.measurements.len(), 1);

        let lane = &summary.measurements[0];
        assert_eq!(lane.lane, LaneSlot::L1);
        assert_eq!(lane.highway_code, "NH-44");
        assert_eq!(lane.latitude, 28.1);
        assert_eq!(lane.longitude, 77.2);
        assert_eq!(lane.roughness, Some(2900.0));
        assert_eq!(lane.rut_depth, None);
        assert_eq!(lane.crack_area, None);
        assert_eq!(lane.ravelling, None);
    }

    #[test]
    fn slot_with_readings_but_no_gps_gets_fallback_coordinate() {
        // R2 rut depth sits at column 40 + 5.
        let table = RawTable::new(vec![data_row("NH-709", 4.0, 4.2, &[(45, number(7.5))])]);

        let summary = SurveyDecoder::standard().decode(&table);
        assert_eq!(summary.measurements.len(), 1);

        let lane = &summary.measurements[0];
        assert_eq!(lane.lane, LaneSlot::R2);
        assert_eq!(lane.latitude, FALLBACK_LATITUDE);
        assert_eq!(lane.longitude, FALLBACK_LONGITUDE);
        assert_eq!(lane.rut_depth, Some(7.5));
    }

    #[test]
    fn non_numeric_distress_cells_read_as_not_measured() {
        let table = RawTable::new(vec![data_row(
            "NH-44",
            10.0,
            10.5,
            &[(5, number(28.1)), (6, number(77.2)), (31, text("N/A"))],
        )]);

        let summary = SurveyDecoder::standard().decode(&table);
        let lane = &summary.measurements[0];
        assert_eq!(lane.roughness, None);
        assert_eq!(lane.latitude, 28.1);
    }

    #[test]
    fn short_rows_decode_without_panicking() {
        // Row ends right after the mandatory cells; every indexed offset
        // beyond that must read as absent.
        let table = RawTable::new(vec![vec![text("NH-27"), number(3.0), number(3.5)]]);

        let summary = SurveyDecoder::standard().decode(&table);
        assert!(summary.measurements.is_empty());
        assert_eq!(summary.skipped.total(), 0);
    }

    #[test]
    fn full_eight_lane_row_fans_out_in_slot_order() {
        let mut overrides = Vec::new();
        for index in 0..8 {
            overrides.push((31 + index, number(1000.0 + index as f64)));
        }
        let table = RawTable::new(vec![data_row("NH-48", 100.0, 100.5, &overrides)]);

        let summary = SurveyDecoder::standard().decode(&table);
        assert_eq!(summary.measurements.len(), 8);
        let slots: Vec<LaneSlot> = summary.measurements.iter().map(|m| m.lane).collect();
        assert_eq!(slots, LaneSlot::ALL);
        assert_eq!(summary.measurements[7].roughness, Some(1007.0));
    }
}
