use serde::Serialize;

use super::decoder::{ColumnLegend, SurveyDecoder};
use super::table::RawTable;

const PREVIEW_ROWS: usize = 5;

/// Structural report over a raw table, for diagnosing malformed uploads
/// without running a full ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct TableDiagnostics {
    pub total_rows: usize,
    pub total_columns: usize,
    /// The first row rendered as text, usually the vendor's header band.
    pub header_row: Vec<String>,
    /// Row index where decoding would start, `None` when no highway code
    /// was found in the scan window.
    pub data_start_row: Option<usize>,
    pub first_data_row: Option<Vec<String>>,
    pub preview: Vec<Vec<String>>,
    pub column_legend: ColumnLegend,
}

/// Renders what the decoder sees, straight off the declarative column map.
pub fn diagnose(table: &RawTable, decoder: &SurveyDecoder) -> TableDiagnostics {
    let data_start_row = decoder.find_data_start(table);

    TableDiagnostics {
        total_rows: table.row_count(),
        total_columns: table.column_count(),
        header_row: render_row(table, 0),
        data_start_row,
        first_data_row: data_start_row.map(|row| render_row(table, row)),
        preview: (0..table.row_count().min(PREVIEW_ROWS))
            .map(|row| render_row(table, row))
            .collect(),
        column_legend: decoder.columns().legend(),
    }
}

fn render_row(table: &RawTable, row: usize) -> Vec<String> {
    table
        .row(row)
        .map(|cells| cells.iter().map(|cell| cell.display()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::table::Cell;

    #[test]
    fn diagnostics_report_structure_and_data_start() {
        let table = RawTable::new(vec![
            vec![
                Cell::Text("NH Number".to_string()),
                Cell::Text("Start".to_string()),
                Cell::Text("End".to_string()),
            ],
            vec![
                Cell::Text("NH-44".to_string()),
                Cell::Number(10.0),
                Cell::Number(10.5),
            ],
        ]);

        let diagnostics = diagnose(&table, &SurveyDecoder::standard());
        assert_eq!(diagnostics.total_rows, 2);
        assert_eq!(diagnostics.total_columns, 3);
        assert_eq!(diagnostics.header_row, ["NH Number", "Start", "End"]);
        // The vendor header itself contains "NH", which is exactly the
        // degenerate case this endpoint exists to expose.
        assert_eq!(diagnostics.data_start_row, Some(0));
        assert_eq!(diagnostics.preview.len(), 2);
        assert_eq!(diagnostics.column_legend.roughness, "columns 31-38");
    }

    #[test]
    fn header_only_table_reports_no_data_start() {
        let table = RawTable::new(vec![vec![Cell::Text("Survey Report".to_string())]]);
        let diagnostics = diagnose(&table, &SurveyDecoder::standard());
        assert_eq!(diagnostics.data_start_row, None);
        assert!(diagnostics.first_data_row.is_none());
    }

    #[test]
    fn empty_table_produces_empty_views() {
        let diagnostics = diagnose(&RawTable::default(), &SurveyDecoder::standard());
        assert_eq!(diagnostics.total_rows, 0);
        assert!(diagnostics.header_row.is_empty());
        assert!(diagnostics.preview.is_empty());
    }
}
