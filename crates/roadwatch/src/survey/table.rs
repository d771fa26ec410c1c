/// A single spreadsheet cell as handed over by the table reader.
///
/// Cells carry no schema; meaning comes entirely from column position.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Lenient numeric view: text that parses as a float counts, anything
    /// else is treated as absent rather than an error.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            Cell::Text(text) => text.trim().parse::<f64>().ok(),
            Cell::Empty => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Rendering used by diagnostics and for mandatory cells that may hold
    /// either text or numbers (a numeric highway code is still a code).
    pub fn display(&self) -> String {
        match self {
            Cell::Number(value) => format!("{value}"),
            Cell::Text(text) => text.trim().to_string(),
            Cell::Empty => String::new(),
        }
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

/// An in-memory table of positional rows, the decoder's only input.
///
/// Rows are jagged: indexing past the end of a row yields an empty cell,
/// never an error, because survey exports routinely truncate trailing
/// blank columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest row in the table; jagged rows make this a maximum, not an
    /// invariant.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or_default()
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// Raised when the input cannot be read as a table at all. This is the
/// one fatal condition in the decode path; everything cell-level degrades
/// to absent values instead.
#[derive(Debug, thiserror::Error)]
pub enum TableReadError {
    #[error("could not read survey table: {0}")]
    Malformed(#[from] csv::Error),
    #[error("could not read survey input: {0}")]
    Io(#[from] std::io::Error),
}

/// Collaborator seam that materializes raw bytes into a [`RawTable`].
///
/// Container-format concerns (legacy binary workbooks vs. zip-based ones)
/// are resolved behind this trait; the decoder never sees them.
pub trait TableReader: Send + Sync {
    fn read(&self, bytes: &[u8]) -> Result<RawTable, TableReadError>;
}

/// Table reader for delimited text exports.
///
/// Runs with `flexible` record lengths and no header handling so the
/// decoder's own header detection stays in charge.
#[derive(Debug, Clone)]
pub struct DelimitedTableReader {
    delimiter: u8,
}

impl Default for DelimitedTableReader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl DelimitedTableReader {
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    fn cell_from_field(field: &str) -> Cell {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) => Cell::Number(value),
            Err(_) => Cell::Text(trimmed.to_string()),
        }
    }
}

impl TableReader for DelimitedTableReader {
    fn read(&self, bytes: &[u8]) -> Result<RawTable, TableReadError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(Self::cell_from_field).collect());
        }

        Ok(RawTable::new(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_numeric_view_is_lenient() {
        assert_eq!(Cell::Number(2.5).as_f64(), Some(2.5));
        assert_eq!(Cell::Text(" 3.25 ".to_string()).as_f64(), Some(3.25));
        assert_eq!(Cell::Text("n/a".to_string()).as_f64(), None);
        assert_eq!(Cell::Empty.as_f64(), None);
    }

    #[test]
    fn out_of_range_cells_read_as_empty() {
        let table = RawTable::new(vec![vec![Cell::Number(1.0)]]);
        assert_eq!(table.cell(0, 5), &Cell::Empty);
        assert_eq!(table.cell(9, 0), &Cell::Empty);
        assert_eq!(table.column_count(), 1);
    }

    #[test]
    fn delimited_reader_types_fields_by_content() {
        let table = DelimitedTableReader::default()
            .read(b"NH-44,10.0,,note\n1,2\n")
            .expect("readable table");

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, 0), &Cell::Text("NH-44".to_string()));
        assert_eq!(table.cell(0, 1), &Cell::Number(10.0));
        assert_eq!(table.cell(0, 2), &Cell::Empty);
        assert_eq!(table.cell(0, 3), &Cell::Text("note".to_string()));
        // Jagged second row still indexes safely.
        assert_eq!(table.cell(1, 3), &Cell::Empty);
    }

    #[test]
    fn delimited_reader_accepts_empty_input() {
        let table = DelimitedTableReader::default()
            .read(b"")
            .expect("empty input is a readable, empty table");
        assert_eq!(table.row_count(), 0);
    }
}
