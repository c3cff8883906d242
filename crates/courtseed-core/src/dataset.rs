// Match table loading, filtering, and writing.
//
// The table keeps its header and every cell exactly as read so that columns
// the pipeline never touches are written back unchanged.

use std::io::{Read, Write};
use std::path::Path;

use tracing::warn;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const TOURNEY_NAME: &str = "tourney_name";
pub const ROUND: &str = "round";
pub const SCORE: &str = "score";
pub const WINNER_NAME: &str = "winner_name";
pub const LOSER_NAME: &str = "loser_name";
pub const WINNER_SEED: &str = "winner_seed";
pub const LOSER_SEED: &str = "loser_seed";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to access file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("required column `{column}` is missing from the match table")]
    MissingColumn { column: String },
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One row of the match table, as raw cells in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    cells: Vec<String>,
}

impl MatchRecord {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub fn cell(&self, idx: usize) -> Option<&str> {
        self.cells.get(idx).map(String::as_str)
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn set_cell(&mut self, idx: usize, value: impl Into<String>) {
        if let Some(cell) = self.cells.get_mut(idx) {
            *cell = value.into();
        }
    }
}

/// A header plus the ordered match rows beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTable {
    headers: Vec<String>,
    records: Vec<MatchRecord>,
}

impl MatchTable {
    pub fn new(headers: Vec<String>, records: Vec<MatchRecord>) -> Self {
        Self { headers, records }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, DatasetError> {
        self.column_index(name)
            .ok_or_else(|| DatasetError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Cell of `record` under `column`, or `None` if the column is absent.
    pub fn value<'a>(&self, record: &'a MatchRecord, column: &str) -> Option<&'a str> {
        self.column_index(column).and_then(|idx| record.cell(idx))
    }

    /// Rows whose `column` equals `value` exactly (case-sensitive).
    pub fn filter_eq(&self, column: &str, value: &str) -> Result<MatchTable, DatasetError> {
        let idx = self.require_column(column)?;
        let records = self
            .records
            .iter()
            .filter(|r| r.cell(idx) == Some(value))
            .cloned()
            .collect();
        Ok(MatchTable::new(self.headers.clone(), records))
    }

    /// Every match of one tournament, all rounds.
    pub fn tournament(&self, tourney_name: &str) -> Result<MatchTable, DatasetError> {
        self.filter_eq(TOURNEY_NAME, tourney_name)
    }

    /// Matches of one round label.
    pub fn round(&self, round: &str) -> Result<MatchTable, DatasetError> {
        self.filter_eq(ROUND, round)
    }
}

// ---------------------------------------------------------------------------
// Reader/writer-based loaders (enable testing without temp files)
// ---------------------------------------------------------------------------

pub fn load_match_table_from_reader<R: Read>(rdr: R) -> Result<MatchTable, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut records = Vec::new();
    for (line, result) in reader.records().enumerate() {
        match result {
            Ok(raw) => {
                records.push(MatchRecord::new(raw.iter().map(str::to_string).collect()));
            }
            Err(e) => {
                warn!("skipping malformed match row {}: {}", line + 1, e);
            }
        }
    }
    Ok(MatchTable::new(headers, records))
}

pub fn write_match_table_to_writer<W: Write>(table: &MatchTable, wtr: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(wtr);
    writer.write_record(table.headers())?;
    for record in table.records() {
        writer.write_record(record.cells())?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Load a match table from a CSV file.
pub fn load_match_table(path: &Path) -> Result<MatchTable, DatasetError> {
    let file = std::fs::File::open(path).map_err(|e| DatasetError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_match_table_from_reader(file).map_err(|e| DatasetError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Write a match table as CSV, creating parent directories as needed.
pub fn write_match_table(table: &MatchTable, path: &Path) -> Result<(), DatasetError> {
    let file = create_output_file(path)?;
    write_match_table_to_writer(table, file).map_err(|e| DatasetError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

pub(crate) fn create_output_file(path: &Path) -> Result<std::fs::File, DatasetError> {
    let io_err = |e| DatasetError::Io {
        path: path.display().to_string(),
        source: e,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::File::create(path).map_err(io_err)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
tourney_name,round,winner_name,loser_name,winner_seed,loser_seed,score
Us Open,R128,Alpha,Bravo,1,,6-4 6-3
Us Open,R64,Alpha,Charlie,1,5,6-2 6-2
Western & Southern Open,R128,Delta,Echo,,,7-6(4) 6-4
us open,R128,Foxtrot,Golf,,,6-0 6-0";

    #[test]
    fn loads_headers_and_rows() {
        let table = load_match_table_from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.headers().len(), 7);
        assert_eq!(table.len(), 4);
        assert_eq!(table.value(&table.records()[0], WINNER_NAME), Some("Alpha"));
        assert_eq!(table.value(&table.records()[0], LOSER_SEED), Some(""));
        assert_eq!(table.value(&table.records()[0], "surface"), None);
    }

    #[test]
    fn tournament_filter_is_exact_and_case_sensitive() {
        let table = load_match_table_from_reader(CSV.as_bytes()).unwrap();
        let us_open = table.tournament("Us Open").unwrap();
        assert_eq!(us_open.len(), 2);
        let r128 = us_open.round("R128").unwrap();
        assert_eq!(r128.len(), 1);
        assert_eq!(r128.value(&r128.records()[0], LOSER_NAME), Some("Bravo"));
    }

    #[test]
    fn filter_on_missing_column_fails() {
        let table = load_match_table_from_reader("a,b\n1,2".as_bytes()).unwrap();
        match table.tournament("Us Open") {
            Err(DatasetError::MissingColumn { column }) => assert_eq!(column, TOURNEY_NAME),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn malformed_rows_skipped() {
        let csv_data = "\
tourney_name,round,winner_name
Us Open,R128,Alpha
Us Open,R128
Us Open,R128,Charlie";
        let table = load_match_table_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(&table.records()[1], WINNER_NAME), Some("Charlie"));
    }

    #[test]
    fn written_table_reads_back_identically() {
        let table = load_match_table_from_reader(CSV.as_bytes()).unwrap();
        let mut buf = Vec::new();
        write_match_table_to_writer(&table, &mut buf).unwrap();
        let reread = load_match_table_from_reader(buf.as_slice()).unwrap();
        assert_eq!(reread, table);
    }

    #[test]
    fn set_cell_ignores_out_of_range() {
        let mut record = MatchRecord::new(vec!["a".into(), "b".into()]);
        record.set_cell(1, "z");
        record.set_cell(5, "ignored");
        assert_eq!(record.cells(), &["a".to_string(), "z".to_string()]);
    }
}
