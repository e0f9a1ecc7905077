//! Delimited-table ingestion and row normalisation.
//!
//! Reads an observations table with arbitrary column spellings, resolves its
//! headers onto canonical keys once, and converts every row into a
//! [`Record`]. The resulting [`Dataset`] is built entirely off to the side;
//! callers decide whether to publish it.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use climate_core::error::{ClimateError, Result};
use climate_core::models::{Dataset, LoadSummary, Record};
use climate_core::parsing::{parse_number, DateParser};
use climate_core::variables::{is_structural_key, DATE_KEY, HEADER_ALIASES, LAT_KEY, LON_KEY};
use tracing::{debug, info};

// ── CancelFlag ────────────────────────────────────────────────────────────────

/// Shared flag a caller raises to abort an in-flight ingestion.
///
/// Cloning shares the underlying flag. The default flag is never raised.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ── Ingested ──────────────────────────────────────────────────────────────────

/// A freshly built dataset plus the report describing how it was built.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub dataset: Dataset,
    pub summary: LoadSummary,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Open `path` and ingest it with [`read_dataset`].
pub fn load_dataset(path: &Path, cancel: &CancelFlag) -> Result<Ingested> {
    let file = File::open(path).map_err(|source| ClimateError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Reading observations from {}", path.display());
    read_dataset(file, cancel)
}

/// Ingest a delimited table from any byte stream.
///
/// The delimiter is `;` when the first line contains one, `,` otherwise.
/// Cells that are not valid UTF-8 are decoded as Latin-1. Rows with a
/// missing or unparseable date are dropped. Any I/O failure aborts the whole
/// pass, as does raising `cancel`; the flag is checked before every read from
/// `source`, per row, and once more after the last row.
pub fn read_dataset<R: Read>(source: R, cancel: &CancelFlag) -> Result<Ingested> {
    if cancel.is_cancelled() {
        return Err(ClimateError::Cancelled);
    }

    let source = CancellableRead {
        inner: source,
        cancel,
    };
    read_rows(source, cancel).map_err(|e| {
        if cancel.is_cancelled() {
            ClimateError::Cancelled
        } else {
            e
        }
    })
}

fn read_rows<R: Read>(source: R, cancel: &CancelFlag) -> Result<Ingested> {
    let mut buffered = BufReader::new(source);
    let mut first_line = Vec::new();
    buffered.read_until(b'\n', &mut first_line)?;
    let delimiter = detect_delimiter(&first_line);

    let stream = Cursor::new(first_line).chain(buffered);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(stream);

    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| decode_cell(h).into_owned())
        .collect();
    let header_map = HeaderMap::resolve(&headers);

    let mut records: Vec<Record> = Vec::new();
    let mut rows_read = 0usize;
    let mut raw = csv::ByteRecord::new();

    while reader.read_byte_record(&mut raw)? {
        if cancel.is_cancelled() {
            debug!(rows_read, "ingestion cancelled");
            return Err(ClimateError::Cancelled);
        }
        rows_read += 1;

        let row: csv::StringRecord = raw.iter().map(decode_cell).collect();
        match header_map.normalize(&row) {
            Some(record) => records.push(record),
            None => debug!(
                row = rows_read,
                "dropping row without a parseable date: {:?}",
                header_map.cell(&row, DATE_KEY)
            ),
        }
    }

    // The final read may have returned after the flag was raised.
    if cancel.is_cancelled() {
        debug!(rows_read, "ingestion cancelled at end of input");
        return Err(ClimateError::Cancelled);
    }

    let dataset = Dataset::from_records(records);
    let variables: Vec<String> = dataset.variables().iter().cloned().collect();

    info!(
        "Dataset loaded: {} rows; vars: {}",
        dataset.len(),
        variables.join(", ")
    );

    let summary = LoadSummary {
        rows_read,
        rows_kept: dataset.len(),
        rows_dropped: rows_read - dataset.len(),
        delimiter,
        header_map: header_map.source_names(),
        variables,
    };

    Ok(Ingested { dataset, summary })
}

/// `;` when the first line contains a semicolon, `,` otherwise.
pub fn detect_delimiter<B: AsRef<[u8]> + ?Sized>(first_line: &B) -> char {
    if first_line.as_ref().contains(&b';') {
        ';'
    } else {
        ','
    }
}

/// UTF-8 when the bytes are valid UTF-8, Latin-1 otherwise.
pub fn decode_cell(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

/// Refuses further reads from `inner` once `cancel` is raised.
struct CancellableRead<'c, R> {
    inner: R,
    cancel: &'c CancelFlag,
}

impl<R: Read> Read for CancellableRead<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.cancel.is_cancelled() {
            return Err(std::io::Error::other("ingestion cancelled"));
        }
        self.inner.read(buf)
    }
}

// ── HeaderMap ─────────────────────────────────────────────────────────────────

/// Resolved mapping from canonical keys to source columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap {
    /// Canonical key → (column index, trimmed source header).
    columns: BTreeMap<&'static str, (usize, String)>,
}

impl HeaderMap {
    /// Resolve `headers` against [`HEADER_ALIASES`].
    ///
    /// For each canonical key in table order, the first header whose
    /// trimmed, lowercased text is one of the key's aliases is taken. Every
    /// key lists itself as an alias, so a header spelled exactly like a key
    /// always maps to it.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Self {
        let trimmed: Vec<&str> = headers.iter().map(|h| h.as_ref().trim()).collect();
        let lowered: Vec<String> = trimmed.iter().map(|h| h.to_lowercase()).collect();
        let mut columns: BTreeMap<&'static str, (usize, String)> = BTreeMap::new();

        for (canon, aliases) in HEADER_ALIASES {
            if let Some(idx) = lowered.iter().position(|h| aliases.contains(&h.as_str())) {
                columns.insert(*canon, (idx, trimmed[idx].to_string()));
            }
        }

        Self { columns }
    }

    /// Column index mapped to `key`, if any.
    pub fn column(&self, key: &str) -> Option<usize> {
        self.columns.get(key).map(|(idx, _)| *idx)
    }

    /// Canonical key → source header text.
    pub fn source_names(&self) -> BTreeMap<String, String> {
        self.columns
            .iter()
            .map(|(key, (_, name))| (key.to_string(), name.clone()))
            .collect()
    }

    /// Raw cell for `key` in `row`; `None` when unmapped, missing or empty.
    pub fn cell<'r>(&self, row: &'r csv::StringRecord, key: &str) -> Option<&'r str> {
        self.column(key)
            .and_then(|idx| row.get(idx))
            .filter(|cell| !cell.is_empty())
    }

    /// Convert one source row into a [`Record`].
    ///
    /// Returns `None` when the date cell is missing or unparseable. Numeric
    /// cells that cannot be read become `None` values.
    pub fn normalize(&self, row: &csv::StringRecord) -> Option<Record> {
        let date = DateParser::parse(self.cell(row, DATE_KEY)?)?;

        let mut record = Record::new(date);
        record.lat = self.cell(row, LAT_KEY).and_then(parse_number);
        record.lon = self.cell(row, LON_KEY).and_then(parse_number);

        for (key, (idx, _)) in &self.columns {
            if is_structural_key(key) {
                continue;
            }
            let value = row.get(*idx).and_then(parse_number);
            record.values.insert(key.to_string(), value);
        }

        Some(record)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn ingest(text: &str) -> Ingested {
        read_dataset(text.as_bytes(), &CancelFlag::new()).expect("ingestion should succeed")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Serves `data` and then fails once `fail_after` bytes have been read.
    struct FailingReader {
        data: Cursor<Vec<u8>>,
        remaining: usize,
    }

    impl FailingReader {
        fn new(data: &str, fail_after: usize) -> Self {
            Self {
                data: Cursor::new(data.as_bytes().to_vec()),
                remaining: fail_after,
            }
        }
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.remaining == 0 {
                return Err(std::io::Error::other("stream reset"));
            }
            let limit = buf.len().min(self.remaining);
            let n = self.data.read(&mut buf[..limit])?;
            self.remaining -= n;
            Ok(n)
        }
    }

    /// Serves `data`, then sleeps for `stall` before reporting end of input.
    struct StallingEof {
        data: Cursor<Vec<u8>>,
        stall: Duration,
    }

    impl Read for StallingEof {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.data.read(buf)?;
            if n == 0 {
                std::thread::sleep(self.stall);
            }
            Ok(n)
        }
    }

    /// Delivers the header, raises the flag, then would keep serving rows.
    struct CancelsAfterHeader {
        header: Option<Vec<u8>>,
        cancel: CancelFlag,
    }

    impl Read for CancelsAfterHeader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if let Some(header) = self.header.take() {
                buf[..header.len()].copy_from_slice(&header);
                self.cancel.cancel();
                return Ok(header.len());
            }
            let row = b"2020-01-01,1\n";
            buf[..row.len()].copy_from_slice(row);
            Ok(row.len())
        }
    }

    // ── detect_delimiter ──────────────────────────────────────────────────────

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("date;temp;lat"), ';');
        assert_eq!(detect_delimiter("date,temp,lat"), ',');
        assert_eq!(detect_delimiter(""), ',');
        assert_eq!(detect_delimiter(b"a;b".as_slice()), ';');
    }

    // ── decode_cell ───────────────────────────────────────────────────────────

    #[test]
    fn test_decode_cell_falls_back_to_latin1() {
        assert_eq!(decode_cell(b"plain"), "plain");
        assert_eq!(decode_cell("S\u{e3}o".as_bytes()), "S\u{e3}o");
        assert_eq!(decode_cell(b"S\xE3o"), "S\u{e3}o");
        assert_eq!(decode_cell(b"(\xB0C)"), "(\u{b0}C)");
    }

    // ── HeaderMap ─────────────────────────────────────────────────────────────

    #[test]
    fn test_header_aliases_case_insensitive_and_trimmed() {
        let map = HeaderMap::resolve(&[" ValidDate ", "Latitude", "LNG", "Temperature(°C)", "RH"]);
        assert_eq!(map.column("date"), Some(0));
        assert_eq!(map.column("lat"), Some(1));
        assert_eq!(map.column("lon"), Some(2));
        assert_eq!(map.column("temperature"), Some(3));
        assert_eq!(map.column("humidity"), Some(4));
        assert_eq!(map.source_names()["date"], "ValidDate");
    }

    #[test]
    fn test_header_first_alias_match_wins() {
        let map = HeaderMap::resolve(&["date", "temp", "temperature"]);
        assert_eq!(map.column("temperature"), Some(1));
    }

    #[test]
    fn test_headers_named_after_keys_resolve() {
        let keys: Vec<&str> = HEADER_ALIASES.iter().map(|(key, _)| *key).collect();
        let map = HeaderMap::resolve(&keys);
        for (idx, key) in keys.iter().enumerate() {
            assert_eq!(map.column(key), Some(idx), "{key}");
        }
    }

    #[test]
    fn test_unknown_headers_ignored() {
        let map = HeaderMap::resolve(&["date", "station_id", "pressure"]);
        assert_eq!(map.source_names().len(), 1);
        assert_eq!(map.column("pressure"), None);
    }

    // ── read_dataset ──────────────────────────────────────────────────────────

    #[test]
    fn test_read_comma_separated() {
        let ing = ingest(
            "date,lat,lon,temp,prcp\n\
             2020-01-01,10.5,20.25,15.5,0\n\
             2020-01-02,10.5,20.25,16,\n",
        );
        let records = ing.dataset.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, date(2020, 1, 1));
        assert_eq!(records[0].lat, Some(10.5));
        assert_eq!(records[0].lon, Some(20.25));
        assert_eq!(records[0].value("temperature"), Some(15.5));
        assert_eq!(records[0].value("precipitation"), Some(0.0));
        assert_eq!(records[1].value("precipitation"), None);
        assert_eq!(ing.summary.delimiter, ',');
        assert_eq!(ing.summary.variables, vec!["precipitation", "temperature"]);
    }

    #[test]
    fn test_read_semicolon_with_decimal_comma() {
        let ing = ingest(
            "Date;Latitude;Longitude;Temperature_C;Wind_Speed\n\
             2021-06-01;-33,92;18,42;21,5;12,25\n",
        );
        let r = &ing.dataset.records()[0];
        assert_eq!(ing.summary.delimiter, ';');
        assert_eq!(r.lat, Some(-33.92));
        assert_eq!(r.lon, Some(18.42));
        assert_eq!(r.value("temperature"), Some(21.5));
        assert_eq!(r.value("wind"), Some(12.25));
    }

    #[test]
    fn test_rows_with_bad_or_missing_dates_dropped() {
        let ing = ingest(
            "date,temp\n\
             2020-01-01,1\n\
             not-a-date,2\n\
             ,3\n\
             2020-01-04,4\n",
        );
        assert_eq!(ing.dataset.len(), 2);
        assert_eq!(ing.summary.rows_read, 4);
        assert_eq!(ing.summary.rows_kept, 2);
        assert_eq!(ing.summary.rows_dropped, 2);
        assert!(ing.dataset.records().iter().all(|r| r.value("temperature").is_some()));
    }

    #[test]
    fn test_non_numeric_cells_become_null_and_are_not_discovered() {
        let ing = ingest(
            "date,temp,snow\n\
             2020-01-01,abc,\n\
             2020-01-02,,n/a\n",
        );
        assert_eq!(ing.dataset.len(), 2);
        assert!(ing.dataset.variables().is_empty());
        assert_eq!(ing.dataset.records()[0].value("temperature"), None);
    }

    #[test]
    fn test_short_rows_tolerated() {
        let ing = ingest("date,lat,lon,temp\n2020-01-01,1\n");
        let r = &ing.dataset.records()[0];
        assert_eq!(r.lat, Some(1.0));
        assert_eq!(r.lon, None);
        assert_eq!(r.value("temperature"), None);
    }

    #[test]
    fn test_empty_source_yields_empty_dataset() {
        let ing = ingest("");
        assert!(ing.dataset.is_empty());
        assert_eq!(ing.summary.rows_read, 0);
    }

    #[test]
    fn test_ingestion_order_preserved() {
        let ing = ingest("date,temp\n2022-05-01,3\n2020-05-01,1\n2021-05-01,2\n");
        let values: Vec<f64> = ing
            .dataset
            .records()
            .iter()
            .filter_map(|r| r.value("temperature"))
            .collect();
        assert_eq!(values, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_stream_failure_mid_read_is_an_error() {
        let mut text = String::from("date,temp\n");
        for day in 1..=28 {
            text.push_str(&format!("2020-02-{day:02},{day}\n"));
        }
        let reader = FailingReader::new(&text, 64);
        let err = read_dataset(reader, &CancelFlag::new()).unwrap_err();
        assert!(err.to_string().contains("stream reset"), "{err}");
    }

    #[test]
    fn test_latin1_cells_do_not_fail_the_load() {
        let bytes = b"date,station,temp\n2020-01-01,S\xE3o,21.5\n2020-01-02,Bel\xE9m,22\n";
        let ing = read_dataset(bytes.as_slice(), &CancelFlag::new()).unwrap();
        assert_eq!(ing.dataset.len(), 2);
        assert_eq!(ing.dataset.records()[0].value("temperature"), Some(21.5));
        assert_eq!(ing.dataset.records()[1].value("temperature"), Some(22.0));
    }

    #[test]
    fn test_latin1_header_matches_alias() {
        let bytes = b"date;Temperature(\xB0C)\n2020-01-01;21,5\n";
        let ing = read_dataset(bytes.as_slice(), &CancelFlag::new()).unwrap();
        assert_eq!(ing.dataset.records()[0].value("temperature"), Some(21.5));
        assert_eq!(ing.summary.header_map["temperature"], "Temperature(\u{b0}C)");
    }

    #[test]
    fn test_cancel_during_final_read_is_honoured() {
        let flag = CancelFlag::new();
        let source = StallingEof {
            data: Cursor::new(b"date,temp\n2020-01-01,1\n2020-01-02,2\n2020-01-03,3\n".to_vec()),
            stall: Duration::from_millis(300),
        };
        let canceller = flag.clone();
        let trigger = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            canceller.cancel();
        });
        let err = read_dataset(source, &flag).unwrap_err();
        trigger.join().unwrap();
        assert!(matches!(err, ClimateError::Cancelled), "{err}");
    }

    #[test]
    fn test_no_read_after_cancel() {
        let flag = CancelFlag::new();
        let source = CancelsAfterHeader {
            header: Some(b"date,temp\n".to_vec()),
            cancel: flag.clone(),
        };
        let err = read_dataset(source, &flag).unwrap_err();
        assert!(matches!(err, ClimateError::Cancelled), "{err}");
    }

    #[test]
    fn test_cancelled_before_start() {
        let flag = CancelFlag::new();
        flag.cancel();
        let err = read_dataset("date,temp\n2020-01-01,1\n".as_bytes(), &flag).unwrap_err();
        assert!(matches!(err, ClimateError::Cancelled));
    }

    #[test]
    fn test_cancel_flag_shared_between_clones() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!flag.is_cancelled());
        clone.cancel();
        assert!(flag.is_cancelled());
    }

    // ── load_dataset ──────────────────────────────────────────────────────────

    #[test]
    fn test_load_dataset_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("obs.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "date;rain").unwrap();
        writeln!(file, "2019-11-03;4,5").unwrap();
        drop(file);

        let ing = load_dataset(&path, &CancelFlag::new()).unwrap();
        assert_eq!(ing.dataset.records()[0].value("precipitation"), Some(4.5));
    }

    #[test]
    fn test_load_dataset_missing_file() {
        let err = load_dataset(Path::new("/tmp/does-not-exist-climate-xyz.csv"), &CancelFlag::new())
            .unwrap_err();
        assert!(matches!(err, ClimateError::FileRead { .. }));
    }
}
