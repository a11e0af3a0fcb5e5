//! Parquet price store with Hive-style partitioning.
//!
//! Layout: `{dir}/symbol={SYMBOL}/{year}.parquet` plus `meta.json`.
//!
//! - Writes replace the symbol's partitions atomically (write `.tmp`, rename)
//! - Loads validate schema and row count; corrupt files are quarantined
//! - The metadata sidecar records date range, row count, BLAKE3 hash and fetch time

use super::provider::{DataError, RawQuote};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Metadata sidecar for a stored symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub row_count: usize,
    pub data_hash: String,
    pub source: String,
    pub cached_at: NaiveDateTime,
}

/// How well the store covers a requested date range.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverageResult {
    NotCached,
    FullyCovered,
    PartiallyCovered {
        cached_start: NaiveDate,
        cached_end: NaiveDate,
    },
}

/// On-disk store of raw quotes per symbol.
#[derive(Debug, Clone)]
pub struct ParquetPriceStore {
    dir: PathBuf,
}

const COLUMNS: [&str; 3] = ["date", "close", "adj_close"];

impl ParquetPriceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn symbol_dir(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("symbol={symbol}"))
    }

    fn year_path(&self, symbol: &str, year: i32) -> PathBuf {
        self.symbol_dir(symbol).join(format!("{year}.parquet"))
    }

    fn meta_path(&self, symbol: &str) -> PathBuf {
        self.symbol_dir(symbol).join("meta.json")
    }

    /// Replace the stored quotes for `symbol`.
    pub fn write(&self, symbol: &str, quotes: &[RawQuote], source: &str) -> Result<(), DataError> {
        let (Some(first), Some(last)) = (quotes.first(), quotes.last()) else {
            return Err(DataError::CacheError("no quotes to store".into()));
        };

        let sym_dir = self.symbol_dir(symbol);
        fs::create_dir_all(&sym_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let mut by_year: HashMap<i32, Vec<&RawQuote>> = HashMap::new();
        for q in quotes {
            by_year.entry(q.date.year()).or_default().push(q);
        }

        for (year, year_quotes) in &by_year {
            let mut df = quotes_to_dataframe(year_quotes)?;
            let path = self.year_path(symbol, *year);
            let tmp_path = path.with_extension("parquet.tmp");

            write_parquet(&mut df, &tmp_path)?;

            fs::rename(&tmp_path, &path).map_err(|e| {
                let _ = fs::remove_file(&tmp_path);
                DataError::CacheError(format!("atomic rename failed: {e}"))
            })?;
        }

        // Partitions from an older, longer download would otherwise resurface.
        let written: BTreeSet<i32> = by_year.keys().copied().collect();
        for path in self.partition_paths(symbol)? {
            let stale = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<i32>().ok())
                .is_some_and(|year| !written.contains(&year));
            if stale {
                let _ = fs::remove_file(&path);
            }
        }

        let hash_input = serde_json::to_vec(quotes)
            .map_err(|e| DataError::CacheError(format!("hash serialization: {e}")))?;
        let meta = StoreMeta {
            symbol: symbol.to_string(),
            start_date: first.date,
            end_date: last.date,
            row_count: quotes.len(),
            data_hash: blake3::hash(&hash_input).to_hex().to_string(),
            source: source.to_string(),
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(symbol), meta_json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;

        debug!(symbol, rows = quotes.len(), "stored quotes");
        Ok(())
    }

    fn partition_paths(&self, symbol: &str) -> Result<Vec<PathBuf>, DataError> {
        let entries = fs::read_dir(self.symbol_dir(symbol))
            .map_err(|e| DataError::CacheError(format!("read dir: {e}")))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("parquet") {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// Load all stored quotes for a symbol, sorted by date ascending.
    pub fn load(&self, symbol: &str) -> Result<Vec<RawQuote>, DataError> {
        if !self.symbol_dir(symbol).exists() {
            return Err(DataError::NoStoredData {
                symbol: symbol.to_string(),
            });
        }

        let mut all = Vec::new();
        let mut quarantined = 0usize;
        for path in self.partition_paths(symbol)? {
            match load_and_validate_parquet(&path) {
                Ok(quotes) => all.extend(quotes),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "quarantining corrupt store file");
                    let _ = fs::rename(&path, path.with_extension("parquet.quarantined"));
                    quarantined += 1;
                }
            }
        }

        // A lost partition leaves a hole the meta sidecar knows nothing about;
        // dropping the sidecar marks the symbol as not stored.
        let short = self
            .get_meta(symbol)
            .is_some_and(|meta| meta.row_count != all.len());
        if quarantined > 0 || short {
            warn!(symbol, quarantined, rows = all.len(), "stored history incomplete");
            let _ = fs::remove_file(self.meta_path(symbol));
            return Err(DataError::IncompleteStore {
                symbol: symbol.to_string(),
            });
        }

        if all.is_empty() {
            return Err(DataError::NoStoredData {
                symbol: symbol.to_string(),
            });
        }

        all.sort_by_key(|q| q.date);
        Ok(all)
    }

    pub fn get_meta(&self, symbol: &str) -> Option<StoreMeta> {
        let content = fs::read_to_string(self.meta_path(symbol)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Whether stored data spans `[start, end]`.
    pub fn covers_range(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> CoverageResult {
        match self.get_meta(symbol) {
            None => CoverageResult::NotCached,
            Some(meta) if meta.start_date <= start && meta.end_date >= end => {
                CoverageResult::FullyCovered
            }
            Some(meta) => CoverageResult::PartiallyCovered {
                cached_start: meta.start_date,
                cached_end: meta.end_date,
            },
        }
    }

    /// Metadata of every stored symbol, sorted by symbol.
    pub fn list(&self) -> Vec<StoreMeta> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut metas: Vec<StoreMeta> = entries
            .flatten()
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                name.strip_prefix("symbol=").and_then(|s| self.get_meta(s))
            })
            .collect();
        metas.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        metas
    }

    /// Bytes on disk for a symbol.
    pub fn size_of(&self, symbol: &str) -> u64 {
        fs::read_dir(self.symbol_dir(symbol))
            .map(|entries| {
                entries
                    .flatten()
                    .filter_map(|e| e.metadata().ok())
                    .map(|m| m.len())
                    .sum()
            })
            .unwrap_or(0)
    }

    pub fn remove(&self, symbol: &str) -> Result<(), DataError> {
        let dir = self.symbol_dir(symbol);
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .map_err(|e| DataError::CacheError(format!("remove {symbol}: {e}")))?;
        }
        Ok(())
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn quotes_to_dataframe(quotes: &[&RawQuote]) -> Result<DataFrame, DataError> {
    let epoch = epoch();
    let dates: Vec<i32> = quotes
        .iter()
        .map(|q| (q.date - epoch).num_days() as i32)
        .collect();
    let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
    let adj_closes: Vec<f64> = quotes.iter().map(|q| q.adj_close).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
        Column::new("close".into(), closes),
        Column::new("adj_close".into(), adj_closes),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn load_and_validate_parquet(path: &Path) -> Result<Vec<RawQuote>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::ValidationError("empty parquet file".into()));
    }
    for col_name in COLUMNS {
        if df.column(col_name).is_err() {
            return Err(DataError::ValidationError(format!(
                "missing column '{col_name}'"
            )));
        }
    }

    dataframe_to_quotes(&df)
}

fn dataframe_to_quotes(df: &DataFrame) -> Result<Vec<RawQuote>, DataError> {
    let col = |name: &str| {
        df.column(name)
            .map_err(|e| DataError::ParquetError(format!("column read: {e}")))
    };

    let date_ca = col("date")?
        .date()
        .map_err(|e| DataError::ParquetError(format!("date column type: {e}")))?;
    let close_ca = col("close")?
        .f64()
        .map_err(|e| DataError::ParquetError(format!("close column type: {e}")))?;
    let adj_ca = col("adj_close")?
        .f64()
        .map_err(|e| DataError::ParquetError(format!("adj_close column type: {e}")))?;

    let epoch = epoch();
    (0..df.height())
        .map(|i| {
            let days = date_ca
                .get(i)
                .ok_or_else(|| DataError::ParquetError(format!("null date at row {i}")))?;
            Ok(RawQuote {
                date: epoch + chrono::Duration::days(days as i64),
                close: close_ca.get(i).unwrap_or(f64::NAN),
                adj_close: adj_ca.get(i).unwrap_or(f64::NAN),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_quotes() -> Vec<RawQuote> {
        vec![
            RawQuote {
                date: NaiveDate::from_ymd_opt(2023, 12, 29).unwrap(),
                close: 99.0,
                adj_close: 98.0,
            },
            RawQuote {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                close: 101.0,
                adj_close: f64::NAN,
            },
            RawQuote {
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                close: 102.0,
                adj_close: 101.5,
            },
        ]
    }

    #[test]
    fn write_and_load_roundtrip_across_years() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetPriceStore::new(dir.path());

        store.write("SPY", &sample_quotes(), "test").unwrap();
        let loaded = store.load("SPY").unwrap();

        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].date, NaiveDate::from_ymd_opt(2023, 12, 29).unwrap());
        assert_eq!(loaded[0].adj_close, 98.0);
        assert!(loaded[1].adj_close.is_nan());
        assert_eq!(loaded[2].close, 102.0);
    }

    #[test]
    fn rewrite_drops_stale_years() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetPriceStore::new(dir.path());

        store.write("SPY", &sample_quotes(), "test").unwrap();
        store.write("SPY", &sample_quotes()[1..], "test").unwrap();
        let loaded = store.load("SPY").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].date.year(), 2024);
    }

    #[test]
    fn load_missing_symbol_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetPriceStore::new(dir.path());
        assert!(matches!(
            store.load("NOPE").unwrap_err(),
            DataError::NoStoredData { .. }
        ));
    }

    #[test]
    fn meta_and_coverage() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetPriceStore::new(dir.path());
        store.write("SPY", &sample_quotes(), "yahoo_finance").unwrap();

        let meta = store.get_meta("SPY").unwrap();
        assert_eq!(meta.row_count, 3);
        assert_eq!(meta.source, "yahoo_finance");
        assert_eq!(meta.data_hash.len(), 64);

        let start = NaiveDate::from_ymd_opt(2023, 12, 29).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(store.covers_range("SPY", start, end), CoverageResult::FullyCovered);
        assert!(matches!(
            store.covers_range("SPY", start, end + chrono::Duration::days(5)),
            CoverageResult::PartiallyCovered { .. }
        ));
        assert_eq!(store.covers_range("QQQ", start, end), CoverageResult::NotCached);
    }

    #[test]
    fn corrupt_partition_is_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetPriceStore::new(dir.path());
        store.write("SPY", &sample_quotes(), "test").unwrap();

        let bad = store.year_path("SPY", 2023);
        fs::write(&bad, b"not parquet").unwrap();

        assert!(matches!(
            store.load("SPY").unwrap_err(),
            DataError::IncompleteStore { .. }
        ));
        assert!(bad.with_extension("parquet.quarantined").exists());
        // the sidecar no longer claims the lost year
        assert!(store.get_meta("SPY").is_none());
        assert_eq!(
            store.covers_range(
                "SPY",
                NaiveDate::from_ymd_opt(2023, 12, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
            ),
            CoverageResult::NotCached
        );
    }

    #[test]
    fn missing_partition_is_detected_by_row_count() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetPriceStore::new(dir.path());
        store.write("SPY", &sample_quotes(), "test").unwrap();

        fs::remove_file(store.year_path("SPY", 2024)).unwrap();

        assert!(matches!(
            store.load("SPY").unwrap_err(),
            DataError::IncompleteStore { .. }
        ));
    }

    #[test]
    fn list_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetPriceStore::new(dir.path());
        store.write("SPY", &sample_quotes(), "test").unwrap();
        store.write("QQQ", &sample_quotes(), "test").unwrap();

        let symbols: Vec<String> = store.list().into_iter().map(|m| m.symbol).collect();
        assert_eq!(symbols, vec!["QQQ", "SPY"]);
        assert!(store.size_of("SPY") > 0);

        store.remove("SPY").unwrap();
        assert_eq!(store.list().len(), 1);
    }
}
