//! Integration tests for the analysis pipeline with a scripted provider.
//!
//! The provider serves a 500-day series that rises 0.1% per day for 250 days
//! and then falls 0.1% per day, so the expected windows, curves and
//! recommendation are known in advance.

use chrono::{Duration, NaiveDate};
use std::sync::atomic::{AtomicUsize, Ordering};
use tsmom_core::data::{DataError, DataProvider, DataSource, FetchResult, ParquetPriceStore, RawQuote};
use tsmom_core::domain::CurveKind;
use tsmom_runner::{
    analyze_symbol, load_manifest, save_artifacts, AnalyzeError, LoadError, LoadOptions,
    PriceCache, Recommendation, TextRenderer, TsmomConfig,
};

struct ScriptedProvider {
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, _end: NaiveDate) -> Result<FetchResult, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if symbol == "NOPE" {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.into(),
            });
        }
        let mut price = 100.0;
        let quotes = (0..500)
            .map(|i| {
                if i > 0 {
                    price *= if i <= 250 { 1.001 } else { 0.999 };
                }
                RawQuote {
                    date: start + Duration::days(i),
                    close: price * 1.01,
                    adj_close: price,
                }
            })
            .collect();
        Ok(FetchResult {
            symbol: symbol.into(),
            quotes,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

fn opts() -> LoadOptions {
    LoadOptions::new(2, NaiveDate::from_ymd_opt(2024, 6, 28).unwrap())
}

#[test]
fn trend_reversal_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let store = ParquetPriceStore::new(dir.path().join("data"));
    let provider = ScriptedProvider::new();
    let mut cache = PriceCache::new();
    let config = TsmomConfig::default();

    let run = analyze_symbol("spy", &config, &mut cache, Some(&store), Some(&provider), &opts())
        .unwrap();

    assert_eq!(run.loaded.source, DataSource::YahooFinance);
    assert_eq!(run.result.symbol, "SPY");
    assert_eq!(run.performance.len(), 245);
    assert!(run.result.windows.robust < 250);
    assert!(run.result.turbo_robust.final_value() > run.result.hold.final_value());
    assert_eq!(run.report.recommendation, Recommendation::Short);
    assert!(run.report.excess_return_pct > 0.0);
    // Adjusted close wins over close.
    assert_eq!(run.loaded.series.prices()[0], 100.0);
    assert_eq!(run.report.last_date, opts().start() + Duration::days(499));
}

#[test]
fn second_run_is_served_from_caches() {
    let dir = tempfile::tempdir().unwrap();
    let store = ParquetPriceStore::new(dir.path());
    let provider = ScriptedProvider::new();
    let config = TsmomConfig::default();

    let mut cache = PriceCache::new();
    let first = analyze_symbol("SPY", &config, &mut cache, Some(&store), Some(&provider), &opts())
        .unwrap();
    let again = analyze_symbol("SPY", &config, &mut cache, Some(&store), Some(&provider), &opts())
        .unwrap();
    assert_eq!(again.loaded.source, DataSource::MemoryCache);

    let mut fresh_cache = PriceCache::new();
    let from_store =
        analyze_symbol("SPY", &config, &mut fresh_cache, Some(&store), Some(&provider), &opts())
            .unwrap();
    assert_eq!(from_store.loaded.source, DataSource::ParquetStore);

    assert_eq!(provider.calls(), 1);
    assert_eq!(first.loaded.dataset_hash, from_store.loaded.dataset_hash);
    assert_eq!(first.result, from_store.result);
}

#[test]
fn unknown_instrument_fails_without_partial_results() {
    let provider = ScriptedProvider::new();
    let mut cache = PriceCache::new();
    let config = TsmomConfig::default();

    for _ in 0..2 {
        let err = analyze_symbol("NOPE", &config, &mut cache, None, Some(&provider), &opts())
            .unwrap_err();
        assert!(matches!(
            err,
            AnalyzeError::Load(LoadError::InstrumentNotFound { .. })
        ));
    }
    assert_eq!(provider.calls(), 1);
}

#[test]
fn gate_can_be_disabled() {
    let provider = ScriptedProvider::new();
    let mut cache = PriceCache::new();
    let mut config = TsmomConfig::default();
    // Windows this long stay long through most of the decline and trail hold.
    config.analysis.scan.min_window = 250;
    config.analysis.scan.max_window = 254;

    let gated = analyze_symbol("SPY", &config, &mut cache, None, Some(&provider), &opts()).unwrap();
    assert_eq!(gated.report.recommendation, Recommendation::NotRecommended);

    config.report.gate_on_benchmark = false;
    let ungated = analyze_symbol("SPY", &config, &mut cache, None, Some(&provider), &opts()).unwrap();
    assert_ne!(ungated.report.recommendation, Recommendation::NotRecommended);
}

#[test]
fn artifacts_and_text_report() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new();
    let mut cache = PriceCache::new();
    let config = TsmomConfig::default();
    let run = analyze_symbol("^GSPC", &config, &mut cache, None, Some(&provider), &opts()).unwrap();

    let run_dir = save_artifacts(
        &run.report,
        &run.result,
        &config.render,
        &run.loaded.dataset_hash,
        &run.config_hash,
        dir.path(),
    )
    .unwrap();
    let name = run_dir.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("_GSPC_"));
    assert_eq!(name.len(), "_GSPC_".len() + 8);

    let csv = std::fs::read_to_string(run_dir.join("curves.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "date,safe_robust,turbo_robust,safe_peak,turbo_peak,hold"
    );
    assert_eq!(lines.count(), 499);

    let manifest = load_manifest(&run_dir).unwrap();
    assert_eq!(manifest.report, run.report);
    assert_eq!(manifest.render, config.render);
    assert_eq!(manifest.bars, 499);

    let text = TextRenderer::new(&config.render, &config.report.profile).render(&run.report);
    assert!(text.contains("^GSPC"));
    assert!(text.contains(config.render.label(CurveKind::TurboRobust)));
    assert!(text.contains("Recommendation: short"));
}
