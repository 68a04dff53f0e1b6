// runner.rs
use std::path::PathBuf;

use crate::config::{City, CityRegistry, Settings};
use crate::crawler::{CrawlReport, CrawlScheduler, Fetcher};
use crate::db::{CrawlLog, PageStore};
use crate::domain::{dedup_by_address, EnrichedRecord, ListingRecord};
use crate::errors::Result;
use crate::features::{FeatureMatrix, FeaturePipeline, PersistTarget, PipelineConfig, RawTable};
use crate::geo::{Enricher, Geocoder, PlaceCounter};
use crate::parser::{ListingProbe, PageDecoder};
use crate::spreadsheets;

/// What a city run produced and lost along the way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub records_decoded: usize,
    pub duplicates_dropped: usize,
    pub misalignments: usize,
    pub geocode_failures: usize,
    pub place_failures: usize,
}

#[derive(Debug, Clone)]
pub struct CityRun {
    pub city: City,
    pub records: Vec<EnrichedRecord>,
    pub table: RawTable,
    pub matrix: FeatureMatrix,
    pub summary: RunSummary,
}

/// Drives crawl -> decode -> dedup -> enrich -> table -> features for
/// registered cities. External capabilities are borrowed so tests can
/// swap in stubs.
pub struct Runner<'a> {
    settings: Settings,
    registry: CityRegistry,
    fetcher: &'a dyn Fetcher,
    store: &'a dyn PageStore,
    log: &'a dyn CrawlLog,
    geocoder: &'a dyn Geocoder,
    places: &'a dyn PlaceCounter,
    output_dir: Option<PathBuf>,
}

impl<'a> Runner<'a> {
    pub fn new(
        settings: Settings,
        fetcher: &'a dyn Fetcher,
        store: &'a dyn PageStore,
        log: &'a dyn CrawlLog,
        geocoder: &'a dyn Geocoder,
        places: &'a dyn PlaceCounter,
    ) -> Result<Self> {
        let registry = settings.registry()?;
        Ok(Self {
            settings,
            registry,
            fetcher,
            store,
            log,
            geocoder,
            places,
            output_dir: None,
        })
    }

    /// Persist `<code>.csv` (raw table), `<code>_simple.csv` (simple layout)
    /// and `<code>_features.csv` here.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn registry(&self) -> &CityRegistry {
        &self.registry
    }

    pub fn run_city(&self, code: &str) -> Result<CityRun> {
        let city = self.registry.get(code)?.clone();
        let scheduler = self.scheduler()?;
        let report = scheduler.fetch_city_pages(&city);
        self.finish_city(city, report)
    }

    /// Crawls all cities at once (one thread each), then processes them in
    /// the given order. Any unknown code fails before a request is sent.
    pub fn run_cities(&self, codes: &[&str]) -> Result<Vec<CityRun>> {
        let cities = codes
            .iter()
            .map(|code| self.registry.get(code))
            .collect::<std::result::Result<Vec<&City>, _>>()?;

        let scheduler = self.scheduler()?;
        let reports = scheduler.fetch_cities_concurrently(&cities);

        cities
            .into_iter()
            .zip(reports)
            .map(|(city, report)| self.finish_city(city.clone(), report))
            .collect()
    }

    /// Stacks several cities' raw tables for cross-city modelling.
    pub fn merge_tables(runs: &[CityRun]) -> RawTable {
        let tables: Vec<RawTable> = runs.iter().map(|r| r.table.clone()).collect();
        RawTable::concat(&tables)
    }

    fn scheduler(&self) -> Result<CrawlScheduler<'a>> {
        let probe = ListingProbe::new(&self.settings.locators)?;
        Ok(CrawlScheduler::new(
            self.fetcher,
            probe,
            self.store,
            self.log,
            self.settings.crawl.clone(),
        ))
    }

    fn finish_city(&self, city: City, mut report: CrawlReport) -> Result<CityRun> {
        let mut summary = RunSummary {
            pages_fetched: report.pages_fetched(),
            pages_failed: report.pages_failed(),
            ..Default::default()
        };

        // keep-first dedup below depends on page order
        report.pages.sort_by_key(|p| p.index);

        let decoder = PageDecoder::new(&self.settings.locators, self.settings.decode.clone())?;
        let mut records: Vec<ListingRecord> = Vec::new();
        for page in &report.pages {
            let decoded = decoder.decode_page(&page.content);
            tracing::debug!(
                city = %city.code,
                page = page.index,
                listings = decoded.listings,
                records = decoded.records.len(),
                "page decoded"
            );
            summary.records_decoded += decoded.records.len();
            summary.duplicates_dropped += decoded.duplicates;
            summary.misalignments += decoded.misalignments.len();
            records.extend(decoded.records);
        }

        let (records, dropped) = dedup_by_address(records);
        summary.duplicates_dropped += dropped;

        let enricher = Enricher::new(self.geocoder, self.places, self.settings.enrich.radius_m);
        let (records, stats) = enricher.enrich_all(records, &city);
        summary.geocode_failures = stats.geocode_failures;
        summary.place_failures = stats.place_failures;

        let table = RawTable::from_records(&records);

        let mut cfg = PipelineConfig::city58(Some(city.clone()));
        if let Some(dir) = &self.output_dir {
            spreadsheets::write_table_csv(&table, &dir.join(format!("{}.csv", city.code)))?;
            spreadsheets::write_table_csv(
                &RawTable::from_records_simple(&records),
                &dir.join(format!("{}_simple.csv", city.code)),
            )?;
            cfg = cfg.with_persist(PersistTarget {
                dir: dir.clone(),
                file_stem: format!("{}_features", city.code),
                xlsx: false,
            });
        }
        let matrix = FeaturePipeline::new(cfg)?.build(&table)?;

        tracing::info!(
            city = %city.code,
            pages_fetched = summary.pages_fetched,
            pages_failed = summary.pages_failed,
            records_decoded = summary.records_decoded,
            duplicates_dropped = summary.duplicates_dropped,
            misalignments = summary.misalignments,
            geocode_failures = summary.geocode_failures,
            place_failures = summary.place_failures,
            rows = table.n_rows(),
            "city run finished"
        );

        Ok(CityRun {
            city,
            records,
            table,
            matrix,
            summary,
        })
    }
}
