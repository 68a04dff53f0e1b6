use crate::config::{City, Settings};
use crate::crawler::{CrawlConfig, FetchError, Fetcher, Pacing, RetryPolicy};
use crate::db::connection::Database;
use crate::geo::{Coordinate, EnrichError, Geocoder, PlaceCounter, PoiCategory};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

/// Fresh SQLite file in its own temp dir. Keep the `TempDir` alive for the
/// duration of the test.
pub fn init_test_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
    let db = Database::new(dir.path().join("test_db.sqlite3"));
    db.init()
        .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    (dir, db)
}

pub fn test_city() -> City {
    City {
        code: "XX".to_string(),
        name: "测试市".to_string(),
        url: "https://xx.58.com/ershoufang/".to_string(),
        center: Coordinate::new(0.0, 0.0),
    }
}

pub fn fast_crawl(max_pages: u32, retry: RetryPolicy) -> CrawlConfig {
    CrawlConfig {
        max_pages,
        retry,
        pacing: Pacing::none(),
        first_page_cooldown: Pacing::none(),
        ..Default::default()
    }
}

pub fn test_settings(max_pages: u32) -> Settings {
    Settings {
        crawl: fast_crawl(max_pages, RetryPolicy::Limited(1)),
        cities: vec![test_city()],
        ..Default::default()
    }
}

/// Field values for one synthetic listing card.
#[derive(Debug, Clone)]
pub struct Card {
    pub address: [&'static str; 3],
    pub community: &'static str,
    pub total_price: &'static str,
    pub unit_price: &'static str,
    pub area: &'static str,
    pub rooms: [&'static str; 3],
    pub orientation: &'static str,
    pub floor: &'static str,
    pub build_year: &'static str,
    pub tags: Vec<&'static str>,
}

impl Default for Card {
    fn default() -> Self {
        Self {
            address: ["锦江", "春熙路", "红星路"],
            community: "阳光小区",
            total_price: "250",
            unit_price: "13400元/㎡",
            area: "89.5㎡",
            rooms: ["3", "2", "1"],
            orientation: "南北",
            floor: "中层(共18层)",
            build_year: "2005年建造",
            tags: vec!["近地铁", "满五年"],
        }
    }
}

/// Markup of one listing card in the 58.com second-hand layout.
pub fn card_html(card: &Card) -> String {
    let address: String = card
        .address
        .iter()
        .map(|a| format!("<span>{a}</span>"))
        .collect();
    let tags: String = card
        .tags
        .iter()
        .map(|t| format!(r#"<span class="property-content-info-tag">{t}</span>"#))
        .collect();
    let [bed, living, bath] = card.rooms;
    format!(
        r#"<div class="property">
  <div class="property-content">
    <div class="property-content-info">
      <p class="property-content-info-text property-content-info-attribute"><span>{bed}</span><span>室</span><span>{living}</span><span>厅</span><span>{bath}</span><span>卫</span></p>
      <p class="property-content-info-text">{area}</p>
      <p class="property-content-info-text">{orientation}</p>
      <p class="property-content-info-text">{floor}</p>
      <p class="property-content-info-text">{build_year}</p>
    </div>
    <div class="property-content-info-comm">
      <p class="property-content-info-comm-name">{community}</p>
      <p class="property-content-info-comm-address">{address}</p>
    </div>
    <div class="property-content-info-tags">{tags}</div>
  </div>
  <div class="property-price">
    <p class="property-price-total"><span class="property-price-total-num">{total}</span><span class="property-price-total-text">万</span></p>
    <p class="property-price-average">{unit}</p>
  </div>
</div>"#,
        area = card.area,
        orientation = card.orientation,
        floor = card.floor,
        build_year = card.build_year,
        community = card.community,
        total = card.total_price,
        unit = card.unit_price,
    )
}

pub fn page_html(cards: &[Card]) -> String {
    let body: String = cards.iter().map(card_html).collect::<Vec<_>>().join("\n");
    format!("<html><body><section class=\"list\">{body}</section></body></html>")
}

/// Serves canned content per URL. Each URL can be made to fail a number
/// of times before it answers; unknown URLs answer with an empty page.
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, String>,
    failures: Mutex<HashMap<String, u32>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    pub fn fail_first(self, url: &str, times: u32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(url.to_string(), times);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(left) = self.failures.lock().unwrap().get_mut(url) {
            if *left > 0 {
                *left -= 1;
                return Err(FetchError::Transport("connection reset".into()));
            }
        }
        Ok(self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }
}

/// Looks addresses up in a fixed table; anything else fails.
#[derive(Default)]
pub struct FixedGeocoder {
    known: HashMap<String, Coordinate>,
}

impl FixedGeocoder {
    pub fn with(mut self, address: &str, at: Coordinate) -> Self {
        self.known.insert(address.to_string(), at);
        self
    }
}

impl Geocoder for FixedGeocoder {
    fn geocode(&self, address: &str, _city_name: &str) -> Result<Coordinate, EnrichError> {
        self.known
            .get(address)
            .copied()
            .ok_or_else(|| EnrichError::Geocode(format!("no match for {address}")))
    }
}

/// Same count for every category, or a failure for one of them.
pub struct ConstPlaces {
    pub count: u32,
    pub failing: Option<PoiCategory>,
}

impl ConstPlaces {
    pub fn new(count: u32) -> Self {
        Self {
            count,
            failing: None,
        }
    }
}

impl PlaceCounter for ConstPlaces {
    fn place_count(
        &self,
        _at: Coordinate,
        category: PoiCategory,
        _radius_m: u32,
    ) -> Result<u32, EnrichError> {
        if self.failing == Some(category) {
            return Err(EnrichError::PlaceLookup("quota exceeded".into()));
        }
        Ok(self.count)
    }
}
