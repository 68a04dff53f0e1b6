// parser/decoder.rs
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

use crate::domain::{dedup_by_address, FloorType, ListingRecord};
use crate::errors::ConfigError;
use crate::parser::locators::{CompiledLocators, LocatorTable};
use crate::parser::regroup::regroup;

/// Characters of unit text trailing each price/area value ("元/㎡", "㎡").
const UNIT_PRICE_SUFFIX_CHARS: usize = 3;
const AREA_SUFFIX_CHARS: usize = 1;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FloorLabels {
    pub low: String,
    pub mid: String,
    pub high: String,
}

impl Default for FloorLabels {
    fn default() -> Self {
        Self {
            low: FloorType::Low.label().to_string(),
            mid: FloorType::Mid.label().to_string(),
            high: FloorType::High.label().to_string(),
        }
    }
}

impl FloorLabels {
    fn classify(&self, prefix: &str) -> Option<FloorType> {
        if prefix == self.low {
            Some(FloorType::Low)
        } else if prefix == self.mid {
            Some(FloorType::Mid)
        } else if prefix == self.high {
            Some(FloorType::High)
        } else {
            None
        }
    }
}

/// Layout assumptions of the listing markup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Age is `reference_year - build year`.
    pub reference_year: i32,
    /// Address fragments per listing.
    pub address_stride: usize,
    /// Room-attribute fragments per listing ("3","室","2","厅","1","卫").
    pub room_stride: usize,
    /// Index of the floor fragment inside each listing's info group.
    pub floor_position: usize,
    pub subway_marker: String,
    /// Checked in order; the first tag match wins.
    pub housing_periods: Vec<String>,
    pub floor_labels: FloorLabels,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            reference_year: 2024,
            address_stride: 3,
            room_stride: 6,
            floor_position: 2,
            subway_marker: "近地铁".to_string(),
            housing_periods: vec!["满五年".to_string(), "满二年".to_string()],
            floor_labels: FloorLabels::default(),
        }
    }
}

/// A field stream whose length disagrees with the page's listing count.
/// Positions past the shorter side are left absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Misalignment {
    pub field: &'static str,
    pub expected: usize,
    pub actual: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DecodedPage {
    pub records: Vec<ListingRecord>,
    pub listings: usize,
    pub duplicates: usize,
    pub misalignments: Vec<Misalignment>,
}

pub struct PageDecoder {
    locators: CompiledLocators,
    cfg: DecodeConfig,
}

impl PageDecoder {
    pub fn new(locators: &LocatorTable, cfg: DecodeConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            locators: locators.compile()?,
            cfg,
        })
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.cfg
    }

    /// Decodes every listing on one page.
    ///
    /// Each attribute stream is read independently and lined up by position
    /// against the listing containers. A stream that is short, long, or not
    /// a whole number of groups leaves the affected fields absent; the page
    /// itself is never rejected. Duplicate addresses keep the first listing.
    pub fn decode_page(&self, html: &str) -> DecodedPage {
        let doc = Html::parse_document(html);
        let loc = &self.locators;
        let containers: Vec<ElementRef> = doc.select(&loc.container).collect();
        let n = containers.len();

        let mut page = DecodedPage {
            listings: n,
            ..Default::default()
        };
        let mut check = |field: &'static str, actual: usize| {
            if actual != n {
                page.misalignments.push(Misalignment {
                    field,
                    expected: n,
                    actual,
                });
            }
        };

        let total_prices: Vec<Option<f64>> = flat_texts(&doc, &loc.total_price)
            .iter()
            .map(|s| parse_number(s))
            .collect();
        check("total_price", total_prices.len());

        let unit_prices: Vec<Option<f64>> = flat_texts(&doc, &loc.unit_price)
            .iter()
            .map(|s| parse_number(drop_suffix(s, UNIT_PRICE_SUFFIX_CHARS)))
            .collect();
        check("unit_price", unit_prices.len());

        let areas: Vec<Option<f64>> = flat_texts(&doc, &loc.area)
            .iter()
            .map(|s| parse_number(drop_suffix(s, AREA_SUFFIX_CHARS)))
            .collect();
        check("area", areas.len());

        let communities = flat_texts(&doc, &loc.community);
        check("community", communities.len());

        let address_stream = flat_texts(&doc, &loc.address);
        let addresses = reconstruct_addresses(&address_stream, &communities, self.cfg.address_stride);
        if address_stream.len() % self.cfg.address_stride.max(1) != 0 {
            tracing::debug!(
                fragments = address_stream.len(),
                stride = self.cfg.address_stride,
                "address stream is not a whole number of groups"
            );
        }
        check("address", addresses.len());

        let room_stream = flat_texts(&doc, &loc.rooms);
        let room_counts = reconstruct_room_counts(&room_stream, self.cfg.room_stride);
        check("rooms", room_counts.len());

        let bedrooms = parse_counts(flat_texts(&doc, &loc.bedroom));
        check("bedroom", bedrooms.len());
        let living_rooms = parse_counts(flat_texts(&doc, &loc.living_room));
        check("living_room", living_rooms.len());
        let bathrooms = parse_counts(flat_texts(&doc, &loc.bathroom));
        check("bathroom", bathrooms.len());

        let orientations = flat_texts(&doc, &loc.orientation);
        check("orientation", orientations.len());

        let ages: Vec<Option<i32>> = flat_texts(&doc, &loc.build_year)
            .iter()
            .map(|s| parse_age(s, self.cfg.reference_year))
            .collect();
        check("build_year", ages.len());

        let mut records = Vec::with_capacity(n);
        for (i, container) in containers.iter().enumerate() {
            let tags = element_texts(*container, &loc.tags);
            let info = element_texts(*container, &loc.floor_info);
            let (floor_type, floor_total) = self.parse_floor(&info);

            records.push(ListingRecord {
                address: addresses.get(i).cloned(),
                community: communities.get(i).cloned(),
                total_price: total_prices.get(i).copied().flatten(),
                unit_price: unit_prices.get(i).copied().flatten(),
                area: areas.get(i).copied().flatten(),
                bedrooms: bedrooms.get(i).copied().flatten(),
                living_rooms: living_rooms.get(i).copied().flatten(),
                bathrooms: bathrooms.get(i).copied().flatten(),
                room_count: room_counts.get(i).copied(),
                orientation: orientations.get(i).cloned(),
                age: ages.get(i).copied().flatten(),
                floor_type,
                floor_total,
                housing_period: self.housing_period(&tags),
                near_subway: tags.iter().any(|t| *t == self.cfg.subway_marker),
            });
        }

        for m in &page.misalignments {
            tracing::warn!(
                field = m.field,
                expected = m.expected,
                actual = m.actual,
                "field stream misaligned with listing count"
            );
        }

        let (records, duplicates) = dedup_by_address(records);
        page.records = records;
        page.duplicates = duplicates;
        page
    }

    fn housing_period(&self, tags: &[String]) -> Option<String> {
        self.cfg
            .housing_periods
            .iter()
            .find(|p| tags.iter().any(|t| t == *p))
            .cloned()
    }

    /// Floor band from the first two characters of the floor fragment,
    /// floor total from all of its digits. No fragment: both absent.
    fn parse_floor(&self, info: &[String]) -> (Option<FloorType>, Option<u32>) {
        let Some(fragment) = info.get(self.cfg.floor_position) else {
            return (None, None);
        };
        let prefix: String = fragment.chars().take(2).collect();
        let floor_type = self.cfg.floor_labels.classify(&prefix);
        let digits: String = fragment.chars().filter(|c| c.is_ascii_digit()).collect();
        (floor_type, digits.parse().ok())
    }
}

/// Joins each address group and appends the community name at the same
/// index, when there is one.
pub fn reconstruct_addresses(stream: &[String], communities: &[String], stride: usize) -> Vec<String> {
    regroup(stream, stride)
        .groups
        .into_iter()
        .enumerate()
        .map(|(i, group)| {
            let mut addr = group.concat();
            if let Some(name) = communities.get(i) {
                addr.push_str(name);
            }
            addr
        })
        .collect()
}

/// Sums every digit character in each room group, so "3室2厅1卫" counts 6.
pub fn reconstruct_room_counts(stream: &[String], stride: usize) -> Vec<u32> {
    regroup(stream, stride)
        .groups
        .into_iter()
        .map(|group| {
            group
                .iter()
                .flat_map(|s| s.chars())
                .filter_map(|c| c.to_digit(10))
                .sum()
        })
        .collect()
}

fn flat_texts(doc: &Html, selector: &Selector) -> Vec<String> {
    doc.select(selector)
        .flat_map(|el| el.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn element_texts(scope: ElementRef, selector: &Selector) -> Vec<String> {
    scope
        .select(selector)
        .map(|el| el.text().flat_map(|t| t.split_whitespace()).collect::<String>())
        .collect()
}

fn drop_suffix(s: &str, n: usize) -> &str {
    let keep = s.chars().count().saturating_sub(n);
    match s.char_indices().nth(keep) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_counts(texts: Vec<String>) -> Vec<Option<u32>> {
    texts.iter().map(|s| s.trim().parse().ok()).collect()
}

/// `reference_year - year` when the fragment starts with a digit.
fn parse_age(s: &str, reference_year: i32) -> Option<i32> {
    let s = s.trim();
    if !s.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let year: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    year.parse::<i32>().ok().map(|y| reference_year - y)
}
