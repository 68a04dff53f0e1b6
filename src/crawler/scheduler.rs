// crawler/scheduler.rs
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

use crate::config::City;
use crate::crawler::fetcher::{Fetcher, RequestProfile};
use crate::crawler::models::{CrawlReport, Page, PageFailure};
use crate::crawler::FetchError;
use crate::db::{CrawlLog, PageStore};
use crate::errors::ConfigError;
use crate::parser::ListingProbe;

/// How often one page may be attempted before it is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// At most this many attempts per page (a value of 0 still allows one).
    Limited(u32),
    /// Keep retrying the same page forever. A page that never validates
    /// stalls the crawl.
    Unbounded,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Limited(3)
    }
}

impl RetryPolicy {
    fn may_retry(self, attempts: u32) -> bool {
        match self {
            RetryPolicy::Limited(max) => attempts < max.max(1),
            RetryPolicy::Unbounded => true,
        }
    }
}

/// Random delay window, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Pacing {
    pub min_secs: f64,
    pub max_secs: f64,
}

/// Longest pause a pacing window may ask for.
pub const MAX_PACING_SECS: f64 = 3600.0;

impl Pacing {
    pub const fn none() -> Self {
        Self {
            min_secs: 0.0,
            max_secs: 0.0,
        }
    }

    /// Rejects windows that are negative, not finite, or longer than
    /// [`MAX_PACING_SECS`].
    pub fn validate(&self, field: &str) -> Result<(), ConfigError> {
        for (bound, v) in [("min_secs", self.min_secs), ("max_secs", self.max_secs)] {
            if !v.is_finite() || !(0.0..=MAX_PACING_SECS).contains(&v) {
                return Err(ConfigError::InvalidSetting {
                    field: format!("{field}.{bound}"),
                    message: format!("{v} is not within 0..={MAX_PACING_SECS} seconds"),
                });
            }
        }
        Ok(())
    }

    /// Random duration in the window. Out-of-range bounds are clamped.
    pub fn delay(&self) -> Duration {
        let clamp = |v: f64| {
            if v.is_finite() {
                v.clamp(0.0, MAX_PACING_SECS)
            } else {
                0.0
            }
        };
        let min = clamp(self.min_secs);
        let max = clamp(self.max_secs);
        let secs = if max > min {
            rand::thread_rng().gen_range(min..=max)
        } else {
            min
        };
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }

    fn wait(&self) {
        let d = self.delay();
        if !d.is_zero() {
            std::thread::sleep(d);
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Pages 1..=max_pages are requested; nothing beyond is discovered.
    pub max_pages: u32,
    pub retry: RetryPolicy,
    /// Before every request.
    pub pacing: Pacing,
    /// Extra pause after the first page.
    pub first_page_cooldown: Pacing,
    /// Appended to the city URL for pages 2+; "{}" becomes the index.
    pub page_suffix: String,
    pub request: RequestProfile,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            retry: RetryPolicy::default(),
            pacing: Pacing {
                min_secs: 1.0,
                max_secs: 3.0,
            },
            first_page_cooldown: Pacing {
                min_secs: 5.0,
                max_secs: 10.0,
            },
            page_suffix: "p{}/".to_string(),
            request: RequestProfile::default(),
        }
    }
}

impl CrawlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pacing.validate("crawl.pacing")?;
        self.first_page_cooldown.validate("crawl.first_page_cooldown")
    }

    pub fn page_url(&self, city: &City, index: u32) -> String {
        if index <= 1 {
            city.url.clone()
        } else {
            format!("{}{}", city.url, self.page_suffix.replace("{}", &index.to_string()))
        }
    }
}

/// Fetches a city's listing pages one at a time, politely.
pub struct CrawlScheduler<'a> {
    fetcher: &'a dyn Fetcher,
    probe: ListingProbe,
    store: &'a dyn PageStore,
    log: &'a dyn CrawlLog,
    cfg: CrawlConfig,
}

impl<'a> CrawlScheduler<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        probe: ListingProbe,
        store: &'a dyn PageStore,
        log: &'a dyn CrawlLog,
        cfg: CrawlConfig,
    ) -> Self {
        Self {
            fetcher,
            probe,
            store,
            log,
            cfg,
        }
    }

    /// Walks pages 1..=max_pages in order. A page that keeps failing is
    /// skipped once the retry policy gives up; the city carries on.
    pub fn fetch_city_pages(&self, city: &City) -> CrawlReport {
        let run_id = self.log.start(&city.code, Utc::now().timestamp());
        let mut report = CrawlReport {
            city: city.code.clone(),
            ..Default::default()
        };

        for index in 1..=self.cfg.max_pages {
            if index == 2 {
                self.cfg.first_page_cooldown.wait();
            }

            let url = self.cfg.page_url(city, index);
            tracing::info!(city = %city.code, page = index, %url, "fetching page");

            let mut attempts = 0u32;
            loop {
                self.cfg.pacing.wait();
                attempts += 1;

                match self.fetch_page(&url) {
                    Ok(content) => {
                        if let Err(e) = self.store.put(&city.code, index, &content) {
                            tracing::warn!(city = %city.code, page = index, "page not persisted: {e}");
                        }
                        tracing::info!(city = %city.code, page = index, attempts, "page fetched");
                        report.pages.push(Page {
                            city: city.code.clone(),
                            index,
                            content,
                        });
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(city = %city.code, page = index, attempts, "attempt failed: {e}");
                        if !self.cfg.retry.may_retry(attempts) {
                            tracing::error!(city = %city.code, page = index, attempts, "giving up on page");
                            self.log.page_failed(
                                run_id,
                                &city.code,
                                index,
                                attempts,
                                &e.to_string(),
                                Utc::now().timestamp(),
                            );
                            report.failures.push(PageFailure {
                                index,
                                attempts,
                                last_error: e,
                            });
                            break;
                        }
                    }
                }
            }
        }

        self.log.finish(
            run_id,
            Utc::now().timestamp(),
            report.pages_fetched(),
            report.pages_failed(),
        );
        tracing::info!(
            city = %city.code,
            fetched = report.pages_fetched(),
            failed = report.pages_failed(),
            "crawl finished"
        );
        report
    }

    /// One scheduler pass per city, each on its own thread. Reports come
    /// back in input order.
    pub fn fetch_cities_concurrently(&self, cities: &[&City]) -> Vec<CrawlReport> {
        std::thread::scope(|s| {
            let handles: Vec<_> = cities
                .iter()
                .map(|city| s.spawn(move || self.fetch_city_pages(city)))
                .collect();

            handles
                .into_iter()
                .zip(cities)
                .map(|(h, city)| {
                    h.join().unwrap_or_else(|_| {
                        tracing::error!(city = %city.code, "crawl thread panicked");
                        CrawlReport {
                            city: city.code.clone(),
                            ..Default::default()
                        }
                    })
                })
                .collect()
        })
    }

    fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let content = self.fetcher.fetch(url)?;
        if !self.probe.has_listings(&content) {
            return Err(FetchError::Invalid);
        }
        Ok(content)
    }
}
