use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

// Internal modules (private)
mod dashboard;
mod geocode_cache;
mod geocoding;
mod loader;
mod map_view;
mod pipeline;
mod record;
mod throttle;

// Re-export public types
pub use dashboard::Dashboard;
pub use geocode_cache::{CacheEntry, GeocodeCache};
pub use geocoding::{Geocoder, NominatimGeocoder, NOMINATIM_URL};
pub use loader::{load_records, parse_records, LoadError};
pub use map_view::{popup_html, MapMarker, MapView, MAP_CENTER, MAP_ZOOM};
pub use pipeline::{GeocodePipeline, GeocodeStats};
pub use record::{BusinessRecord, Coordinates, QueryKey, DEFAULT_COUNTRY};
pub use throttle::{Clock, SystemClock, Throttle};

/// CSV the dashboard reads when no source is given
pub const DEFAULT_CSV_URL: &str =
    "https://raw.githubusercontent.com/username/business-data/main/data/businesses.csv";

pub const DEFAULT_TITLE: &str = "Business Locations Map in Alabama";

/// User-Agent sent with every outbound HTTP request
pub(crate) fn user_agent() -> String {
    format!("bizmap/{}", env!("CARGO_PKG_VERSION"))
}

/// Configuration options for the dashboard engine
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Heading and page title of the rendered dashboard
    pub title: String,
    /// Country appended to every "City, State" query
    pub country: String,
    /// Minimum spacing between geocoding requests (Nominatim allows 1/s)
    pub min_interval: Duration,
    /// Timeout for the CSV fetch and each geocoding request
    pub request_timeout: Duration,
    /// Base URL of the Nominatim instance
    pub nominatim_url: String,
    /// Persist geocoding results here so later runs skip known locations
    pub cache_path: Option<PathBuf>,
    /// Lifetime of a cached geocoding result
    pub cache_ttl: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            min_interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
            nominatim_url: NOMINATIM_URL.to_string(),
            cache_path: None,
            cache_ttl: Duration::from_secs(30 * 86_400),
        }
    }
}

/// Runs load -> geocode -> present for one CSV source
pub struct DashboardEngine {
    config: DashboardConfig,
}

impl DashboardEngine {
    /// Create a new engine with the given configuration
    pub fn new(config: DashboardConfig) -> Self {
        Self { config }
    }

    /// Load records, reporting any failure and returning an empty list instead.
    /// Callers stop processing when the result is empty.
    pub fn load(&self, source: &str) -> Vec<BusinessRecord> {
        match load_records(source, self.config.request_timeout) {
            Ok(records) => {
                if records.is_empty() {
                    log::warn!("{} contains no records", source);
                } else {
                    log::info!("Loaded {} records from {}", records.len(), source);
                }
                records
            }
            Err(e) => {
                log::error!("Error loading CSV file: {}", e);
                Vec::new()
            }
        }
    }

    /// Cache described by the configuration: file-backed if a path is set,
    /// in-memory otherwise
    pub fn open_cache(&self) -> GeocodeCache {
        match &self.config.cache_path {
            Some(path) => GeocodeCache::load_or_empty(path.clone(), self.config.cache_ttl),
            None => GeocodeCache::new(self.config.cache_ttl),
        }
    }

    /// Geocode with any provider and clock
    pub fn geocode_with<G: Geocoder, C: Clock>(
        &self,
        records: Vec<BusinessRecord>,
        geocoder: G,
        clock: C,
        cache: &mut GeocodeCache,
    ) -> (Vec<BusinessRecord>, GeocodeStats) {
        let throttle = Throttle::new(self.config.min_interval, clock);
        let mut pipeline = GeocodePipeline::new(geocoder, throttle, cache, &self.config.country);
        let records = pipeline.annotate(records);
        (records, pipeline.stats())
    }

    /// Build the dashboard for already geocoded records
    pub fn present(&self, records: Vec<BusinessRecord>, stats: GeocodeStats) -> Dashboard {
        Dashboard::new(&self.config.title, records).with_stats(stats)
    }

    /// Full pass against Nominatim. Returns None when nothing could be loaded.
    pub fn run(&self, source: &str) -> Result<Option<Dashboard>> {
        let geocoder =
            NominatimGeocoder::new(&self.config.nominatim_url, self.config.request_timeout)?;
        Ok(self.run_with(source, geocoder, SystemClock))
    }

    /// Full pass with any provider and clock
    pub fn run_with<G: Geocoder, C: Clock>(
        &self,
        source: &str,
        geocoder: G,
        clock: C,
    ) -> Option<Dashboard> {
        let records = self.load(source);
        if records.is_empty() {
            return None;
        }

        let mut cache = self.open_cache();
        let (records, stats) = self.geocode_with(records, geocoder, clock, &mut cache);

        let expired = cache.purge_expired();
        if expired > 0 {
            log::debug!("Dropped {} expired geocode cache entries", expired);
        }
        if let Err(e) = cache.save() {
            log::warn!("Failed to save geocode cache: {:#}", e);
        }

        Some(self.present(records, stats))
    }
}

impl Default for DashboardEngine {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}
