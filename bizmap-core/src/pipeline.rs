use crate::geocode_cache::GeocodeCache;
use crate::geocoding::Geocoder;
use crate::record::{BusinessRecord, Coordinates, QueryKey};
use crate::throttle::{Clock, Throttle};
use std::collections::HashSet;

/// Counters collected during one pipeline run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GeocodeStats {
    /// Requests actually sent to the provider
    pub requests: usize,
    /// Records answered from the cache
    pub cache_hits: usize,
    /// Provider errors (network, status, payload)
    pub errors: usize,
    /// Records left without coordinates
    pub unresolved: usize,
}

/// Annotates records with coordinates, one throttled lookup per uncached
/// (city, state) pair
pub struct GeocodePipeline<'a, G: Geocoder, C: Clock> {
    geocoder: G,
    throttle: Throttle<C>,
    cache: &'a mut GeocodeCache,
    country: String,
    /// Keys whose lookup errored during this run; never retried, never persisted
    failed: HashSet<String>,
    stats: GeocodeStats,
}

impl<'a, G: Geocoder, C: Clock> GeocodePipeline<'a, G, C> {
    pub fn new(
        geocoder: G,
        throttle: Throttle<C>,
        cache: &'a mut GeocodeCache,
        country: impl Into<String>,
    ) -> Self {
        Self {
            geocoder,
            throttle,
            cache,
            country: country.into(),
            failed: HashSet::new(),
            stats: GeocodeStats::default(),
        }
    }

    pub fn stats(&self) -> GeocodeStats {
        self.stats
    }

    /// Return the records in their original order, each with coordinates set
    /// or left absent when the location could not be resolved
    pub fn annotate(&mut self, records: Vec<BusinessRecord>) -> Vec<BusinessRecord> {
        log::info!("Geocoding {} business locations", records.len());

        let annotated: Vec<BusinessRecord> = records
            .into_iter()
            .map(|mut record| {
                record.coordinates = self.resolve(&record.query_key());
                if record.coordinates.is_none() {
                    self.stats.unresolved += 1;
                }
                record
            })
            .collect();

        log::info!(
            "Geocoding finished: {} requests, {} cache hits, {} errors, {} unresolved",
            self.stats.requests,
            self.stats.cache_hits,
            self.stats.errors,
            self.stats.unresolved
        );

        annotated
    }

    fn resolve(&mut self, key: &QueryKey) -> Option<Coordinates> {
        if let Some(cached) = self.cache.get(key) {
            log::debug!("Geocode cache hit for {}", key);
            self.stats.cache_hits += 1;
            return cached;
        }

        if self.failed.contains(&key.cache_key()) {
            log::debug!("Skipping {} after earlier failure", key);
            return None;
        }

        let query = key.query(&self.country);
        let geocoder = &self.geocoder;
        self.stats.requests += 1;

        match self.throttle.call(|| geocoder.geocode(&query)) {
            Ok(coordinates) => {
                if coordinates.is_none() {
                    log::warn!("No match for '{}'", query);
                }
                self.cache.insert(key, coordinates);
                coordinates
            }
            Err(e) => {
                log::warn!("Geocoding '{}' failed: {:#}", query, e);
                self.stats.errors += 1;
                self.failed.insert(key.cache_key());
                None
            }
        }
    }
}
