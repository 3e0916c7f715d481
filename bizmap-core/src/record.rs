use serde::{Deserialize, Serialize};
use std::fmt;

/// Country appended to every geocoding query unless configured otherwise
pub const DEFAULT_COUNTRY: &str = "USA";

/// A resolved latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One business row loaded from the CSV source
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessRecord {
    pub business_category: String,
    pub business_type: String,
    pub city: String,
    pub state: String,
    /// Set by the geocoding pipeline; None until resolved or when resolution failed
    pub coordinates: Option<Coordinates>,
}

impl BusinessRecord {
    pub fn new(
        business_category: impl Into<String>,
        business_type: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            business_category: business_category.into(),
            business_type: business_type.into(),
            city: city.into(),
            state: state.into(),
            coordinates: None,
        }
    }

    /// Key used to geocode and cache this record's location
    pub fn query_key(&self) -> QueryKey {
        QueryKey::new(&self.city, &self.state)
    }

    pub fn is_mapped(&self) -> bool {
        self.coordinates.is_some()
    }
}

/// The (city, state) pair a geocoding lookup is made for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub city: String,
    pub state: String,
}

impl QueryKey {
    pub fn new(city: &str, state: &str) -> Self {
        Self {
            city: city.trim().to_string(),
            state: state.trim().to_string(),
        }
    }

    /// Free-text query sent to the provider, e.g. "Mobile, AL, USA"
    pub fn query(&self, country: &str) -> String {
        format!("{}, {}, {}", self.city, self.state, country)
    }

    /// Stable string form used as the cache map key.
    /// Case-insensitive so "MOBILE, al" and "Mobile, AL" share an entry.
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}",
            self.city.to_lowercase(),
            self.state.to_lowercase()
        )
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_appends_country() {
        let key = QueryKey::new("Mobile", "AL");
        assert_eq!(key.query(DEFAULT_COUNTRY), "Mobile, AL, USA");
    }

    #[test]
    fn test_query_key_trims_whitespace() {
        let record = BusinessRecord::new("Food", "Bakery", "  Dothan ", "AL ");
        assert_eq!(record.query_key(), QueryKey::new("Dothan", "AL"));
        assert_eq!(record.query_key().to_string(), "Dothan, AL");
    }

    #[test]
    fn test_cache_key_ignores_case() {
        assert_eq!(
            QueryKey::new("MOBILE", "al").cache_key(),
            QueryKey::new("Mobile", "AL").cache_key()
        );
        assert_ne!(
            QueryKey::new("Auburn", "AL").cache_key(),
            QueryKey::new("Auburn", "CA").cache_key()
        );
    }

    #[test]
    fn test_new_record_is_unmapped() {
        let mut record = BusinessRecord::new("Retail", "Hardware", "Selma", "AL");
        assert!(!record.is_mapped());
        record.coordinates = Some(Coordinates::new(32.4, -87.0));
        assert!(record.is_mapped());
    }
}
