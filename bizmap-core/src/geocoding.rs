use crate::record::Coordinates;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Public Nominatim instance
pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Something that can turn a free-text place query into coordinates.
/// `Ok(None)` means the provider answered but found no match.
pub trait Geocoder {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>>;
}

impl<G: Geocoder + ?Sized> Geocoder for &G {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        (**self).geocode(query)
    }
}

/// Forward geocoder backed by the Nominatim search API
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        // Nominatim's usage policy requires an identifying User-Agent
        let client = reqwest::blocking::Client::builder()
            .user_agent(crate::user_agent())
            .timeout(timeout)
            .build()
            .context("Failed to build geocoding HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        log::debug!("Geocoding '{}' via Nominatim", query);

        let response = self
            .client
            .get(self.search_url())
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .context("Failed to send geocoding request")?;

        if !response.status().is_success() {
            anyhow::bail!("Geocoding API returned status: {}", response.status());
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .context("Failed to parse geocoding response")?;

        best_match(&places)
    }
}

/// Single entry of a Nominatim search response
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Nominatim orders results by relevance, so the first one wins
fn best_match(places: &[NominatimPlace]) -> Result<Option<Coordinates>> {
    let Some(place) = places.first() else {
        return Ok(None);
    };

    let latitude: f64 = place
        .lat
        .parse()
        .with_context(|| format!("Invalid latitude '{}'", place.lat))?;
    let longitude: f64 = place
        .lon
        .parse()
        .with_context(|| format!("Invalid longitude '{}'", place.lon))?;

    if !latitude.is_finite() || !longitude.is_finite() {
        anyhow::bail!("Non-finite coordinates '{}', '{}'", place.lat, place.lon);
    }

    if let Some(name) = &place.display_name {
        log::debug!("Matched {}", name);
    }

    Ok(Some(Coordinates::new(latitude, longitude)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<NominatimPlace> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_best_match_takes_first_result() {
        let places = parse(
            r#"[
                {"lat": "30.6943566", "lon": "-88.0430541", "display_name": "Mobile, Alabama"},
                {"lat": "1.0", "lon": "2.0"}
            ]"#,
        );
        let coords = best_match(&places).unwrap().unwrap();
        assert_eq!(coords, Coordinates::new(30.6943566, -88.0430541));
    }

    #[test]
    fn test_empty_response_is_no_match() {
        assert_eq!(best_match(&parse("[]")).unwrap(), None);
    }

    #[test]
    fn test_unparsable_coordinates_is_error() {
        let places = parse(r#"[{"lat": "north", "lon": "-88.0"}]"#);
        assert!(best_match(&places).is_err());
    }

    #[test]
    fn test_non_finite_coordinates_are_error() {
        for (lat, lon) in [("nan", "-88.0"), ("30.6", "inf"), ("-infinity", "NaN")] {
            let json = format!(r#"[{{"lat": "{}", "lon": "{}"}}]"#, lat, lon);
            assert!(best_match(&parse(&json)).is_err(), "{} {}", lat, lon);
        }
    }

    #[test]
    fn test_search_url_strips_trailing_slash() {
        let geocoder =
            NominatimGeocoder::new("http://localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(geocoder.search_url(), "http://localhost:8080/search");
    }

    #[test]
    fn test_unreachable_provider_is_error() {
        let url = crate::loader::test_http::closed_port_url();
        let base = url.trim_end_matches("/businesses.csv");
        let geocoder = NominatimGeocoder::new(base, Duration::from_millis(500)).unwrap();
        assert!(geocoder.geocode("Mobile, AL, USA").is_err());
    }
}
