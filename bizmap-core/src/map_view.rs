use crate::record::{BusinessRecord, Coordinates};
use maud::{html, Markup};
use serde::Serialize;

/// Center of Alabama
pub const MAP_CENTER: Coordinates = Coordinates {
    latitude: 32.806671,
    longitude: -86.791130,
};
pub const MAP_ZOOM: u8 = 7;

pub const MAP_WIDTH_PX: u32 = 700;
pub const MAP_HEIGHT_PX: u32 = 500;

/// One pin on the map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub lat: f64,
    pub lng: f64,
    /// HTML shown when the pin is clicked
    pub popup: String,
}

impl MapMarker {
    /// Build a marker for a geocoded record, None if it has no coordinates
    pub fn from_record(record: &BusinessRecord) -> Option<Self> {
        let coords = record.coordinates?;
        Some(Self {
            lat: coords.latitude,
            lng: coords.longitude,
            popup: popup_html(record).into_string(),
        })
    }
}

/// Popup label: business type in bold, then category, then "City, State"
pub fn popup_html(record: &BusinessRecord) -> Markup {
    html! {
        b { (record.business_type) }
        br;
        (record.business_category)
        br;
        (record.city) ", " (record.state)
    }
}

/// Map centered on a fixed region with one marker per geocoded record
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
    pub markers: Vec<MapMarker>,
}

impl MapView {
    pub fn new(records: &[BusinessRecord]) -> Self {
        Self {
            center: MAP_CENTER,
            zoom: MAP_ZOOM,
            markers: records.iter().filter_map(MapMarker::from_record).collect(),
        }
    }

    /// Inline script creating the Leaflet map inside `container_id`
    pub fn to_script(&self, container_id: &str) -> serde_json::Result<String> {
        let markers = script_safe(&serde_json::to_string(&self.markers)?);
        let container = script_safe(&serde_json::to_string(container_id)?);
        Ok(format!(
            "var map=L.map({container}).setView([{lat},{lng}],{zoom});\
             L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png',\
             {{attribution:'&copy; OpenStreetMap contributors'}}).addTo(map);\
             {markers}.forEach(function(m){{L.marker([m.lat,m.lng]).bindPopup(m.popup).addTo(map);}});",
            container = container,
            lat = self.center.latitude,
            lng = self.center.longitude,
            zoom = self.zoom,
            markers = markers,
        ))
    }
}

/// Keep JSON embedded in a <script> element from closing it early
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}
