use crate::map_view::{MapView, MAP_HEIGHT_PX, MAP_WIDTH_PX};
use crate::pipeline::GeocodeStats;
use crate::record::BusinessRecord;
use anyhow::{Context, Result};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fs;
use std::path::Path;

const LEAFLET_CSS_URL: &str = "https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.4.0/leaflet.css";
const LEAFLET_CSS_SHA512: &str = "sha512-puBpdR0798OZvTTbP4A8Ix/l+A4dHDD0DGqYW6RQ+9jxkRFclaxxQb/SJAWZfWAkuyeQUytO7+7N4QKrDh+drA==";
const LEAFLET_JS_URL: &str = "https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.4.0/leaflet.js";
const LEAFLET_JS_SHA512: &str = "sha512-QVftwZFqvtRNi0ZyCtsznlKSWOStnDORoefr1enyq5mVL4tmKB3S/EnC3rRJcxCPavG10IcrVGSmPh6Qw5lwrg==";

const MAP_CONTAINER_ID: &str = "map";
const TABLE_HEADERS: [&str; 4] = ["Business Category", "Business Type", "City", "State"];

/// Everything shown to the user after a run: the map, the full table and
/// the unmapped-records note
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub title: String,
    pub records: Vec<BusinessRecord>,
    pub map: MapView,
    /// Geocoding counters of the run that produced the records
    pub stats: GeocodeStats,
}

impl Dashboard {
    pub fn new(title: impl Into<String>, records: Vec<BusinessRecord>) -> Self {
        let map = MapView::new(&records);
        Self {
            title: title.into(),
            records,
            map,
            stats: GeocodeStats::default(),
        }
    }

    pub fn with_stats(mut self, stats: GeocodeStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn mapped(&self) -> usize {
        self.map.markers.len()
    }

    /// Records that are in the table but not on the map
    pub fn unmapped(&self) -> usize {
        self.total() - self.mapped()
    }

    /// Note about ungeocoded records, None when every record is on the map
    pub fn warning(&self) -> Option<String> {
        match self.unmapped() {
            0 => None,
            n => Some(format!(
                "Note: {} locations could not be geocoded and are not shown on the map.",
                n
            )),
        }
    }

    /// Full standalone HTML page
    pub fn render_html(&self) -> Result<String> {
        let script = self
            .map
            .to_script(MAP_CONTAINER_ID)
            .context("Failed to serialize map markers")?;
        Ok(self.page(&script).into_string())
    }

    /// Render and write the page to `path`
    pub fn write_html(&self, path: &Path) -> Result<()> {
        let html = self.render_html()?;
        fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote dashboard to {}", path.display());
        Ok(())
    }

    /// Column-aligned plain-text rendering of the records table
    pub fn render_table(&self) -> String {
        let rows: Vec<[&str; 4]> = self
            .records
            .iter()
            .map(|r| {
                [
                    r.business_category.as_str(),
                    r.business_type.as_str(),
                    r.city.as_str(),
                    r.state.as_str(),
                ]
            })
            .collect();

        let mut widths = TABLE_HEADERS.map(|h| h.chars().count());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_row(&mut out, &TABLE_HEADERS, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        let rule: Vec<&str> = rule.iter().map(String::as_str).collect();
        push_row(&mut out, &rule, &widths);
        for row in &rows {
            push_row(&mut out, row, &widths);
        }
        out
    }

    fn page(&self, script: &str) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    link
                        rel="stylesheet"
                        href=(LEAFLET_CSS_URL)
                        integrity=(LEAFLET_CSS_SHA512)
                        crossorigin="anonymous";
                }
                body {
                    h1 { (self.title) }
                    div id=(MAP_CONTAINER_ID)
                        style=(format!("width:{}px;height:{}px;", MAP_WIDTH_PX, MAP_HEIGHT_PX)) {}
                    h2 { "Business Data" }
                    (self.records_table())
                    @if let Some(warning) = self.warning() {
                        p class="warning" { (warning) }
                    }
                    p class="generated" {
                        "Generated " (chrono::Local::now().format("%Y-%m-%d %H:%M").to_string())
                    }
                    script
                        src=(LEAFLET_JS_URL)
                        integrity=(LEAFLET_JS_SHA512)
                        crossorigin="anonymous" {}
                    script { (PreEscaped(script)) }
                }
            }
        }
    }

    fn records_table(&self) -> Markup {
        html! {
            table {
                thead {
                    tr {
                        @for header in TABLE_HEADERS {
                            th { (header) }
                        }
                    }
                }
                tbody {
                    @for r in &self.records {
                        tr {
                            td { (r.business_category) }
                            td { (r.business_type) }
                            td { (r.city) }
                            td { (r.state) }
                        }
                    }
                }
            }
        }
    }
}

fn push_row(out: &mut String, cells: &[&str], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Coordinates;
    use tempfile::TempDir;

    fn sample(mapped: usize, unmapped: usize) -> Vec<BusinessRecord> {
        let mut records = Vec::new();
        for i in 0..mapped {
            let mut r = BusinessRecord::new("Food", format!("Bakery {}", i), "Mobile", "AL");
            r.coordinates = Some(Coordinates::new(30.69, -88.04 + i as f64 / 100.0));
            records.push(r);
        }
        for i in 0..unmapped {
            records.push(BusinessRecord::new("Retail", format!("Shop {}", i), "Atlantis", "AL"));
        }
        records
    }

    #[test]
    fn test_partial_geocoding_scenario() {
        let dashboard = Dashboard::new("Businesses", sample(2, 1));
        assert_eq!(dashboard.total(), 3);
        assert_eq!(dashboard.mapped(), 2);
        assert_eq!(
            dashboard.warning().as_deref(),
            Some("Note: 1 locations could not be geocoded and are not shown on the map.")
        );
    }

    #[test]
    fn test_no_warning_when_everything_mapped() {
        let dashboard = Dashboard::new("Businesses", sample(4, 0));
        assert_eq!(dashboard.unmapped(), 0);
        assert!(dashboard.warning().is_none());
        assert!(!dashboard.render_html().unwrap().contains("could not be geocoded"));
    }

    #[test]
    fn test_html_lists_every_record() {
        let dashboard = Dashboard::new("Business Locations Map in Alabama", sample(1, 2));
        let html = dashboard.render_html().unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Business Locations Map in Alabama</h1>"));
        assert_eq!(html.matches("<tr>").count(), 4);
        assert!(html.contains("<td>Shop 1</td>"));
        assert!(html.contains(
            "<p class=\"warning\">Note: 2 locations could not be geocoded and are not shown on the map.</p>"
        ));
        assert!(html.contains("leaflet.js"));
    }

    #[test]
    fn test_html_escapes_record_text() {
        let records = vec![BusinessRecord::new("A&B", "<i>Bar</i>", "Mobile", "AL")];
        let html = Dashboard::new("Businesses", records).render_html().unwrap();
        assert!(html.contains("<td>A&amp;B</td>"));
        assert!(html.contains("<td>&lt;i&gt;Bar&lt;/i&gt;</td>"));
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let records = vec![
            BusinessRecord::new("Food", "Bakery", "Mobile", "AL"),
            BusinessRecord::new("Retail", "Hardware Store", "Huntsville", "AL"),
        ];
        let table = Dashboard::new("Businesses", records).render_table();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "Business Category  Business Type   City        State"
        );
        assert_eq!(lines[2], "Food               Bakery          Mobile      AL");
        assert!(lines[1].starts_with("-----------------  "));
    }

    #[test]
    fn test_write_html() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("map.html");
        Dashboard::new("Businesses", sample(1, 0)).write_html(&path)?;
        assert!(fs::read_to_string(&path)?.contains("L.marker"));
        Ok(())
    }
}
