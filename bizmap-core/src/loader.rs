use crate::record::BusinessRecord;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const COLUMN_CATEGORY: &str = "Business Category";
pub const COLUMN_TYPE: &str = "Business Type";
pub const COLUMN_CITY: &str = "City";
pub const COLUMN_STATE: &str = "State";

/// Reasons a CSV source could not be turned into records
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("required column '{0}' is missing")]
    MissingColumn(&'static str),
}

/// Load business records from a local path or an http(s) URL
pub fn load_records(source: &str, timeout: Duration) -> Result<Vec<BusinessRecord>, LoadError> {
    if is_remote(source) {
        log::debug!("Fetching CSV from {}", source);
        let body = fetch_remote(source, timeout)?;
        parse_records(body.as_bytes())
    } else {
        log::debug!("Reading CSV from {}", source);
        let file = std::fs::File::open(Path::new(source)).map_err(|e| LoadError::Io {
            path: source.to_string(),
            source: e,
        })?;
        parse_records(file)
    }
}

/// Parse CSV content with a header row into records
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<BusinessRecord>, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns = ColumnIndex::resolve(&headers)?;

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        records.push(columns.record(&row));
    }

    log::debug!("Parsed {} records", records.len());
    Ok(records)
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn fetch_remote(url: &str, timeout: Duration) -> Result<String, LoadError> {
    let fetch_err = |e| LoadError::Fetch {
        url: url.to_string(),
        source: e,
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(crate::user_agent())
        .timeout(timeout)
        .build()
        .map_err(fetch_err)?;

    let response = client.get(url).send().map_err(fetch_err)?;

    if !response.status().is_success() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    response.text().map_err(fetch_err)
}

/// Positions of the required columns within the header row
struct ColumnIndex {
    category: usize,
    business_type: usize,
    city: usize,
    state: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> Result<Self, LoadError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(LoadError::MissingColumn(name))
        };

        Ok(Self {
            category: find(COLUMN_CATEGORY)?,
            business_type: find(COLUMN_TYPE)?,
            city: find(COLUMN_CITY)?,
            state: find(COLUMN_STATE)?,
        })
    }

    fn record(&self, row: &StringRecord) -> BusinessRecord {
        let field = |idx: usize| row.get(idx).unwrap_or_default();
        BusinessRecord::new(
            field(self.category),
            field(self.business_type),
            field(self.city),
            field(self.state),
        )
    }
}
