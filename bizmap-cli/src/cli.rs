use bizmap_core::{DEFAULT_COUNTRY, DEFAULT_CSV_URL, DEFAULT_TITLE, NOMINATIM_URL};
use clap::Parser;
use std::path::PathBuf;

const MAX_CACHE_TTL_DAYS: u64 = 36_500;

/// Geocode business records from a CSV and render them on a map
#[derive(Parser, Debug)]
#[command(name = "bizmap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Plots CSV business records on an HTML map via Nominatim", long_about = None)]
pub struct Args {
    /// CSV file path or http(s) URL with Business Category, Business Type, City and State columns
    #[arg(value_name = "SOURCE", default_value = DEFAULT_CSV_URL)]
    pub source: String,

    /// Where to write the HTML dashboard
    #[arg(short = 'o', long = "output", default_value = "business_map.html")]
    pub output: PathBuf,

    /// Persist geocoding results to this JSON file and reuse them on later runs
    #[arg(long = "cache-file", value_name = "FILE")]
    pub cache_file: Option<PathBuf>,

    /// Days a cached geocoding result stays valid (at most 100 years)
    #[arg(
        long = "cache-ttl-days",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..=MAX_CACHE_TTL_DAYS)
    )]
    pub cache_ttl_days: u64,

    /// Minimum seconds between geocoding requests
    #[arg(long = "min-delay", default_value_t = 1.0)]
    pub min_delay: f64,

    /// Base URL of the Nominatim service
    #[arg(long = "nominatim-url", default_value = NOMINATIM_URL)]
    pub nominatim_url: String,

    /// Country appended to every "City, State" query
    #[arg(long = "country", default_value = DEFAULT_COUNTRY)]
    pub country: String,

    /// Dashboard title
    #[arg(long = "title", default_value = DEFAULT_TITLE)]
    pub title: String,

    /// Also print the records table to stdout
    #[arg(short = 't', long = "print-table")]
    pub print_table: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Parses command-line arguments
pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["bizmap"]).unwrap();
        assert_eq!(args.source, DEFAULT_CSV_URL);
        assert_eq!(args.output, PathBuf::from("business_map.html"));
        assert_eq!(args.min_delay, 1.0);
        assert_eq!(args.country, "USA");
        assert!(args.cache_file.is_none());
        assert!(!args.print_table);
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "bizmap",
            "data.csv",
            "-o",
            "out.html",
            "--cache-file",
            "cache.json",
            "--min-delay",
            "2.5",
            "-t",
        ])
        .unwrap();
        assert_eq!(args.source, "data.csv");
        assert_eq!(args.output, PathBuf::from("out.html"));
        assert_eq!(args.cache_file, Some(PathBuf::from("cache.json")));
        assert_eq!(args.min_delay, 2.5);
        assert!(args.print_table);
    }

    #[test]
    fn test_cache_ttl_days_is_bounded() {
        let args = Args::try_parse_from(["bizmap", "--cache-ttl-days", "36500"]).unwrap();
        assert_eq!(args.cache_ttl_days, MAX_CACHE_TTL_DAYS);

        assert!(Args::try_parse_from(["bizmap", "--cache-ttl-days", "36501"]).is_err());
        assert!(Args::try_parse_from(["bizmap", "--cache-ttl-days", "0"]).is_err());
        assert!(
            Args::try_parse_from(["bizmap", "--cache-ttl-days", "200000000000000"]).is_err()
        );
    }
}
