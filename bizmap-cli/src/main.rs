use anyhow::{Context, Result};
use bizmap_core::{DashboardConfig, DashboardEngine};
use std::time::Duration;

mod cli;

fn main() -> Result<()> {
    let args = cli::parse_args();

    // Initialize logger with appropriate level based on verbose flag
    if std::env::var("RUST_LOG").is_err() {
        if args.verbose {
            std::env::set_var("RUST_LOG", "debug");
        } else {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    let min_interval = Duration::try_from_secs_f64(args.min_delay)
        .with_context(|| format!("Invalid --min-delay value: {}", args.min_delay))?;

    let config = DashboardConfig {
        title: args.title.clone(),
        country: args.country.clone(),
        min_interval,
        nominatim_url: args.nominatim_url.clone(),
        cache_path: args.cache_file.clone(),
        cache_ttl: Duration::from_secs(args.cache_ttl_days.saturating_mul(86_400)),
        ..DashboardConfig::default()
    };

    let engine = DashboardEngine::new(config);

    // An empty load has already been reported; nothing gets rendered
    let dashboard = match engine.run(&args.source)? {
        Some(dashboard) => dashboard,
        None => std::process::exit(1),
    };

    if args.print_table {
        println!("{}", dashboard.render_table());
    }

    dashboard.write_html(&args.output)?;

    log::info!(
        "{} of {} businesses shown on the map",
        dashboard.mapped(),
        dashboard.total()
    );
    if let Some(warning) = dashboard.warning() {
        log::warn!("{}", warning);
    }

    Ok(())
}
