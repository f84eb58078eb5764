use clap::{Parser, Subcommand};
use media_cache::config::{self, HostConfig, PickerOptions};
use media_cache::host::LocalHost;
use media_cache::locator::MediaLocator;
use media_cache::materialize::MaterializeOptions;
use media_cache::selector::{self, ErrorResponse};
use media_cache::{output, resolve};
use std::path::PathBuf;
use std::process::ExitCode;

/// Shared flags for commands that write cache files.
#[derive(clap::Args, Clone)]
struct RequestArgs {
    /// Content locator, e.g. content://media/external/images/media/42
    locator: MediaLocator,

    /// Picker option map as JSON, e.g. '{"storageOptions":{"path":"sel"}}'
    #[arg(long)]
    options: Option<String>,
}

impl RequestArgs {
    fn picker_options(&self) -> PickerOptions {
        self.options
            .as_deref()
            .map(PickerOptions::from_json)
            .unwrap_or_default()
    }
}

#[derive(Parser)]
#[command(name = "media-cache")]
#[command(about = "Resolve media locators to local files and cache upright JPEG copies")]
#[command(long_about = "\
Resolve media locators to local files and cache upright JPEG copies

Locators are served by a filesystem-backed host:

  mount/
  ├── com.example.provider/        # content://com.example.provider/<path>
  │   └── picked/1
  └── media/
      └── external/images/media/42

Structured stores (downloads, media collections) are read from a JSON
store index mapping store URIs to rows with an `_data` column.

Resolution order (first match wins):
  external storage document  → <public storage root>/<path>
  downloads / media document → store lookup, else materialize
  photo library              → store lookup, else materialize
  other content locator      → store lookup
  file://                    → path as given
  anything else              → materialize

Run 'media-cache gen-config' to generate a documented media-cache.toml.")]
#[command(version)]
struct Cli {
    /// Host config file
    #[arg(long, default_value = "media-cache.toml", global = true)]
    config: PathBuf,

    /// Base directory for cache files (overrides the config file)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Directory with one subdirectory per provider authority (overrides the config file)
    #[arg(long, global = true)]
    mount_root: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a locator and look up its filesystem path
    Resolve {
        /// Content locator
        locator: MediaLocator,
    },
    /// Resolve a locator, materializing a cache file if it has no path
    Path(RequestArgs),
    /// Copy a locator's image into an upright JPEG cache file
    Cache(RequestArgs),
    /// Print a stock media-cache.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Resolve { locator } => {
            let (host, _) = open_host(&cli)?;
            let resolution = resolve::resolve(&host, locator);
            output::print_resolution(locator, &resolution);
        }
        Command::Path(args) => {
            let (host, settings) = open_host(&cli)?;
            match resolve::get_path(&host, &args.locator, &args.picker_options(), &settings) {
                Ok(path) => println!("{}", path.display()),
                Err(e) => return report_failure(&cli, &args.locator, &e),
            }
        }
        Command::Cache(args) => {
            let (host, settings) = open_host(&cli)?;
            let result = selector::create_cache_file(
                &host,
                &args.locator,
                &args.picker_options(),
                &settings,
            );
            match result {
                Ok(response) if cli.json => {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                }
                Ok(response) => output::print_response(&args.locator, &response),
                Err(e) => return report_failure(&cli, &args.locator, &e),
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Build the filesystem host and encoder settings from config and flags.
fn open_host(cli: &Cli) -> Result<(LocalHost, MaterializeOptions), Box<dyn std::error::Error>> {
    let host_config = load_host_config(cli)?;
    std::fs::create_dir_all(&host_config.cache_dir)?;
    let host = LocalHost::from_config(&host_config)?;
    Ok((host, MaterializeOptions::from(&host_config.encoding)))
}

/// Config file merged over defaults, then command-line overrides.
fn load_host_config(cli: &Cli) -> Result<HostConfig, config::ConfigError> {
    let mut host_config = config::load_config(&cli.config)?;
    if let Some(dir) = &cli.cache_dir {
        host_config.cache_dir = dir.clone();
    }
    if let Some(dir) = &cli.mount_root {
        host_config.mount_root = dir.clone();
    }
    host_config.validate()?;
    Ok(host_config)
}

fn report_failure(
    cli: &Cli,
    locator: &MediaLocator,
    err: &selector::CacheError,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(err))?);
    } else {
        output::print_error(locator, err);
    }
    Ok(ExitCode::FAILURE)
}
