use std::{path::PathBuf, time::Duration};

use clap::Parser;
use ssoconf::{
    config::AppConfig,
    models::ConfigurationRecord,
    observability,
    services::{ConfigScreen, RenderedForm, ScreenOutcome, VersionChecker},
    validation::parse_certificate,
};

/// CLI arguments for the SSO configuration screen
#[derive(Parser, Debug)]
#[command(version, about = "SAML SSO configuration screen", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (defaults to ssoconf.toml in the current directory
    /// if it exists, otherwise built-in defaults with an in-memory store)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Create the configuration row with default values
    Init {
        /// Row to create (defaults to screen.config_id)
        #[arg(long)]
        id: Option<i64>,
    },
    /// Render the configuration form for a stored row
    Show {
        /// Row to show (defaults to screen.config_id)
        #[arg(long)]
        id: Option<i64>,
        /// Print the placeholder map and findings as JSON instead of HTML
        #[arg(long)]
        json: bool,
    },
    /// Validate a submission and save it if nothing blocks it
    ///
    /// Exits with status 2 when the submission was rejected; the re-rendered
    /// form is printed in that case.
    Apply {
        /// File holding an application/x-www-form-urlencoded body
        #[arg(short, long)]
        form: Option<PathBuf>,
        /// Submitted field as NAME=VALUE; may be repeated
        #[arg(short, long = "set", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
        /// Print the placeholder map and findings as JSON instead of HTML
        #[arg(long)]
        json: bool,
    },
    /// Inspect a PEM certificate file and print what was found as JSON
    InspectCert {
        /// Certificate file
        path: PathBuf,
    },
    /// Compare the newest release in the feed against a version
    CheckVersion {
        /// Version to compare against (defaults to this build's version)
        #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
        running: String,
    },
    /// Show enabled compile-time features
    Features,
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Command::Features = args.command {
        run_features();
        return;
    }

    let config = load_config(args.config.as_deref());
    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    match args.command {
        Command::Init { id } => run_init(&config, id).await,
        Command::Show { id, json } => run_show(&config, id, json).await,
        Command::Apply { form, set, json } => run_apply(&config, form, set, json).await,
        Command::InspectCert { path } => run_inspect_cert(&path),
        Command::CheckVersion { running } => run_check_version(&config, &running).await,
        Command::Features => run_features(),
    }
}

/// Load the config file, falling back to defaults when none is present.
fn load_config(explicit_path: Option<&std::path::Path>) -> AppConfig {
    let path = match explicit_path {
        Some(path) if !path.exists() => {
            eprintln!("Error: Config file not found: {}", path.display());
            std::process::exit(1);
        }
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from("ssoconf.toml")).filter(|p| p.exists()),
    };

    let Some(path) = path else {
        return AppConfig::default();
    };

    match AppConfig::from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

async fn build_screen(config: &AppConfig) -> ConfigScreen {
    match ConfigScreen::from_config(config).await {
        Ok(screen) => screen,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build configuration screen");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_init(config: &AppConfig, id: Option<i64>) {
    let screen = build_screen(config).await;
    let id = id.unwrap_or(screen.default_id());

    match screen.store().initialize(id).await {
        Ok(()) => {
            tracing::info!(id, "Initialized SSO configuration");
            println!("Initialized configuration {id}");
        }
        Err(e) => {
            tracing::error!(id, error = %e, "Failed to initialize SSO configuration");
            eprintln!("Error: Failed to initialize configuration {id}: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_show(config: &AppConfig, id: Option<i64>, json: bool) {
    let screen = build_screen(config).await;
    let form = screen.show(id.unwrap_or(screen.default_id())).await;
    print_form(&form, json);
}

async fn run_apply(
    config: &AppConfig,
    form: Option<PathBuf>,
    set: Vec<(String, String)>,
    json: bool,
) {
    let mut submitted = match form {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(body) => ConfigurationRecord::from_form_urlencoded(&body),
            Err(e) => {
                eprintln!("Error: Failed to read {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => ConfigurationRecord::new(),
    };
    for (name, value) in set {
        submitted.insert(name, value);
    }
    if submitted.is_empty() {
        eprintln!("Error: Nothing submitted. Use --form or --set NAME=VALUE.");
        std::process::exit(1);
    }

    let screen = build_screen(config).await;
    match screen.process(&submitted).await {
        ScreenOutcome::Saved { id, form } => {
            eprintln!("Saved configuration {id}");
            print_form(&form, json);
        }
        ScreenOutcome::Redisplay(form) => {
            for finding in &form.findings {
                eprintln!("{:?}: {}", finding.severity, finding);
            }
            print_form(&form, json);
            std::process::exit(2);
        }
    }
}

fn run_inspect_cert(path: &std::path::Path) {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error: Failed to read {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };

    print_json(&parse_certificate(&raw));
}

async fn run_check_version(config: &AppConfig, running: &str) {
    let checker = match VersionChecker::new(
        config.version_check.feed_url.clone(),
        Duration::from_secs(config.version_check.timeout_secs),
    ) {
        Ok(checker) => checker,
        Err(e) => {
            eprintln!("Error: Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    match checker.check(running).await {
        Ok(status) => print_json(&status),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_form(form: &RenderedForm, json: bool) {
    if json {
        print_json(form);
    } else {
        println!("{}", form.html);
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: Failed to serialize output: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_features() {
    let version = env!("CARGO_PKG_VERSION");

    let features: &[(&str, bool)] = &[
        ("cli", cfg!(feature = "cli")),
        ("native-http", cfg!(feature = "native-http")),
        ("database-sqlite", cfg!(feature = "database-sqlite")),
        ("x509", cfg!(feature = "x509")),
    ];

    println!("ssoconf {version}");
    println!();
    for (name, enabled) in features {
        let marker = if *enabled { "+" } else { "-" };
        println!("  {marker} {name}");
    }
}
