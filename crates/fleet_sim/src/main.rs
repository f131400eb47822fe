//! Fleet battle batch runner.
//!
//! Runs Monte Carlo batches from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Answer one JSON request (file or `-` for stdin)
//! cargo run -p fleet_sim -- run --request request.json
//!
//! # Run a batch from fleet files (.ron or JSON)
//! cargo run -p fleet_sim -- batch --attacker a.ron --defender d.ron --seed 42 --trials 1000
//!
//! # Check a request replays identically
//! cargo run -p fleet_sim -- verify --request request.json --runs 5
//! ```
//!
//! # Output
//!
//! Results (stdout): JSON
//! Logs (stderr): Debug information, filtered by `RUST_LOG` when set

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use fleet_core::combat::EclipseResolver;
use fleet_core::fleet::Fleet;
use fleet_core::rules::CombatRules;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fleet_sim::{
    batch::BatchDriver,
    boundary::{decode_request, verify_request, ExecutionBoundary},
    protocol::{BatchRequest, BatchResponse},
    SimError,
};

#[derive(Parser)]
#[command(name = "fleet_sim")]
#[command(about = "Monte Carlo fleet battle simulator")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Combat rules file (.ron or JSON)
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single batch request
    Run {
        /// Request JSON file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        request: PathBuf,
    },

    /// Run a batch from two fleet files
    Batch {
        /// Attacker fleet file
        #[arg(short, long)]
        attacker: PathBuf,

        /// Defender fleet file
        #[arg(short, long)]
        defender: PathBuf,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Number of trials
        #[arg(short, long, default_value = "1000")]
        trials: u64,
    },

    /// Verify determinism by running the same request multiple times
    Verify {
        /// Request JSON file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        request: PathBuf,

        /// Number of verification runs
        #[arg(short = 'n', long, default_value = "5")]
        runs: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for results)
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let rules = load_rules(cli.rules.as_deref());

    match cli.command {
        Commands::Run { request } => cmd_run(&request, rules),
        Commands::Batch {
            attacker,
            defender,
            seed,
            trials,
        } => cmd_batch(&attacker, &defender, seed, trials, rules),
        Commands::Verify { request, runs } => cmd_verify(&request, runs, rules),
    }
}

fn load_rules(path: Option<&Path>) -> CombatRules {
    let Some(path) = path else {
        return CombatRules::default();
    };
    match CombatRules::load(path) {
        Ok(rules) => {
            tracing::debug!(?rules, "Loaded combat rules from {}", path.display());
            rules
        }
        Err(e) => {
            eprintln!("Failed to load rules: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_fleet(path: &Path) -> Fleet {
    match Fleet::load(path) {
        Ok(fleet) => fleet,
        Err(e) => {
            eprintln!("Failed to load fleet {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn read_text(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
    }
}

/// Read and decode a request; both failures are boundary errors.
fn load_request(path: &Path) -> Result<BatchRequest, SimError> {
    let text = read_text(path).map_err(|e| {
        SimError::BoundaryError(format!("Failed to read request {}: {}", path.display(), e))
    })?;
    decode_request(&text)
}

fn read_request(path: &Path) -> BatchRequest {
    match load_request(path) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Answer one request through the execution boundary
fn cmd_run(request_path: &Path, rules: CombatRules) {
    // Every failure from here on is answered on stdout as well.
    let request = match load_request(request_path) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("{}", e);
            print!("{}", BatchResponse::failed(&e).to_json_line());
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            let err = SimError::BoundaryError(format!("Failed to start runtime: {}", e));
            eprintln!("FATAL: {}", err);
            print!("{}", BatchResponse::failed(&err).to_json_line());
            std::process::exit(1);
        }
    };

    let boundary = ExecutionBoundary::with_rules(runtime.handle().clone(), rules);
    let response = runtime.block_on(boundary.submit(request).wait());

    print!("{}", response.to_json_line());
    if response.error().is_some() {
        std::process::exit(1);
    }
}

/// Run a batch from fleet files
fn cmd_batch(attacker: &Path, defender: &Path, seed: u64, trials: u64, rules: CombatRules) {
    let attacker_fleet = load_fleet(attacker);
    let defender_fleet = load_fleet(defender);
    let resolver = EclipseResolver::new(rules);

    tracing::info!(
        "Running {} trials: {} ({} ships) vs {} ({} ships), seed {}",
        trials,
        attacker.display(),
        attacker_fleet.ships().len(),
        defender.display(),
        defender_fleet.ships().len(),
        seed
    );

    let result = match BatchDriver::new(&attacker_fleet, &defender_fleet, &resolver).run(seed, trials)
    {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Batch failed: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Trials: {}", result.trial_count());
    eprintln!(
        "Defender wins: {} ({:.1}%)",
        result.defender_wins(),
        result.defender_win_fraction() * 100.0
    );
    eprintln!(
        "Attacker wins: {} ({:.1}%)",
        result.attacker_wins(),
        result.attacker_win_fraction() * 100.0
    );
    eprintln!("Draws: {}", result.draws());

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("FATAL: Failed to serialize result: {}", e);
            std::process::exit(1);
        }
    }
}

/// Verify determinism by rerunning one request
fn cmd_verify(request_path: &Path, runs: u32, rules: CombatRules) {
    let request = read_request(request_path);
    tracing::info!(
        "Verifying determinism: seed {} ({} trials, {} runs)",
        request.seed,
        request.simulation_steps,
        runs
    );

    match verify_request(&request, &EclipseResolver::new(rules), runs) {
        Ok(true) => eprintln!("PASS: All {} runs produced identical outcomes", runs),
        Ok(false) => {
            eprintln!("FAIL: Non-determinism detected!");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("FAIL: {}", e);
            std::process::exit(1);
        }
    }
}
