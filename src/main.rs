use clap::{CommandFactory, Parser, Subcommand};
use std::fmt::Display;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shock_index::scoring::{classify_risk, ShockIndexCalculator};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_USAGE: i32 = 1;
const EXIT_DATA: i32 = 2;
const EXIT_SCORING: i32 = 3;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the index from four pre-computed factor scores
    Single {
        /// Clinical completeness score [0, 1]
        #[arg(long, allow_hyphen_values = true)]
        ccs: f64,
        /// ECDS adoption variability score [0, 1]
        #[arg(long, allow_hyphen_values = true)]
        eav: f64,
        /// Cutpoint pressure risk score [0, 1]
        #[arg(long, allow_hyphen_values = true)]
        cpr: f64,
        /// Weight multiplier score [0, 1]
        #[arg(long, allow_hyphen_values = true)]
        wm: f64,
        /// Output result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Score all measures from an ECDS results CSV and a measure weights CSV
    Batch {
        /// Path to NCQA ECDS results CSV
        #[arg(long)]
        ecds: PathBuf,
        /// Path to CMS measure weights CSV
        #[arg(long)]
        weights: PathBuf,
        /// Max cutpoint shift for CPR normalization (default: 0.5)
        #[arg(long)]
        max_shift: Option<f64>,
        /// Max measure weight for WM normalization (default: 5.0)
        #[arg(long)]
        max_weight: Option<f64>,
        /// Write scored CSV to this path (default: print table to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output contract-level summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compute the contract summary of a previously scored CSV
    Summarize {
        /// Path to a scored CSV (as written by `batch --output`)
        #[arg(long)]
        scored: PathBuf,
        /// Output contract-level summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the effective combination weights and normalization parameters
    Weights,
}

#[derive(Parser, Debug)]
#[command(name = "shock-index")]
#[command(about = "Compute ECDS Shock Index from normalized factors or CSV files", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/shock-index/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    // Legacy flat invocation: shock-index --ccs X --eav Y --cpr Z --wm W
    #[arg(long, hide = true, allow_hyphen_values = true)]
    ccs: Option<f64>,
    #[arg(long, hide = true, allow_hyphen_values = true)]
    eav: Option<f64>,
    #[arg(long, hide = true, allow_hyphen_values = true)]
    cpr: Option<f64>,
    #[arg(long, hide = true, allow_hyphen_values = true)]
    wm: Option<f64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl Cli {
    /// The subcommand to run. Without one, the four legacy flags together
    /// mean `single` with text output; anything else is `None`.
    fn resolve_command(&mut self) -> Option<Commands> {
        if let Some(command) = self.command.take() {
            return Some(command);
        }
        match (self.ccs, self.eav, self.cpr, self.wm) {
            (Some(ccs), Some(eav), Some(cpr), Some(wm)) => Some(Commands::Single {
                ccs,
                eav,
                cpr,
                wm,
                json: false,
            }),
            _ => None,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "shock_index=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Print an error to stderr and exit with `code`.
fn exit_with(code: i32, kind: &str, err: impl Display) -> ! {
    eprintln!("{} error: {:#}", kind, err);
    std::process::exit(code);
}

fn main() {
    let mut cli = Cli::parse();
    init_logging(cli.verbose);

    // Load config
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let config = match shock_index::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => exit_with(EXIT_CONFIG, "Config", e),
    };

    // Validate scoring config at startup
    let effective_scoring = config.scoring.unwrap_or_default();
    if let Err(errors) = shock_index::scoring::validate_scoring(&effective_scoring) {
        eprintln!("Scoring config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let calculator = match ShockIndexCalculator::new(effective_scoring.effective_weights()) {
        Ok(c) => c,
        Err(e) => exit_with(EXIT_CONFIG, "Config", e),
    };
    debug!(weights = ?calculator.weights(), "calculator ready");

    let use_colors = !cli.no_color && shock_index::output::should_use_colors();

    let Some(command) = cli.resolve_command() else {
        // Help goes to stdout, but the invocation is still a usage error
        let _ = Cli::command().print_help();
        println!();
        std::process::exit(EXIT_USAGE);
    };

    match command {
        Commands::Single {
            ccs,
            eav,
            cpr,
            wm,
            json,
        } => {
            let score = calculator.calculate(ccs, eav, cpr, wm);
            let tier = classify_risk(score);
            if json {
                match shock_index::output::format_single_json(score, tier) {
                    Ok(s) => println!("{}", s),
                    Err(e) => exit_with(EXIT_USAGE, "Output", e),
                }
            } else {
                println!("{}", shock_index::output::format_single(score, tier, use_colors));
                if cli.verbose {
                    let parts = calculator.breakdown(ccs, eav, cpr, wm);
                    eprintln!("{}", shock_index::output::format_breakdown(&parts));
                }
            }
        }
        Commands::Batch {
            ecds,
            weights,
            max_shift,
            max_weight,
            output,
            json,
        } => {
            let normalization = effective_scoring
                .effective_normalization()
                .with_overrides(max_shift, max_weight);

            let results = match shock_index::data::load_ncqa_ecds(&ecds) {
                Ok(r) => r,
                Err(e) => exit_with(EXIT_DATA, "Data", e),
            };
            let weight_rows = match shock_index::data::load_cms_measure_weights(&weights) {
                Ok(w) => w,
                Err(e) => exit_with(EXIT_DATA, "Data", e),
            };
            let merged = shock_index::data::merge_ecds_and_weights(results, &weight_rows);
            debug!(rows = merged.len(), "merged results with weights");

            let scored = match calculator.score_collection(merged, &normalization) {
                Ok(s) => s,
                Err(e) => exit_with(EXIT_SCORING, "Scoring", e),
            };
            let summary = match calculator.aggregate(&scored) {
                Ok(s) => s,
                Err(e) => exit_with(EXIT_SCORING, "Scoring", e),
            };

            if let Some(path) = &output {
                if let Err(e) = shock_index::data::save_scored_csv(path, &scored) {
                    exit_with(EXIT_DATA, "Output", e);
                }
            }

            if cli.verbose {
                for s in &scored {
                    eprintln!("{} ({:.4}):", s.record.measure_id, s.shock_index);
                    eprintln!("{}", shock_index::output::format_breakdown(&s.breakdown));
                }
            }

            match shock_index::output::format_batch_report(
                &scored,
                output.as_deref(),
                &summary,
                json,
                use_colors,
            ) {
                Ok(report) => println!("{}", report),
                Err(e) => exit_with(EXIT_USAGE, "Output", e),
            }
        }
        Commands::Summarize { scored, json } => {
            let observations = match shock_index::data::load_scored_observations(&scored) {
                Ok(o) => o,
                Err(e) => exit_with(EXIT_DATA, "Data", e),
            };
            let summary = match observations.aggregate() {
                Ok(s) => s,
                Err(e) => exit_with(EXIT_SCORING, "Scoring", e),
            };
            match shock_index::output::format_summary(&summary, json, use_colors) {
                Ok(s) => println!("{}", s),
                Err(e) => exit_with(EXIT_USAGE, "Output", e),
            }
        }
        Commands::Weights => {
            println!(
                "{}",
                shock_index::output::format_weights(
                    &calculator.weights(),
                    &effective_scoring.effective_normalization()
                )
            );
        }
    }

    std::process::exit(EXIT_SUCCESS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use shock_index::scoring::Normalization;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("shock-index").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_legacy_flags_run_single() {
        let mut cli = parse(&["--ccs", "0.8", "--eav", "0.5", "--cpr", "0.5", "--wm", "-0.5"]);
        match cli.resolve_command() {
            Some(Commands::Single {
                ccs,
                eav,
                cpr,
                wm,
                json,
            }) => {
                assert_eq!((ccs, eav, cpr, wm), (0.8, 0.5, 0.5, -0.5));
                assert!(!json);
            }
            other => panic!("expected single, got {:?}", other),
        }
    }

    #[test]
    fn test_no_arguments_resolve_to_help() {
        assert!(parse(&[]).resolve_command().is_none());
    }

    #[test]
    fn test_incomplete_legacy_flags_resolve_to_help() {
        let mut cli = parse(&["--ccs", "0.8", "--eav", "0.5", "--cpr", "0.5"]);
        assert!(cli.resolve_command().is_none());
    }

    #[test]
    fn test_subcommand_wins_over_legacy_flags() {
        let mut cli = parse(&[
            "--ccs", "0.1", "single", "--ccs", "0.9", "--eav", "0", "--cpr", "0", "--wm", "0",
            "--json",
        ]);
        match cli.resolve_command() {
            Some(Commands::Single { ccs, json, .. }) => {
                assert_eq!(ccs, 0.9);
                assert!(json);
            }
            other => panic!("expected single, got {:?}", other),
        }
    }

    #[test]
    fn test_batch_normalization_flags_parse() {
        let mut cli = parse(&[
            "batch", "--ecds", "r.csv", "--weights", "w.csv", "--max-shift", "1.5",
        ]);
        match cli.resolve_command() {
            Some(Commands::Batch {
                max_shift,
                max_weight,
                ..
            }) => {
                let configured = Normalization {
                    max_shift: 0.75,
                    max_weight: 4.0,
                };
                let effective = configured.with_overrides(max_shift, max_weight);
                assert_eq!(effective.max_shift, 1.5);
                assert_eq!(effective.max_weight, 4.0);
            }
            other => panic!("expected batch, got {:?}", other),
        }
    }
}
