//! Command line front end for callscope.
//!
//! Reads stored runs from a directory and prints flat, diff and
//! parent/child reports as text tables or JSON.

mod config;
mod renderer;
mod store;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use callscope_core::model::RunData;
use callscope_core::{ReportRequest, RunSelection, generate, parse_weights};
use callscope_protocol::Column;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::{Config, DEFAULT_CONFIG, OutputFormat};
use renderer::CliOutput;
use store::DirStore;

#[derive(Parser)]
#[command(name = "callscope")]
#[command(about = "Inspect and compare hierarchical profiler runs", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Directory holding stored runs (overrides `runs_dir`)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Source category of the runs (overrides `source`)
    #[arg(long, global = true)]
    source: Option<String>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ReportArgs {
    /// Show one function with its callers and callees
    #[arg(long)]
    symbol: Option<String>,

    /// Sort column: fn, ct, wt, excl_wt, cpu, excl_cpu, mu, ...
    #[arg(long)]
    sort: Option<Column>,

    /// Show every function
    #[arg(long, conflicts_with = "limit")]
    all: bool,

    /// Number of rows; negative shows the last rows
    #[arg(long, allow_hyphen_values = true)]
    limit: Option<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report on one run, or the weighted mean of several
    Show {
        /// Run id, or comma-separated ids to aggregate
        runs: String,

        /// Comma-separated positive weights, one per run
        #[arg(long)]
        weights: Option<String>,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Compare two runs (values are run2 - run1)
    Diff {
        run1: String,
        run2: String,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// List stored runs, newest first
    List,

    /// Validate a run file and store it under the runs directory
    Import {
        file: PathBuf,

        /// Run id (default: file stem)
        #[arg(long)]
        id: Option<String>,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

impl ReportArgs {
    fn into_request(
        self,
        config: &Config,
        source: String,
        runs: RunSelection,
    ) -> Result<ReportRequest> {
        let sort = match self.sort {
            Some(sort) => Some(sort),
            None => config
                .sort
                .as_deref()
                .map(str::parse::<Column>)
                .transpose()
                .context("invalid `sort` in config")?,
        };
        let limit = if self.all {
            0
        } else {
            self.limit.unwrap_or(config.limit)
        };
        Ok(ReportRequest {
            source,
            runs,
            symbol: self.symbol,
            sort,
            limit,
        })
    }
}

fn import(
    store: &DirStore,
    source: &str,
    file: &Path,
    id: Option<String>,
) -> Result<(String, PathBuf)> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let data: RunData = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid run", file.display()))?;
    let id = match id {
        Some(id) => id,
        None => file
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .with_context(|| format!("cannot derive a run id from {}", file.display()))?,
    };
    let path = store.save_run(&id, source, &data)?;
    tracing::info!(id, edges = data.len(), "imported run");
    Ok((id, path))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load_optional(&cli.config);
    let store = DirStore::new(cli.dir.unwrap_or_else(|| config.runs_dir.clone()));
    let source = cli.source.unwrap_or_else(|| config.source.clone());
    let output = CliOutput::new(cli.json || config.format == OutputFormat::Json);

    let request = match cli.command {
        Commands::Show {
            runs,
            weights,
            report,
        } => {
            let ids: Vec<String> = runs
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
            let weights = weights.as_deref().map(parse_weights).transpose()?;
            report.into_request(&config, source, RunSelection::Single { ids, weights })?
        }
        Commands::Diff { run1, run2, report } => {
            report.into_request(&config, source, RunSelection::Diff { run1, run2 })?
        }
        Commands::List => ReportRequest::new(source, RunSelection::None),
        Commands::Import { file, id } => {
            let (id, path) = import(&store, &source, &file, id)?;
            return output.print_stored(&id, &path);
        }
    };

    let report = generate(&store, &request).context("failed to build report")?;
    output.print_report(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use callscope_core::RunSource;
    use callscope_protocol::Metric;

    fn show_args(flags: &[&str]) -> ReportArgs {
        let mut argv = vec!["callscope", "show", "r1"];
        argv.extend_from_slice(flags);
        let Commands::Show { report, .. } = Cli::try_parse_from(argv).unwrap().command else {
            panic!("expected the show command");
        };
        report
    }

    fn request(flags: &[&str], config: &Config) -> Result<ReportRequest> {
        show_args(flags).into_request(config, "web".to_string(), RunSelection::None)
    }

    fn config(sort: Option<&str>, limit: i64) -> Config {
        Config {
            sort: sort.map(str::to_string),
            limit,
            ..Config::default()
        }
    }

    #[test]
    fn all_flag_shows_every_row() {
        let req = request(&["--all"], &config(None, 25)).unwrap();
        assert_eq!(req.limit, 0);
        assert!(Cli::try_parse_from(["callscope", "show", "r1", "--all", "--limit", "3"]).is_err());
    }

    #[test]
    fn flags_override_config() {
        let cfg = config(Some("cpu"), 5);

        let from_config = request(&[], &cfg).unwrap();
        assert_eq!(from_config.sort, Some(Column::Inclusive(Metric::CpuTime)));
        assert_eq!(from_config.limit, 5);

        let from_flags = request(&["--sort", "excl_wt", "--limit", "-3"], &cfg).unwrap();
        assert_eq!(from_flags.sort, Some(Column::Exclusive(Metric::WallTime)));
        assert_eq!(from_flags.limit, -3);
        assert_eq!(from_flags.source, "web");
    }

    #[test]
    fn unknown_config_sort_is_an_error() {
        let err = request(&[], &config(Some("speed"), 5)).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("invalid `sort` in config"), "{message}");
        assert!(message.contains("speed"), "{message}");

        assert!(request(&["--sort", "wt"], &config(Some("speed"), 5)).is_ok());
    }

    #[test]
    fn import_defaults_the_id_to_the_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nightly.json");
        std::fs::write(
            &file,
            r#"{"main()": {"ct": 1, "wt": 100}, "main()==>work": {"ct": 2, "wt": 40}}"#,
        )
        .unwrap();
        let store = DirStore::new(dir.path().join("runs"));

        let (id, path) = import(&store, "web", &file, None).unwrap();
        assert_eq!(id, "nightly");
        assert!(path.ends_with("nightly.web.json"));
        assert_eq!(store.get_run("nightly", "web").unwrap().data.len(), 2);

        let (id, _) = import(&store, "web", &file, Some("baseline".to_string())).unwrap();
        assert_eq!(id, "baseline");
        assert!(store.get_run("baseline", "web").is_ok());
    }

    #[test]
    fn import_rejects_malformed_runs() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.json");
        std::fs::write(&file, r#"{"main()==>": {"wt": 1}}"#).unwrap();
        let store = DirStore::new(dir.path().join("runs"));

        let err = import(&store, "web", &file, None).unwrap_err();
        assert!(format!("{err:#}").contains("is not a valid run"));
        assert!(store.list_runs("web").unwrap().is_empty());

        let missing = import(&store, "web", &dir.path().join("absent.json"), None);
        assert!(missing.is_err());
    }
}
