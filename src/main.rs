#![forbid(unsafe_code)]
//! PPM Tool Finder command line interface

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use ppm_finder::commands::{
    execute_criteria, execute_guided, execute_presets, execute_rank, execute_tools,
    guided::parse_answer, parse_weight, CriteriaOptions, GuidedOptions, PresetsOptions,
    RankOptions, SourceOptions, ToolsOptions,
};
use ppm_finder::config::{FinderConfig, DEFAULT_CONFIG_FILE};
use ppm_finder::finder::{AnalyticsSink, FilterMode, OutputFormat, TracingSink};

#[derive(Parser)]
#[command(name = "ppm-finder")]
#[command(about = "Rank project portfolio management tools against weighted criteria")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Project catalog merged over the built-in one
    #[arg(long, global = true, env = "PPM_FINDER_CATALOG")]
    catalog: Option<PathBuf>,

    /// Tool IDs to leave out (can specify multiple)
    #[arg(long, global = true)]
    exclude: Vec<String>,

    /// Keep only tools carrying one of these tags (can specify multiple)
    #[arg(long, global = true)]
    only_tag: Vec<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List scoring criteria
    Criteria {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List catalog tools
    Tools {
        /// Only tools carrying any of these tags
        #[arg(short, long)]
        tag: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rank tools for a set of weights and filters
    Rank {
        /// Criterion weight as criterion=1..5 (can specify multiple)
        #[arg(short, long, value_parser = parse_weight)]
        weight: Vec<(String, u8)>,

        /// Weight preset applied before --weight
        #[arg(short, long)]
        preset: Option<String>,

        /// Filter condition as comma-separated tags (one condition per flag)
        #[arg(short, long)]
        filter: Vec<String>,

        /// How filter conditions combine: and | or
        #[arg(short, long)]
        mode: Option<FilterMode>,

        /// Tool IDs to select, in priority order
        #[arg(long)]
        select: Vec<String>,

        /// Tool IDs to drop from the ranking
        #[arg(long)]
        remove: Vec<String>,

        /// Tool IDs to compare side by side
        #[arg(long)]
        compare: Vec<String>,

        /// Output format: text, markdown, json
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Show only the first N tools
        #[arg(long)]
        top: Option<usize>,
    },

    /// Answer a short questionnaire to set weights
    Guided {
        /// Answer as question=option (can specify multiple); skips prompts
        #[arg(short, long, value_parser = parse_answer)]
        answer: Vec<(String, String)>,

        /// Submit without confirmation
        #[arg(short = 'y', long)]
        yes: bool,

        /// Output format: text, markdown, json
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Show only the first N tools
        #[arg(long)]
        top: Option<usize>,
    },

    /// List weight presets
    Presets,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "ppm_finder=debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = FinderConfig::load_or_default(&cli.config)?;

    let source = SourceOptions {
        config,
        catalog: cli.catalog,
        exclude: cli.exclude,
        only_tags: cli.only_tag,
    };
    let sink: Arc<dyn AnalyticsSink> = Arc::new(TracingSink);

    let result = match cli.command {
        Commands::Criteria { json } => execute_criteria(CriteriaOptions { source, json }),
        Commands::Tools { tag, json } => execute_tools(ToolsOptions {
            source,
            tags: tag,
            json,
        }),
        Commands::Rank {
            weight,
            preset,
            filter,
            mode,
            select,
            remove,
            compare,
            format,
            top,
        } => {
            let options = RankOptions {
                source,
                preset,
                weights: weight,
                filters: split_filters(filter),
                mode,
                remove,
                select,
                compare,
                format,
                top,
            };
            execute_rank(options, sink)
        }
        Commands::Guided {
            answer,
            yes,
            format,
            top,
        } => {
            let options = GuidedOptions {
                source,
                answers: answer,
                format,
                top,
                yes,
            };
            execute_guided(options, sink)
        }
        Commands::Presets => execute_presets(PresetsOptions { source }),
    };

    if let Err(err) = result {
        eprintln!("{} {:#}", style("✗").red(), err);
        std::process::exit(1);
    }
    Ok(())
}

/// Each `--filter` occurrence is one condition; `--filter a,b` is a single
/// condition matching either tag.
fn split_filters(values: Vec<String>) -> Vec<Vec<String>> {
    values
        .into_iter()
        .map(|v| v.split(',').map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect())
        .filter(|tags: &Vec<String>| !tags.is_empty())
        .collect()
}
