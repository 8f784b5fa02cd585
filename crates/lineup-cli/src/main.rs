#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use lineup_core::config::load_user_config;
use output::{OutputMode, resolve_output_mode};
use std::env;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "lineup: dependency-aware ordering for declared resources",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides FORMAT and the user config).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags, environment and user config.
    fn output_mode(&self, user_output: Option<&str>) -> OutputMode {
        resolve_output_mode(self.format, self.json, user_output)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Ordering",
        about = "Print resources in dependency order",
        long_about = "Print every resource after everything it depends on. Fails with the full list of cycles if any exist.",
        after_help = "EXAMPLES:\n    # Apply order\n    lineup sort stack.toml\n\n    # Teardown order, rejecting undeclared dependencies\n    lineup sort stack.toml --teardown --strict\n\n    # Emit machine-readable output\n    lineup sort stack.yaml --json"
    )]
    Sort(cmd::sort::SortArgs),

    #[command(
        next_help_heading = "Ordering",
        about = "List dependency cycles",
        long_about = "List every group of resources that depend on each other, outermost first.",
        after_help = "EXAMPLES:\n    # Show cycles\n    lineup cycles stack.toml\n\n    # Emit machine-readable output\n    lineup cycles stack.toml --json"
    )]
    Cycles(cmd::cycles::CyclesArgs),

    #[command(
        next_help_heading = "Ordering",
        about = "Show parallel apply layers",
        long_about = "Group resources into layers; each layer depends only on earlier ones.",
        after_help = "EXAMPLES:\n    # Show layers\n    lineup plan stack.toml\n\n    # Include each resource's dependencies\n    lineup plan stack.toml --explain"
    )]
    Plan(cmd::plan::PlanArgs),

    #[command(
        next_help_heading = "Inspection",
        about = "Summarize or export the dependency graph",
        long_about = "Show graph counts, content hash and cycles, or export Graphviz DOT.",
        after_help = "EXAMPLES:\n    # Summary\n    lineup graph stack.toml\n\n    # Render with Graphviz\n    lineup graph stack.toml --dot | dot -Tsvg > stack.svg"
    )]
    Graph(cmd::graph::GraphArgs),

    #[command(
        next_help_heading = "Configuration",
        about = "Show or change configuration",
        long_about = "Show effective configuration or set/unset project and user keys.",
        after_help = "EXAMPLES:\n    # Show effective configuration\n    lineup config show\n\n    # Make strict mode the project default\n    lineup config set sort.strict true\n\n    # Prefer JSON output everywhere\n    lineup config set --scope user output json"
    )]
    Config(cmd::config::ConfigArgs),

    #[command(
        next_help_heading = "Configuration",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    lineup completions bash\n\n    # Generate zsh completions\n    lineup completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("LINEUP_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "lineup=debug,info"
        } else {
            "lineup=info,warn"
        })
    });

    let format = env::var("LINEUP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_root = env::current_dir()?;
    let user = load_user_config()?;
    let output = cli.output_mode(user.output.as_deref());
    debug!(?output, root = %project_root.display(), "resolved output mode");

    match cli.command {
        Commands::Sort(args) => cmd::sort::run_sort(&args, output, &project_root),
        Commands::Cycles(args) => cmd::cycles::run_cycles(&args, output, &project_root),
        Commands::Plan(args) => cmd::plan::run_plan(&args, output, &project_root),
        Commands::Graph(args) => cmd::graph::run_graph(&args, output, &project_root),
        Commands::Config(args) => cmd::config::run_config(&args, &project_root, output),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
