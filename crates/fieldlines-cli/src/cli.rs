use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Fieldlines Contributors",
    version,
    about = "Fieldlines CLI - Trace the electric field lines of 2D point-charge scenes stored in project files.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used for tracing.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Trace the field lines of a project and write them as a lines document.
    Compute(ComputeArgs),
    /// Play a recorded list of interaction actions against a project.
    Replay(ReplayArgs),
    /// Print the simulations, charges and settings of a project.
    Inspect(InspectArgs),
}

/// Engine configuration options shared by the tracing commands.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Path to an engine configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S trace.stall-epsilon=1e-10
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `compute` subcommand.
#[derive(Args, Debug)]
pub struct ComputeArgs {
    /// Path to the input project file (JSON).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output lines document (JSON).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    #[command(flatten)]
    pub target: TargetSelection,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Which simulations to trace. The active one is traced when neither flag is
/// given.
#[derive(Args, Debug, Clone, Copy)]
#[group(required = false, multiple = false)]
pub struct TargetSelection {
    /// Trace only the simulation at this tab position (0-based).
    #[arg(long, value_name = "INDEX")]
    pub simulation: Option<usize>,
    /// Trace every simulation of the project.
    #[arg(long)]
    pub all: bool,
}

/// Arguments for the `replay` subcommand.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Path to the input project file (JSON).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to a JSON array of interaction actions.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub actions: PathBuf,

    /// Path for the output lines document (JSON).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Also write the project as it stands after the replay.
    #[arg(long, value_name = "PATH")]
    pub save: Option<PathBuf>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the input project file (JSON).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,
}
