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
    author = "Tony Kan",
    version,
    about = "BRER CLI - Manage the run state of Bias-Resampling Ensemble Refinement simulations.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create (or resume) the state file of one ensemble member.
    Init(InitArgs),
    /// Print a state file as JSON.
    Show {
        /// Path to the state file.
        #[arg(value_name = "STATE")]
        state: PathBuf,
    },
    /// Print a single parameter from a state file.
    Get(GetArgs),
    /// Assign parameters in a state file. Either all assignments succeed or none are saved.
    Set(SetArgs),
    /// Move a state file to its next phase.
    Advance {
        /// Path to the state file.
        #[arg(value_name = "STATE")]
        state: PathBuf,
    },
}

/// Arguments for the `init` subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path to a run configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Layout Overrides ---
    /// Override the ensemble root directory.
    #[arg(short = 'd', long, value_name = "PATH")]
    pub ensemble_dir: Option<PathBuf>,

    /// Override the ensemble member index.
    #[arg(short = 'n', long, value_name = "INT")]
    pub ensemble_num: Option<u64>,

    /// Override the restraint definition file (JSON).
    #[arg(short, long, value_name = "PATH")]
    pub pairs: Option<PathBuf>,

    // --- Simulation Input Overrides ---
    /// Override the structural input (.tpr) file.
    #[arg(long, value_name = "PATH")]
    pub tpr_file: Option<PathBuf>,

    /// Override the checkpoint file the first segment starts from.
    #[arg(long, value_name = "PATH", requires = "tpr_file")]
    pub checkpoint: Option<PathBuf>,

    /// Override a general parameter, e.g. -S tau=100.
    /// Can be used multiple times.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `get` subcommand.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Path to the state file.
    #[arg(value_name = "STATE")]
    pub state: PathBuf,

    /// Name of the parameter.
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Restraint the parameter belongs to. Not needed for general parameters.
    #[arg(long, value_name = "RESTRAINT")]
    pub name: Option<String>,
}

/// Arguments for the `set` subcommand.
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Path to the state file.
    #[arg(value_name = "STATE")]
    pub state: PathBuf,

    /// Restraint to modify. Omit to modify general parameters.
    #[arg(long, value_name = "RESTRAINT")]
    pub name: Option<String>,

    /// Assignments such as `alpha=0.5` or `sites=[10,25]`.
    #[arg(value_name = "KEY=VALUE", required = true, num_args(1..))]
    pub assignments: Vec<String>,
}
