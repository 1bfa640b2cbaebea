use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use crate::completion::CompletionKind;

#[derive(Parser, Debug)]
#[command(
    name = "ssh-inventory",
    version,
    about = "Generate SSH configs and shell completions from YAML inventories",
    after_help = "EXAMPLES:\n  List clients:            ssh-inventory --inventory ~/inventory --completion clients\n  SSH arguments for host:  ssh $(ssh-inventory --inventory ~/inventory --string web1)\n  Regenerate SSH configs:  ssh-inventory --inventory ~/inventory --config"
)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["string", "config", "completion"])
))]
pub struct Cli {
    #[arg(long, help = "Path to the inventory directory")]
    pub inventory: PathBuf,

    #[arg(long, help = "Search in this client's hosts only")]
    pub client: Option<String>,

    #[arg(
        long,
        help = "Directory for the generated per-client SSH configs [default: ~/.ssh/config.d/]"
    )]
    pub config_dir: Option<PathBuf>,

    #[arg(long, help = "Path to the main SSH config [default: ~/.ssh/config]")]
    pub config_main: Option<PathBuf>,

    #[arg(long, help = "Place quoted SSH options in single quotes")]
    pub quote_opts_quotes: bool,

    #[arg(long, value_name = "HOST", help = "Print the ssh arguments for HOST")]
    pub string: Option<String>,

    #[arg(long, help = "Regenerate the SSH configs")]
    pub config: bool,

    #[arg(long, value_enum, help = "Print completion words")]
    pub completion: Option<CompletionKind>,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase log verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,
}
