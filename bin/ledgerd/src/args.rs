use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Clone, Debug)]
#[command(name = "ledgerd", about = "Account-chain ledger node")]
pub struct Args {
    /// Path to the TOML config file.
    #[arg(long, short = 'c')]
    pub config: PathBuf,

    /// Overrides `store.datadir` from the config file.
    #[arg(long)]
    pub datadir: Option<PathBuf>,

    /// Tag stamped on every log line, for telling several instances apart.
    #[arg(long)]
    pub whoami: Option<String>,

    /// Required until a real key/work service is wired in: runs against
    /// the deterministic stand-ins from `ledger-test-utils`.
    #[arg(long)]
    pub standalone: bool,
}
