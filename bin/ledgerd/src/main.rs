//! Thin binary wiring the ledger crates together behind a config file and
//! a handful of CLI flags (the `strata-client` role in this workspace,
//! minus everything that binary does for L1/L2 sync -- this core has no
//! networking component of its own).

mod args;
mod fork_handler;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context};
use args::Args;
use clap::Parser;
use fork_handler::ElectionForkHandler;
use ledger_common::clock::WallClock;
use ledger_common::config::Config;
use ledger_common::logging::{self, LoggerConfig};
use ledger_consensus::prelude::{ElectionManager, SystemClock, VoteProcessor};
use ledger_core::context::{Clock, KeySigner, LedgerParams};
use ledger_core::ledger::Ledger;
use ledger_primitives::buf::Buf32;
use ledger_primitives::ids::AccountId;
use ledger_primitives::work::WorkValidator;
use ledger_processor::BlockProcessor;
use ledger_rocksdb::RocksDatabase;
use ledger_test_utils::{DeterministicSigner, NullWorkValidator};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("FATAL ERROR: {err:?}");
        return Err(err);
    }
    Ok(())
}

fn run(args: Args) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.config).with_context(|| format!("reading config at {:?}", args.config))?;
    let config: Config = toml::from_str(&raw).context("parsing config")?;

    logging::init(LoggerConfig::new(args.whoami.clone().unwrap_or_else(|| "ledgerd".to_string())));

    let datadir = args.datadir.clone().unwrap_or_else(|| config.store.datadir.clone());
    let db = RocksDatabase::open(&datadir).with_context(|| format!("opening store at {datadir:?}"))?;

    let params = ledger_params_from_config(&config)?;

    // The work and key services are external collaborators this core only
    // consumes: it never generates or holds wallet keys and has no opinion
    // on the work algorithm beyond the threshold contract. Until a real
    // service is wired in, `--standalone` runs this node against the
    // deterministic stand-ins from `ledger-test-utils`, which is only
    // sound for a single-node development deployment.
    if !args.standalone {
        bail!("no production key/work service is wired in yet; pass --standalone to run against the deterministic test signer");
    }
    let signer: Arc<dyn KeySigner> = Arc::new(DeterministicSigner::new());
    let work: Arc<dyn WorkValidator> = Arc::new(NullWorkValidator);
    let clock: Arc<dyn Clock> = Arc::new(WallClock::new());

    let ledger = Ledger::with_unchecked_capacity(
        db,
        params,
        signer,
        work,
        clock,
        HashMap::new(),
        config.store.unchecked_capacity,
    )
    .context("constructing ledger")?;
    let ledger = Arc::new(ledger);

    let monotonic_clock: Arc<dyn ledger_consensus::prelude::MonotonicClock> = Arc::new(SystemClock::new());
    let elections = Arc::new(ElectionManager::new(
        config.consensus.vote_cooldown_ms,
        config.consensus.vote_cooldown_ms,
        5 * 60_000,
    ));
    let fork_handler = Arc::new(ElectionForkHandler::new(elections.clone(), monotonic_clock.clone()));
    let processor = BlockProcessor::new(ledger.clone(), Some(fork_handler as Arc<dyn ledger_processor::ForkHandler>));
    let vote_signer: Arc<dyn KeySigner> = Arc::new(DeterministicSigner::new());
    let votes = VoteProcessor::new(elections.clone(), vote_signer, monotonic_clock);

    tracing::info!(
        datadir = %datadir.display(),
        genesis = %params_account_display(&ledger),
        "ledgerd ready"
    );

    // No networking component is in scope for this core: blocks and votes
    // arrive over the `Process`/`Election` APIs exposed as plain library
    // calls, not a wire protocol this binary serves. Wait here so an
    // embedder (or a future transport layer) can submit work through
    // `processor`/`votes`/`ledger` while the process stays up.
    wait_for_shutdown_signal()?;

    processor.flush();
    votes.flush();
    drop(processor);
    drop(votes);
    Ok(())
}

fn params_account_display<D: ledger_db::Database>(ledger: &Ledger<D>) -> AccountId {
    ledger.params().genesis_account
}

fn ledger_params_from_config(config: &Config) -> anyhow::Result<LedgerParams> {
    let account = decode_account(&config.genesis.account).context("genesis.account")?;
    let representative = match &config.genesis.representative {
        Some(r) => decode_account(r).context("genesis.representative")?,
        None => account,
    };
    Ok(LedgerParams {
        genesis_supply: config.genesis.supply,
        genesis_account: account,
        genesis_representative: representative,
        bootstrap_weight_max_blocks: config.consensus.bootstrap_weight_max_blocks,
    })
}

fn decode_account(hex_str: &str) -> anyhow::Result<AccountId> {
    let bytes = hex::decode(hex_str).context("invalid hex")?;
    let buf = Buf32::from_slice(&bytes).context("expected exactly 32 bytes")?;
    Ok(AccountId::from(buf))
}

fn wait_for_shutdown_signal() -> anyhow::Result<()> {
    // A minimal stand-in for a real signal handler: this core has no
    // async runtime or event loop of its own, so blocking on stdin EOF is
    // enough to let an operator (or a wrapping process supervisor closing
    // the pipe) stop the node.
    use std::io::Read;
    let mut buf = [0u8; 1];
    let _ = std::io::stdin().read(&mut buf);
    Ok(())
}
