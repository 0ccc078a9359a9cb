//! `cset-log`: runs the changeset log cache's worker fleet against a
//! local SQLite store, optionally answering one `range_of` query and
//! exiting instead of serving indefinitely.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use cset_core::{CsetConfig, Revision};
use cset_fetch::HgChangelogFetcher;
use cset_store::CsetStore;
use cset_workers::control::stop_channel;
use cset_workers::core::CsetCore;

#[derive(Parser, Debug)]
#[command(name = "cset-log", about = "Persistent windowed cache over a linear changelog")]
struct Cli {
    /// Path to a TOML config file. Falls back to built-in defaults for
    /// any field it omits.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the range between two changesets instead of running the
    /// worker fleet indefinitely.
    #[arg(long, requires = "rev_b")]
    rev_a: Option<String>,

    #[arg(long, requires = "rev_a")]
    rev_b: Option<String>,
}

fn load_config(path: Option<&PathBuf>) -> CsetConfig {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .unwrap_or_else(|e| panic!("failed to read config {}: {e}", path.display()));
            toml::from_str(&text).unwrap_or_else(|e| panic!("invalid config {}: {e}", path.display()))
        }
        None => CsetConfig::default(),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let store = CsetStore::open(PathBuf::from(config.effective_database_name()).as_path())
        .expect("failed to open cset store");
    let fetcher = HgChangelogFetcher::new(config.effective_hg_url(), config.effective_hg_branch());

    let core = Arc::new(CsetCore::new(Arc::new(store), Arc::new(fetcher), config));

    let fleet = cset_workers::bootstrap_and_spawn(core.clone()).expect("bootstrap failed");

    if let (Some(rev_a), Some(rev_b)) = (cli.rev_a, cli.rev_b) {
        let (_stop, signal) = stop_channel();
        let rows = cset_service::range_of(
            &core,
            &signal,
            &Revision::from_node(&rev_a),
            &Revision::from_node(&rev_b),
        )
        .expect("range_of failed");
        for row in rows {
            println!("{}\t{}\t{}", row.revnum, row.revision, row.timestamp);
        }
        fleet.shutdown();
        return;
    }

    tracing::info!("cset-log worker fleet running, press Ctrl+C to stop");
    std::thread::park();
    fleet.shutdown();
}
