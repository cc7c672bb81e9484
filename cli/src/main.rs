//! statledger: admin CLI over a stats document.
//!
//! # Usage
//!
//! ```text
//! statledger get <entity> Points
//! statledger add BSCS-1 <entity> Points 5
//! statledger find-name steve
//! ```

mod command;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use statledger_core::{EngineConfig, MapResolver, StatsEngine, YamlFileStore};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use command::parse_args;


fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let arg_refs: Vec<&str> = args[1..].iter().map(|s| s.as_str()).collect();

    let cmd = match parse_args(&arg_refs) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("statledger: {}", e);
            process::exit(1);
        }
    };

    let config_dir = resolve_config_dir();
    let config = match load_config(&config_dir) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("statledger: {}", e);
            process::exit(1);
        }
    };
    debug!(stats_file = %config.stats_file.display(), "using stats document");

    let store = Arc::new(YamlFileStore::new(&config.stats_file));
    let resolver = Arc::new(MapResolver::new());
    let engine = StatsEngine::new(config, store, resolver.clone());

    match command::execute(&engine, &resolver, cmd) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(message) => {
            eprintln!("statledger error: {}", message);
            process::exit(1);
        }
    }
}


fn resolve_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("STATLEDGER_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".config").join("statledger")
}


/// `config.yml` in the config dir if present, otherwise defaults with the
/// stats document kept alongside it.
fn load_config(config_dir: &Path) -> Result<EngineConfig, String> {
    let path = config_dir.join("config.yml");
    if path.exists() {
        return EngineConfig::load(&path).map_err(|e| e.to_string());
    }
    let mut config = EngineConfig::default();
    config.stats_file = config_dir.join(&config.stats_file);
    Ok(config)
}
