//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `roost_core` linkage and print the core version.
//! - Optionally reload a store file and print per-class entity counts.
//! - Start file logging when `ROOST_LOG_DIR` names an absolute directory.

use roost_core::{init_logging_from_env, Store, StoreConfig, LOG_DIR_ENV, STORE_PATH_ENV};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("roost_core version={}", roost_core::core_version());

    if let Err(err) = init_logging_from_env() {
        eprintln!("roost_core logging disabled ({LOG_DIR_ENV}): {err}");
    }

    let config = match std::env::args_os().nth(1) {
        Some(path) => StoreConfig::new(path),
        None if std::env::var_os(STORE_PATH_ENV).is_some() => StoreConfig::from_env(),
        None => return ExitCode::SUCCESS,
    };

    match Store::open(config) {
        Ok(store) => {
            for (class_name, count) in store.class_counts() {
                println!("class={class_name} count={count}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("roost_core reload failed: {err}");
            ExitCode::FAILURE
        }
    }
}
