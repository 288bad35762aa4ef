//! Tracing setup for programs embedding a class registry.
//!
//! The registry logs through `tracing`: class definitions and declared types
//! at `debug`, metadata cache fills, hygiene renames and constructor
//! dispatch at `trace`. Nothing is printed unless a subscriber is installed;
//! `init_tracing` installs one from the environment:
//!
//! ```bash
//! LINEAGE_LOG=debug my-program                         # flat text
//! LINEAGE_LOG=trace LINEAGE_LOG_FORMAT=tree my-program # indented spans
//! LINEAGE_LOG="lineage_core::dispatch=trace" LINEAGE_LOG_FORMAT=json my-program
//! ```
//!
//! `RUST_LOG` is honoured when `LINEAGE_LOG` is unset.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

const LOG_ENV: &str = "LINEAGE_LOG";
const FORMAT_ENV: &str = "LINEAGE_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    /// Hierarchical output via `tracing-tree`; shows each `define` span with
    /// the events it produced.
    Tree,
    /// Newline-delimited JSON.
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var(FORMAT_ENV).unwrap_or_default())
    }
}

fn build_filter() -> Option<EnvFilter> {
    match std::env::var(LOG_ENV) {
        Ok(directives) => Some(EnvFilter::builder().parse_lossy(directives)),
        Err(_) if std::env::var("RUST_LOG").is_ok() => Some(EnvFilter::from_default_env()),
        Err(_) => None,
    }
}

/// Install a global subscriber writing to stderr.
///
/// Returns `false` without doing anything when neither `LINEAGE_LOG` nor
/// `RUST_LOG` is set, or when another subscriber is already installed.
pub fn init_tracing() -> bool {
    let Some(filter) = build_filter() else {
        return false;
    };

    match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_targets(true);
            Registry::default().with(filter).with(tree).try_init().is_ok()
        }
        LogFormat::Json => {
            let json = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json).try_init().is_ok()
        }
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok(),
    }
}
