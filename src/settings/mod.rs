//! Settings come from a TOML file (`settings/dev.toml` or
//! `settings/release.toml` unless `--settings` points elsewhere).

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
