//! Settings come from a TOML file (chosen by build profile or `--settings`)
//! overlaid by `DIARY__SECTION__KEY` environment variables.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
