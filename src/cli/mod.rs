//! Command-line interface for variant-forge.
//!
//! Provides commands for generating message variations, exporting them, and
//! inspecting the prompts sent to the model.

mod commands;

pub use commands::{
    load_saved_rows, load_variations_file, parse_cli, parse_variation, run_with_cli, Cli,
    Commands, ExportArgs, GenerateArgs, PromptArgs,
};
