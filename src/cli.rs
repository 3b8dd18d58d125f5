//! Command-line structure for the `marrow` tool

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "marrow")]
#[command(about = "Inspect skeletal animation assets and sample their poses", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display the skeleton and animation tables of an asset file
    Inspect {
        /// Path to the asset file
        asset: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the skinning matrices of one frame
    Pose {
        /// Path to the asset file
        asset: PathBuf,

        /// Animation to sample
        #[arg(short, long, default_value = "0")]
        animation: u32,

        /// Wall-clock seconds since the animation started, fed through the
        /// configured frame clock
        #[arg(short, long, default_value = "0")]
        time: f32,

        /// Animation to cross-fade out of, started at the same moment
        #[arg(long)]
        from: Option<u32>,

        /// Cross-fade duration in seconds (defaults to the configured value)
        #[arg(long, requires = "from")]
        fade: Option<f32>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a settings file with default values
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
