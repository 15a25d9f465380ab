//! CLI interface for LeafScan
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags for the LeafScan engine.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// LeafScan Diagnosis Engine
///
/// Orchestrates leaf image classification, disease explanation, speech
/// synthesis, and plant information lookup against backend services.
#[derive(Parser, Debug)]
#[command(name = "leafscan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Diagnose a leaf image
    Diagnose {
        /// Plant category (potato, tomato, pepper)
        plant: String,

        /// Path to the leaf image (jpeg/png)
        image: PathBuf,
    },

    /// Show general information about a plant
    PlantInfo {
        /// Plant category (potato, tomato, pepper)
        plant: String,
    },

    /// List registered tools and their input schemas
    Tools,

    /// Validate the configuration file
    Doctor,
}
