//! CLI interface for Stride
//!
//! This module provides the command-line interface using clap's derive API.
//! The only required input is the goal text.

use clap::Parser;
use std::path::PathBuf;

/// Stride agent loop
///
/// Runs a step-bounded agent against a goal and prints the result.
#[derive(Parser, Debug)]
#[command(name = "stride")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the step budget
    #[arg(long, value_name = "N")]
    pub max_steps: Option<usize>,

    /// Do not register the reviewer sub-agent
    #[arg(long)]
    pub no_review: bool,

    /// The goal, e.g. "Solve Advent of Code 2020 Day 16 Part A"
    #[arg(required = true, num_args = 1..)]
    pub goal: Vec<String>,
}

impl Cli {
    /// Goal words joined with single spaces
    pub fn goal_text(&self) -> String {
        self.goal.join(" ")
    }
}
