// src/cli.rs

//! CLI definitions for the dot dotfile manager
//!
//! Command-line interface built with clap derive. The actual command
//! implementations live in the `commands` module.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::resolver::ResolutionPolicy;

#[derive(Parser)]
#[command(name = "dot")]
#[command(version)]
#[command(
    about = "Dotfile manager that links package trees into a target directory",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// Directory containing the package trees (default: current directory)
    #[arg(short = 'd', long = "dir", global = true)]
    pub dir: Option<PathBuf>,

    /// Directory to materialize links into (default: home directory)
    #[arg(short = 't', long = "target", global = true)]
    pub target: Option<PathBuf>,

    /// Path to the config file (default: ~/.config/dot/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory the backup policy preserves files into
    #[arg(long, global = true)]
    pub backup_dir: Option<PathBuf>,

    /// Reaction to a regular file occupying a link target
    #[arg(long, global = true, value_enum)]
    pub on_file_exists: Option<PolicyArg>,

    /// Reaction to an existing link pointing elsewhere
    #[arg(long, global = true, value_enum)]
    pub on_wrong_link: Option<PolicyArg>,

    /// Extra ignore globs applied while scanning packages
    #[arg(long = "ignore", global = true)]
    pub ignore: Vec<String>,
}

/// Conflict policy names accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Fail,
    Backup,
    Overwrite,
    Skip,
}

impl From<PolicyArg> for ResolutionPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Fail => ResolutionPolicy::Fail,
            PolicyArg::Backup => ResolutionPolicy::Backup,
            PolicyArg::Overwrite => ResolutionPolicy::Overwrite,
            PolicyArg::Skip => ResolutionPolicy::Skip,
        }
    }
}

/// Plan rendering formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install packages: link their files into the target directory
    Manage {
        /// Package names under the package directory
        #[arg(required = true)]
        packages: Vec<String>,

        /// Plan and print without touching the filesystem
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove packages: delete their links from the target directory
    Unmanage {
        #[arg(required = true)]
        packages: Vec<String>,

        #[arg(long)]
        dry_run: bool,
    },

    /// Re-plan managed packages and reconcile the target directory
    Remanage {
        /// Package names; defaults to everything in the manifest
        packages: Vec<String>,

        #[arg(long)]
        dry_run: bool,
    },

    /// Move existing target files into a package and link them back
    Adopt {
        /// Package that should own the files
        package: String,

        /// Files to adopt, relative to the target directory
        #[arg(required = true)]
        files: Vec<String>,

        #[arg(long)]
        dry_run: bool,
    },

    /// Compute and print an install plan without executing it
    Plan {
        #[arg(required = true)]
        packages: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show what the manifest records as managed
    Status,
}
