//! Command line interface for the `reimburse` binary

use crate::config::{CONFIG_ENV, STORE_ENV};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

/// reimburse: print approved expense records as reimbursement forms.
///
/// Selected records are laid out five to an A5 form, converted to PDF with
/// LibreOffice, and placed two forms per A4 sheet.
#[derive(Debug, Parser, Clone)]
#[command(name = "reimburse", version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Export selected records to a PDF file.
    Export(ExportArgs),
    /// Print an amount in capital Chinese numerals.
    Upper(UpperArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// RUST_LOG takes precedence when set.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// JSON configuration file. Built-in defaults apply when omitted.
    #[arg(long, env = CONFIG_ENV)]
    config: Option<PathBuf>,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }
}

#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    /// JSON dataset with `users` and `expenses` arrays.
    #[arg(long, env = STORE_ENV)]
    store: PathBuf,

    /// Id of the requesting user.
    #[arg(long)]
    user: i64,

    /// Comma-separated record ids, e.g. 3,1,2
    #[arg(long)]
    ids: String,

    /// Directory to write the PDF into.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Date used in the file name (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl ExportArgs {
    pub fn store(&self) -> &Path {
        &self.store
    }

    pub fn user(&self) -> i64 {
        self.user
    }

    pub fn ids(&self) -> &str {
        &self.ids
    }

    pub fn out(&self) -> &Path {
        &self.out
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

#[derive(Debug, Parser, Clone)]
pub struct UpperArgs {
    /// Amount with at most two fractional digits.
    #[arg(allow_hyphen_values = true)]
    amount: String,
}

impl UpperArgs {
    pub fn amount(&self) -> &str {
        &self.amount
    }
}
