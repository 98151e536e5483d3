use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// pgprovision - profile a CSV file and provision PostgreSQL for it
#[derive(Parser, Debug)]
#[command(name = "pgprovision")]
#[command(version)]
#[command(
    about = "Profile CSV columns and provision a PostgreSQL database, table and roles",
    long_about = None
)]
pub struct Cli {
    /// Enable verbose logging (debug level unless RUST_LOG is set)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Count distinct values and maximum length per column
    Profile(ProfileArgs),

    /// Create database, schema, enum, table, load the file, set up roles
    Provision(ProvisionArgs),

    /// Print role attributes, memberships, grants and sample rows
    Verify(VerifyArgs),

    /// Drop the database and every role the layout names
    Teardown(ConfigArgs),

    /// Store a password in the OS keychain, read from stdin
    StorePassword(StorePasswordArgs),
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// TOML configuration file layered over the built-in defaults
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// Delimited file with a header row
    pub file: PathBuf,

    /// Zero-based column index; repeat for several, omit for all
    #[arg(short = 'c', long = "column")]
    pub columns: Vec<usize>,

    /// Field delimiter
    #[arg(short = 'd', long = "delimiter", default_value_t = ',')]
    pub delimiter: char,

    /// Largest distinct-value count treated as enumerable
    #[arg(long = "enum-threshold", default_value_t = 10)]
    pub enum_threshold: usize,

    /// Multiplier applied to the observed maximum length
    #[arg(long = "headroom", default_value_t = 2)]
    pub headroom: usize,

    /// Emit JSON instead of text
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ProvisionArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Tear down existing artifacts first
    #[arg(long = "recreate")]
    pub recreate: bool,

    /// Print the plan without connecting
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Emit the verification report as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Emit JSON instead of text
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct StorePasswordArgs {
    /// Keychain key, referenced later as `keychain:<KEY>`
    pub key: String,
}
