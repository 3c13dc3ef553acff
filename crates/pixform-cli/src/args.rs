//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "pixform")]
#[command(version, about = "Per-pixel formula renderer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate an expression at one pixel
    Eval {
        /// Formula text
        expr: String,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        x: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        y: f64,
        /// Image width seen by `w`
        #[arg(long, default_value_t = 0)]
        width: u32,
        /// Image height seen by `h`
        #[arg(long, default_value_t = 0)]
        height: u32,
        /// Skip constant folding
        #[arg(long)]
        no_optimize: bool,
    },

    /// Print the tree of an expression
    Graph {
        /// Formula text
        expr: String,
        /// Constant-fold before printing
        #[arg(long)]
        optimize: bool,
        #[arg(long, value_enum, default_value_t = GraphFormat::Xml)]
        format: GraphFormat,
    },

    /// Render channel formulas over an image
    Render(RenderArgs),

    /// Render a downsized RGB preview
    Preview {
        #[command(flatten)]
        render: RenderArgs,
        /// Preview width in pixels
        #[arg(long, default_value_t = 256)]
        width: u32,
        /// Preview height in pixels
        #[arg(long, default_value_t = 256)]
        height: u32,
    },

    /// List operators, values and functions
    Symbols,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Xml,
    Json,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Source image
    #[arg(short, long)]
    pub input: PathBuf,
    /// Destination image; the format follows the extension
    #[arg(short, long)]
    pub output: PathBuf,
    /// JSON render config
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub red: Option<String>,
    #[arg(long)]
    pub green: Option<String>,
    #[arg(long)]
    pub blue: Option<String>,
    #[arg(long)]
    pub gray: Option<String>,
    #[arg(long)]
    pub alpha: Option<String>,
    /// Seed for `rand()`
    #[arg(long)]
    pub seed: Option<u64>,
    /// Skip constant folding
    #[arg(long)]
    pub no_optimize: bool,
    /// Render on a single thread
    #[arg(long)]
    pub sequential: bool,
}
