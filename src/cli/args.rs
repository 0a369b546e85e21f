//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use contentmap::config::CONFIG_FILE;

/// Content identity <-> URL mapping
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the current directory
    #[arg(short = 'C', long, default_value = CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output (template rejections, resolution steps)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List the URLs of an address, canonical first
    #[command(visible_alias = "u")]
    Urls {
        #[command(flatten)]
        args: UrlsArgs,
    },

    /// Resolve a URL path back to content addresses
    #[command(visible_alias = "r")]
    Resolve {
        #[command(flatten)]
        args: ResolveArgs,
    },

    /// Validate the config and report route coverage and URL conflicts
    #[command(visible_alias = "c")]
    Check {
        #[command(flatten)]
        args: CheckArgs,
    },
}

/// `urls` command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct UrlsArgs {
    /// Content type name
    #[arg(value_name = "TYPE")]
    pub type_name: String,

    /// Natural key values as `key=value`
    #[arg(value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub keys: Vec<(String, String)>,

    /// Only URLs selecting this handler
    #[arg(short = 'H', long)]
    pub handler: Option<String>,

    /// Version to pin the address to (`locale=en;stage=draft`),
    /// defaults to the configured current version
    #[arg(short, long)]
    pub at: Option<String>,

    /// Output JSON
    #[arg(short, long)]
    pub json: bool,
}

/// `resolve` command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ResolveArgs {
    /// URL path (`/blog/news/hello`, percent-encoding allowed)
    #[arg(value_name = "PATH")]
    pub path: String,

    /// List every matching route instead of the winner only
    #[arg(short, long)]
    pub all: bool,

    /// Output JSON
    #[arg(short, long)]
    pub json: bool,
}

/// `check` command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct CheckArgs {
    /// JSON file with existing content (`[{"type": "Post", "slug": ..}, ..]`)
    /// to scan for URL conflicts
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub content: Option<PathBuf>,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected `key=value`, got `{s}`"))
}
