use clap::{Args, Parser, Subcommand};

use crate::locale::Locale;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Slug {
        #[command(subcommand)]
        command: SlugCommand,
    },
    Views {
        #[command(subcommand)]
        command: ViewsCommand,
    },
    Head(HeadArgs),
    Locale {
        #[command(subcommand)]
        command: LocaleCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum SlugCommand {
    Encode(SlugEncodeArgs),
    Decode(SlugDecodeArgs),
}

#[derive(Debug, Args)]
pub struct SlugEncodeArgs {
    /// Document title in the target locale.
    #[arg(long)]
    pub title: String,

    /// Document id appended as the slug suffix.
    #[arg(long)]
    pub id: u64,

    #[arg(long, default_value_t = Locale::En)]
    pub locale: Locale,
}

#[derive(Debug, Args)]
pub struct SlugDecodeArgs {
    pub slug: String,
}

#[derive(Debug, Args)]
pub struct CounterArgs {
    /// View counter endpoint (default: HABITSITE_VIEW_COUNTER_URL).
    #[arg(long)]
    pub counter_url: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ViewsCommand {
    Get(ViewsGetArgs),
    Increment(ViewsIncrementArgs),
}

#[derive(Debug, Args)]
pub struct ViewsGetArgs {
    #[arg(required = true)]
    pub ids: Vec<u64>,

    #[command(flatten)]
    pub counter: CounterArgs,
}

#[derive(Debug, Args)]
pub struct ViewsIncrementArgs {
    pub id: u64,

    #[command(flatten)]
    pub counter: CounterArgs,
}

#[derive(Debug, Args)]
pub struct HeadArgs {
    /// In-app path to render metadata for (e.g. `/blog/tiny-wins-3`).
    #[arg(long)]
    pub path: String,

    /// Locale to render (default: persisted locale).
    #[arg(long)]
    pub locale: Option<Locale>,

    /// Content catalog (`.yaml` or `.json`).
    #[arg(long)]
    pub catalog: String,

    /// Translations file (`.yaml`).
    #[arg(long)]
    pub translations: Option<String>,

    /// Site origin for canonical URLs (default: HABITSITE_SITE_ORIGIN).
    #[arg(long)]
    pub site_origin: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum LocaleCommand {
    Show,
    Set(LocaleSetArgs),
}

#[derive(Debug, Args)]
pub struct LocaleSetArgs {
    pub locale: Locale,
}
