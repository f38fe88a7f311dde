use clap::{Args, Parser, Subcommand, ValueEnum};
use recall_core::ItemKind;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Vocab,
    Question,
}

impl From<KindArg> for ItemKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Vocab => ItemKind::Vocabulary,
            KindArg::Question => ItemKind::Question,
        }
    }
}

#[derive(Debug, Parser, Clone)]
#[command(name = "recall", version, about = "Recall spaced-repetition scheduler")]
pub struct Cli {
    /// JSON store file (defaults to the app data dir)
    #[arg(long, env = "RECALL_DATA_FILE", global = true)]
    pub data_file: Option<PathBuf>,

    /// Rotated store backups to keep
    #[arg(long, default_value_t = 10, global = true)]
    pub max_backups: usize,

    /// IANA time zone used for due dates, e.g. Europe/Berlin (defaults to the host zone)
    #[arg(long, env = "RECALL_TZ", global = true)]
    pub tz: Option<String>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Item operations
    #[command(subcommand)]
    Item(ItemCmd),
    /// Record one review of an item
    Review(ReviewArgs),
    /// List items due now
    Due(DueArgs),
    /// Mastery and review statistics
    Stats(StatsArgs),
    /// Compute a schedule from explicit state without touching the store
    Preview(PreviewArgs),
}

#[derive(Debug, Subcommand, Clone)]
pub enum ItemCmd {
    Add {
        #[arg(long, value_enum)]
        kind: KindArg,
        label: String,
    },
    List {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    Show {
        item_id: String,
    },
    Rm {
        item_id: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct ReviewArgs {
    pub item_id: String,
    /// Quality 0-5
    #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["correct", "wrong"])]
    pub quality: Option<i32>,
    #[arg(long, conflicts_with = "wrong")]
    pub correct: bool,
    #[arg(long)]
    pub wrong: bool,
    /// Attempts taken before answering correctly
    #[arg(long, default_value_t = 1)]
    pub attempts: u32,
}

#[derive(Debug, Args, Clone)]
pub struct DueArgs {
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,
    #[arg(long)]
    pub include_new: bool,
    #[arg(long, default_value_t = 50)]
    pub max: usize,
}

#[derive(Debug, Args, Clone)]
pub struct StatsArgs {
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,
}

#[derive(Debug, Args, Clone)]
pub struct PreviewArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub quality: i32,
    #[arg(long, allow_hyphen_values = true, default_value_t = recall_core::EF_DEFAULT)]
    pub ease: f64,
    #[arg(long, allow_hyphen_values = true, default_value_t = recall_core::INTERVAL_INITIAL)]
    pub interval: i32,
    #[arg(long, allow_hyphen_values = true, default_value_t = 0)]
    pub repetition: i32,
}
