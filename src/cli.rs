use std::time::Duration;

use crate::locale::Lang;
use crate::usage::DEFAULT_COMMAND;
use crate::utils::DEFAULT_INTERVAL_SECS;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LangArg {
    /// Follow LANG / LC_ALL / LC_MESSAGES
    Auto,
    En,
    Ja,
}

#[derive(clap::Parser, Debug)]
#[command(name = "claude_costbar", version, about = "Live Claude cost monitor backed by ccusage")]
pub struct Args {
    /// ccusage executable to run (invoked as `<command> blocks --live --json --active`)
    #[arg(long, env = "CLAUDE_COSTBAR_COMMAND", default_value = DEFAULT_COMMAND)]
    pub command: String,

    /// Seconds between refreshes
    #[arg(
        long,
        env = "CLAUDE_COSTBAR_INTERVAL",
        default_value_t = DEFAULT_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,

    /// Emit one JSON object per update instead of colored text
    #[arg(long)]
    pub json: bool,

    /// Display language: auto|en|ja
    #[arg(long, env = "CLAUDE_COSTBAR_LANG", value_enum, default_value_t = LangArg::Auto)]
    pub lang: LangArg,

    /// Fetch and render a single time, then exit
    #[arg(long)]
    pub once: bool,

    /// Debug mode: verbose logging on stderr
    #[arg(long, env = "CLAUDE_DEBUG")]
    pub debug: bool,
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// Resolve the display language once; `auto` reads the process locale.
    pub fn resolve_lang(&self) -> Lang {
        match self.lang {
            LangArg::Auto => Lang::from_env(),
            LangArg::En => Lang::English,
            LangArg::Ja => Lang::Japanese,
        }
    }
}
