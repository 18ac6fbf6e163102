use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Follow an episode feed, queue new releases and replace superseded ones.
///
/// Without a subcommand, runs one pass over the current feed.
#[derive(Debug, Parser)]
#[command(name = "nab", version, about)]
pub struct Cli {
    /// Configuration file (.toml, .yaml, .yml or .json).
    #[arg(short, long, env = "NAB_CONFIG", global = true)]
    pub config: Option<PathBuf>,
    /// More logging; repeat for more.
    #[arg(short, long, action = ArgAction::Count, global = true, conflicts_with = "quiet")]
    pub verbose: u8,
    /// Less logging; repeat for less.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Read the feed from a local file instead of the configured URL.
    #[arg(long, value_name = "PATH")]
    pub feed_file: Option<PathBuf>,
    /// Log queue changes instead of making them, and never write the cache.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect or edit the identifier cache.
    #[command(subcommand)]
    Cache(CacheCommand),
    /// Show how a feed entry would be classified.
    Classify {
        title: String,
        link: String,
        /// Replacement marker; repeat for several.
        #[arg(long = "marker", value_name = "MARKER", default_values = ["REPACK", "PROPER"])]
        markers: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Print cached identifiers, oldest first.
    List,
    /// Forget one identifier so its release is processed again next run.
    Forget { hash: String },
}

impl Cli {
    /// Default log level, before `RUST_LOG` is applied.
    pub fn level(&self) -> LevelFilter {
        match (self.verbose, self.quiet) {
            (0, 0) => LevelFilter::INFO,
            (1, _) => LevelFilter::DEBUG,
            (_, 0) => LevelFilter::TRACE,
            (_, 1) => LevelFilter::WARN,
            (_, 2) => LevelFilter::ERROR,
            _ => LevelFilter::OFF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case(&["nab"], LevelFilter::INFO)]
    #[case(&["nab", "-v"], LevelFilter::DEBUG)]
    #[case(&["nab", "-vvv"], LevelFilter::TRACE)]
    #[case(&["nab", "-q"], LevelFilter::WARN)]
    #[case(&["nab", "-qq"], LevelFilter::ERROR)]
    #[case(&["nab", "-qqq"], LevelFilter::OFF)]
    fn test_level(#[case] args: &[&str], #[case] expected: LevelFilter) {
        assert_eq!(Cli::parse_from(args).level(), expected);
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from(["nab", "--dry-run", "--feed-file", "feed.xml", "-c", "nab.toml"]);
        assert!(cli.command.is_none());
        assert!(cli.run.dry_run);
        assert_eq!(cli.run.feed_file, Some(PathBuf::from("feed.xml")));
        assert_eq!(cli.config, Some(PathBuf::from("nab.toml")));
    }

    #[test]
    fn test_cache_forget() {
        let cli = Cli::parse_from(["nab", "cache", "forget", "ABC"]);
        assert!(matches!(cli.command, Some(Command::Cache(CacheCommand::Forget { ref hash })) if hash == "ABC"));
    }

    #[test]
    fn test_classify_default_markers() {
        let cli = Cli::parse_from(["nab", "classify", "Show S01E02 720p GROUP", "magnet:?xt=urn:btih:abc"]);
        let Some(Command::Classify { markers, .. }) = cli.command else {
            panic!("expected classify");
        };
        assert_eq!(markers, vec!["REPACK".to_string(), "PROPER".to_string()]);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["nab", "-v", "-q"]).is_err());
    }
}
