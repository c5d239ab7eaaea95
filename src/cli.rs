use clap::Parser;
use std::path::PathBuf;

use goldtbot::config::Overrides;
use goldtbot::humanize::HumanDuration;

#[derive(Parser, Debug)]
#[command(name = "goldtbot")]
#[command(about = "Replies to bild.de links on Reddit with archived copies", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subreddit to watch
    pub subreddit: String,

    /// Configuration file (default: $GOLDTBOT_CONFIG or config/goldtbot.toml)
    #[arg(long = "config")]
    pub config_file: Option<PathBuf>,

    /// Append log output to this file instead of the terminal
    #[arg(long)]
    pub logfile: Option<PathBuf>,

    /// DEBUG, INFO, WARNING, ERROR or CRITICAL
    #[arg(long, default_value = "WARNING")]
    pub loglevel: String,

    /// Ledger of processed comments (default: processed_comments_<subreddit>.txt)
    #[arg(long)]
    pub comment_ledger: Option<PathBuf>,

    /// Ledger of processed submissions (default: processed_submissions_<subreddit>.txt)
    #[arg(long)]
    pub submission_ledger: Option<PathBuf>,

    /// Seconds to sleep after a Reddit API fault (default: 900)
    #[arg(long, value_name = "SECONDS")]
    pub sleep: Option<u64>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            comment_ledger: self.comment_ledger.clone(),
            submission_ledger: self.submission_ledger.clone(),
            fault_sleep: self.sleep.map(HumanDuration::from_secs),
        }
    }
}
