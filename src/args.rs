use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "listing-harvest")]
#[command(about = "Crawls a paginated listing site and merges extracted records into a CSV dataset")]
#[command(version)]
pub struct Args {
    /// JSON configuration file (flags below override its values)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listing page to start crawling from
    #[arg(short, long)]
    pub start_url: Option<String>,

    /// Path of the output CSV dataset
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Run the browser with a visible window
    #[arg(long, default_value_t = false)]
    pub headed: bool,

    /// WebDriver server URL
    #[arg(long)]
    pub webdriver_url: Option<String>,
}
