use clap::Parser;
use listing_harvest::{Crawl, CrawlConfig};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match CrawlConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("Failed to load config {:?}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => CrawlConfig::default(),
    };

    if let Some(start_url) = args.start_url {
        config.start_url = start_url;
    }
    if let Some(output) = args.output {
        config.output_path = output;
    }
    if let Some(webdriver_url) = args.webdriver_url {
        config.webdriver_url = webdriver_url;
    }
    if args.headed {
        config.headless = false;
    }

    println!("Note: crawling requires a WebDriver server (e.g., ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL environment variable if not using the default {}",
        config.webdriver_url
    );

    ::log::info!("Starting crawl from: {}", config.start_url);
    let start_time = std::time::Instant::now();

    match Crawl::with_config(config).run().await {
        Ok(report) => {
            ::log::info!(
                "Crawl complete - {} pages, {} records in {:.2} seconds",
                report.pages,
                report.records,
                start_time.elapsed().as_secs_f64()
            );
        }
        Err(e) => {
            ::log::error!("Crawl aborted: {}", e);
            std::process::exit(1);
        }
    }
}
