use clap::Parser;
use page_digest::{FetchConfig, Page};

mod args;
use args::{Args, OutputFormat};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        ::log::error!("{}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> page_digest::Result<()> {
    let config = match &args.config {
        Some(path) => FetchConfig::from_file(path)?.with_env_overrides(),
        None => FetchConfig::from_env(),
    };

    ::log::info!("Fetching {}", args.url);
    let start_time = std::time::Instant::now();

    let mut page = Page::new(&args.url);
    if !page.fetch_with_config(&config, args.render).await? {
        eprintln!(
            "Could not fetch {}: {}",
            args.url,
            page.error_text().unwrap_or_default()
        );
        std::process::exit(2);
    }

    ::log::info!(
        "Fetched {} in {:.2} seconds ({} attempts)",
        args.url,
        start_time.elapsed().as_secs_f64(),
        page.attempts()
    );

    match args.format {
        OutputFormat::Overview => println!("{}", page.overview()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page.to_record()?)?),
        OutputFormat::Clean => println!("{}", page.clean_html(args.max_bytes)?),
    }

    Ok(())
}
