mod browser;
mod config;
mod db;
mod downloader;
mod parser;
mod scraper;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "italgiure_scraper", about = "Italian Court of Cassation decision scraper")]
struct Cli {
    /// SQLite database path
    #[arg(long, global = true, default_value = "data/italgiure.sqlite")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the search UI and download decision PDFs
    Run {
        /// Result pages to visit at most
        #[arg(short = 'n', long, default_value = "5")]
        max_pages: usize,
        /// Decision category filter (CIVILE or PENALE)
        #[arg(long, default_value = "CIVILE")]
        category: String,
        /// Search page to start from
        #[arg(long, default_value = config::DEFAULT_START_URL)]
        start_url: String,
        /// Show the browser window instead of running headless
        #[arg(long)]
        headed: bool,
        /// Chrome/Chromium executable (default: CHROME_PATH, then a PATH search)
        #[arg(long)]
        chrome: Option<PathBuf>,
        /// Directory for downloaded PDFs
        #[arg(long, default_value = "downloads")]
        download_dir: PathBuf,
    },
    /// List stored documents
    List {
        /// Filter by category (CIVILE or PENALE)
        #[arg(short, long)]
        category: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one stored document in full
    Show {
        /// Document id, as listed
        id: String,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show storage statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            max_pages,
            category,
            start_url,
            headed,
            chrome,
            download_dir,
        } => {
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;

            let chrome = config::resolve_chrome(chrome.as_deref())?;
            let cfg = config::ScrapeConfig {
                start_url,
                category: category.to_uppercase(),
                max_pages,
                headless: !headed,
                chrome,
                download_dir,
            };

            println!(
                "Scraping up to {} pages of {} decisions...",
                cfg.max_pages, cfg.category
            );
            let mut session = browser::BrowserSession::launch(&cfg.chrome, cfg.headless).await?;
            let crawled = scraper::crawl(&session, &cfg).await;
            session.close().await;
            let docs = crawled?;

            if docs.is_empty() {
                println!("No documents collected.");
                return Ok(());
            }
            println!("Collected metadata for {} documents.", docs.len());

            let stats = downloader::download_all(&conn, &docs, &cfg.download_dir).await?;
            println!("Done: {} PDFs saved, {} failed.", stats.saved, stats.failed);
            Ok(())
        }
        Commands::List {
            category,
            limit,
            json,
        } => {
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_documents(&conn, category.as_deref(), limit)?;
            if rows.is_empty() {
                println!("No documents stored. Run 'run' first.");
                return Ok(());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }

            println!(
                "{:>3} | {:<28} | {:<6} | {:<14} | {:>6} | {:<10} | {:<26}",
                "#", "Id", "Cat", "Type", "Num", "Date", "Ecli"
            );
            println!("{}", "-".repeat(110));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<28} | {:<6} | {:<14} | {:>6} | {:<10} | {:<26}",
                    i + 1,
                    truncate(&r.id, 28),
                    truncate(&r.category, 6),
                    truncate(&r.doc_type, 14),
                    truncate(&r.number, 6),
                    r.date,
                    truncate(&r.ecli, 26)
                );
            }
            println!("\n{} documents", rows.len());
            Ok(())
        }
        Commands::Show { id, json } => {
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let doc = match db::fetch_document(&conn, &id)? {
                Some(doc) => doc,
                None => {
                    println!("No document with id '{}'.", id);
                    return Ok(());
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&doc)?);
                return Ok(());
            }

            println!("Id:        {}", doc.id);
            println!("Category:  {}", doc.category);
            println!("Section:   {}", doc.section);
            println!("Kind:      {}", doc.kind);
            println!("Type:      {}", doc.doc_type);
            println!("Number:    {}", doc.number);
            println!("Date:      {}", doc.date);
            println!("Ecli:      {}", doc.ecli);
            println!("President: {}", doc.president);
            println!("Relator:   {}", doc.relator);
            println!("Pdf:       {}", doc.pdf_path);
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Total:    {}", s.total);
            println!("Civile:   {}", s.civile);
            println!("Penale:   {}", s.penale);
            println!("With PDF: {}", s.with_pdf);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
