use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use time::OffsetDateTime;

use sales_report::{
    open_db,
    sale::NewSale,
    seed::{DEFAULT_SEED_URL, RawSale, fetch_raw_sales, normalize, replace_sales},
};

/// A utility for seeding a sales database without running the server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path of the SQLite database to seed. It is created if it does not exist.
    #[arg(long, short, env = "DB_PATH", default_value = "sales.db")]
    db_path: PathBuf,

    /// A local JSON file to read the sales from instead of the feed URL.
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// The URL of the JSON feed to fetch the sales from.
    #[arg(long, env = "SEED_URL", default_value = DEFAULT_SEED_URL)]
    seed_url: String,
}

/// Replace the sales in a database with the seed feed.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let raw_sales: Vec<RawSale> = match &args.input {
        Some(input) => {
            println!("Reading sales from {input:#?}");
            serde_json::from_str(&fs::read_to_string(input)?)?
        }
        None => {
            println!("Fetching sales from {}", args.seed_url);
            fetch_raw_sales(&reqwest::Client::new(), &args.seed_url).await?
        }
    };

    let now = OffsetDateTime::now_utc();
    let sales: Vec<NewSale> = raw_sales
        .into_iter()
        .map(|raw| normalize(raw, now))
        .collect();

    println!("Seeding database at {:#?}", args.db_path);
    let conn = open_db(&args.db_path)?;
    let inserted = replace_sales(&sales, &conn)?;

    println!("Stored {inserted} sales.");

    Ok(())
}
