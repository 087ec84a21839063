use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "identity-cli")]
#[command(about = "Admin CLI for the client identity service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8081")]
    url: String,

    #[arg(short, long, env = "IDENTITY_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show service version and pattern counts
    Status,
    /// List patterns, optionally for one category
    List {
        /// automation, crawler or browser
        category: Option<String>,
    },
    /// Add a pattern to a category
    Add { category: String, pattern: String },
    /// Remove the first exact occurrence of a pattern
    Remove { category: String, pattern: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let base = cli.url.trim_end_matches('/');
    let request = match cli.command {
        Commands::Status => client.get(format!("{base}/admin/status")),
        Commands::List { category: None } => client.get(format!("{base}/admin/patterns")),
        Commands::List {
            category: Some(category),
        } => client.get(format!("{base}/admin/patterns/{category}")),
        Commands::Add { category, pattern } => client
            .post(format!("{base}/admin/patterns/{category}"))
            .json(&json!({ "pattern": pattern })),
        Commands::Remove { category, pattern } => client
            .delete(format!("{base}/admin/patterns/{category}"))
            .json(&json!({ "pattern": pattern })),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
