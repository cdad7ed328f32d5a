use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};

use tron_signer::auth::SIGNER_SECRET_HEADER;

#[derive(Parser)]
#[command(name = "signer-cli")]
#[command(about = "Command-line client for the TRON signer", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Shared secret; only needed for signing commands.
    #[arg(short, long, env = "SIGNER_SECRET", hide_env_values = true)]
    secret: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the signer is up
    Status,
    /// Check the signer can reach its node
    Ready,
    /// Sign and broadcast a TRX transfer
    Native {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Amount in sun (1 TRX = 1,000,000 sun)
        #[arg(long)]
        amount_sun: u64,
    },
    /// Sign and broadcast a TRC-20 transfer
    Token {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Token contract address
        #[arg(long)]
        contract: String,
        /// Amount in token base units
        #[arg(long)]
        amount: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Ready => {
            let res = client.get(format!("{}/ready", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Native { from, to, amount_sun } => {
            let body = json!({ "from": from, "to": to, "amountSun": amount_sun });
            let res = client
                .post(format!("{}/sign", base))
                .headers(auth_headers(cli.secret.as_deref())?)
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Token {
            from,
            to,
            contract,
            amount,
        } => {
            let body = json!({ "from": from, "to": to, "tokenContract": contract, "tokenAmount": amount });
            let res = client
                .post(format!("{}/sign", base))
                .headers(auth_headers(cli.secret.as_deref())?)
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn auth_headers(secret: Option<&str>) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let secret = secret.ok_or("signer secret required: pass --secret or set SIGNER_SECRET")?;
    let mut value = HeaderValue::from_str(secret)?;
    value.set_sensitive(true);
    let mut headers = HeaderMap::new();
    headers.insert(SIGNER_SECRET_HEADER, value);
    Ok(headers)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: signer returned status {}", status);
        eprintln!("{}", rendered);
    }
    Ok(())
}
