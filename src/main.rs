//! Exportador de Compras - Bitquery DEX Trades
//!
//! Busca TODAS as compras de um token Solana, do mais recente para o mais antigo,
//! e salva em CSVs de 20.000 linhas + um arquivo mestre combinado.
//!
//! Uso:
//!   ./target/release/token-buys-export
//!   BITQUERY_API_KEY=... TOKEN_ADDRESS=... ./target/release/token-buys-export --yes
//!   ./target/release/token-buys-export --token <mint> --output-dir out/ --dedup

use anyhow::{bail, Context};
use clap::Parser;
use std::io::{BufRead, Write};
use token_buys_export::config::{Cli, ExportConfig};
use token_buys_export::credentials::{resolve_api_key, KeyStore};
use token_buys_export::csv_writer::count_rows;
use token_buys_export::fetcher::BitqueryClient;
use token_buys_export::logging::setup_logging;
use token_buys_export::orchestrator::{ExportSummary, Exporter};
use token_buys_export::types::{MASTER_FILE_NAME, RECORDS_PER_FILE};
use tracing::{error, info, warn};

const RULE: &str = "======================================================================";

// ============================================================================
// Entrada Interativa
// ============================================================================

/// Mostra a pergunta e lê uma linha do stdin (sem espaços nas pontas).
fn prompt(question: &str) -> std::io::Result<String> {
    print!("{}", question);
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_yes(question: &str) -> std::io::Result<bool> {
    let answer = prompt(question)?.to_lowercase();
    Ok(answer == "yes" || answer == "y")
}

// ============================================================================
// Relatório Final
// ============================================================================

fn print_report(summary: &ExportSummary) {
    let master_rows = summary
        .master
        .as_ref()
        .and_then(|path| count_rows(path).ok())
        .unwrap_or_else(|| summary.master_rows());

    println!();
    println!("{}", RULE);
    println!("EXPORT COMPLETE!");
    println!("{}", RULE);
    println!("Total buy transactions fetched: {}", master_rows);
    println!("Total API calls made: {}", summary.api_calls);
    if let Some(err) = &summary.fetch_error {
        println!("Pagination stopped early: {}", err);
    }
    println!("\nFiles created:");

    for (i, chunk) in summary.chunks.iter().enumerate() {
        match count_rows(&chunk.path) {
            Ok(rows) => println!("   {}. {} ({} records)", i + 1, chunk.path.display(), rows),
            Err(_) => println!("   {}. {}", i + 1, chunk.path.display()),
        }
    }
    if let Some(master) = &summary.master {
        println!(
            "   {}. {} ({} records)  MASTER FILE",
            summary.chunks.len() + 1,
            master.display(),
            master_rows
        );
    }
    println!();
    println!("{}", RULE);
}

// ============================================================================
// Função Principal
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    println!("{}", RULE);
    println!("solana token buy transactions exporter");
    println!("{}", RULE);
    println!();

    let store = KeyStore::new(&cli.key_file);
    let api_key = resolve_api_key(&store, cli.api_key.as_deref(), prompt)
        .context("failed to read API key")?;
    if api_key.is_empty() {
        bail!("API key cannot be empty!");
    }

    let token_address = match cli.token_address.clone() {
        Some(token) => token,
        None => {
            println!("\nSTEP 2: Token Contract Address");
            prompt("\nEnter token address: ")?
        }
    };

    let mut config = ExportConfig::from_cli(&cli, api_key, token_address, cli.confirm);
    config.validate_inputs()?;

    // Confere chave e token antes de qualquer arquivo ser criado
    let client = BitqueryClient::new(&config.endpoint, &config.api_key, &config.token_address)?;
    match client.probe().await {
        Ok(true) => info!(token = %config.token_address, "Token found"),
        Ok(false) => warn!(token = %config.token_address, "Token found no buy transactions yet"),
        Err(e) => {
            error!(error = %e, "Probe request failed");
            bail!("Failed to connect to Bitquery. Please check your API key and token address.");
        }
    }

    println!("{}", RULE);
    println!("This will fetch ALL buy transactions for this token and save them to CSV files.");
    println!("Files will be saved as: token_buys_file1.csv, token_buys_file2.csv, etc.");
    println!("{} records per file, combined into {}", RECORDS_PER_FILE, MASTER_FILE_NAME);
    println!("{}", RULE);

    if !config.confirm {
        config.confirm = prompt_yes("\nStart fetching? (yes/no): ")?;
    }
    if !config.confirm {
        println!("Cancelled by user.");
        return Ok(());
    }

    info!(output_dir = %config.output_dir.display(), "Starting to fetch");
    let summary = Exporter::new(client, config).run().await?;

    print_report(&summary);
    summary.ensure_records()?;
    Ok(())
}
