//! Configuração do exportador
//!
//! Tudo que o pipeline precisa chega aqui antes da execução; o pipeline em si
//! nunca pergunta nada ao usuário.

use crate::credentials::DEFAULT_KEY_FILE;
use crate::error::{ExportError, Result};
use crate::fetcher::BITQUERY_URL;
use crate::types::{BATCH_SIZE, RECORDS_PER_FILE};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Flags de linha de comando (com fallback para variáveis de ambiente).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Exporta todas as compras de um token Solana para CSV")]
pub struct Cli {
    /// Chave da API Bitquery (senão usa a salva ou pergunta)
    #[arg(long, env = "BITQUERY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Endereço (mint) do token
    #[arg(long = "token", env = "TOKEN_ADDRESS")]
    pub token_address: Option<String>,

    /// Começa sem pedir confirmação
    #[arg(long = "yes", short = 'y', env = "EXPORT_CONFIRM", default_value_t = false)]
    pub confirm: bool,

    /// Diretório dos CSVs
    #[arg(long, env = "OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Arquivo onde a chave fica salva
    #[arg(long, env = "KEY_FILE", default_value = DEFAULT_KEY_FILE)]
    pub key_file: PathBuf,

    /// Endpoint GraphQL
    #[arg(long, env = "BITQUERY_URL", default_value = BITQUERY_URL)]
    pub endpoint: String,

    /// Pausa entre chamadas (rate limit)
    #[arg(long, env = "PAUSE_MS", default_value_t = 1000)]
    pub pause_ms: u64,

    /// Descarta assinaturas repetidas no arquivo mestre
    #[arg(long, default_value_t = false)]
    pub dedup: bool,

    /// Nível de log (ex: "info", "debug")
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

/// Configuração completa de uma execução.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub api_key: String,
    pub token_address: String,
    pub confirm: bool,
    pub output_dir: PathBuf,
    pub endpoint: String,
    pub batch_size: usize,
    pub records_per_file: usize,
    pub pause: Duration,
    pub dedup_signatures: bool,
}

impl ExportConfig {
    pub fn new(api_key: impl Into<String>, token_address: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into().trim().to_string(),
            token_address: token_address.into().trim().to_string(),
            confirm: false,
            output_dir: PathBuf::from("."),
            endpoint: BITQUERY_URL.to_string(),
            batch_size: BATCH_SIZE,
            records_per_file: RECORDS_PER_FILE,
            pause: Duration::from_secs(1),
            dedup_signatures: false,
        }
    }

    /// Combina as flags com a chave e o token já resolvidos.
    pub fn from_cli(cli: &Cli, api_key: String, token_address: String, confirm: bool) -> Self {
        Self {
            confirm,
            output_dir: cli.output_dir.clone(),
            endpoint: cli.endpoint.clone(),
            pause: Duration::from_millis(cli.pause_ms),
            dedup_signatures: cli.dedup,
            ..Self::new(api_key, token_address)
        }
    }

    /// Validação completa: entradas + confirmação. Exigida por `Exporter::run`.
    pub fn validate(&self) -> Result<()> {
        self.validate_inputs()?;
        if !self.confirm {
            return Err(ExportError::Config("Run not confirmed".into()));
        }
        Ok(())
    }

    /// Só chave, token e tamanhos (antes de pedir a confirmação).
    pub fn validate_inputs(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(ExportError::Config("API key cannot be empty".into()));
        }
        if self.token_address.is_empty() {
            return Err(ExportError::Config("Token address cannot be empty".into()));
        }
        if self.batch_size == 0 {
            return Err(ExportError::Config("batch_size must be > 0".into()));
        }
        if self.records_per_file == 0 {
            return Err(ExportError::Config("records_per_file must be > 0".into()));
        }
        Ok(())
    }
}
