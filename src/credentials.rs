//! Chave da API salva em disco

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_KEY_FILE: &str = "config.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredConfig {
    #[serde(default)]
    api_key: Option<String>,
}

/// Arquivo JSON com a última chave usada: `{ "api_key": "..." }`.
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lê a chave salva. Arquivo ausente ou inválido conta como "sem chave".
    pub fn load(&self) -> Option<String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!(file = %self.path.display(), error = %e, "No saved API key");
                return None;
            }
        };

        match serde_json::from_str::<StoredConfig>(&content) {
            Ok(config) => config.api_key.filter(|k| !k.trim().is_empty()),
            Err(e) => {
                warn!(file = %self.path.display(), error = %e, "Ignoring unreadable key file");
                None
            }
        }
    }

    /// Salva a chave (sobrescreve o arquivo).
    pub fn save(&self, api_key: &str) -> Result<()> {
        let config = StoredConfig {
            api_key: Some(api_key.to_string()),
        };
        fs::write(&self.path, serde_json::to_string(&config)?)?;
        info!(file = %self.path.display(), "API key saved for future use");
        Ok(())
    }
}

fn is_yes(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    answer == "yes" || answer == "y"
}

/// Decide qual chave usar: a explícita (flag/env), a salva ou uma digitada.
///
/// `ask` mostra a pergunta e devolve a resposta. Só a chave digitada em
/// `ask` é salva; a explícita nunca vai para o disco. Falha ao salvar só gera
/// um `warn!`.
pub fn resolve_api_key<A>(
    store: &KeyStore,
    explicit: Option<&str>,
    mut ask: A,
) -> std::io::Result<String>
where
    A: FnMut(&str) -> std::io::Result<String>,
{
    if let Some(key) = explicit.map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    let question = match store.load() {
        Some(saved) => {
            println!("Found saved API key");
            if is_yes(&ask("Use saved API key? (yes/no): ")?) {
                println!("Using saved API key.");
                return Ok(saved);
            }
            "\nEnter new Bitquery API key: "
        }
        None => {
            println!("STEP 1: Bitquery API Key");
            "\nEnter your Bitquery API key: "
        }
    };

    let key = ask(question)?.trim().to_string();
    if !key.is_empty() {
        if let Err(e) = store.save(&key) {
            warn!(error = %e, "Could not save API key");
        }
    }
    Ok(key)
}
