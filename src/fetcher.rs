//! Busca de páginas na API GraphQL da Bitquery

use crate::cursor::page_from;
use crate::error::{ExportError, Result};
use crate::extract::extract_trades;
use crate::types::{Cursor, Page, TradeRecord};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

pub const BITQUERY_URL: &str = "https://streaming.bitquery.io/graphql";

/// Uma chamada limitada à fonte de dados.
///
/// Não faz retry: quem decide o que fazer com a falha é o orquestrador.
#[async_trait]
pub trait PageFetcher {
    /// Busca até `batch_size` compras mais antigas que `cursor` (ou as mais
    /// recentes, se `cursor` for `None`), em ordem decrescente de tempo.
    async fn fetch_page(&self, cursor: Option<&Cursor>, batch_size: usize) -> Result<Page>;
}

/// Query única; `$BEFORE_VAR` e `$BEFORE_FILTER` só são preenchidos com cursor.
const BATCH_QUERY_TEMPLATE: &str = r#"
query GetBatch($token: String, $limit: Int$BEFORE_VAR) {
  Solana(dataset: realtime) {
    DEXTradeByTokens(
      where: {
        Trade: {
          Currency: { MintAddress: { is: $token } }
          Side: { Type: { is: buy } }
        }
        Transaction: { Result: { Success: true } }$BEFORE_FILTER
      }
      orderBy: { descendingByField: "Block_Time" }
      limit: { count: $limit }
    ) {
      Block { Time }
      Transaction { Signature Signer }
      Trade {
        Account { Address }
        Amount
        Price
        PriceInUSD
        Side {
          Amount
          AmountInUSD
          Currency { Symbol MintAddress }
        }
      }
    }
  }
}
"#;

fn batch_query(with_before: bool) -> String {
    let (var, filter) = if with_before {
        (
            ", $before: DateTime",
            "\n        Block: { Time: { before: $before } }",
        )
    } else {
        ("", "")
    };
    BATCH_QUERY_TEMPLATE
        .replace("$BEFORE_VAR", var)
        .replace("$BEFORE_FILTER", filter)
}

/// Monta o corpo JSON de uma página (query + variables).
pub fn batch_request(token_address: &str, cursor: Option<&Cursor>, batch_size: usize) -> Value {
    match cursor {
        Some(before) => json!({
            "query": batch_query(true),
            "variables": { "token": token_address, "before": before.as_str(), "limit": batch_size },
        }),
        None => json!({
            "query": batch_query(false),
            "variables": { "token": token_address, "limit": batch_size },
        }),
    }
}

/// Cliente HTTP da Bitquery para um único token.
pub struct BitqueryClient {
    client: Client,
    endpoint: String,
    api_key: String,
    token_address: String,
}

impl BitqueryClient {
    pub fn new(endpoint: &str, api_key: &str, token_address: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self::with_client(client, endpoint, api_key, token_address))
    }

    pub fn with_client(
        client: Client,
        endpoint: &str,
        api_key: &str,
        token_address: &str,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            token_address: token_address.to_string(),
        }
    }

    /// Verifica chave e token com uma consulta de 1 registro.
    ///
    /// # Retorno
    /// `true` se o token já tem alguma compra, `false` se a consulta
    /// funcionou mas veio vazia.
    pub async fn probe(&self) -> Result<bool> {
        let trades = self.post(&batch_request(&self.token_address, None, 1)).await?;
        Ok(!trades.is_empty())
    }

    async fn post(&self, body: &Value) -> Result<Vec<TradeRecord>> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ExportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        extract_trades(&text)
    }
}

#[async_trait]
impl PageFetcher for BitqueryClient {
    async fn fetch_page(&self, cursor: Option<&Cursor>, batch_size: usize) -> Result<Page> {
        debug!(
            token = %self.token_address,
            before = cursor.map(Cursor::as_str).unwrap_or("-"),
            batch_size,
            "Requesting batch"
        );
        let trades = self
            .post(&batch_request(&self.token_address, cursor, batch_size))
            .await?;
        Ok(page_from(trades, batch_size))
    }
}
