//! Extração dos trades da resposta GraphQL
//!
//! A resposta da Bitquery tem o formato:
//!
//! ```text
//! { "data": { "Solana": { "DEXTradeByTokens": [ { "Block": {...}, "Transaction": {...}, "Trade": {...} } ] } },
//!   "errors": [ ... ] }
//! ```
//!
//! Se `errors` vier preenchido a chamada é tratada como falha, mesmo com status 200.

use crate::error::{ExportError, Result};
use crate::types::TradeRecord;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<SolanaData>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SolanaData {
    #[serde(rename = "Solana")]
    solana: Option<DexTrades>,
}

#[derive(Debug, Deserialize)]
struct DexTrades {
    #[serde(rename = "DEXTradeByTokens", default)]
    trades: Option<Vec<RawTrade>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawTrade {
    block: RawBlock,
    transaction: RawTransaction,
    trade: RawTradeBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawBlock {
    time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawTransaction {
    signature: String,
    signer: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawTradeBody {
    account: RawAccount,
    #[serde(deserialize_with = "decimal_text")]
    amount: String,
    side: RawSide,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawAccount {
    address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSide {
    #[serde(default = "zero", deserialize_with = "decimal_or_zero")]
    amount: String,
    #[serde(rename = "AmountInUSD", default = "zero", deserialize_with = "decimal_or_zero")]
    amount_in_usd: String,
}

fn zero() -> String {
    "0".to_string()
}

/// Aceita número ou texto (a API usa os dois para decimais).
fn decimal_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "Invalid decimal value: {}",
            other
        ))),
    }
}

/// Igual a `decimal_text`, mas valores nulos ou vazios viram "0".
fn decimal_or_zero<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => return Ok(zero()),
        other => {
            return Err(serde::de::Error::custom(format!(
                "Invalid decimal value: {}",
                other
            )))
        }
    };

    if text.trim().is_empty() {
        Ok(zero())
    } else {
        Ok(text)
    }
}

impl From<RawTrade> for TradeRecord {
    fn from(raw: RawTrade) -> Self {
        Self {
            block_time: raw.block.time,
            buyer: raw.trade.account.address,
            token_amount: raw.trade.amount,
            amount_paid: raw.trade.side.amount,
            amount_paid_usd: raw.trade.side.amount_in_usd,
            signature: raw.transaction.signature,
            signer: raw.transaction.signer,
        }
    }
}

/// Decodifica o corpo da resposta em `TradeRecord`s, preservando a ordem.
///
/// # Retorno
/// Lista de trades (pode ser vazia), ou erro se a resposta trouxer `errors`
/// ou não tiver o caminho `data.Solana.DEXTradeByTokens`.
pub fn extract_trades(body: &str) -> Result<Vec<TradeRecord>> {
    let response: GraphQlResponse = serde_json::from_str(body)?;

    if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
        let detail = serde_json::to_string(&errors)?;
        return Err(ExportError::Api(detail));
    }

    let trades = response
        .data
        .and_then(|d| d.solana)
        .and_then(|s| s.trades)
        .ok_or_else(|| ExportError::Decode("missing data.Solana.DEXTradeByTokens".into()))?;

    Ok(trades.into_iter().map(TradeRecord::from).collect())
}
