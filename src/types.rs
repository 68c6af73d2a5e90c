//! Tipos e estruturas de dados

use std::path::{Path, PathBuf};

/// Máximo de registros pedidos por chamada à API.
pub const BATCH_SIZE: usize = 10_000;

/// Máximo de registros por arquivo CSV (chunk).
pub const RECORDS_PER_FILE: usize = 20_000;

/// Cabeçalho compartilhado por todos os chunks e pelo arquivo mestre.
pub const CSV_HEADER: [&str; 7] = [
    "Timestamp",
    "Buyer_Wallet",
    "Token_Amount",
    "Amount_Paid_SOL",
    "Amount_Paid_USD",
    "Transaction_Signature",
    "Signer",
];

pub const MASTER_FILE_NAME: &str = "token_buys_ALL_COMBINED.csv";

/// Nome do chunk `index` (começa em 1).
pub fn chunk_file_name(index: usize) -> String {
    format!("token_buys_file{}.csv", index)
}

pub fn master_file_path(dir: &Path) -> PathBuf {
    dir.join(MASTER_FILE_NAME)
}

/// Uma compra (buy) do token, como veio da API.
///
/// Valores numéricos ficam como texto para não perder precisão decimal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRecord {
    pub block_time: String,    // Também serve de cursor
    pub buyer: String,
    pub token_amount: String,
    pub amount_paid: String,     // Moeda base (SOL), "0" se ausente
    pub amount_paid_usd: String, // "0" se ausente
    pub signature: String,
    pub signer: String,
}

impl TradeRecord {
    /// Linha CSV na ordem de `CSV_HEADER`.
    pub fn to_row(&self) -> [&str; 7] {
        [
            self.block_time.as_str(),
            self.buyer.as_str(),
            self.token_amount.as_str(),
            self.amount_paid.as_str(),
            self.amount_paid_usd.as_str(),
            self.signature.as_str(),
            self.signer.as_str(),
        ]
    }
}

/// Cursor de paginação: limite superior exclusivo ("before") por timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(pub String);

impl Cursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Palpite sobre o fim do stream.
///
/// É uma heurística: a API não informa o total, então uma página cheia
/// só indica que *provavelmente* há mais dados, e uma página curta que
/// *provavelmente* acabou.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageHint {
    MoreLikely,
    LikelyEnd,
}

/// Resultado de uma chamada: registros em ordem decrescente de `block_time`.
#[derive(Debug, Clone)]
pub struct Page {
    pub records: Vec<TradeRecord>,
    pub hint: PageHint,
}

impl Page {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Um chunk já fechado em disco.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFile {
    pub index: usize,
    pub path: PathBuf,
    pub rows: usize,
}

#[cfg(test)]
pub(crate) fn sample_record(i: usize) -> TradeRecord {
    TradeRecord {
        block_time: format!("2024-05-01T00:{:02}:{:02}Z", (i / 60) % 60, i % 60),
        buyer: format!("buyer{}", i),
        token_amount: format!("{}.5", i),
        amount_paid: "0.01".to_string(),
        amount_paid_usd: "1.7".to_string(),
        signature: format!("sig{}", i),
        signer: format!("signer{}", i),
    }
}
