//! Buffer de trades e divisão em chunks

use crate::csv_writer::write_chunk;
use crate::error::Result;
use crate::types::{chunk_file_name, ChunkFile, TradeRecord};
use std::path::PathBuf;
use tracing::info;

/// Acumula trades em memória e grava chunks de tamanho fixo.
///
/// Sempre que o buffer chega a `chunk_size`, os `chunk_size` registros mais
/// antigos (na ordem em que chegaram) viram `token_buys_file<N>.csv`. O resto
/// fica no buffer até a próxima página ou até `finish`.
pub struct ChunkWriter {
    dir: PathBuf,
    chunk_size: usize,
    buffer: Vec<TradeRecord>,
    next_index: usize,
    chunks: Vec<ChunkFile>,
}

impl ChunkWriter {
    pub fn new(dir: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            dir: dir.into(),
            chunk_size,
            buffer: Vec::with_capacity(chunk_size),
            next_index: 1,
            chunks: Vec::new(),
        }
    }

    /// Adiciona registros e grava todos os chunks cheios que couberem.
    ///
    /// # Retorno
    /// Os chunks criados nesta chamada (pode ser vazio).
    pub fn push(&mut self, records: Vec<TradeRecord>) -> Result<Vec<ChunkFile>> {
        self.buffer.extend(records);

        let mut created = Vec::new();
        while self.buffer.len() >= self.chunk_size {
            let rest = self.buffer.split_off(self.chunk_size);
            let full = std::mem::replace(&mut self.buffer, rest);
            created.push(self.flush_chunk(&full)?);
        }
        Ok(created)
    }

    /// Grava o resto do buffer como último chunk (se houver algo).
    pub fn finish(&mut self) -> Result<Option<ChunkFile>> {
        if self.buffer.is_empty() {
            return Ok(None);
        }
        let remainder = std::mem::take(&mut self.buffer);
        self.flush_chunk(&remainder).map(Some)
    }

    fn flush_chunk(&mut self, records: &[TradeRecord]) -> Result<ChunkFile> {
        let path = self.dir.join(chunk_file_name(self.next_index));
        let rows = write_chunk(&path, records)?;
        info!(file = %path.display(), rows, "Chunk saved");

        let chunk = ChunkFile {
            index: self.next_index,
            path,
            rows,
        };
        self.next_index += 1;
        self.chunks.push(chunk.clone());
        Ok(chunk)
    }

    /// Quantos registros ainda não foram gravados.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Todos os chunks já fechados, na ordem de criação.
    pub fn chunks(&self) -> &[ChunkFile] {
        &self.chunks
    }
}
