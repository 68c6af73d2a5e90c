//! Loop principal: busca → acumula → grava → junta
//!
//! Fluxo de estados:
//!
//! ```text
//! Init → Fetching ⇄ Accumulating → Draining → Merging → Done
//!           └──────→ Failed (erro na primeira busca, nada coletado)
//! ```
//!
//! Tudo é sequencial: uma chamada por vez, com pausa entre chamadas.
//! Não há retry. Erro de busca encerra a paginação, mas o que já foi gravado
//! é drenado e juntado normalmente.

use crate::config::ExportConfig;
use crate::csv_buffer::ChunkWriter;
use crate::cursor::next_cursor;
use crate::error::{ExportError, Result};
use crate::fetcher::PageFetcher;
use crate::merge::{merge_chunks, MergeReport};
use crate::types::{master_file_path, ChunkFile, Cursor, PageHint};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Fetching,
    Accumulating,
    Draining,
    Merging,
    Done,
    Failed,
}

/// Estado de uma execução, passado de estado em estado.
#[derive(Debug)]
pub struct RunState {
    pub stage: Stage,
    pub cursor: Option<Cursor>,
    next_cursor: Option<Cursor>,
    pub last_hint: Option<PageHint>,
    pub api_calls: usize,
    pub total_fetched: usize,
    pub fetch_error: Option<String>,
}

impl RunState {
    fn new() -> Self {
        Self {
            stage: Stage::Init,
            cursor: None,
            next_cursor: None,
            last_hint: None,
            api_calls: 0,
            total_fetched: 0,
            fetch_error: None,
        }
    }
}

/// Resultado final de uma exportação.
#[derive(Debug)]
pub struct ExportSummary {
    pub stage: Stage,
    pub total_fetched: usize,
    pub api_calls: usize,
    pub chunks: Vec<ChunkFile>,
    pub master: Option<PathBuf>,
    pub merge: Option<MergeReport>,
    pub fetch_error: Option<String>,
}

impl ExportSummary {
    /// Execução sem nenhum registro conta como falha.
    pub fn ensure_records(self) -> Result<Self> {
        if self.total_fetched == 0 {
            Err(ExportError::NoRecords)
        } else {
            Ok(self)
        }
    }

    pub fn master_rows(&self) -> usize {
        self.merge.as_ref().map(|m| m.rows).unwrap_or(0)
    }
}

/// Orquestra uma exportação completa para um token.
pub struct Exporter<F> {
    fetcher: F,
    config: ExportConfig,
}

impl<F: PageFetcher> Exporter<F> {
    pub fn new(fetcher: F, config: ExportConfig) -> Self {
        Self { fetcher, config }
    }

    pub async fn run(&self) -> Result<ExportSummary> {
        let mut state = RunState::new();
        let mut writer = ChunkWriter::new(&self.config.output_dir, self.config.records_per_file);
        let mut merge = None;
        let mut master = None;

        loop {
            state.stage = match state.stage {
                Stage::Init => {
                    self.config.validate()?;
                    std::fs::create_dir_all(&self.config.output_dir)?;
                    Stage::Fetching
                }

                Stage::Fetching => {
                    state.api_calls += 1;
                    let result = self
                        .fetcher
                        .fetch_page(state.cursor.as_ref(), self.config.batch_size)
                        .await;

                    match result {
                        Err(e) => {
                            error!(batch = state.api_calls, error = %e, "Failed to fetch batch");
                            state.fetch_error = Some(e.to_string());
                            if state.total_fetched == 0 {
                                Stage::Failed
                            } else {
                                Stage::Draining
                            }
                        }
                        Ok(page) if page.is_empty() => {
                            info!(batch = state.api_calls, "No more trades");
                            Stage::Draining
                        }
                        Ok(page) => {
                            state.total_fetched += page.len();
                            state.last_hint = Some(page.hint);
                            state.next_cursor = next_cursor(&page);
                            info!(
                                batch = state.api_calls,
                                trades = page.len(),
                                total = state.total_fetched,
                                "Batch fetched"
                            );
                            writer.push(page.records)?;
                            Stage::Accumulating
                        }
                    }
                }

                Stage::Accumulating => match state.last_hint {
                    Some(PageHint::MoreLikely) => {
                        state.cursor = state.next_cursor.take();
                        if !self.config.pause.is_zero() {
                            tokio::time::sleep(self.config.pause).await;
                        }
                        Stage::Fetching
                    }
                    _ => {
                        info!(total = state.total_fetched, "Reached end of data");
                        Stage::Draining
                    }
                },

                Stage::Draining => {
                    if let Some(chunk) = writer.finish()? {
                        info!(file = %chunk.path.display(), rows = chunk.rows, "Saved remaining trades");
                    }
                    Stage::Merging
                }

                Stage::Merging => {
                    let paths: Vec<PathBuf> =
                        writer.chunks().iter().map(|c| c.path.clone()).collect();
                    if paths.is_empty() {
                        warn!("No chunk files, skipping merge");
                    } else {
                        let output = master_file_path(&self.config.output_dir);
                        merge = Some(merge_chunks(
                            &paths,
                            &output,
                            self.config.dedup_signatures,
                        )?);
                        master = Some(output);
                    }
                    Stage::Done
                }

                Stage::Done | Stage::Failed => break,
            };
        }

        Ok(ExportSummary {
            stage: state.stage,
            total_fetched: state.total_fetched,
            api_calls: state.api_calls,
            chunks: writer.chunks().to_vec(),
            master,
            merge,
            fetch_error: state.fetch_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_writer::count_rows;
    use crate::cursor::page_from;
    use crate::types::{Page, TradeRecord, MASTER_FILE_NAME};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::tempdir;

    /// Fonte falsa: cada item do script é o tamanho da página ou um erro.
    struct ScriptedFetcher {
        script: Mutex<VecDeque<Option<usize>>>,
        cursors: Mutex<Vec<Option<String>>>,
        produced: Mutex<usize>,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<Option<usize>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                cursors: Mutex::new(Vec::new()),
                produced: Mutex::new(0),
            }
        }

        fn cursors(&self) -> Vec<Option<String>> {
            self.cursors.lock().unwrap().clone()
        }
    }

    fn record(n: usize) -> TradeRecord {
        TradeRecord {
            // Timestamps decrescentes conforme n cresce
            block_time: format!("{:012}", 1_000_000_000 - n),
            buyer: format!("buyer{}", n),
            token_amount: "10".to_string(),
            amount_paid: "0.1".to_string(),
            amount_paid_usd: "15".to_string(),
            signature: format!("sig{}", n),
            signer: format!("signer{}", n),
        }
    }

    #[async_trait]
    impl<'a> PageFetcher for &'a ScriptedFetcher {
        async fn fetch_page(&self, cursor: Option<&Cursor>, batch_size: usize) -> Result<Page> {
            self.cursors
                .lock()
                .unwrap()
                .push(cursor.map(|c| c.as_str().to_string()));

            let step = self.script.lock().unwrap().pop_front().flatten();
            let Some(len) = step else {
                return Err(ExportError::Api("scripted failure".into()));
            };

            let mut produced = self.produced.lock().unwrap();
            let records = (*produced..*produced + len).map(record).collect();
            *produced += len;
            Ok(page_from(records, batch_size))
        }
    }

    fn config(dir: &Path, batch_size: usize, records_per_file: usize) -> ExportConfig {
        let mut config = ExportConfig::new("key", "Mint111");
        config.confirm = true;
        config.output_dir = dir.to_path_buf();
        config.batch_size = batch_size;
        config.records_per_file = records_per_file;
        config.pause = Duration::ZERO;
        config
    }

    fn data_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .skip(1)
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_two_full_pages_then_short_page() {
        let dir = tempdir().unwrap();
        let fetcher = ScriptedFetcher::new(vec![Some(10_000), Some(10_000), Some(3_500)]);
        let exporter = Exporter::new(&fetcher, config(dir.path(), 10_000, 20_000));

        let summary = exporter.run().await.unwrap();

        assert_eq!(summary.stage, Stage::Done);
        assert_eq!(summary.total_fetched, 23_500);
        assert_eq!(summary.api_calls, 3);
        assert_eq!(summary.chunks.len(), 2);
        assert_eq!(summary.chunks[0].rows, 20_000);
        assert_eq!(summary.chunks[1].rows, 3_500);
        assert_eq!(count_rows(&summary.chunks[0].path).unwrap(), 20_000);
        assert_eq!(count_rows(&summary.chunks[1].path).unwrap(), 3_500);

        let master = summary.master.clone().unwrap();
        assert_eq!(master, dir.path().join(MASTER_FILE_NAME));
        assert_eq!(summary.master_rows(), 23_500);

        let mut expected = data_lines(&summary.chunks[0].path);
        expected.extend(data_lines(&summary.chunks[1].path));
        assert_eq!(data_lines(&master), expected);
    }

    #[tokio::test]
    async fn test_failure_on_first_call() {
        let dir = tempdir().unwrap();
        let fetcher = ScriptedFetcher::new(vec![None]);
        let exporter = Exporter::new(&fetcher, config(dir.path(), 10, 20));

        let summary = exporter.run().await.unwrap();

        assert_eq!(summary.stage, Stage::Failed);
        assert_eq!(summary.api_calls, 1);
        assert!(summary.chunks.is_empty());
        assert!(summary.master.is_none());
        assert!(summary.fetch_error.is_some());
        assert!(!dir.path().join(MASTER_FILE_NAME).exists());
        assert!(matches!(summary.ensure_records(), Err(ExportError::NoRecords)));
    }

    #[tokio::test]
    async fn test_failure_mid_run_keeps_flushed_chunks() {
        let dir = tempdir().unwrap();
        let fetcher = ScriptedFetcher::new(vec![Some(4), Some(4), None]);
        let exporter = Exporter::new(&fetcher, config(dir.path(), 4, 5));

        let summary = exporter.run().await.unwrap();

        assert_eq!(summary.stage, Stage::Done);
        assert_eq!(summary.api_calls, 3);
        assert_eq!(summary.total_fetched, 8);
        let rows: Vec<usize> = summary.chunks.iter().map(|c| c.rows).collect();
        assert_eq!(rows, vec![5, 3]);
        assert_eq!(summary.master_rows(), 8);
        assert!(summary.fetch_error.is_some());
    }

    #[tokio::test]
    async fn test_cursor_follows_oldest_record() {
        let dir = tempdir().unwrap();
        let fetcher = ScriptedFetcher::new(vec![Some(3), Some(3), Some(1)]);
        let exporter = Exporter::new(&fetcher, config(dir.path(), 3, 100));

        exporter.run().await.unwrap();

        assert_eq!(
            fetcher.cursors(),
            vec![
                None,
                Some(record(2).block_time),
                Some(record(5).block_time),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_page_after_full_pages() {
        let dir = tempdir().unwrap();
        let fetcher = ScriptedFetcher::new(vec![Some(5), Some(5), Some(0)]);
        let exporter = Exporter::new(&fetcher, config(dir.path(), 5, 5));

        let summary = exporter.run().await.unwrap();

        assert_eq!(summary.api_calls, 3);
        assert_eq!(summary.chunks.len(), 2);
        assert!(summary.fetch_error.is_none());
        assert_eq!(summary.master_rows(), 10);
    }

    #[tokio::test]
    async fn test_record_accounting_across_scripts() {
        let scripts: Vec<(usize, usize, Vec<Option<usize>>)> = vec![
            (4, 3, vec![Some(4), Some(4), Some(4), Some(2)]),
            (4, 8, vec![Some(4), Some(4), Some(1)]),
            (5, 7, vec![Some(5), Some(5), Some(5), Some(5), Some(0)]),
            (3, 2, vec![Some(3), Some(3), None]),
            (6, 4, vec![Some(2)]),
        ];

        for (batch, per_file, script) in scripts {
            let dir = tempdir().unwrap();
            let fetcher = ScriptedFetcher::new(script);
            let exporter = Exporter::new(&fetcher, config(dir.path(), batch, per_file));

            let summary = exporter.run().await.unwrap();
            let written: usize = summary.chunks.iter().map(|c| c.rows).sum();
            assert_eq!(written, summary.total_fetched);
            assert_eq!(summary.master_rows(), summary.total_fetched);

            let (last, full) = summary.chunks.split_last().unwrap();
            assert!(full.iter().all(|c| c.rows == per_file));
            assert!(last.rows >= 1 && last.rows <= per_file);
        }
    }

    #[tokio::test]
    async fn test_invalid_config_never_fetches() {
        let dir = tempdir().unwrap();
        let fetcher = ScriptedFetcher::new(vec![Some(1)]);
        let mut cfg = config(dir.path(), 5, 5);
        cfg.token_address.clear();

        let result = Exporter::new(&fetcher, cfg).run().await;

        assert!(matches!(result, Err(ExportError::Config(_))));
        assert!(fetcher.cursors().is_empty());
    }

    #[tokio::test]
    async fn test_unconfirmed_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let fetcher = ScriptedFetcher::new(vec![Some(1)]);
        let mut cfg = config(dir.path(), 5, 5);
        cfg.confirm = false;

        let result = Exporter::new(&fetcher, cfg).run().await;

        assert!(matches!(result, Err(ExportError::Config(_))));
        assert!(fetcher.cursors().is_empty());
        assert!(!dir.path().join("token_buys_file1.csv").exists());
        assert!(!dir.path().join(MASTER_FILE_NAME).exists());
    }
}
