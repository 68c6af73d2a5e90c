//! Junção dos chunks no arquivo mestre

use crate::csv_writer::create_csv;
use crate::error::{ExportError, Result};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Índice da coluna `Transaction_Signature`.
const SIGNATURE_COLUMN: usize = 5;

/// Resultado do merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub rows: usize,
    pub merged_files: usize,
    pub skipped_files: Vec<PathBuf>,
    pub duplicates_dropped: usize,
}

/// Concatena os chunks (na ordem dada) em `output`, com um único cabeçalho.
///
/// Chunk que não existe em disco é logado e pulado; o merge continua.
/// Com `dedup_signatures`, linhas cuja assinatura já apareceu são descartadas.
pub fn merge_chunks(
    chunks: &[PathBuf],
    output: &Path,
    dedup_signatures: bool,
) -> Result<MergeReport> {
    let mut writer = create_csv(output)?;
    let mut report = MergeReport::default();
    let mut seen: HashSet<Vec<u8>> = HashSet::new();

    for path in chunks {
        let mut reader = match csv::Reader::from_path(path) {
            Ok(reader) => reader,
            Err(e) if is_not_found(&e) => {
                warn!(file = %path.display(), "File not found, skipping");
                report.skipped_files.push(path.clone());
                continue;
            }
            Err(e) => return Err(ExportError::Csv(e)),
        };

        // O reader já consome o cabeçalho de cada chunk
        let mut record = csv::ByteRecord::new();
        while reader.read_byte_record(&mut record)? {
            if dedup_signatures {
                let signature = record.get(SIGNATURE_COLUMN).unwrap_or_default();
                if !seen.insert(signature.to_vec()) {
                    report.duplicates_dropped += 1;
                    continue;
                }
            }
            writer.write_byte_record(&record)?;
            report.rows += 1;
        }
        report.merged_files += 1;
    }

    writer.flush()?;
    info!(
        file = %output.display(),
        rows = report.rows,
        skipped = report.skipped_files.len(),
        "Master file created"
    );
    Ok(report)
}

fn is_not_found(err: &csv::Error) -> bool {
    matches!(err.kind(), csv::ErrorKind::Io(io) if io.kind() == ErrorKind::NotFound)
}
