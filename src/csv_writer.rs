//! Escrita de um chunk CSV

use crate::error::Result;
use crate::types::{TradeRecord, CSV_HEADER};
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Abre (truncando) um CSV e já escreve o cabeçalho.
pub fn create_csv(path: &Path) -> Result<csv::Writer<File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(CSV_HEADER)?;
    Ok(writer)
}

/// Escreve um chunk completo: cabeçalho + uma linha por trade.
///
/// O arquivo é aberto, escrito e fechado aqui; depois disso nunca mais é tocado.
///
/// # Retorno
/// Número de linhas de dados escritas.
pub fn write_chunk(path: &Path, records: &[TradeRecord]) -> Result<usize> {
    let mut writer = create_csv(path)?;

    for record in records {
        writer.write_record(record.to_row())?;
    }

    // Flush final antes de fechar
    writer.flush()?;
    Ok(records.len())
}

/// Conta as linhas de dados (sem cabeçalho) de um CSV já escrito.
pub fn count_rows(path: &Path) -> Result<usize> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut count = 0;
    let mut record = csv::ByteRecord::new();
    while reader.read_byte_record(&mut record)? {
        count += 1;
    }
    Ok(count)
}
