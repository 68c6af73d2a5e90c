//! Cursor de paginação

use crate::types::{Cursor, Page, PageHint, TradeRecord};

/// Monta a página e calcula o `PageHint`.
///
/// Página cheia (`len == batch_size`) => `MoreLikely`; qualquer coisa menor
/// => `LikelyEnd`. É só uma heurística: se o total de compras for múltiplo
/// exato do batch, a última chamada volta vazia.
pub fn page_from(records: Vec<TradeRecord>, batch_size: usize) -> Page {
    let hint = if !records.is_empty() && records.len() >= batch_size {
        PageHint::MoreLikely
    } else {
        PageHint::LikelyEnd
    };
    Page { records, hint }
}

/// Próximo cursor: timestamp do último registro (o mais antigo da página).
///
/// Retorna `None` para página vazia (fim do stream).
pub fn next_cursor(page: &Page) -> Option<Cursor> {
    page.records.last().map(|r| Cursor(r.block_time.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::sample_record;

    fn descending(n: usize) -> Vec<TradeRecord> {
        (0..n).rev().map(sample_record).collect()
    }

    #[test]
    fn test_next_cursor_is_oldest_timestamp() {
        let page = page_from(descending(5), 5);
        let cursor = next_cursor(&page).unwrap();

        assert_eq!(cursor.as_str(), page.records[4].block_time);
        assert!(page
            .records
            .iter()
            .all(|r| cursor.as_str() <= r.block_time.as_str()));
    }

    #[test]
    fn test_empty_page_has_no_cursor() {
        let page = page_from(Vec::new(), 10);
        assert_eq!(next_cursor(&page), None);
        assert_eq!(page.hint, PageHint::LikelyEnd);
    }

    #[test]
    fn test_short_page_is_likely_end() {
        assert_eq!(page_from(descending(3), 3).hint, PageHint::MoreLikely);
        assert_eq!(page_from(descending(2), 3).hint, PageHint::LikelyEnd);
    }
}
