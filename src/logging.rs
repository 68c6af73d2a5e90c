//! Setup de logging (tracing)

use std::str::FromStr;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Monta o filtro. Um nível simples ("debug") ganha limites para os crates de
/// transporte; diretivas completas (com ',' ou '=') são usadas como vieram.
///
/// # Retorno
/// O filtro e, se a diretiva foi rejeitada, o motivo (filtro cai para "info").
fn build_filter(log_level: &str) -> (EnvFilter, Option<String>) {
    let level = log_level.trim();
    let spec = if level.contains(',') || level.contains('=') {
        level.to_string()
    } else {
        format!("{},hyper=info,reqwest=info,h2=info", level)
    };

    match EnvFilter::from_str(&spec) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new("info"), Some(format!("{}: {}", spec, e))),
    }
}

/// Inicializa o subscriber global.
pub fn setup_logging(log_level: &str) {
    let (filter, rejected) = build_filter(log_level);
    let layer = fmt::layer().with_target(false).compact();

    // Ignora erro se já existir um subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();

    if let Some(reason) = rejected {
        tracing::warn!(%reason, "Invalid log filter, falling back to info");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_level_accepted() {
        let (filter, rejected) = build_filter("debug");
        assert!(rejected.is_none());
        assert!(filter.to_string().contains("hyper=info"));
    }

    #[test]
    fn test_invalid_filter_is_reported() {
        let (filter, rejected) = build_filter("info,foo=notalevel");
        assert!(rejected.unwrap().contains("foo=notalevel"));
        assert_eq!(filter.to_string(), "info");
    }
}
