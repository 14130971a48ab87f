//! Small helpers for tests that need dates and grade records.

use chrono::NaiveDate;

use crate::academic::Periodo;
use crate::grading::{NotaLancada, TipoAvaliacao};

/// Parse a `YYYY-MM-DD` literal. Panics on malformed input.
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("test date must be YYYY-MM-DD")
}

/// A regular assessment grade with weight 1.
pub fn nota(periodo: Periodo, valor: f64) -> NotaLancada {
    NotaLancada {
        periodo,
        tipo: TipoAvaliacao::Prova,
        peso: 1.0,
        valor,
    }
}

/// A grade with an explicit assessment type and weight.
pub fn nota_com(periodo: Periodo, tipo: TipoAvaliacao, peso: f64, valor: f64) -> NotaLancada {
    NotaLancada {
        periodo,
        tipo,
        peso,
        valor,
    }
}
