//! Attendance aggregation.

use serde::Serialize;

use crate::RuleError;

/// Minimum attendance, in percent, for a student to be graded.
pub const FREQUENCIA_MINIMA: f64 = 75.0;

text_enum! {
    pub enum PresencaStatus {
        Presente => "PRESENTE",
        Ausente => "AUSENTE",
        /// Absence with an accepted justification; counts as attended.
        Justificado => "JUSTIFICADO",
    }
}

/// Lesson-hour counts of one student. Each record is weighted by the number
/// of lessons the logged aula covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ResumoFrequencia {
    pub aulas: i64,
    pub presencas: i64,
    pub faltas: i64,
    pub justificadas: i64,
}

impl ResumoFrequencia {
    pub fn registar(&mut self, status: PresencaStatus, quantidade: i64) {
        self.aulas += quantidade;
        match status {
            PresencaStatus::Presente => self.presencas += quantidade,
            PresencaStatus::Ausente => self.faltas += quantidade,
            PresencaStatus::Justificado => self.justificadas += quantidade,
        }
    }

    /// Attendance in percent with two decimals, `None` before any record.
    pub fn frequencia(&self) -> Option<f64> {
        if self.aulas == 0 {
            return None;
        }
        let attended = (self.presencas + self.justificadas) as f64;
        Some(crate::grading::round2(attended * 100.0 / self.aulas as f64))
    }

    pub fn abaixo_do_minimo(&self) -> bool {
        self.frequencia().is_some_and(|f| f < FREQUENCIA_MINIMA)
    }
}

impl FromIterator<(PresencaStatus, i64)> for ResumoFrequencia {
    fn from_iter<I: IntoIterator<Item = (PresencaStatus, i64)>>(iter: I) -> Self {
        let mut resumo = Self::default();
        for (status, quantidade) in iter {
            resumo.registar(status, quantidade);
        }
        resumo
    }
}

pub fn validate_quantidade(quantidade: i64) -> Result<i64, RuleError> {
    if !(1..=10).contains(&quantidade) {
        return Err(RuleError::invalid("quantidade", "must be between 1 and 10"));
    }
    Ok(quantidade)
}

#[cfg(test)]
mod tests {
    use super::*;
    use PresencaStatus::*;

    #[test]
    fn empty_has_no_frequency() {
        let r = ResumoFrequencia::default();
        assert_eq!(r.frequencia(), None);
        assert!(!r.abaixo_do_minimo());
    }

    #[test]
    fn justified_absence_counts_as_attended() {
        let r: ResumoFrequencia = [(Presente, 1), (Justificado, 1), (Ausente, 2)]
            .into_iter()
            .collect();
        assert_eq!(r.aulas, 4);
        assert_eq!(r.faltas, 2);
        assert_eq!(r.frequencia(), Some(50.0));
        assert!(r.abaixo_do_minimo());
    }

    #[test]
    fn lessons_are_weighted_by_quantity() {
        let r: ResumoFrequencia = [(Presente, 2), (Ausente, 1), (Presente, 3)]
            .into_iter()
            .collect();
        assert_eq!(r.aulas, 6);
        assert_eq!(r.frequencia(), Some(83.33));
        assert!(!r.abaixo_do_minimo());
    }

    #[test]
    fn exactly_minimum_passes() {
        let r: ResumoFrequencia = [(Presente, 3), (Ausente, 1)].into_iter().collect();
        assert_eq!(r.frequencia(), Some(75.0));
        assert!(!r.abaixo_do_minimo());
    }

    #[test]
    fn quantity_bounds() {
        assert!(validate_quantidade(0).is_err());
        assert!(validate_quantidade(2).is_ok());
        assert!(validate_quantidade(11).is_err());
    }
}
