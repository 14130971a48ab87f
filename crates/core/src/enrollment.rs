//! Enrollment rules for annual and class-level matrículas.

use crate::academic::AnoLetivoStatus;
use crate::RuleError;

text_enum! {
    pub enum MatriculaAnualStatus {
        Ativa => "ATIVA",
        Cancelada => "CANCELADA",
        Concluida => "CONCLUIDA",
    }
}

text_enum! {
    pub enum MatriculaStatus {
        Ativa => "ATIVA",
        Cancelada => "CANCELADA",
    }
}

/// A student can be enrolled for a year that has not been closed.
pub fn check_matricula_anual(ano_status: AnoLetivoStatus) -> Result<(), RuleError> {
    if ano_status == AnoLetivoStatus::Encerrado {
        return Err(RuleError::InvalidTransition {
            action: "enroll a student",
            state: "the academic year is closed".into(),
        });
    }
    Ok(())
}

/// A class-level enrollment needs an active annual enrollment in the same
/// year and a free seat in the turma.
pub fn check_matricula_turma(
    anual: Option<MatriculaAnualStatus>,
    capacidade: i64,
    ocupadas: i64,
) -> Result<(), RuleError> {
    match anual {
        Some(MatriculaAnualStatus::Ativa) => {}
        Some(other) => {
            return Err(RuleError::precondition(format!(
                "annual enrollment is {other}"
            )))
        }
        None => {
            return Err(RuleError::precondition(
                "student has no annual enrollment for this academic year",
            ))
        }
    }
    if ocupadas >= capacidade {
        return Err(RuleError::precondition(format!(
            "turma is full ({ocupadas}/{capacidade})"
        )));
    }
    Ok(())
}

/// Cancelling is only possible from `ATIVA`.
pub fn check_cancelamento(status: MatriculaAnualStatus) -> Result<(), RuleError> {
    match status {
        MatriculaAnualStatus::Ativa => Ok(()),
        other => Err(RuleError::InvalidTransition {
            action: "cancel enrollment",
            state: other.to_string(),
        }),
    }
}

pub fn validate_capacidade(capacidade: i64) -> Result<(), RuleError> {
    if !(1..=500).contains(&capacidade) {
        return Err(RuleError::invalid("capacidade", "must be between 1 and 500"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_year_rejects_enrollment() {
        assert!(check_matricula_anual(AnoLetivoStatus::Planejado).is_ok());
        assert!(check_matricula_anual(AnoLetivoStatus::Ativo).is_ok());
        assert!(check_matricula_anual(AnoLetivoStatus::Encerrado).is_err());
    }

    #[test]
    fn class_enrollment_needs_active_annual() {
        assert!(check_matricula_turma(Some(MatriculaAnualStatus::Ativa), 30, 0).is_ok());
        assert!(check_matricula_turma(None, 30, 0).is_err());
        assert!(check_matricula_turma(Some(MatriculaAnualStatus::Cancelada), 30, 0).is_err());
    }

    #[test]
    fn full_turma_rejects() {
        let err = check_matricula_turma(Some(MatriculaAnualStatus::Ativa), 2, 2).unwrap_err();
        assert!(err.to_string().contains("2/2"));
    }

    #[test]
    fn cancel_only_active() {
        assert!(check_cancelamento(MatriculaAnualStatus::Ativa).is_ok());
        assert!(check_cancelamento(MatriculaAnualStatus::Concluida).is_err());
    }

    #[test]
    fn capacity_bounds() {
        assert!(validate_capacidade(0).is_err());
        assert!(validate_capacidade(40).is_ok());
    }
}
