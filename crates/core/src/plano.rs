//! Teaching plan (plano de ensino) lifecycle.
//!
//! ```text
//! RASCUNHO --submeter--> SUBMETIDO --aprovar--> APROVADO
//!    ^                       |
//!    |                    rejeitar
//!    +----editar---- REJEITADO
//! ```
//!
//! Only an approved plan unlocks assessments, grades, lesson logging and
//! attendance for its disciplina/turma.

use crate::RuleError;

text_enum! {
    pub enum PlanoStatus {
        Rascunho => "RASCUNHO",
        Submetido => "SUBMETIDO",
        Aprovado => "APROVADO",
        Rejeitado => "REJEITADO",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanoAcao {
    Editar,
    Submeter,
    Aprovar,
    Rejeitar,
}

impl PlanoAcao {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Editar => "edit plan",
            Self::Submeter => "submit plan",
            Self::Aprovar => "approve plan",
            Self::Rejeitar => "reject plan",
        }
    }
}

impl PlanoStatus {
    /// Status after applying `acao`, or the reason it is not allowed.
    pub fn transition(self, acao: PlanoAcao) -> Result<PlanoStatus, RuleError> {
        use PlanoAcao::*;
        use PlanoStatus::*;
        match (self, acao) {
            (Rascunho | Rejeitado, Editar) => Ok(Rascunho),
            (Rascunho, Submeter) => Ok(Submetido),
            (Submetido, Aprovar) => Ok(Aprovado),
            (Submetido, Rejeitar) => Ok(Rejeitado),
            (state, acao) => Err(RuleError::InvalidTransition {
                action: acao.as_str(),
                state: format!("plan is {state}"),
            }),
        }
    }

    /// Gate for everything recorded against a plan.
    pub fn ensure_aprovado(self) -> Result<(), RuleError> {
        if self == PlanoStatus::Aprovado {
            Ok(())
        } else {
            Err(RuleError::precondition(format!(
                "teaching plan must be APROVADO (currently {self})"
            )))
        }
    }
}

/// Submission needs a workload and at least one planned lesson.
pub fn check_submissao(carga_horaria_total: i64, aulas_planeadas: usize) -> Result<(), RuleError> {
    if carga_horaria_total <= 0 {
        return Err(RuleError::precondition(
            "carga_horaria_total must be set before submitting",
        ));
    }
    if aulas_planeadas == 0 {
        return Err(RuleError::precondition(
            "plan needs at least one planned lesson before submitting",
        ));
    }
    Ok(())
}

pub fn validate_motivo(motivo: &str) -> Result<String, RuleError> {
    let motivo = motivo.trim();
    if motivo.is_empty() {
        return Err(RuleError::invalid("motivo", "must not be empty"));
    }
    Ok(motivo.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let s = PlanoStatus::Rascunho;
        let s = s.transition(PlanoAcao::Submeter).unwrap();
        assert_eq!(s, PlanoStatus::Submetido);
        let s = s.transition(PlanoAcao::Aprovar).unwrap();
        assert_eq!(s, PlanoStatus::Aprovado);
        assert!(s.ensure_aprovado().is_ok());
    }

    #[test]
    fn rejected_plan_returns_to_draft_on_edit() {
        let s = PlanoStatus::Submetido.transition(PlanoAcao::Rejeitar).unwrap();
        assert_eq!(s, PlanoStatus::Rejeitado);
        assert_eq!(s.transition(PlanoAcao::Editar).unwrap(), PlanoStatus::Rascunho);
    }

    #[test]
    fn approved_and_submitted_are_read_only() {
        assert!(PlanoStatus::Aprovado.transition(PlanoAcao::Editar).is_err());
        assert!(PlanoStatus::Submetido.transition(PlanoAcao::Editar).is_err());
    }

    #[test]
    fn cannot_skip_submission() {
        let err = PlanoStatus::Rascunho.transition(PlanoAcao::Aprovar).unwrap_err();
        assert_eq!(err.to_string(), "cannot approve plan while plan is RASCUNHO");
    }

    #[test]
    fn gate_blocks_unapproved() {
        for s in [PlanoStatus::Rascunho, PlanoStatus::Submetido, PlanoStatus::Rejeitado] {
            assert!(s.ensure_aprovado().is_err());
        }
    }

    #[test]
    fn submission_requirements() {
        assert!(check_submissao(0, 3).is_err());
        assert!(check_submissao(60, 0).is_err());
        assert!(check_submissao(60, 1).is_ok());
    }
}
