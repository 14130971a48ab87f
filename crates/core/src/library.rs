//! Library loans.

use chrono::NaiveDate;

use crate::RuleError;

text_enum! {
    pub enum EmprestimoStatus {
        Ativo => "ATIVO",
        Devolvido => "DEVOLVIDO",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoliticaEmprestimo {
    pub dias_emprestimo: i64,
    pub max_ativos: i64,
}

impl Default for PoliticaEmprestimo {
    fn default() -> Self {
        Self {
            dias_emprestimo: 14,
            max_ativos: 3,
        }
    }
}

impl PoliticaEmprestimo {
    pub fn data_prevista(&self, hoje: NaiveDate) -> NaiveDate {
        hoje + chrono::Duration::days(self.dias_emprestimo)
    }

    /// `ativos` and `atrasados` are the borrower's current loans.
    pub fn check_emprestimo(
        &self,
        disponiveis: i64,
        ativos: i64,
        atrasados: i64,
    ) -> Result<(), RuleError> {
        if disponiveis <= 0 {
            return Err(RuleError::precondition("no copies available"));
        }
        if atrasados > 0 {
            return Err(RuleError::precondition(
                "borrower has overdue loans",
            ));
        }
        if ativos >= self.max_ativos {
            return Err(RuleError::precondition(format!(
                "borrower already has {ativos} active loans (max {})",
                self.max_ativos
            )));
        }
        Ok(())
    }
}

pub fn check_devolucao(status: EmprestimoStatus) -> Result<(), RuleError> {
    match status {
        EmprestimoStatus::Ativo => Ok(()),
        EmprestimoStatus::Devolvido => Err(RuleError::InvalidTransition {
            action: "return item",
            state: "loan is already DEVOLVIDO".into(),
        }),
    }
}

/// A loan is overdue while active past its due date.
pub fn atrasado(status: EmprestimoStatus, prevista: NaiveDate, hoje: NaiveDate) -> bool {
    status == EmprestimoStatus::Ativo && hoje > prevista
}

pub fn validate_quantidade_total(quantidade: i64) -> Result<i64, RuleError> {
    if !(1..=10_000).contains(&quantidade) {
        return Err(RuleError::invalid("quantidade_total", "must be between 1 and 10000"));
    }
    Ok(quantidade)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::date;

    #[test]
    fn due_date() {
        let p = PoliticaEmprestimo::default();
        assert_eq!(p.data_prevista(date("2026-03-01")), date("2026-03-15"));
    }

    #[test]
    fn loan_rules() {
        let p = PoliticaEmprestimo::default();
        assert!(p.check_emprestimo(1, 0, 0).is_ok());
        assert!(p.check_emprestimo(0, 0, 0).is_err());
        assert!(p.check_emprestimo(2, 3, 0).is_err());
        assert!(p.check_emprestimo(2, 1, 1).is_err());
    }

    #[test]
    fn overdue_only_while_active() {
        let prevista = date("2026-03-15");
        assert!(!atrasado(EmprestimoStatus::Ativo, prevista, date("2026-03-15")));
        assert!(atrasado(EmprestimoStatus::Ativo, prevista, date("2026-03-16")));
        assert!(!atrasado(EmprestimoStatus::Devolvido, prevista, date("2026-04-01")));
    }

    #[test]
    fn return_once() {
        assert!(check_devolucao(EmprestimoStatus::Ativo).is_ok());
        assert!(check_devolucao(EmprestimoStatus::Devolvido).is_err());
    }
}
