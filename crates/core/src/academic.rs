//! Academic calendar: institution type, periods, academic-year status and
//! the period closing workflow.

use chrono::NaiveDate;

use crate::RuleError;

text_enum! {
    /// Secondary schools run trimesters; higher education runs semesters.
    pub enum TipoAcademico {
        Secundario => "SECUNDARIO",
        Superior => "SUPERIOR",
    }
}

text_enum! {
    pub enum Periodo {
        Trimestre1 => "TRIMESTRE_1",
        Trimestre2 => "TRIMESTRE_2",
        Trimestre3 => "TRIMESTRE_3",
        Semestre1 => "SEMESTRE_1",
        Semestre2 => "SEMESTRE_2",
        /// Closing of the academic year as a whole.
        Ano => "ANO",
    }
}

text_enum! {
    pub enum AnoLetivoStatus {
        Planejado => "PLANEJADO",
        Ativo => "ATIVO",
        Encerrado => "ENCERRADO",
    }
}

text_enum! {
    pub enum EncerramentoStatus {
        Encerrado => "ENCERRADO",
        Reaberto => "REABERTO",
    }
}

text_enum! {
    pub enum Turno {
        Manha => "MANHA",
        Tarde => "TARDE",
        Noite => "NOITE",
    }
}

impl TipoAcademico {
    /// Teaching periods of a year, in chronological order. Excludes `Ano`.
    pub fn periodos(&self) -> &'static [Periodo] {
        match self {
            Self::Secundario => &[Periodo::Trimestre1, Periodo::Trimestre2, Periodo::Trimestre3],
            Self::Superior => &[Periodo::Semestre1, Periodo::Semestre2],
        }
    }

    /// Check that a turma/disciplina is tied to the structure this type uses:
    /// a classe for secondary, a curso for higher education.
    pub fn check_vinculo(&self, has_classe: bool, has_curso: bool) -> Result<(), RuleError> {
        match (self, has_classe, has_curso) {
            (Self::Secundario, true, false) | (Self::Superior, false, true) => Ok(()),
            (Self::Secundario, _, _) => Err(RuleError::invalid(
                "classe_id",
                "secondary institutions link to a classe and not a curso",
            )),
            (Self::Superior, _, _) => Err(RuleError::invalid(
                "curso_id",
                "higher-education institutions link to a curso and not a classe",
            )),
        }
    }
}

impl Periodo {
    pub fn is_ano(&self) -> bool {
        matches!(self, Self::Ano)
    }

    /// Whether grades/lessons can be recorded against this period for `tipo`.
    pub fn is_teaching_period_of(&self, tipo: TipoAcademico) -> bool {
        tipo.periodos().contains(self)
    }

    fn position(&self, tipo: TipoAcademico) -> Option<usize> {
        if self.is_ano() {
            return Some(tipo.periodos().len());
        }
        tipo.periodos().iter().position(|p| p == self)
    }
}

impl AnoLetivoStatus {
    /// `PLANEJADO -> ATIVO`.
    pub fn iniciar(self) -> Result<Self, RuleError> {
        match self {
            Self::Planejado => Ok(Self::Ativo),
            other => Err(RuleError::InvalidTransition {
                action: "start academic year",
                state: other.to_string(),
            }),
        }
    }
}

/// Validate the academic-year date range and that the year number matches
/// the start date or the year before it (years such as 2025/2026).
pub fn validate_ano_letivo(ano: i32, inicio: NaiveDate, fim: NaiveDate) -> Result<(), RuleError> {
    if !(1900..=2200).contains(&ano) {
        return Err(RuleError::invalid("ano", "out of range"));
    }
    if inicio >= fim {
        return Err(RuleError::invalid(
            "data_fim",
            "must be after data_inicio",
        ));
    }
    use chrono::Datelike;
    if inicio.year() != ano && inicio.year() != ano - 1 {
        return Err(RuleError::invalid(
            "data_inicio",
            format!("does not fall in academic year {ano}"),
        ));
    }
    Ok(())
}

/// Closing state of one academic year.
#[derive(Debug, Clone)]
pub struct Calendario {
    tipo: TipoAcademico,
    status: AnoLetivoStatus,
    fechados: Vec<Periodo>,
}

impl Calendario {
    /// `fechados` lists every period whose latest closing record is
    /// `ENCERRADO`, in any order.
    pub fn new(
        tipo: TipoAcademico,
        status: AnoLetivoStatus,
        fechados: impl IntoIterator<Item = Periodo>,
    ) -> Self {
        let mut unicos: Vec<Periodo> = Vec::new();
        for p in fechados {
            if !unicos.contains(&p) {
                unicos.push(p);
            }
        }
        Self {
            tipo,
            status,
            fechados: unicos,
        }
    }

    pub fn tipo(&self) -> TipoAcademico {
        self.tipo
    }

    pub fn status(&self) -> AnoLetivoStatus {
        self.status
    }

    pub fn is_closed(&self, periodo: Periodo) -> bool {
        self.fechados.contains(&periodo)
    }

    /// Every teaching period plus `Ano`, with its closed flag.
    pub fn periodos(&self) -> Vec<(Periodo, bool)> {
        self.tipo
            .periodos()
            .iter()
            .copied()
            .chain(std::iter::once(Periodo::Ano))
            .map(|p| (p, self.is_closed(p)))
            .collect()
    }

    /// Records (grades, lessons, attendance) may only change in an open
    /// period of an active year.
    pub fn ensure_editable(&self, periodo: Periodo) -> Result<(), RuleError> {
        if !periodo.is_teaching_period_of(self.tipo) {
            return Err(RuleError::invalid(
                "periodo",
                format!("{periodo} is not a period of a {} institution", self.tipo),
            ));
        }
        match self.status {
            AnoLetivoStatus::Ativo => {}
            AnoLetivoStatus::Planejado => {
                return Err(RuleError::precondition("academic year has not started"))
            }
            AnoLetivoStatus::Encerrado => {
                return Err(RuleError::PeriodClosed {
                    periodo: Periodo::Ano.to_string(),
                })
            }
        }
        if self.is_closed(Periodo::Ano) {
            return Err(RuleError::PeriodClosed {
                periodo: Periodo::Ano.to_string(),
            });
        }
        if self.is_closed(periodo) {
            return Err(RuleError::PeriodClosed {
                periodo: periodo.to_string(),
            });
        }
        Ok(())
    }

    /// Check that `periodo` can be closed now. `planos_pendentes` is the
    /// number of teaching plans of the year not yet approved.
    pub fn check_encerrar(&self, periodo: Periodo, planos_pendentes: usize) -> Result<(), RuleError> {
        let Some(pos) = periodo.position(self.tipo) else {
            return Err(RuleError::invalid(
                "periodo",
                format!("{periodo} is not a period of a {} institution", self.tipo),
            ));
        };
        if self.status != AnoLetivoStatus::Ativo {
            return Err(RuleError::InvalidTransition {
                action: "close a period",
                state: format!("academic year is {}", self.status),
            });
        }
        if self.is_closed(periodo) {
            return Err(RuleError::precondition(format!("{periodo} is already closed")));
        }
        if let Some(aberto) = self.tipo.periodos()[..pos]
            .iter()
            .find(|p| !self.is_closed(**p))
        {
            return Err(RuleError::precondition(format!(
                "{aberto} must be closed before {periodo}"
            )));
        }
        if planos_pendentes > 0 {
            return Err(RuleError::precondition(format!(
                "{planos_pendentes} teaching plan(s) of this year are not approved"
            )));
        }
        Ok(())
    }

    /// Check that `periodo` can be reopened now. Periods reopen in reverse
    /// order, so no later period may be closed.
    pub fn check_reabrir(&self, periodo: Periodo, justificativa: &str) -> Result<(), RuleError> {
        let Some(pos) = periodo.position(self.tipo) else {
            return Err(RuleError::invalid(
                "periodo",
                format!("{periodo} is not a period of a {} institution", self.tipo),
            ));
        };
        if justificativa.trim().is_empty() {
            return Err(RuleError::invalid("justificativa", "must not be empty"));
        }
        if !self.is_closed(periodo) {
            return Err(RuleError::precondition(format!("{periodo} is not closed")));
        }
        let later = self.tipo.periodos()[pos..]
            .iter()
            .copied()
            .chain(std::iter::once(Periodo::Ano))
            .filter(|p| *p != periodo)
            .find(|p| self.is_closed(*p));
        if let Some(later) = later {
            return Err(RuleError::precondition(format!(
                "{later} must be reopened before {periodo}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::date;

    fn secundario(fechados: &[Periodo]) -> Calendario {
        Calendario::new(
            TipoAcademico::Secundario,
            AnoLetivoStatus::Ativo,
            fechados.iter().copied(),
        )
    }

    #[test]
    fn periods_follow_institution_type() {
        assert_eq!(TipoAcademico::Secundario.periodos().len(), 3);
        assert_eq!(
            TipoAcademico::Superior.periodos(),
            &[Periodo::Semestre1, Periodo::Semestre2]
        );
        assert!(!Periodo::Ano.is_teaching_period_of(TipoAcademico::Superior));
        assert!(!Periodo::Semestre1.is_teaching_period_of(TipoAcademico::Secundario));
    }

    #[test]
    fn periods_close_in_order() {
        let cal = secundario(&[]);
        assert!(cal.check_encerrar(Periodo::Trimestre1, 0).is_ok());
        let err = cal.check_encerrar(Periodo::Trimestre2, 0).unwrap_err();
        assert!(err.to_string().contains("TRIMESTRE_1"));

        let cal = secundario(&[Periodo::Trimestre1]);
        assert!(cal.check_encerrar(Periodo::Trimestre2, 0).is_ok());
        assert!(cal.check_encerrar(Periodo::Trimestre1, 0).is_err());
    }

    #[test]
    fn year_closes_only_after_all_periods() {
        let cal = secundario(&[Periodo::Trimestre1, Periodo::Trimestre2]);
        assert!(cal.check_encerrar(Periodo::Ano, 0).is_err());
        let cal = secundario(&[Periodo::Trimestre1, Periodo::Trimestre2, Periodo::Trimestre3]);
        assert!(cal.check_encerrar(Periodo::Ano, 0).is_ok());
    }

    #[test]
    fn pending_plans_block_closing() {
        let cal = secundario(&[]);
        let err = cal.check_encerrar(Periodo::Trimestre1, 2).unwrap_err();
        assert!(matches!(err, RuleError::Precondition(_)));
    }

    #[test]
    fn closing_needs_active_year() {
        let cal = Calendario::new(TipoAcademico::Superior, AnoLetivoStatus::Planejado, []);
        assert!(matches!(
            cal.check_encerrar(Periodo::Semestre1, 0),
            Err(RuleError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn foreign_period_is_invalid() {
        let cal = secundario(&[]);
        assert!(cal
            .check_encerrar(Periodo::Semestre1, 0)
            .unwrap_err()
            .is_invalid_input());
    }

    #[test]
    fn closed_period_locks_records() {
        let cal = secundario(&[Periodo::Trimestre1]);
        assert!(matches!(
            cal.ensure_editable(Periodo::Trimestre1),
            Err(RuleError::PeriodClosed { .. })
        ));
        assert!(cal.ensure_editable(Periodo::Trimestre2).is_ok());
        assert!(cal.ensure_editable(Periodo::Ano).is_err());
    }

    #[test]
    fn closed_year_locks_every_period() {
        let cal = Calendario::new(
            TipoAcademico::Secundario,
            AnoLetivoStatus::Encerrado,
            [Periodo::Trimestre1, Periodo::Trimestre2, Periodo::Trimestre3, Periodo::Ano],
        );
        for p in TipoAcademico::Secundario.periodos() {
            assert!(cal.ensure_editable(*p).is_err());
        }
    }

    #[test]
    fn reopen_in_reverse_order() {
        let cal = secundario(&[Periodo::Trimestre1, Periodo::Trimestre2]);
        assert!(cal.check_reabrir(Periodo::Trimestre1, "erro de lançamento").is_err());
        assert!(cal.check_reabrir(Periodo::Trimestre2, "erro de lançamento").is_ok());
        assert!(cal.check_reabrir(Periodo::Trimestre3, "x").is_err());
    }

    #[test]
    fn reopen_requires_justification() {
        let cal = secundario(&[Periodo::Trimestre1]);
        assert!(cal.check_reabrir(Periodo::Trimestre1, "   ").unwrap_err().is_invalid_input());
    }

    #[test]
    fn reopening_period_requires_year_reopened_first() {
        let cal = Calendario::new(
            TipoAcademico::Superior,
            AnoLetivoStatus::Encerrado,
            [Periodo::Semestre1, Periodo::Semestre2, Periodo::Ano],
        );
        assert!(cal.check_reabrir(Periodo::Semestre2, "revisão").is_err());
        assert!(cal.check_reabrir(Periodo::Ano, "revisão").is_ok());
    }

    #[test]
    fn period_listing_includes_year() {
        let cal = secundario(&[Periodo::Trimestre1]);
        let listed = cal.periodos();
        assert_eq!(listed.len(), 4);
        assert_eq!(listed[0], (Periodo::Trimestre1, true));
        assert_eq!(listed[3], (Periodo::Ano, false));
    }

    #[test]
    fn year_status_transitions() {
        assert_eq!(
            AnoLetivoStatus::Planejado.iniciar().unwrap(),
            AnoLetivoStatus::Ativo
        );
        assert!(AnoLetivoStatus::Ativo.iniciar().is_err());
    }

    #[test]
    fn academic_year_dates() {
        assert!(validate_ano_letivo(2026, date("2026-02-01"), date("2026-12-15")).is_ok());
        assert!(validate_ano_letivo(2026, date("2025-09-01"), date("2026-07-15")).is_ok());
        assert!(validate_ano_letivo(2026, date("2026-12-15"), date("2026-02-01")).is_err());
        assert!(validate_ano_letivo(2026, date("2020-02-01"), date("2020-12-15")).is_err());
    }

    #[test]
    fn structure_link_matches_type() {
        assert!(TipoAcademico::Secundario.check_vinculo(true, false).is_ok());
        assert!(TipoAcademico::Secundario.check_vinculo(false, true).is_err());
        assert!(TipoAcademico::Superior.check_vinculo(false, true).is_ok());
        assert!(TipoAcademico::Superior.check_vinculo(true, true).is_err());
    }
}
