//! Grade validation and averaging on the 0–20 scale.
//!
//! A period average is the weighted mean of the regular assessments
//! (`PROVA`, `TESTE`, `TRABALHO`) graded in that period. The final average is
//! the mean of the graded periods, then combined with the exam and, if the
//! student is still below the pass mark, replaced by the resit grade when
//! that is higher.

use serde::Serialize;

use crate::academic::{Periodo, TipoAcademico};
use crate::attendance::FREQUENCIA_MINIMA;
use crate::RuleError;

pub const NOTA_MINIMA: f64 = 0.0;
pub const NOTA_MAXIMA: f64 = 20.0;
pub const NOTA_APROVACAO: f64 = 10.0;

text_enum! {
    pub enum TipoAvaliacao {
        Prova => "PROVA",
        Teste => "TESTE",
        Trabalho => "TRABALHO",
        Exame => "EXAME",
        Recurso => "RECURSO",
    }
}

text_enum! {
    pub enum Situacao {
        Aprovado => "APROVADO",
        Reprovado => "REPROVADO",
        ReprovadoPorFaltas => "REPROVADO_POR_FALTAS",
        EmCurso => "EM_CURSO",
    }
}

impl TipoAvaliacao {
    /// Regular assessments feed period averages.
    pub fn is_regular(&self) -> bool {
        matches!(self, Self::Prova | Self::Teste | Self::Trabalho)
    }
}

pub fn validate_nota(valor: f64) -> Result<f64, RuleError> {
    if !valor.is_finite() || !(NOTA_MINIMA..=NOTA_MAXIMA).contains(&valor) {
        return Err(RuleError::invalid(
            "valor",
            format!("grade must be between {NOTA_MINIMA} and {NOTA_MAXIMA}"),
        ));
    }
    Ok(round2(valor))
}

pub fn validate_peso(peso: f64) -> Result<f64, RuleError> {
    if !peso.is_finite() || peso <= 0.0 || peso > 100.0 {
        return Err(RuleError::invalid("peso", "must be greater than 0 and at most 100"));
    }
    Ok(peso)
}

/// One graded assessment of one student.
#[derive(Debug, Clone, PartialEq)]
pub struct NotaLancada {
    pub periodo: Periodo,
    pub tipo: TipoAvaliacao,
    pub peso: f64,
    pub valor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaPeriodo {
    pub periodo: Periodo,
    pub media: Option<f64>,
}

/// Averages of one student in one disciplina.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultadoDisciplina {
    pub medias: Vec<MediaPeriodo>,
    pub exame: Option<f64>,
    pub recurso: Option<f64>,
    pub media_final: Option<f64>,
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Weighted average of the regular assessments of `periodo`, `None` when no
/// regular assessment of that period is graded.
pub fn media_periodo(notas: &[NotaLancada], periodo: Periodo) -> Option<f64> {
    let (soma, pesos) = notas
        .iter()
        .filter(|n| n.periodo == periodo && n.tipo.is_regular())
        .fold((0.0, 0.0), |(soma, pesos), n| {
            (soma + n.valor * n.peso, pesos + n.peso)
        });
    (pesos > 0.0).then(|| round2(soma / pesos))
}

fn best_of(notas: &[NotaLancada], tipo: TipoAvaliacao) -> Option<f64> {
    notas
        .iter()
        .filter(|n| n.tipo == tipo)
        .map(|n| n.valor)
        .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))))
}

pub fn resultado(tipo: TipoAcademico, notas: &[NotaLancada]) -> ResultadoDisciplina {
    let medias: Vec<MediaPeriodo> = tipo
        .periodos()
        .iter()
        .map(|p| MediaPeriodo {
            periodo: *p,
            media: media_periodo(notas, *p),
        })
        .collect();

    let graded: Vec<f64> = medias.iter().filter_map(|m| m.media).collect();
    let exame = best_of(notas, TipoAvaliacao::Exame);
    let recurso = best_of(notas, TipoAvaliacao::Recurso);

    let mut media_final = if graded.is_empty() {
        None
    } else {
        Some(graded.iter().sum::<f64>() / graded.len() as f64)
    };
    if let Some(exame) = exame {
        media_final = Some(media_final.map_or(exame, |m| (m + exame) / 2.0));
    }
    if let Some(recurso) = recurso {
        media_final = match media_final {
            Some(m) if m >= NOTA_APROVACAO => Some(m),
            Some(m) => Some(m.max(recurso)),
            None => Some(recurso),
        };
    }

    ResultadoDisciplina {
        medias,
        exame,
        recurso,
        media_final: media_final.map(round2),
    }
}

/// Outcome of a disciplina. Nothing is final until the year is closed.
pub fn situacao(media_final: Option<f64>, frequencia: Option<f64>, ano_encerrado: bool) -> Situacao {
    if !ano_encerrado {
        return Situacao::EmCurso;
    }
    if frequencia.is_some_and(|f| f < FREQUENCIA_MINIMA) {
        return Situacao::ReprovadoPorFaltas;
    }
    match media_final {
        Some(m) if m >= NOTA_APROVACAO => Situacao::Aprovado,
        _ => Situacao::Reprovado,
    }
}

/// Mean of the available final averages, for the report card summary line.
pub fn media_geral(finais: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let values: Vec<f64> = finais.into_iter().flatten().collect();
    if values.is_empty() {
        return None;
    }
    Some(round2(values.iter().sum::<f64>() / values.len() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{nota, nota_com};
    use Periodo::*;

    #[test]
    fn grade_bounds() {
        assert!(validate_nota(-0.5).is_err());
        assert!(validate_nota(20.01).is_err());
        assert!(validate_nota(f64::NAN).is_err());
        assert_eq!(validate_nota(14.456).unwrap(), 14.46);
        assert_eq!(validate_nota(0.0).unwrap(), 0.0);
        assert_eq!(validate_nota(20.0).unwrap(), 20.0);
    }

    #[test]
    fn weight_bounds() {
        assert!(validate_peso(0.0).is_err());
        assert!(validate_peso(2.5).is_ok());
    }

    #[test]
    fn weighted_period_average() {
        let notas = vec![
            nota_com(Trimestre1, TipoAvaliacao::Prova, 2.0, 12.0),
            nota_com(Trimestre1, TipoAvaliacao::Trabalho, 1.0, 15.0),
            nota(Trimestre2, 8.0),
        ];
        assert_eq!(media_periodo(&notas, Trimestre1), Some(13.0));
        assert_eq!(media_periodo(&notas, Trimestre2), Some(8.0));
        assert_eq!(media_periodo(&notas, Trimestre3), None);
    }

    #[test]
    fn exam_does_not_enter_period_average() {
        let notas = vec![
            nota(Trimestre3, 10.0),
            nota_com(Trimestre3, TipoAvaliacao::Exame, 1.0, 20.0),
        ];
        assert_eq!(media_periodo(&notas, Trimestre3), Some(10.0));
    }

    #[test]
    fn final_average_is_mean_of_graded_periods() {
        let notas = vec![nota(Trimestre1, 10.0), nota(Trimestre2, 13.0), nota(Trimestre3, 16.0)];
        let r = resultado(TipoAcademico::Secundario, &notas);
        assert_eq!(r.medias.len(), 3);
        assert_eq!(r.media_final, Some(13.0));
        assert_eq!(r.exame, None);
    }

    #[test]
    fn ungraded_periods_are_skipped() {
        let notas = vec![nota(Semestre1, 11.0)];
        let r = resultado(TipoAcademico::Superior, &notas);
        assert_eq!(r.medias[1].media, None);
        assert_eq!(r.media_final, Some(11.0));
    }

    #[test]
    fn exam_is_averaged_with_continuous_assessment() {
        let notas = vec![
            nota(Semestre1, 12.0),
            nota(Semestre2, 8.0),
            nota_com(Semestre2, TipoAvaliacao::Exame, 1.0, 14.0),
        ];
        let r = resultado(TipoAcademico::Superior, &notas);
        assert_eq!(r.exame, Some(14.0));
        assert_eq!(r.media_final, Some(12.0));
    }

    #[test]
    fn resit_only_lifts_failing_average() {
        let failing = vec![
            nota(Semestre1, 6.0),
            nota(Semestre2, 8.0),
            nota_com(Semestre2, TipoAvaliacao::Recurso, 1.0, 11.5),
        ];
        assert_eq!(
            resultado(TipoAcademico::Superior, &failing).media_final,
            Some(11.5)
        );

        let passing = vec![
            nota(Semestre1, 14.0),
            nota_com(Semestre2, TipoAvaliacao::Recurso, 1.0, 18.0),
        ];
        assert_eq!(
            resultado(TipoAcademico::Superior, &passing).media_final,
            Some(14.0)
        );
    }

    #[test]
    fn no_grades_no_average() {
        let r = resultado(TipoAcademico::Secundario, &[]);
        assert_eq!(r.media_final, None);
    }

    #[test]
    fn situation_rules() {
        assert_eq!(situacao(Some(15.0), Some(90.0), false), Situacao::EmCurso);
        assert_eq!(situacao(Some(15.0), Some(90.0), true), Situacao::Aprovado);
        assert_eq!(situacao(Some(10.0), None, true), Situacao::Aprovado);
        assert_eq!(situacao(Some(9.99), Some(100.0), true), Situacao::Reprovado);
        assert_eq!(
            situacao(Some(18.0), Some(60.0), true),
            Situacao::ReprovadoPorFaltas
        );
        assert_eq!(situacao(None, None, true), Situacao::Reprovado);
    }

    #[test]
    fn overall_average() {
        assert_eq!(media_geral([Some(10.0), None, Some(15.0)]), Some(12.5));
        assert_eq!(media_geral([None, None]), None);
    }
}
