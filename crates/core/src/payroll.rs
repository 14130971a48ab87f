//! Staff status and monthly payroll.

use serde::{Deserialize, Serialize};

use crate::RuleError;

/// Working days used to value one day of absence.
pub const DIAS_UTEIS_MES: i64 = 22;
/// Employee social-security contribution, percent of base salary.
pub const TAXA_INSS: f64 = 3.0;

text_enum! {
    pub enum FuncionarioStatus {
        Ativo => "ATIVO",
        Inativo => "INATIVO",
        Afastado => "AFASTADO",
    }
}

text_enum! {
    pub enum FolhaStatus {
        Gerada => "GERADA",
        Paga => "PAGA",
    }
}

text_enum! {
    /// Kind of change recorded in the HR history.
    pub enum TipoAlteracao {
        Admissao => "ADMISSAO",
        Cargo => "CARGO",
        Departamento => "DEPARTAMENTO",
        Salario => "SALARIO",
        Status => "STATUS",
        Outro => "OUTRO",
    }
}

/// Variable inputs of one payslip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LancamentoFolha {
    #[serde(default)]
    pub subsidios: i64,
    #[serde(default)]
    pub descontos: i64,
    #[serde(default)]
    pub faltas: i64,
}

/// Computed payslip, all amounts in centavos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Folha {
    pub salario_base: i64,
    pub subsidios: i64,
    pub descontos: i64,
    pub desconto_faltas: i64,
    pub inss: i64,
    pub valor_liquido: i64,
}

pub fn calcular_folha(salario_base: i64, l: &LancamentoFolha) -> Result<Folha, RuleError> {
    if salario_base < 0 {
        return Err(RuleError::invalid("salario_base", "must not be negative"));
    }
    if l.subsidios < 0 || l.descontos < 0 {
        return Err(RuleError::invalid("lancamentos", "amounts must not be negative"));
    }
    if !(0..=DIAS_UTEIS_MES).contains(&l.faltas) {
        return Err(RuleError::invalid(
            "faltas",
            format!("must be between 0 and {DIAS_UTEIS_MES}"),
        ));
    }
    let desconto_faltas = salario_base * l.faltas / DIAS_UTEIS_MES;
    let inss = (salario_base as f64 * TAXA_INSS / 100.0).round() as i64;
    let bruto = salario_base + l.subsidios;
    let valor_liquido = (bruto - l.descontos - desconto_faltas - inss).max(0);
    Ok(Folha {
        salario_base,
        subsidios: l.subsidios,
        descontos: l.descontos,
        desconto_faltas,
        inss,
        valor_liquido,
    })
}

pub fn check_pagamento_folha(status: FolhaStatus) -> Result<(), RuleError> {
    match status {
        FolhaStatus::Gerada => Ok(()),
        FolhaStatus::Paga => Err(RuleError::InvalidTransition {
            action: "pay payslip",
            state: "payslip is already PAGA".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_salary() {
        let f = calcular_folha(
            220_000,
            &LancamentoFolha {
                subsidios: 30_000,
                descontos: 5_000,
                faltas: 2,
            },
        )
        .unwrap();
        assert_eq!(f.desconto_faltas, 20_000);
        assert_eq!(f.inss, 6_600);
        assert_eq!(f.valor_liquido, 220_000 + 30_000 - 5_000 - 20_000 - 6_600);
    }

    #[test]
    fn net_never_negative() {
        let f = calcular_folha(
            10_000,
            &LancamentoFolha {
                descontos: 50_000,
                ..LancamentoFolha::default()
            },
        )
        .unwrap();
        assert_eq!(f.valor_liquido, 0);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(calcular_folha(-1, &LancamentoFolha::default()).is_err());
        let l = LancamentoFolha {
            faltas: 23,
            ..LancamentoFolha::default()
        };
        assert!(calcular_folha(100_000, &l).is_err());
    }

    #[test]
    fn pay_once() {
        assert!(check_pagamento_folha(FolhaStatus::Gerada).is_ok());
        assert!(check_pagamento_folha(FolhaStatus::Paga).is_err());
    }
}
