//! Tuition (mensalidades), late fees and payments.
//!
//! Amounts are integer centavos. Percentages are plain numbers (`10.0` is
//! ten percent).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::RuleError;

text_enum! {
    /// `ATRASADO` is never stored; it is derived from `PENDENTE` and the date.
    pub enum MensalidadeStatus {
        Pendente => "PENDENTE",
        Pago => "PAGO",
        Atrasado => "ATRASADO",
        Cancelado => "CANCELADO",
    }
}

text_enum! {
    pub enum MetodoPagamento {
        Dinheiro => "DINHEIRO",
        Transferencia => "TRANSFERENCIA",
        Multicaixa => "MULTICAIXA",
        Deposito => "DEPOSITO",
    }
}

/// Late-fee policy of an institution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfiguracaoMultas {
    /// One-off fine, percent of the amount.
    pub percentual_multa: f64,
    /// Daily interest, percent of the amount per day late.
    pub percentual_juros_dia: f64,
    /// Days after the due date without any charge.
    pub dias_tolerancia: i64,
}

impl Default for ConfiguracaoMultas {
    fn default() -> Self {
        Self {
            percentual_multa: 10.0,
            percentual_juros_dia: 0.1,
            dias_tolerancia: 5,
        }
    }
}

impl ConfiguracaoMultas {
    pub fn validate(&self) -> Result<(), RuleError> {
        if !self.percentual_multa.is_finite() || !(0.0..=100.0).contains(&self.percentual_multa) {
            return Err(RuleError::invalid("percentual_multa", "must be between 0 and 100"));
        }
        if !self.percentual_juros_dia.is_finite()
            || !(0.0..=10.0).contains(&self.percentual_juros_dia)
        {
            return Err(RuleError::invalid(
                "percentual_juros_dia",
                "must be between 0 and 10",
            ));
        }
        if !(0..=90).contains(&self.dias_tolerancia) {
            return Err(RuleError::invalid("dias_tolerancia", "must be between 0 and 90"));
        }
        Ok(())
    }
}

/// Late charges of one mensalidade on a given date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Encargos {
    pub dias_atraso: i64,
    pub multa: i64,
    pub juros: i64,
}

impl Encargos {
    pub fn total(&self, valor: i64) -> i64 {
        valor + self.multa + self.juros
    }
}

fn percent_of(valor: i64, percent: f64) -> i64 {
    (valor as f64 * percent / 100.0).round() as i64
}

/// Charges for `valor` due on `vencimento`, evaluated on `data`. Interest runs
/// from the due date once the tolerance window has passed.
pub fn calcular_encargos(
    valor: i64,
    vencimento: NaiveDate,
    data: NaiveDate,
    cfg: &ConfiguracaoMultas,
) -> Encargos {
    let dias = (data - vencimento).num_days();
    if dias <= cfg.dias_tolerancia {
        return Encargos {
            dias_atraso: dias.max(0),
            ..Encargos::default()
        };
    }
    Encargos {
        dias_atraso: dias,
        multa: percent_of(valor, cfg.percentual_multa),
        juros: percent_of(valor, cfg.percentual_juros_dia * dias as f64),
    }
}

/// Status as shown to users.
pub fn status_efetivo(
    stored: MensalidadeStatus,
    vencimento: NaiveDate,
    data: NaiveDate,
    cfg: &ConfiguracaoMultas,
) -> MensalidadeStatus {
    match stored {
        MensalidadeStatus::Pendente
            if (data - vencimento).num_days() > cfg.dias_tolerancia =>
        {
            MensalidadeStatus::Atrasado
        }
        other => other,
    }
}

/// Parse a `YYYY-MM` billing reference.
pub fn parse_referencia(referencia: &str) -> Result<(i32, u32), RuleError> {
    let invalid = || RuleError::invalid("referencia", "expected YYYY-MM");
    let (ano, mes) = referencia.trim().split_once('-').ok_or_else(invalid)?;
    if ano.len() != 4 || mes.len() != 2 {
        return Err(invalid());
    }
    let ano: i32 = ano.parse().map_err(|_| invalid())?;
    let mes: u32 = mes.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&mes) {
        return Err(invalid());
    }
    Ok((ano, mes))
}

/// Due date for a reference month, clamping `dia` to the month's length.
pub fn vencimento_para(referencia: &str, dia: u32) -> Result<NaiveDate, RuleError> {
    let (ano, mes) = parse_referencia(referencia)?;
    if !(1..=31).contains(&dia) {
        return Err(RuleError::invalid("dia_vencimento", "must be between 1 and 31"));
    }
    let first = NaiveDate::from_ymd_opt(ano, mes, 1)
        .ok_or_else(|| RuleError::invalid("referencia", "not a calendar month"))?;
    let next_month = if mes == 12 {
        NaiveDate::from_ymd_opt(ano + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(ano, mes + 1, 1)
    }
    .ok_or_else(|| RuleError::invalid("referencia", "not a calendar month"))?;
    let last_day = (next_month - first).num_days() as u32;
    NaiveDate::from_ymd_opt(first.year(), first.month(), dia.min(last_day))
        .ok_or_else(|| RuleError::invalid("dia_vencimento", "not a calendar day"))
}

pub fn validate_valor(field: &'static str, valor: i64) -> Result<i64, RuleError> {
    if valor <= 0 {
        return Err(RuleError::invalid(field, "must be greater than zero"));
    }
    Ok(valor)
}

/// A payment must settle the whole amount due, charges included.
pub fn check_pagamento(
    status: MensalidadeStatus,
    devido: i64,
    pago: i64,
) -> Result<(), RuleError> {
    match status {
        MensalidadeStatus::Pendente | MensalidadeStatus::Atrasado => {}
        other => {
            return Err(RuleError::InvalidTransition {
                action: "register payment",
                state: format!("mensalidade is {other}"),
            })
        }
    }
    if pago < devido {
        return Err(RuleError::precondition(format!(
            "payment of {pago} does not cover the {devido} due"
        )));
    }
    Ok(())
}

pub fn check_cancelamento(status: MensalidadeStatus) -> Result<(), RuleError> {
    match status {
        MensalidadeStatus::Pago | MensalidadeStatus::Cancelado => Err(RuleError::InvalidTransition {
            action: "cancel mensalidade",
            state: format!("mensalidade is {status}"),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::date;

    #[test]
    fn no_charges_within_tolerance() {
        let cfg = ConfiguracaoMultas::default();
        let e = calcular_encargos(50_000, date("2026-03-10"), date("2026-03-15"), &cfg);
        assert_eq!(e.multa, 0);
        assert_eq!(e.juros, 0);
        assert_eq!(e.dias_atraso, 5);
        let e = calcular_encargos(50_000, date("2026-03-10"), date("2026-03-01"), &cfg);
        assert_eq!(e, Encargos::default());
    }

    #[test]
    fn fine_and_daily_interest_after_tolerance() {
        let cfg = ConfiguracaoMultas::default();
        // 20 days late: multa 10% = 5000, juros 0.1% * 20 = 2% = 1000
        let e = calcular_encargos(50_000, date("2026-03-10"), date("2026-03-30"), &cfg);
        assert_eq!(e.dias_atraso, 20);
        assert_eq!(e.multa, 5_000);
        assert_eq!(e.juros, 1_000);
        assert_eq!(e.total(50_000), 56_000);
    }

    #[test]
    fn charges_round_to_centavos() {
        let cfg = ConfiguracaoMultas {
            percentual_multa: 2.5,
            percentual_juros_dia: 0.033,
            dias_tolerancia: 0,
        };
        let e = calcular_encargos(12_345, date("2026-01-01"), date("2026-01-04"), &cfg);
        assert_eq!(e.multa, 309);
        assert_eq!(e.juros, 12);
    }

    #[test]
    fn effective_status() {
        let cfg = ConfiguracaoMultas::default();
        let venc = date("2026-03-10");
        assert_eq!(
            status_efetivo(MensalidadeStatus::Pendente, venc, date("2026-03-12"), &cfg),
            MensalidadeStatus::Pendente
        );
        assert_eq!(
            status_efetivo(MensalidadeStatus::Pendente, venc, date("2026-04-12"), &cfg),
            MensalidadeStatus::Atrasado
        );
        assert_eq!(
            status_efetivo(MensalidadeStatus::Pago, venc, date("2026-04-12"), &cfg),
            MensalidadeStatus::Pago
        );
    }

    #[test]
    fn config_validation() {
        assert!(ConfiguracaoMultas::default().validate().is_ok());
        let bad = ConfiguracaoMultas {
            percentual_multa: 150.0,
            ..ConfiguracaoMultas::default()
        };
        assert!(bad.validate().is_err());
        let bad = ConfiguracaoMultas {
            dias_tolerancia: -1,
            ..ConfiguracaoMultas::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn reference_parsing() {
        assert_eq!(parse_referencia("2026-03").unwrap(), (2026, 3));
        assert!(parse_referencia("2026-13").is_err());
        assert!(parse_referencia("2026/03").is_err());
        assert!(parse_referencia("26-03").is_err());
    }

    #[test]
    fn due_date_clamps_to_month_end() {
        assert_eq!(vencimento_para("2026-02", 31).unwrap(), date("2026-02-28"));
        assert_eq!(vencimento_para("2026-12", 10).unwrap(), date("2026-12-10"));
        assert!(vencimento_para("2026-02", 0).is_err());
    }

    #[test]
    fn payment_must_cover_amount_due() {
        assert!(check_pagamento(MensalidadeStatus::Pendente, 1000, 1000).is_ok());
        assert!(check_pagamento(MensalidadeStatus::Atrasado, 1100, 1000).is_err());
        assert!(check_pagamento(MensalidadeStatus::Pago, 1000, 1000).is_err());
        assert!(check_pagamento(MensalidadeStatus::Cancelado, 1000, 1000).is_err());
    }

    #[test]
    fn paid_cannot_be_cancelled() {
        assert!(check_cancelamento(MensalidadeStatus::Pendente).is_ok());
        assert!(check_cancelamento(MensalidadeStatus::Pago).is_err());
    }
}
