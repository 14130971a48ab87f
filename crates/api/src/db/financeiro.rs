//! Tuition and fine-configuration query builders.

use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{ConfiguracaoMultas, Mensalidades, Users};

// ── Configuração de multas ─────────────────────────────────────────────────

/// Returns percentual_multa, percentual_juros_dia, dias_tolerancia.
pub fn get_config(instituicao_id: &str) -> Built {
    Query::select()
        .columns([
            ConfiguracaoMultas::PercentualMulta,
            ConfiguracaoMultas::PercentualJurosDia,
            ConfiguracaoMultas::DiasTolerancia,
        ])
        .from(ConfiguracaoMultas::Table)
        .and_where(Expr::col(ConfiguracaoMultas::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

pub fn upsert_config(
    instituicao_id: &str,
    percentual_multa: f64,
    percentual_juros_dia: f64,
    dias_tolerancia: i64,
    updated_at: &str,
) -> Built {
    Query::insert()
        .into_table(ConfiguracaoMultas::Table)
        .columns([
            ConfiguracaoMultas::InstituicaoId,
            ConfiguracaoMultas::PercentualMulta,
            ConfiguracaoMultas::PercentualJurosDia,
            ConfiguracaoMultas::DiasTolerancia,
            ConfiguracaoMultas::UpdatedAt,
        ])
        .values_panic([
            instituicao_id.into(),
            percentual_multa.into(),
            percentual_juros_dia.into(),
            dias_tolerancia.into(),
            updated_at.into(),
        ])
        .on_conflict(
            OnConflict::column(ConfiguracaoMultas::InstituicaoId)
                .update_columns([
                    ConfiguracaoMultas::PercentualMulta,
                    ConfiguracaoMultas::PercentualJurosDia,
                    ConfiguracaoMultas::DiasTolerancia,
                    ConfiguracaoMultas::UpdatedAt,
                ])
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

// ── Mensalidades ───────────────────────────────────────────────────────────

/// Column order: id, aluno_id, aluno nome, referencia, valor,
/// data_vencimento, status, multa, juros, valor_pago, data_pagamento,
/// metodo_pagamento, created_at.
fn select_mensalidades(instituicao_id: &str) -> sea_query::SelectStatement {
    Query::select()
        .column((Mensalidades::Table, Mensalidades::Id))
        .column((Mensalidades::Table, Mensalidades::AlunoId))
        .column((Users::Table, Users::Nome))
        .column((Mensalidades::Table, Mensalidades::Referencia))
        .column((Mensalidades::Table, Mensalidades::Valor))
        .column((Mensalidades::Table, Mensalidades::DataVencimento))
        .column((Mensalidades::Table, Mensalidades::Status))
        .column((Mensalidades::Table, Mensalidades::Multa))
        .column((Mensalidades::Table, Mensalidades::Juros))
        .column((Mensalidades::Table, Mensalidades::ValorPago))
        .column((Mensalidades::Table, Mensalidades::DataPagamento))
        .column((Mensalidades::Table, Mensalidades::MetodoPagamento))
        .column((Mensalidades::Table, Mensalidades::CreatedAt))
        .from(Mensalidades::Table)
        .inner_join(
            Users::Table,
            Expr::col((Users::Table, Users::Id))
                .equals((Mensalidades::Table, Mensalidades::AlunoId)),
        )
        .and_where(Expr::col((Mensalidades::Table, Mensalidades::InstituicaoId)).eq(instituicao_id))
        .to_owned()
}

/// Insert a mensalidade unless the student already has one for the
/// referência (affected rows tell which).
pub fn insert(
    instituicao_id: &str,
    id: &str,
    aluno_id: &str,
    referencia: &str,
    valor: i64,
    data_vencimento: &str,
) -> Built {
    Query::insert()
        .into_table(Mensalidades::Table)
        .columns([
            Mensalidades::Id,
            Mensalidades::InstituicaoId,
            Mensalidades::AlunoId,
            Mensalidades::Referencia,
            Mensalidades::Valor,
            Mensalidades::DataVencimento,
        ])
        .values_panic([
            id.into(),
            instituicao_id.into(),
            aluno_id.into(),
            referencia.into(),
            valor.into(),
            data_vencimento.into(),
        ])
        .on_conflict(
            OnConflict::columns([Mensalidades::AlunoId, Mensalidades::Referencia])
                .do_nothing()
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

pub fn get(instituicao_id: &str, id: &str) -> Built {
    select_mensalidades(instituicao_id)
        .and_where(Expr::col((Mensalidades::Table, Mensalidades::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// Status is filtered by the caller: `ATRASADO` is derived, not stored.
pub fn list(instituicao_id: &str, aluno_id: Option<&str>, referencia: Option<&str>) -> Built {
    let mut q = select_mensalidades(instituicao_id);
    if let Some(aluno) = aluno_id {
        q.and_where(Expr::col((Mensalidades::Table, Mensalidades::AlunoId)).eq(aluno));
    }
    if let Some(referencia) = referencia {
        q.and_where(Expr::col((Mensalidades::Table, Mensalidades::Referencia)).eq(referencia));
    }
    q.order_by((Mensalidades::Table, Mensalidades::DataVencimento), Order::Asc)
        .order_by((Users::Table, Users::Nome), Order::Asc)
        .build(SqliteQueryBuilder)
}

pub struct Pagamento<'a> {
    pub multa: i64,
    pub juros: i64,
    pub valor_pago: i64,
    pub data_pagamento: &'a str,
    pub metodo_pagamento: &'a str,
}

/// Settle a mensalidade, freezing the charges computed at payment date.
pub fn pagar(instituicao_id: &str, id: &str, p: &Pagamento<'_>) -> Built {
    Query::update()
        .table(Mensalidades::Table)
        .value(Mensalidades::Status, "PAGO")
        .value(Mensalidades::Multa, p.multa)
        .value(Mensalidades::Juros, p.juros)
        .value(Mensalidades::ValorPago, p.valor_pago)
        .value(Mensalidades::DataPagamento, p.data_pagamento)
        .value(Mensalidades::MetodoPagamento, p.metodo_pagamento)
        .and_where(Expr::col(Mensalidades::Id).eq(id))
        .and_where(Expr::col(Mensalidades::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

pub fn set_status(instituicao_id: &str, id: &str, status: &str) -> Built {
    Query::update()
        .table(Mensalidades::Table)
        .value(Mensalidades::Status, status)
        .and_where(Expr::col(Mensalidades::Id).eq(id))
        .and_where(Expr::col(Mensalidades::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_insert_is_idempotent() {
        let (sql, _) = insert("inst-1", "m1", "a1", "2026-03", 1_500_000, "2026-03-10");
        assert!(sql.contains("DO NOTHING"));
    }
}
