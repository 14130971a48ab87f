//! Academic year and period-closing query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{AnosLetivos, Encerramentos};

// ── Anos letivos ───────────────────────────────────────────────────────────

/// Column order: id, ano, data_inicio, data_fim, status, created_at.
fn ano_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        AnosLetivos::Id,
        AnosLetivos::Ano,
        AnosLetivos::DataInicio,
        AnosLetivos::DataFim,
        AnosLetivos::Status,
        AnosLetivos::CreatedAt,
    ])
}

pub fn insert_ano(
    instituicao_id: &str,
    id: &str,
    ano: i32,
    data_inicio: &str,
    data_fim: &str,
) -> Built {
    Query::insert()
        .into_table(AnosLetivos::Table)
        .columns([
            AnosLetivos::Id,
            AnosLetivos::InstituicaoId,
            AnosLetivos::Ano,
            AnosLetivos::DataInicio,
            AnosLetivos::DataFim,
        ])
        .values_panic([
            id.into(),
            instituicao_id.into(),
            ano.into(),
            data_inicio.into(),
            data_fim.into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn get_ano(instituicao_id: &str, id: &str) -> Built {
    let mut q = Query::select().to_owned();
    ano_columns(&mut q);
    q.from(AnosLetivos::Table)
        .and_where(Expr::col(AnosLetivos::Id).eq(id))
        .and_where(Expr::col(AnosLetivos::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

/// Most recent year first.
pub fn list_anos(instituicao_id: &str) -> Built {
    let mut q = Query::select().to_owned();
    ano_columns(&mut q);
    q.from(AnosLetivos::Table)
        .and_where(Expr::col(AnosLetivos::InstituicaoId).eq(instituicao_id))
        .order_by(AnosLetivos::Ano, Order::Desc)
        .build(SqliteQueryBuilder)
}

/// The tenant's `ATIVO` year, if any.
pub fn get_ano_ativo(instituicao_id: &str) -> Built {
    let mut q = Query::select().to_owned();
    ano_columns(&mut q);
    q.from(AnosLetivos::Table)
        .and_where(Expr::col(AnosLetivos::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(AnosLetivos::Status).eq("ATIVO"))
        .build(SqliteQueryBuilder)
}

pub fn set_ano_status(instituicao_id: &str, id: &str, status: &str) -> Built {
    Query::update()
        .table(AnosLetivos::Table)
        .value(AnosLetivos::Status, status)
        .and_where(Expr::col(AnosLetivos::Id).eq(id))
        .and_where(Expr::col(AnosLetivos::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

// ── Encerramentos ──────────────────────────────────────────────────────────

/// Column order: id, ano_letivo_id, periodo, status, encerrado_por,
/// encerrado_em, justificativa_reabertura, reaberto_por, reaberto_em.
fn encerramento_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        Encerramentos::Id,
        Encerramentos::AnoLetivoId,
        Encerramentos::Periodo,
        Encerramentos::Status,
        Encerramentos::EncerradoPor,
        Encerramentos::EncerradoEm,
        Encerramentos::JustificativaReabertura,
        Encerramentos::ReabertoPor,
        Encerramentos::ReabertoEm,
    ])
}

pub fn list_encerramentos(instituicao_id: &str, ano_letivo_id: &str) -> Built {
    let mut q = Query::select().to_owned();
    encerramento_columns(&mut q);
    q.from(Encerramentos::Table)
        .and_where(Expr::col(Encerramentos::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(Encerramentos::AnoLetivoId).eq(ano_letivo_id))
        .order_by(Encerramentos::EncerradoEm, Order::Asc)
        .build(SqliteQueryBuilder)
}

pub fn get_encerramento(instituicao_id: &str, ano_letivo_id: &str, periodo: &str) -> Built {
    let mut q = Query::select().to_owned();
    encerramento_columns(&mut q);
    q.from(Encerramentos::Table)
        .and_where(Expr::col(Encerramentos::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(Encerramentos::AnoLetivoId).eq(ano_letivo_id))
        .and_where(Expr::col(Encerramentos::Periodo).eq(periodo))
        .build(SqliteQueryBuilder)
}

/// Periods currently closed for a year (returns periodo).
pub fn periodos_fechados(instituicao_id: &str, ano_letivo_id: &str) -> Built {
    Query::select()
        .column(Encerramentos::Periodo)
        .from(Encerramentos::Table)
        .and_where(Expr::col(Encerramentos::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(Encerramentos::AnoLetivoId).eq(ano_letivo_id))
        .and_where(Expr::col(Encerramentos::Status).eq("ENCERRADO"))
        .build(SqliteQueryBuilder)
}

pub fn insert_encerramento(
    instituicao_id: &str,
    id: &str,
    ano_letivo_id: &str,
    periodo: &str,
    encerrado_por: &str,
    encerrado_em: &str,
) -> Built {
    Query::insert()
        .into_table(Encerramentos::Table)
        .columns([
            Encerramentos::Id,
            Encerramentos::InstituicaoId,
            Encerramentos::AnoLetivoId,
            Encerramentos::Periodo,
            Encerramentos::Status,
            Encerramentos::EncerradoPor,
            Encerramentos::EncerradoEm,
        ])
        .values_panic([
            id.into(),
            instituicao_id.into(),
            ano_letivo_id.into(),
            periodo.into(),
            "ENCERRADO".into(),
            encerrado_por.into(),
            encerrado_em.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Close a previously reopened period again. The last reopening stays on
/// record.
pub fn reencerrar(instituicao_id: &str, id: &str, encerrado_por: &str, encerrado_em: &str) -> Built {
    Query::update()
        .table(Encerramentos::Table)
        .value(Encerramentos::Status, "ENCERRADO")
        .value(Encerramentos::EncerradoPor, encerrado_por)
        .value(Encerramentos::EncerradoEm, encerrado_em)
        .and_where(Expr::col(Encerramentos::Id).eq(id))
        .and_where(Expr::col(Encerramentos::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

pub fn reabrir(
    instituicao_id: &str,
    id: &str,
    justificativa: &str,
    reaberto_por: &str,
    reaberto_em: &str,
) -> Built {
    Query::update()
        .table(Encerramentos::Table)
        .value(Encerramentos::Status, "REABERTO")
        .value(Encerramentos::JustificativaReabertura, justificativa)
        .value(Encerramentos::ReabertoPor, reaberto_por)
        .value(Encerramentos::ReabertoEm, reaberto_em)
        .and_where(Expr::col(Encerramentos::Id).eq(id))
        .and_where(Expr::col(Encerramentos::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}
