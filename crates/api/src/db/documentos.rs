//! Issued-document registry.

use sea_query::{Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Documentos;

/// Highest sequence issued so far (NULL when none).
pub fn max_sequencia(instituicao_id: &str, tipo: &str, ano: i32) -> Built {
    Query::select()
        .expr(Func::max(Expr::col(Documentos::Sequencia)))
        .from(Documentos::Table)
        .and_where(Expr::col(Documentos::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(Documentos::Tipo).eq(tipo))
        .and_where(Expr::col(Documentos::Ano).eq(ano))
        .build(SqliteQueryBuilder)
}

pub struct NewDocumento<'a> {
    pub id: &'a str,
    pub aluno_id: &'a str,
    pub tipo: &'a str,
    pub ano: i32,
    pub sequencia: i64,
    pub numero: &'a str,
    pub emitido_por: &'a str,
}

pub fn insert(instituicao_id: &str, d: &NewDocumento<'_>) -> Built {
    Query::insert()
        .into_table(Documentos::Table)
        .columns([
            Documentos::Id,
            Documentos::InstituicaoId,
            Documentos::AlunoId,
            Documentos::Tipo,
            Documentos::Ano,
            Documentos::Sequencia,
            Documentos::Numero,
            Documentos::EmitidoPor,
        ])
        .values_panic([
            d.id.into(),
            instituicao_id.into(),
            d.aluno_id.into(),
            d.tipo.into(),
            d.ano.into(),
            d.sequencia.into(),
            d.numero.into(),
            d.emitido_por.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Column order: id, aluno_id, tipo, numero, emitido_por, created_at.
fn documento_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        Documentos::Id,
        Documentos::AlunoId,
        Documentos::Tipo,
        Documentos::Numero,
        Documentos::EmitidoPor,
        Documentos::CreatedAt,
    ])
}

pub fn get(instituicao_id: &str, id: &str) -> Built {
    let mut q = Query::select().to_owned();
    documento_columns(&mut q);
    q.from(Documentos::Table)
        .and_where(Expr::col(Documentos::Id).eq(id))
        .and_where(Expr::col(Documentos::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

pub fn list(instituicao_id: &str, aluno_id: Option<&str>) -> Built {
    let mut q = Query::select().to_owned();
    documento_columns(&mut q);
    q.from(Documentos::Table)
        .and_where(Expr::col(Documentos::InstituicaoId).eq(instituicao_id));
    if let Some(aluno) = aluno_id {
        q.and_where(Expr::col(Documentos::AlunoId).eq(aluno));
    }
    q.order_by(Documentos::CreatedAt, Order::Desc)
        .order_by(Documentos::Numero, Order::Desc)
        .build(SqliteQueryBuilder)
}
