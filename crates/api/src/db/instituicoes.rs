//! Institution (tenant) query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Instituicoes;

/// Column order: id, nome, sigla, tipo_academico, email, telefone, endereco,
/// ativo, created_at.
fn columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        Instituicoes::Id,
        Instituicoes::Nome,
        Instituicoes::Sigla,
        Instituicoes::TipoAcademico,
        Instituicoes::Email,
        Instituicoes::Telefone,
        Instituicoes::Endereco,
        Instituicoes::Ativo,
        Instituicoes::CreatedAt,
    ])
}

pub struct NewInstituicao<'a> {
    pub id: &'a str,
    pub nome: &'a str,
    pub sigla: &'a str,
    pub tipo_academico: &'a str,
    pub email: Option<&'a str>,
    pub telefone: Option<&'a str>,
    pub endereco: Option<&'a str>,
}

pub fn insert(i: &NewInstituicao<'_>) -> Built {
    Query::insert()
        .into_table(Instituicoes::Table)
        .columns([
            Instituicoes::Id,
            Instituicoes::Nome,
            Instituicoes::Sigla,
            Instituicoes::TipoAcademico,
            Instituicoes::Email,
            Instituicoes::Telefone,
            Instituicoes::Endereco,
        ])
        .values_panic([
            i.id.into(),
            i.nome.into(),
            i.sigla.into(),
            i.tipo_academico.into(),
            i.email.map(|s| s.to_string()).into(),
            i.telefone.map(|s| s.to_string()).into(),
            i.endereco.map(|s| s.to_string()).into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn get_by_id(id: &str) -> Built {
    let mut q = Query::select().to_owned();
    columns(&mut q);
    q.from(Instituicoes::Table)
        .and_where(Expr::col(Instituicoes::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn list() -> Built {
    let mut q = Query::select().to_owned();
    columns(&mut q);
    q.from(Instituicoes::Table)
        .order_by(Instituicoes::Nome, Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Sigla lookup (returns id). Siglas are stored uppercased.
pub fn find_by_sigla(sigla: &str) -> Built {
    Query::select()
        .column(Instituicoes::Id)
        .from(Instituicoes::Table)
        .and_where(Expr::col(Instituicoes::Sigla).eq(sigla))
        .build(SqliteQueryBuilder)
}

/// Tipo académico of a tenant (drives which periods exist).
pub fn get_tipo(id: &str) -> Built {
    Query::select()
        .column(Instituicoes::TipoAcademico)
        .from(Instituicoes::Table)
        .and_where(Expr::col(Instituicoes::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn set_ativo(id: &str, ativo: bool) -> Built {
    Query::update()
        .table(Instituicoes::Table)
        .value(Instituicoes::Ativo, ativo)
        .and_where(Expr::col(Instituicoes::Id).eq(id))
        .build(SqliteQueryBuilder)
}
