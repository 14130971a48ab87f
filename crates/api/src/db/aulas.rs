//! Lesson log and attendance query builders.

use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{Aulas, Presencas, Users};

/// Column order: id, plano_id, data, periodo, conteudo, quantidade,
/// created_by, created_at.
fn aula_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        Aulas::Id,
        Aulas::PlanoId,
        Aulas::Data,
        Aulas::Periodo,
        Aulas::Conteudo,
        Aulas::Quantidade,
        Aulas::CreatedBy,
        Aulas::CreatedAt,
    ])
}

pub struct NewAula<'a> {
    pub id: &'a str,
    pub plano_id: &'a str,
    pub data: &'a str,
    pub periodo: &'a str,
    pub conteudo: &'a str,
    pub quantidade: i64,
    pub created_by: &'a str,
}

pub fn insert(instituicao_id: &str, a: &NewAula<'_>) -> Built {
    Query::insert()
        .into_table(Aulas::Table)
        .columns([
            Aulas::Id,
            Aulas::InstituicaoId,
            Aulas::PlanoId,
            Aulas::Data,
            Aulas::Periodo,
            Aulas::Conteudo,
            Aulas::Quantidade,
            Aulas::CreatedBy,
        ])
        .values_panic([
            a.id.into(),
            instituicao_id.into(),
            a.plano_id.into(),
            a.data.into(),
            a.periodo.into(),
            a.conteudo.into(),
            a.quantidade.into(),
            a.created_by.into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn get(instituicao_id: &str, id: &str) -> Built {
    let mut q = Query::select().to_owned();
    aula_columns(&mut q);
    q.from(Aulas::Table)
        .and_where(Expr::col(Aulas::Id).eq(id))
        .and_where(Expr::col(Aulas::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

pub fn list(instituicao_id: &str, plano_id: Option<&str>) -> Built {
    let mut q = Query::select().to_owned();
    aula_columns(&mut q);
    q.from(Aulas::Table)
        .and_where(Expr::col(Aulas::InstituicaoId).eq(instituicao_id));
    if let Some(plano) = plano_id {
        q.and_where(Expr::col(Aulas::PlanoId).eq(plano));
    }
    q.order_by(Aulas::Data, Order::Asc)
        .build(SqliteQueryBuilder)
}

// ── Presenças ──────────────────────────────────────────────────────────────

pub fn upsert_presenca(
    instituicao_id: &str,
    id: &str,
    aula_id: &str,
    aluno_id: &str,
    status: &str,
    observacao: Option<&str>,
) -> Built {
    Query::insert()
        .into_table(Presencas::Table)
        .columns([
            Presencas::Id,
            Presencas::InstituicaoId,
            Presencas::AulaId,
            Presencas::AlunoId,
            Presencas::Status,
            Presencas::Observacao,
        ])
        .values_panic([
            id.into(),
            instituicao_id.into(),
            aula_id.into(),
            aluno_id.into(),
            status.into(),
            observacao.map(|s| s.to_string()).into(),
        ])
        .on_conflict(
            OnConflict::columns([Presencas::AulaId, Presencas::AlunoId])
                .update_columns([Presencas::Status, Presencas::Observacao])
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

/// Column order: aluno_id, aluno nome, status, observacao.
pub fn list_presencas(instituicao_id: &str, aula_id: &str) -> Built {
    Query::select()
        .column((Presencas::Table, Presencas::AlunoId))
        .column((Users::Table, Users::Nome))
        .column((Presencas::Table, Presencas::Status))
        .column((Presencas::Table, Presencas::Observacao))
        .from(Presencas::Table)
        .inner_join(
            Users::Table,
            Expr::col((Users::Table, Users::Id)).equals((Presencas::Table, Presencas::AlunoId)),
        )
        .and_where(Expr::col((Presencas::Table, Presencas::InstituicaoId)).eq(instituicao_id))
        .and_where(Expr::col((Presencas::Table, Presencas::AulaId)).eq(aula_id))
        .order_by((Users::Table, Users::Nome), Order::Asc)
        .build(SqliteQueryBuilder)
}
