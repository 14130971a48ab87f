//! Classes, cursos and disciplinas.

use sea_query::{Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{Classes, Cursos, Disciplinas};

// ── Classes ────────────────────────────────────────────────────────────────

pub fn insert_classe(instituicao_id: &str, id: &str, nome: &str, nivel: i32) -> Built {
    Query::insert()
        .into_table(Classes::Table)
        .columns([Classes::Id, Classes::InstituicaoId, Classes::Nome, Classes::Nivel])
        .values_panic([id.into(), instituicao_id.into(), nome.into(), nivel.into()])
        .build(SqliteQueryBuilder)
}

/// Column order: id, nome, nivel.
pub fn list_classes(instituicao_id: &str) -> Built {
    Query::select()
        .columns([Classes::Id, Classes::Nome, Classes::Nivel])
        .from(Classes::Table)
        .and_where(Expr::col(Classes::InstituicaoId).eq(instituicao_id))
        .order_by(Classes::Nivel, Order::Asc)
        .build(SqliteQueryBuilder)
}

pub fn classe_exists(instituicao_id: &str, id: &str) -> Built {
    Query::select()
        .expr(Expr::expr(Func::count(Expr::col(Asterisk))).gt(0))
        .from(Classes::Table)
        .and_where(Expr::col(Classes::Id).eq(id))
        .and_where(Expr::col(Classes::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

// ── Cursos ─────────────────────────────────────────────────────────────────

pub fn insert_curso(
    instituicao_id: &str,
    id: &str,
    nome: &str,
    codigo: &str,
    duracao_anos: i32,
) -> Built {
    Query::insert()
        .into_table(Cursos::Table)
        .columns([
            Cursos::Id,
            Cursos::InstituicaoId,
            Cursos::Nome,
            Cursos::Codigo,
            Cursos::DuracaoAnos,
        ])
        .values_panic([
            id.into(),
            instituicao_id.into(),
            nome.into(),
            codigo.into(),
            duracao_anos.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Column order: id, nome, codigo, duracao_anos.
pub fn list_cursos(instituicao_id: &str) -> Built {
    Query::select()
        .columns([Cursos::Id, Cursos::Nome, Cursos::Codigo, Cursos::DuracaoAnos])
        .from(Cursos::Table)
        .and_where(Expr::col(Cursos::InstituicaoId).eq(instituicao_id))
        .order_by(Cursos::Nome, Order::Asc)
        .build(SqliteQueryBuilder)
}

pub fn curso_exists(instituicao_id: &str, id: &str) -> Built {
    Query::select()
        .expr(Expr::expr(Func::count(Expr::col(Asterisk))).gt(0))
        .from(Cursos::Table)
        .and_where(Expr::col(Cursos::Id).eq(id))
        .and_where(Expr::col(Cursos::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

// ── Disciplinas ────────────────────────────────────────────────────────────

pub struct NewDisciplina<'a> {
    pub id: &'a str,
    pub nome: &'a str,
    pub codigo: &'a str,
    pub carga_horaria: i64,
    pub classe_id: Option<&'a str>,
    pub curso_id: Option<&'a str>,
}

pub fn insert_disciplina(instituicao_id: &str, d: &NewDisciplina<'_>) -> Built {
    Query::insert()
        .into_table(Disciplinas::Table)
        .columns([
            Disciplinas::Id,
            Disciplinas::InstituicaoId,
            Disciplinas::Nome,
            Disciplinas::Codigo,
            Disciplinas::CargaHoraria,
            Disciplinas::ClasseId,
            Disciplinas::CursoId,
        ])
        .values_panic([
            d.id.into(),
            instituicao_id.into(),
            d.nome.into(),
            d.codigo.into(),
            d.carga_horaria.into(),
            d.classe_id.map(|s| s.to_string()).into(),
            d.curso_id.map(|s| s.to_string()).into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Column order: id, nome, codigo, carga_horaria, classe_id, curso_id.
fn disciplina_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        Disciplinas::Id,
        Disciplinas::Nome,
        Disciplinas::Codigo,
        Disciplinas::CargaHoraria,
        Disciplinas::ClasseId,
        Disciplinas::CursoId,
    ])
}

pub fn list_disciplinas(instituicao_id: &str) -> Built {
    let mut q = Query::select().to_owned();
    disciplina_columns(&mut q);
    q.from(Disciplinas::Table)
        .and_where(Expr::col(Disciplinas::InstituicaoId).eq(instituicao_id))
        .order_by(Disciplinas::Nome, Order::Asc)
        .build(SqliteQueryBuilder)
}

pub fn get_disciplina(instituicao_id: &str, id: &str) -> Built {
    let mut q = Query::select().to_owned();
    disciplina_columns(&mut q);
    q.from(Disciplinas::Table)
        .and_where(Expr::col(Disciplinas::Id).eq(id))
        .and_where(Expr::col(Disciplinas::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}
