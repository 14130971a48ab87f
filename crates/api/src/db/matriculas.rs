//! Annual and class enrollment query builders.

use sea_query::{Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{Matriculas, MatriculasAnuais, Users};

// ── Matrícula anual ────────────────────────────────────────────────────────

pub struct NewMatriculaAnual<'a> {
    pub id: &'a str,
    pub aluno_id: &'a str,
    pub ano_letivo_id: &'a str,
    pub classe_id: Option<&'a str>,
    pub curso_id: Option<&'a str>,
}

pub fn insert_anual(instituicao_id: &str, m: &NewMatriculaAnual<'_>) -> Built {
    Query::insert()
        .into_table(MatriculasAnuais::Table)
        .columns([
            MatriculasAnuais::Id,
            MatriculasAnuais::InstituicaoId,
            MatriculasAnuais::AlunoId,
            MatriculasAnuais::AnoLetivoId,
            MatriculasAnuais::ClasseId,
            MatriculasAnuais::CursoId,
        ])
        .values_panic([
            m.id.into(),
            instituicao_id.into(),
            m.aluno_id.into(),
            m.ano_letivo_id.into(),
            m.classe_id.map(|s| s.to_string()).into(),
            m.curso_id.map(|s| s.to_string()).into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Column order: id, aluno_id, aluno nome, ano_letivo_id, classe_id,
/// curso_id, status, created_at.
fn select_anuais(instituicao_id: &str) -> sea_query::SelectStatement {
    Query::select()
        .column((MatriculasAnuais::Table, MatriculasAnuais::Id))
        .column((MatriculasAnuais::Table, MatriculasAnuais::AlunoId))
        .column((Users::Table, Users::Nome))
        .column((MatriculasAnuais::Table, MatriculasAnuais::AnoLetivoId))
        .column((MatriculasAnuais::Table, MatriculasAnuais::ClasseId))
        .column((MatriculasAnuais::Table, MatriculasAnuais::CursoId))
        .column((MatriculasAnuais::Table, MatriculasAnuais::Status))
        .column((MatriculasAnuais::Table, MatriculasAnuais::CreatedAt))
        .from(MatriculasAnuais::Table)
        .inner_join(
            Users::Table,
            Expr::col((Users::Table, Users::Id))
                .equals((MatriculasAnuais::Table, MatriculasAnuais::AlunoId)),
        )
        .and_where(
            Expr::col((MatriculasAnuais::Table, MatriculasAnuais::InstituicaoId))
                .eq(instituicao_id),
        )
        .to_owned()
}

pub fn get_anual(instituicao_id: &str, id: &str) -> Built {
    select_anuais(instituicao_id)
        .and_where(Expr::col((MatriculasAnuais::Table, MatriculasAnuais::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn list_anuais(
    instituicao_id: &str,
    ano_letivo_id: Option<&str>,
    aluno_id: Option<&str>,
    status: Option<&str>,
) -> Built {
    let mut q = select_anuais(instituicao_id);
    if let Some(ano) = ano_letivo_id {
        q.and_where(Expr::col((MatriculasAnuais::Table, MatriculasAnuais::AnoLetivoId)).eq(ano));
    }
    if let Some(aluno) = aluno_id {
        q.and_where(Expr::col((MatriculasAnuais::Table, MatriculasAnuais::AlunoId)).eq(aluno));
    }
    if let Some(status) = status {
        q.and_where(Expr::col((MatriculasAnuais::Table, MatriculasAnuais::Status)).eq(status));
    }
    q.order_by((Users::Table, Users::Nome), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Matrícula anual of a student in a year (returns id, status).
pub fn find_anual(instituicao_id: &str, aluno_id: &str, ano_letivo_id: &str) -> Built {
    Query::select()
        .columns([MatriculasAnuais::Id, MatriculasAnuais::Status])
        .from(MatriculasAnuais::Table)
        .and_where(Expr::col(MatriculasAnuais::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(MatriculasAnuais::AlunoId).eq(aluno_id))
        .and_where(Expr::col(MatriculasAnuais::AnoLetivoId).eq(ano_letivo_id))
        .build(SqliteQueryBuilder)
}

/// Does the student hold an `ATIVA` matrícula anual in any year?
pub fn has_anual_ativa(instituicao_id: &str, aluno_id: &str) -> Built {
    Query::select()
        .expr(Expr::expr(Func::count(Expr::col(Asterisk))).gt(0))
        .from(MatriculasAnuais::Table)
        .and_where(Expr::col(MatriculasAnuais::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(MatriculasAnuais::AlunoId).eq(aluno_id))
        .and_where(Expr::col(MatriculasAnuais::Status).eq("ATIVA"))
        .build(SqliteQueryBuilder)
}

/// Students with an `ATIVA` matrícula anual in a year (returns aluno_id).
pub fn alunos_ativos(instituicao_id: &str, ano_letivo_id: &str) -> Built {
    Query::select()
        .column(MatriculasAnuais::AlunoId)
        .from(MatriculasAnuais::Table)
        .and_where(Expr::col(MatriculasAnuais::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(MatriculasAnuais::AnoLetivoId).eq(ano_letivo_id))
        .and_where(Expr::col(MatriculasAnuais::Status).eq("ATIVA"))
        .build(SqliteQueryBuilder)
}

pub fn set_anual_status(instituicao_id: &str, id: &str, status: &str) -> Built {
    Query::update()
        .table(MatriculasAnuais::Table)
        .value(MatriculasAnuais::Status, status)
        .and_where(Expr::col(MatriculasAnuais::Id).eq(id))
        .and_where(Expr::col(MatriculasAnuais::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

/// Mark every `ATIVA` matrícula anual of a closed year `CONCLUIDA`.
pub fn concluir_anuais(instituicao_id: &str, ano_letivo_id: &str) -> Built {
    Query::update()
        .table(MatriculasAnuais::Table)
        .value(MatriculasAnuais::Status, "CONCLUIDA")
        .and_where(Expr::col(MatriculasAnuais::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(MatriculasAnuais::AnoLetivoId).eq(ano_letivo_id))
        .and_where(Expr::col(MatriculasAnuais::Status).eq("ATIVA"))
        .build(SqliteQueryBuilder)
}

/// Undo [`concluir_anuais`] when the year is reopened.
pub fn reativar_anuais(instituicao_id: &str, ano_letivo_id: &str) -> Built {
    Query::update()
        .table(MatriculasAnuais::Table)
        .value(MatriculasAnuais::Status, "ATIVA")
        .and_where(Expr::col(MatriculasAnuais::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(MatriculasAnuais::AnoLetivoId).eq(ano_letivo_id))
        .and_where(Expr::col(MatriculasAnuais::Status).eq("CONCLUIDA"))
        .build(SqliteQueryBuilder)
}

// ── Matrícula em turma ─────────────────────────────────────────────────────

pub fn insert(
    instituicao_id: &str,
    id: &str,
    aluno_id: &str,
    turma_id: &str,
    matricula_anual_id: &str,
) -> Built {
    Query::insert()
        .into_table(Matriculas::Table)
        .columns([
            Matriculas::Id,
            Matriculas::InstituicaoId,
            Matriculas::AlunoId,
            Matriculas::TurmaId,
            Matriculas::MatriculaAnualId,
        ])
        .values_panic([
            id.into(),
            instituicao_id.into(),
            aluno_id.into(),
            turma_id.into(),
            matricula_anual_id.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Column order: id, aluno_id, turma_id, matricula_anual_id, status,
/// created_at.
fn matricula_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        Matriculas::Id,
        Matriculas::AlunoId,
        Matriculas::TurmaId,
        Matriculas::MatriculaAnualId,
        Matriculas::Status,
        Matriculas::CreatedAt,
    ])
}

pub fn get(instituicao_id: &str, id: &str) -> Built {
    let mut q = Query::select().to_owned();
    matricula_columns(&mut q);
    q.from(Matriculas::Table)
        .and_where(Expr::col(Matriculas::Id).eq(id))
        .and_where(Expr::col(Matriculas::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

pub fn list(instituicao_id: &str, turma_id: Option<&str>, aluno_id: Option<&str>) -> Built {
    let mut q = Query::select().to_owned();
    matricula_columns(&mut q);
    q.from(Matriculas::Table)
        .and_where(Expr::col(Matriculas::InstituicaoId).eq(instituicao_id));
    if let Some(turma) = turma_id {
        q.and_where(Expr::col(Matriculas::TurmaId).eq(turma));
    }
    if let Some(aluno) = aluno_id {
        q.and_where(Expr::col(Matriculas::AlunoId).eq(aluno));
    }
    q.order_by(Matriculas::CreatedAt, Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Seats taken in a turma (returns count).
pub fn count_ativas(instituicao_id: &str, turma_id: &str) -> Built {
    Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Matriculas::Table)
        .and_where(Expr::col(Matriculas::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(Matriculas::TurmaId).eq(turma_id))
        .and_where(Expr::col(Matriculas::Status).eq("ATIVA"))
        .build(SqliteQueryBuilder)
}

/// Is the student actively enrolled in the turma?
pub fn is_enrolled(instituicao_id: &str, turma_id: &str, aluno_id: &str) -> Built {
    Query::select()
        .expr(Expr::expr(Func::count(Expr::col(Asterisk))).gt(0))
        .from(Matriculas::Table)
        .and_where(Expr::col(Matriculas::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(Matriculas::TurmaId).eq(turma_id))
        .and_where(Expr::col(Matriculas::AlunoId).eq(aluno_id))
        .and_where(Expr::col(Matriculas::Status).eq("ATIVA"))
        .build(SqliteQueryBuilder)
}

/// Cancel every class enrollment hanging off a matrícula anual.
pub fn cancel_for_anual(instituicao_id: &str, matricula_anual_id: &str) -> Built {
    Query::update()
        .table(Matriculas::Table)
        .value(Matriculas::Status, "CANCELADA")
        .and_where(Expr::col(Matriculas::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(Matriculas::MatriculaAnualId).eq(matricula_anual_id))
        .build(SqliteQueryBuilder)
}
