//! Turma query builders.

use sea_query::{Alias, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{Matriculas, Turmas, Users};

/// Column order: id, nome, ano_letivo_id, classe_id, curso_id, turno,
/// capacidade, ocupadas.
fn select_turmas(instituicao_id: &str) -> sea_query::SelectStatement {
    Query::select()
        .column((Turmas::Table, Turmas::Id))
        .column((Turmas::Table, Turmas::Nome))
        .column((Turmas::Table, Turmas::AnoLetivoId))
        .column((Turmas::Table, Turmas::ClasseId))
        .column((Turmas::Table, Turmas::CursoId))
        .column((Turmas::Table, Turmas::Turno))
        .column((Turmas::Table, Turmas::Capacidade))
        .expr_as(
            Func::count(Expr::col((Matriculas::Table, Matriculas::Id))),
            Alias::new("ocupadas"),
        )
        .from(Turmas::Table)
        .left_join(
            Matriculas::Table,
            Expr::col((Matriculas::Table, Matriculas::TurmaId))
                .equals((Turmas::Table, Turmas::Id))
                .and(Expr::col((Matriculas::Table, Matriculas::Status)).eq("ATIVA")),
        )
        .and_where(Expr::col((Turmas::Table, Turmas::InstituicaoId)).eq(instituicao_id))
        .group_by_col((Turmas::Table, Turmas::Id))
        .to_owned()
}

pub struct NewTurma<'a> {
    pub id: &'a str,
    pub ano_letivo_id: &'a str,
    pub nome: &'a str,
    pub classe_id: Option<&'a str>,
    pub curso_id: Option<&'a str>,
    pub turno: &'a str,
    pub capacidade: i64,
}

pub fn insert(instituicao_id: &str, t: &NewTurma<'_>) -> Built {
    Query::insert()
        .into_table(Turmas::Table)
        .columns([
            Turmas::Id,
            Turmas::InstituicaoId,
            Turmas::AnoLetivoId,
            Turmas::Nome,
            Turmas::ClasseId,
            Turmas::CursoId,
            Turmas::Turno,
            Turmas::Capacidade,
        ])
        .values_panic([
            t.id.into(),
            instituicao_id.into(),
            t.ano_letivo_id.into(),
            t.nome.into(),
            t.classe_id.map(|s| s.to_string()).into(),
            t.curso_id.map(|s| s.to_string()).into(),
            t.turno.into(),
            t.capacidade.into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn get(instituicao_id: &str, id: &str) -> Built {
    select_turmas(instituicao_id)
        .and_where(Expr::col((Turmas::Table, Turmas::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn list(instituicao_id: &str, ano_letivo_id: Option<&str>) -> Built {
    let mut q = select_turmas(instituicao_id);
    if let Some(ano) = ano_letivo_id {
        q.and_where(Expr::col((Turmas::Table, Turmas::AnoLetivoId)).eq(ano));
    }
    q.order_by((Turmas::Table, Turmas::Nome), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Active class enrollments of a turma with the student's name.
///
/// Column order: matricula id, aluno_id, nome, numero_identificacao, status.
pub fn list_alunos(instituicao_id: &str, turma_id: &str) -> Built {
    Query::select()
        .column((Matriculas::Table, Matriculas::Id))
        .column((Matriculas::Table, Matriculas::AlunoId))
        .column((Users::Table, Users::Nome))
        .column((Users::Table, Users::NumeroIdentificacao))
        .column((Matriculas::Table, Matriculas::Status))
        .from(Matriculas::Table)
        .inner_join(
            Users::Table,
            Expr::col((Users::Table, Users::Id)).equals((Matriculas::Table, Matriculas::AlunoId)),
        )
        .and_where(Expr::col((Matriculas::Table, Matriculas::InstituicaoId)).eq(instituicao_id))
        .and_where(Expr::col((Matriculas::Table, Matriculas::TurmaId)).eq(turma_id))
        .and_where(Expr::col((Matriculas::Table, Matriculas::Status)).eq("ATIVA"))
        .order_by((Users::Table, Users::Nome), Order::Asc)
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupancy_counts_only_active_enrollments() {
        let (sql, values) = get("inst-1", "turma-1");
        assert!(sql.contains("LEFT JOIN"));
        assert!(sql.contains("GROUP BY"));
        assert_eq!(values.0.len(), 3);
    }
}
