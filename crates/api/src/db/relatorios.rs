//! Read-only aggregation queries behind boletim, pauta and attendance
//! summaries.

use sea_query::{Alias, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{
    Aulas, Avaliacoes, Disciplinas, Matriculas, Notas, PlanosEnsino, Presencas, Turmas,
};

/// Plans of the turmas a student attends in a year.
///
/// Column order: plano id, disciplina_id, disciplina nome, turma_id.
pub fn planos_do_aluno(instituicao_id: &str, aluno_id: &str, ano_letivo_id: &str) -> Built {
    Query::select()
        .column((PlanosEnsino::Table, PlanosEnsino::Id))
        .column((PlanosEnsino::Table, PlanosEnsino::DisciplinaId))
        .column((Disciplinas::Table, Disciplinas::Nome))
        .column((PlanosEnsino::Table, PlanosEnsino::TurmaId))
        .from(PlanosEnsino::Table)
        .inner_join(
            Disciplinas::Table,
            Expr::col((Disciplinas::Table, Disciplinas::Id))
                .equals((PlanosEnsino::Table, PlanosEnsino::DisciplinaId)),
        )
        .inner_join(
            Matriculas::Table,
            Expr::col((Matriculas::Table, Matriculas::TurmaId))
                .equals((PlanosEnsino::Table, PlanosEnsino::TurmaId)),
        )
        .and_where(Expr::col((PlanosEnsino::Table, PlanosEnsino::InstituicaoId)).eq(instituicao_id))
        .and_where(Expr::col((PlanosEnsino::Table, PlanosEnsino::AnoLetivoId)).eq(ano_letivo_id))
        .and_where(Expr::col((Matriculas::Table, Matriculas::AlunoId)).eq(aluno_id))
        .and_where(Expr::col((Matriculas::Table, Matriculas::Status)).eq("ATIVA"))
        .order_by((Disciplinas::Table, Disciplinas::Nome), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Header of a pauta.
///
/// Column order: turma_id, turma nome, disciplina nome, ano_letivo_id.
pub fn cabecalho_pauta(instituicao_id: &str, plano_id: &str) -> Built {
    Query::select()
        .column((PlanosEnsino::Table, PlanosEnsino::TurmaId))
        .column((Turmas::Table, Turmas::Nome))
        .column((Disciplinas::Table, Disciplinas::Nome))
        .column((PlanosEnsino::Table, PlanosEnsino::AnoLetivoId))
        .from(PlanosEnsino::Table)
        .inner_join(
            Turmas::Table,
            Expr::col((Turmas::Table, Turmas::Id))
                .equals((PlanosEnsino::Table, PlanosEnsino::TurmaId)),
        )
        .inner_join(
            Disciplinas::Table,
            Expr::col((Disciplinas::Table, Disciplinas::Id))
                .equals((PlanosEnsino::Table, PlanosEnsino::DisciplinaId)),
        )
        .and_where(Expr::col((PlanosEnsino::Table, PlanosEnsino::InstituicaoId)).eq(instituicao_id))
        .and_where(Expr::col((PlanosEnsino::Table, PlanosEnsino::Id)).eq(plano_id))
        .build(SqliteQueryBuilder)
}

/// Every grade recorded under a plan, optionally for one student.
///
/// Column order: aluno_id, periodo, tipo, peso, valor.
pub fn notas_do_plano(instituicao_id: &str, plano_id: &str, aluno_id: Option<&str>) -> Built {
    let mut q = Query::select()
        .column((Notas::Table, Notas::AlunoId))
        .column((Avaliacoes::Table, Avaliacoes::Periodo))
        .column((Avaliacoes::Table, Avaliacoes::Tipo))
        .column((Avaliacoes::Table, Avaliacoes::Peso))
        .column((Notas::Table, Notas::Valor))
        .from(Notas::Table)
        .inner_join(
            Avaliacoes::Table,
            Expr::col((Avaliacoes::Table, Avaliacoes::Id))
                .equals((Notas::Table, Notas::AvaliacaoId)),
        )
        .and_where(Expr::col((Notas::Table, Notas::InstituicaoId)).eq(instituicao_id))
        .and_where(Expr::col((Avaliacoes::Table, Avaliacoes::PlanoId)).eq(plano_id))
        .to_owned();
    if let Some(aluno) = aluno_id {
        q.and_where(Expr::col((Notas::Table, Notas::AlunoId)).eq(aluno));
    }
    q.build(SqliteQueryBuilder)
}

/// Attendance under a plan, weighted by each aula's quantidade.
///
/// Column order: aluno_id, status, total.
pub fn frequencia_do_plano(
    instituicao_id: &str,
    plano_id: &str,
    aluno_id: Option<&str>,
) -> Built {
    let mut q = Query::select()
        .column((Presencas::Table, Presencas::AlunoId))
        .column((Presencas::Table, Presencas::Status))
        .expr_as(
            Func::sum(Expr::col((Aulas::Table, Aulas::Quantidade))),
            Alias::new("total"),
        )
        .from(Presencas::Table)
        .inner_join(
            Aulas::Table,
            Expr::col((Aulas::Table, Aulas::Id)).equals((Presencas::Table, Presencas::AulaId)),
        )
        .and_where(Expr::col((Presencas::Table, Presencas::InstituicaoId)).eq(instituicao_id))
        .and_where(Expr::col((Aulas::Table, Aulas::PlanoId)).eq(plano_id))
        .to_owned();
    if let Some(aluno) = aluno_id {
        q.and_where(Expr::col((Presencas::Table, Presencas::AlunoId)).eq(aluno));
    }
    q.group_by_col((Presencas::Table, Presencas::AlunoId))
        .group_by_col((Presencas::Table, Presencas::Status))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attendance_is_grouped_per_student_and_status() {
        let (sql, values) = frequencia_do_plano("inst-1", "plano-1", None);
        assert!(sql.contains("SUM"));
        assert!(sql.contains("GROUP BY"));
        assert_eq!(values.0.len(), 2);
    }

    #[test]
    fn student_plans_require_active_enrollment() {
        let (_, values) = planos_do_aluno("inst-1", "aluno-1", "ano-1");
        assert_eq!(values.0.len(), 4);
    }
}
