//! Plano de ensino query builders.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{PlanoAulas, PlanosEnsino};

/// Column order: id, professor_id, disciplina_id, turma_id, ano_letivo_id,
/// ementa, objetivos, metodologia, carga_horaria_total, status, observacao,
/// aprovado_por, aprovado_em, created_at, updated_at.
fn plano_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        PlanosEnsino::Id,
        PlanosEnsino::ProfessorId,
        PlanosEnsino::DisciplinaId,
        PlanosEnsino::TurmaId,
        PlanosEnsino::AnoLetivoId,
        PlanosEnsino::Ementa,
        PlanosEnsino::Objetivos,
        PlanosEnsino::Metodologia,
        PlanosEnsino::CargaHorariaTotal,
        PlanosEnsino::Status,
        PlanosEnsino::Observacao,
        PlanosEnsino::AprovadoPor,
        PlanosEnsino::AprovadoEm,
        PlanosEnsino::CreatedAt,
        PlanosEnsino::UpdatedAt,
    ])
}

pub struct NewPlano<'a> {
    pub id: &'a str,
    pub professor_id: &'a str,
    pub disciplina_id: &'a str,
    pub turma_id: &'a str,
    pub ano_letivo_id: &'a str,
    pub ementa: &'a str,
    pub objetivos: &'a str,
    pub metodologia: &'a str,
    pub carga_horaria_total: i64,
}

pub fn insert(instituicao_id: &str, p: &NewPlano<'_>) -> Built {
    Query::insert()
        .into_table(PlanosEnsino::Table)
        .columns([
            PlanosEnsino::Id,
            PlanosEnsino::InstituicaoId,
            PlanosEnsino::ProfessorId,
            PlanosEnsino::DisciplinaId,
            PlanosEnsino::TurmaId,
            PlanosEnsino::AnoLetivoId,
            PlanosEnsino::Ementa,
            PlanosEnsino::Objetivos,
            PlanosEnsino::Metodologia,
            PlanosEnsino::CargaHorariaTotal,
        ])
        .values_panic([
            p.id.into(),
            instituicao_id.into(),
            p.professor_id.into(),
            p.disciplina_id.into(),
            p.turma_id.into(),
            p.ano_letivo_id.into(),
            p.ementa.into(),
            p.objetivos.into(),
            p.metodologia.into(),
            p.carga_horaria_total.into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn get(instituicao_id: &str, id: &str) -> Built {
    let mut q = Query::select().to_owned();
    plano_columns(&mut q);
    q.from(PlanosEnsino::Table)
        .and_where(Expr::col(PlanosEnsino::Id).eq(id))
        .and_where(Expr::col(PlanosEnsino::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

pub struct PlanoFilter<'a> {
    pub turma_id: Option<&'a str>,
    pub professor_id: Option<&'a str>,
    pub ano_letivo_id: Option<&'a str>,
    pub status: Option<&'a str>,
}

pub fn list(instituicao_id: &str, f: &PlanoFilter<'_>) -> Built {
    let mut q = Query::select().to_owned();
    plano_columns(&mut q);
    q.from(PlanosEnsino::Table)
        .and_where(Expr::col(PlanosEnsino::InstituicaoId).eq(instituicao_id));
    if let Some(v) = f.turma_id {
        q.and_where(Expr::col(PlanosEnsino::TurmaId).eq(v));
    }
    if let Some(v) = f.professor_id {
        q.and_where(Expr::col(PlanosEnsino::ProfessorId).eq(v));
    }
    if let Some(v) = f.ano_letivo_id {
        q.and_where(Expr::col(PlanosEnsino::AnoLetivoId).eq(v));
    }
    if let Some(v) = f.status {
        q.and_where(Expr::col(PlanosEnsino::Status).eq(v));
    }
    q.order_by(PlanosEnsino::CreatedAt, Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Plans of a year not yet `APROVADO` (returns count).
pub fn count_pendentes(instituicao_id: &str, ano_letivo_id: &str) -> Built {
    Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(PlanosEnsino::Table)
        .and_where(Expr::col(PlanosEnsino::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(PlanosEnsino::AnoLetivoId).eq(ano_letivo_id))
        .and_where(Expr::col(PlanosEnsino::Status).ne("APROVADO"))
        .build(SqliteQueryBuilder)
}

pub struct PlanoEdit<'a> {
    pub ementa: &'a str,
    pub objetivos: &'a str,
    pub metodologia: &'a str,
    pub carga_horaria_total: i64,
    pub status: &'a str,
    pub updated_at: &'a str,
}

pub fn update(instituicao_id: &str, id: &str, e: &PlanoEdit<'_>) -> Built {
    Query::update()
        .table(PlanosEnsino::Table)
        .value(PlanosEnsino::Ementa, e.ementa)
        .value(PlanosEnsino::Objetivos, e.objetivos)
        .value(PlanosEnsino::Metodologia, e.metodologia)
        .value(PlanosEnsino::CargaHorariaTotal, e.carga_horaria_total)
        .value(PlanosEnsino::Status, e.status)
        .value(PlanosEnsino::UpdatedAt, e.updated_at)
        .and_where(Expr::col(PlanosEnsino::Id).eq(id))
        .and_where(Expr::col(PlanosEnsino::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

/// Move a plan to `status`; `observacao` is overwritten (cleared on
/// anything but a rejection).
pub fn set_status(
    instituicao_id: &str,
    id: &str,
    status: &str,
    observacao: Option<&str>,
    updated_at: &str,
) -> Built {
    Query::update()
        .table(PlanosEnsino::Table)
        .value(PlanosEnsino::Status, status)
        .value(PlanosEnsino::Observacao, observacao.map(|s| s.to_string()))
        .value(PlanosEnsino::UpdatedAt, updated_at)
        .and_where(Expr::col(PlanosEnsino::Id).eq(id))
        .and_where(Expr::col(PlanosEnsino::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

pub fn aprovar(instituicao_id: &str, id: &str, aprovado_por: &str, now: &str) -> Built {
    Query::update()
        .table(PlanosEnsino::Table)
        .value(PlanosEnsino::Status, "APROVADO")
        .value(PlanosEnsino::Observacao, Option::<String>::None)
        .value(PlanosEnsino::AprovadoPor, aprovado_por)
        .value(PlanosEnsino::AprovadoEm, now)
        .value(PlanosEnsino::UpdatedAt, now)
        .and_where(Expr::col(PlanosEnsino::Id).eq(id))
        .and_where(Expr::col(PlanosEnsino::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

// ── Planned aulas ──────────────────────────────────────────────────────────

pub struct NewPlanoAula<'a> {
    pub id: &'a str,
    pub plano_id: &'a str,
    pub ordem: i64,
    pub titulo: &'a str,
    pub descricao: Option<&'a str>,
    pub periodo: &'a str,
    pub quantidade_aulas: i64,
}

pub fn insert_aula(instituicao_id: &str, a: &NewPlanoAula<'_>) -> Built {
    Query::insert()
        .into_table(PlanoAulas::Table)
        .columns([
            PlanoAulas::Id,
            PlanoAulas::InstituicaoId,
            PlanoAulas::PlanoId,
            PlanoAulas::Ordem,
            PlanoAulas::Titulo,
            PlanoAulas::Descricao,
            PlanoAulas::Periodo,
            PlanoAulas::QuantidadeAulas,
        ])
        .values_panic([
            a.id.into(),
            instituicao_id.into(),
            a.plano_id.into(),
            a.ordem.into(),
            a.titulo.into(),
            a.descricao.map(|s| s.to_string()).into(),
            a.periodo.into(),
            a.quantidade_aulas.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Column order: id, ordem, titulo, descricao, periodo, quantidade_aulas.
pub fn list_aulas(instituicao_id: &str, plano_id: &str) -> Built {
    Query::select()
        .columns([
            PlanoAulas::Id,
            PlanoAulas::Ordem,
            PlanoAulas::Titulo,
            PlanoAulas::Descricao,
            PlanoAulas::Periodo,
            PlanoAulas::QuantidadeAulas,
        ])
        .from(PlanoAulas::Table)
        .and_where(Expr::col(PlanoAulas::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(PlanoAulas::PlanoId).eq(plano_id))
        .order_by(PlanoAulas::Ordem, Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Returns count of planned aulas.
pub fn count_aulas(instituicao_id: &str, plano_id: &str) -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(PlanoAulas::Table)
        .and_where(Expr::col(PlanoAulas::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(PlanoAulas::PlanoId).eq(plano_id))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planned_aulas_are_tenant_scoped() {
        for (sql, values) in [list_aulas("inst-1", "plano-1"), count_aulas("inst-1", "plano-1")] {
            assert!(sql.contains(r#""instituicao_id" = ?"#), "{sql}");
            assert_eq!(values.0.len(), 2);
        }

        let (sql, values) = insert_aula(
            "inst-1",
            &NewPlanoAula {
                id: "aula-1",
                plano_id: "plano-1",
                ordem: 1,
                titulo: "Equações",
                descricao: None,
                periodo: "TRIMESTRE_1",
                quantidade_aulas: 2,
            },
        );
        assert!(sql.contains(r#""instituicao_id""#));
        assert_eq!(values.0.len(), 8);
    }
}
