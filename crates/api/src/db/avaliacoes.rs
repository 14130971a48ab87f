//! Assessment and grade query builders.

use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{Avaliacoes, Notas, Users};

/// Column order: id, plano_id, periodo, tipo, descricao, peso, data,
/// created_at.
fn avaliacao_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        Avaliacoes::Id,
        Avaliacoes::PlanoId,
        Avaliacoes::Periodo,
        Avaliacoes::Tipo,
        Avaliacoes::Descricao,
        Avaliacoes::Peso,
        Avaliacoes::Data,
        Avaliacoes::CreatedAt,
    ])
}

pub struct NewAvaliacao<'a> {
    pub id: &'a str,
    pub plano_id: &'a str,
    pub periodo: &'a str,
    pub tipo: &'a str,
    pub descricao: &'a str,
    pub peso: f64,
    pub data: &'a str,
}

pub fn insert(instituicao_id: &str, a: &NewAvaliacao<'_>) -> Built {
    Query::insert()
        .into_table(Avaliacoes::Table)
        .columns([
            Avaliacoes::Id,
            Avaliacoes::InstituicaoId,
            Avaliacoes::PlanoId,
            Avaliacoes::Periodo,
            Avaliacoes::Tipo,
            Avaliacoes::Descricao,
            Avaliacoes::Peso,
            Avaliacoes::Data,
        ])
        .values_panic([
            a.id.into(),
            instituicao_id.into(),
            a.plano_id.into(),
            a.periodo.into(),
            a.tipo.into(),
            a.descricao.into(),
            a.peso.into(),
            a.data.into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn get(instituicao_id: &str, id: &str) -> Built {
    let mut q = Query::select().to_owned();
    avaliacao_columns(&mut q);
    q.from(Avaliacoes::Table)
        .and_where(Expr::col(Avaliacoes::Id).eq(id))
        .and_where(Expr::col(Avaliacoes::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

pub fn list(instituicao_id: &str, plano_id: Option<&str>) -> Built {
    let mut q = Query::select().to_owned();
    avaliacao_columns(&mut q);
    q.from(Avaliacoes::Table)
        .and_where(Expr::col(Avaliacoes::InstituicaoId).eq(instituicao_id));
    if let Some(plano) = plano_id {
        q.and_where(Expr::col(Avaliacoes::PlanoId).eq(plano));
    }
    q.order_by(Avaliacoes::Data, Order::Asc)
        .build(SqliteQueryBuilder)
}

// ── Notas ──────────────────────────────────────────────────────────────────

pub struct NotaUpsert<'a> {
    pub id: &'a str,
    pub avaliacao_id: &'a str,
    pub aluno_id: &'a str,
    pub valor: f64,
    pub observacao: Option<&'a str>,
    pub lancado_por: &'a str,
    pub updated_at: &'a str,
}

/// Insert or replace the grade of one student in one assessment.
pub fn upsert_nota(instituicao_id: &str, n: &NotaUpsert<'_>) -> Built {
    Query::insert()
        .into_table(Notas::Table)
        .columns([
            Notas::Id,
            Notas::InstituicaoId,
            Notas::AvaliacaoId,
            Notas::AlunoId,
            Notas::Valor,
            Notas::Observacao,
            Notas::LancadoPor,
            Notas::UpdatedAt,
        ])
        .values_panic([
            n.id.into(),
            instituicao_id.into(),
            n.avaliacao_id.into(),
            n.aluno_id.into(),
            n.valor.into(),
            n.observacao.map(|s| s.to_string()).into(),
            n.lancado_por.into(),
            n.updated_at.into(),
        ])
        .on_conflict(
            OnConflict::columns([Notas::AvaliacaoId, Notas::AlunoId])
                .update_columns([
                    Notas::Valor,
                    Notas::Observacao,
                    Notas::LancadoPor,
                    Notas::UpdatedAt,
                ])
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

/// Column order: id, avaliacao_id, aluno_id, aluno nome, valor, observacao,
/// updated_at.
pub fn list_notas(instituicao_id: &str, avaliacao_id: &str) -> Built {
    Query::select()
        .column((Notas::Table, Notas::Id))
        .column((Notas::Table, Notas::AvaliacaoId))
        .column((Notas::Table, Notas::AlunoId))
        .column((Users::Table, Users::Nome))
        .column((Notas::Table, Notas::Valor))
        .column((Notas::Table, Notas::Observacao))
        .column((Notas::Table, Notas::UpdatedAt))
        .from(Notas::Table)
        .inner_join(
            Users::Table,
            Expr::col((Users::Table, Users::Id)).equals((Notas::Table, Notas::AlunoId)),
        )
        .and_where(Expr::col((Notas::Table, Notas::InstituicaoId)).eq(instituicao_id))
        .and_where(Expr::col((Notas::Table, Notas::AvaliacaoId)).eq(avaliacao_id))
        .order_by((Users::Table, Users::Nome), Order::Asc)
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_targets_the_student_assessment_pair() {
        let (sql, _) = upsert_nota(
            "inst-1",
            &NotaUpsert {
                id: "n1",
                avaliacao_id: "a1",
                aluno_id: "u1",
                valor: 14.5,
                observacao: None,
                lancado_por: "p1",
                updated_at: "2026-03-01 10:00:00",
            },
        );
        assert!(sql.contains(r#"ON CONFLICT ("avaliacao_id", "aluno_id") DO UPDATE"#));
    }
}
