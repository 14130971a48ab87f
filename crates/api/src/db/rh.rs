//! Staff, HR history and payroll query builders.

use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{FolhasPagamento, Funcionarios, HistoricoRh};

// ── Funcionários ───────────────────────────────────────────────────────────

/// Column order: id, user_id, nome, cargo, departamento, salario_base,
/// data_admissao, status, created_at.
fn funcionario_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        Funcionarios::Id,
        Funcionarios::UserId,
        Funcionarios::Nome,
        Funcionarios::Cargo,
        Funcionarios::Departamento,
        Funcionarios::SalarioBase,
        Funcionarios::DataAdmissao,
        Funcionarios::Status,
        Funcionarios::CreatedAt,
    ])
}

pub struct NewFuncionario<'a> {
    pub id: &'a str,
    pub user_id: Option<&'a str>,
    pub nome: &'a str,
    pub cargo: &'a str,
    pub departamento: &'a str,
    pub salario_base: i64,
    pub data_admissao: &'a str,
}

pub fn insert_funcionario(instituicao_id: &str, f: &NewFuncionario<'_>) -> Built {
    Query::insert()
        .into_table(Funcionarios::Table)
        .columns([
            Funcionarios::Id,
            Funcionarios::InstituicaoId,
            Funcionarios::UserId,
            Funcionarios::Nome,
            Funcionarios::Cargo,
            Funcionarios::Departamento,
            Funcionarios::SalarioBase,
            Funcionarios::DataAdmissao,
        ])
        .values_panic([
            f.id.into(),
            instituicao_id.into(),
            f.user_id.map(|s| s.to_string()).into(),
            f.nome.into(),
            f.cargo.into(),
            f.departamento.into(),
            f.salario_base.into(),
            f.data_admissao.into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn get_funcionario(instituicao_id: &str, id: &str) -> Built {
    let mut q = Query::select().to_owned();
    funcionario_columns(&mut q);
    q.from(Funcionarios::Table)
        .and_where(Expr::col(Funcionarios::Id).eq(id))
        .and_where(Expr::col(Funcionarios::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

pub fn list_funcionarios(instituicao_id: &str, status: Option<&str>) -> Built {
    let mut q = Query::select().to_owned();
    funcionario_columns(&mut q);
    q.from(Funcionarios::Table)
        .and_where(Expr::col(Funcionarios::InstituicaoId).eq(instituicao_id));
    if let Some(status) = status {
        q.and_where(Expr::col(Funcionarios::Status).eq(status));
    }
    q.order_by(Funcionarios::Nome, Order::Asc)
        .build(SqliteQueryBuilder)
}

pub struct FuncionarioEdit<'a> {
    pub cargo: &'a str,
    pub departamento: &'a str,
    pub salario_base: i64,
    pub status: &'a str,
}

pub fn update_funcionario(instituicao_id: &str, id: &str, e: &FuncionarioEdit<'_>) -> Built {
    Query::update()
        .table(Funcionarios::Table)
        .value(Funcionarios::Cargo, e.cargo)
        .value(Funcionarios::Departamento, e.departamento)
        .value(Funcionarios::SalarioBase, e.salario_base)
        .value(Funcionarios::Status, e.status)
        .and_where(Expr::col(Funcionarios::Id).eq(id))
        .and_where(Expr::col(Funcionarios::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

// ── Histórico RH ───────────────────────────────────────────────────────────

pub struct NewHistorico<'a> {
    pub id: &'a str,
    pub funcionario_id: &'a str,
    pub tipo_alteracao: &'a str,
    pub descricao: &'a str,
    pub valor_anterior: Option<&'a str>,
    pub valor_novo: Option<&'a str>,
    pub registrado_por: &'a str,
}

pub fn insert_historico(instituicao_id: &str, h: &NewHistorico<'_>) -> Built {
    Query::insert()
        .into_table(HistoricoRh::Table)
        .columns([
            HistoricoRh::Id,
            HistoricoRh::InstituicaoId,
            HistoricoRh::FuncionarioId,
            HistoricoRh::TipoAlteracao,
            HistoricoRh::Descricao,
            HistoricoRh::ValorAnterior,
            HistoricoRh::ValorNovo,
            HistoricoRh::RegistradoPor,
        ])
        .values_panic([
            h.id.into(),
            instituicao_id.into(),
            h.funcionario_id.into(),
            h.tipo_alteracao.into(),
            h.descricao.into(),
            h.valor_anterior.map(|s| s.to_string()).into(),
            h.valor_novo.map(|s| s.to_string()).into(),
            h.registrado_por.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Column order: id, funcionario_id, tipo_alteracao, descricao,
/// valor_anterior, valor_novo, registrado_por, created_at. Newest first.
pub fn list_historico(instituicao_id: &str, funcionario_id: Option<&str>) -> Built {
    let mut q = Query::select()
        .columns([
            HistoricoRh::Id,
            HistoricoRh::FuncionarioId,
            HistoricoRh::TipoAlteracao,
            HistoricoRh::Descricao,
            HistoricoRh::ValorAnterior,
            HistoricoRh::ValorNovo,
            HistoricoRh::RegistradoPor,
            HistoricoRh::CreatedAt,
        ])
        .from(HistoricoRh::Table)
        .and_where(Expr::col(HistoricoRh::InstituicaoId).eq(instituicao_id))
        .to_owned();
    if let Some(f) = funcionario_id {
        q.and_where(Expr::col(HistoricoRh::FuncionarioId).eq(f));
    }
    q.order_by(HistoricoRh::CreatedAt, Order::Desc)
        .order_by(HistoricoRh::Id, Order::Desc)
        .build(SqliteQueryBuilder)
}

// ── Folhas de pagamento ────────────────────────────────────────────────────

pub struct NewFolha<'a> {
    pub id: &'a str,
    pub funcionario_id: &'a str,
    pub referencia: &'a str,
    pub salario_base: i64,
    pub subsidios: i64,
    pub descontos: i64,
    pub desconto_faltas: i64,
    pub inss: i64,
    pub valor_liquido: i64,
}

/// Skips employees that already have a payslip for the referência.
pub fn insert_folha(instituicao_id: &str, f: &NewFolha<'_>) -> Built {
    Query::insert()
        .into_table(FolhasPagamento::Table)
        .columns([
            FolhasPagamento::Id,
            FolhasPagamento::InstituicaoId,
            FolhasPagamento::FuncionarioId,
            FolhasPagamento::Referencia,
            FolhasPagamento::SalarioBase,
            FolhasPagamento::Subsidios,
            FolhasPagamento::Descontos,
            FolhasPagamento::DescontoFaltas,
            FolhasPagamento::Inss,
            FolhasPagamento::ValorLiquido,
        ])
        .values_panic([
            f.id.into(),
            instituicao_id.into(),
            f.funcionario_id.into(),
            f.referencia.into(),
            f.salario_base.into(),
            f.subsidios.into(),
            f.descontos.into(),
            f.desconto_faltas.into(),
            f.inss.into(),
            f.valor_liquido.into(),
        ])
        .on_conflict(
            OnConflict::columns([FolhasPagamento::FuncionarioId, FolhasPagamento::Referencia])
                .do_nothing()
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

/// Column order: id, funcionario_id, funcionario nome, referencia,
/// salario_base, subsidios, descontos, desconto_faltas, inss, valor_liquido,
/// status, pago_em.
fn select_folhas(instituicao_id: &str) -> sea_query::SelectStatement {
    Query::select()
        .column((FolhasPagamento::Table, FolhasPagamento::Id))
        .column((FolhasPagamento::Table, FolhasPagamento::FuncionarioId))
        .column((Funcionarios::Table, Funcionarios::Nome))
        .column((FolhasPagamento::Table, FolhasPagamento::Referencia))
        .column((FolhasPagamento::Table, FolhasPagamento::SalarioBase))
        .column((FolhasPagamento::Table, FolhasPagamento::Subsidios))
        .column((FolhasPagamento::Table, FolhasPagamento::Descontos))
        .column((FolhasPagamento::Table, FolhasPagamento::DescontoFaltas))
        .column((FolhasPagamento::Table, FolhasPagamento::Inss))
        .column((FolhasPagamento::Table, FolhasPagamento::ValorLiquido))
        .column((FolhasPagamento::Table, FolhasPagamento::Status))
        .column((FolhasPagamento::Table, FolhasPagamento::PagoEm))
        .from(FolhasPagamento::Table)
        .inner_join(
            Funcionarios::Table,
            Expr::col((Funcionarios::Table, Funcionarios::Id))
                .equals((FolhasPagamento::Table, FolhasPagamento::FuncionarioId)),
        )
        .and_where(
            Expr::col((FolhasPagamento::Table, FolhasPagamento::InstituicaoId)).eq(instituicao_id),
        )
        .to_owned()
}

pub fn get_folha(instituicao_id: &str, id: &str) -> Built {
    select_folhas(instituicao_id)
        .and_where(Expr::col((FolhasPagamento::Table, FolhasPagamento::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn list_folhas(instituicao_id: &str, referencia: Option<&str>) -> Built {
    let mut q = select_folhas(instituicao_id);
    if let Some(r) = referencia {
        q.and_where(Expr::col((FolhasPagamento::Table, FolhasPagamento::Referencia)).eq(r));
    }
    q.order_by((FolhasPagamento::Table, FolhasPagamento::Referencia), Order::Desc)
        .order_by((Funcionarios::Table, Funcionarios::Nome), Order::Asc)
        .build(SqliteQueryBuilder)
}

pub fn pagar_folha(instituicao_id: &str, id: &str, pago_em: &str) -> Built {
    Query::update()
        .table(FolhasPagamento::Table)
        .value(FolhasPagamento::Status, "PAGA")
        .value(FolhasPagamento::PagoEm, pago_em)
        .and_where(Expr::col(FolhasPagamento::Id).eq(id))
        .and_where(Expr::col(FolhasPagamento::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}
