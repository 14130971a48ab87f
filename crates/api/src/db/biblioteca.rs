//! Library items and loans.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{BibliotecaItens, Emprestimos};

// ── Itens ──────────────────────────────────────────────────────────────────

pub struct NewItem<'a> {
    pub id: &'a str,
    pub titulo: &'a str,
    pub autor: &'a str,
    pub isbn: Option<&'a str>,
    pub categoria: Option<&'a str>,
    pub quantidade_total: i64,
}

pub fn insert_item(instituicao_id: &str, i: &NewItem<'_>) -> Built {
    Query::insert()
        .into_table(BibliotecaItens::Table)
        .columns([
            BibliotecaItens::Id,
            BibliotecaItens::InstituicaoId,
            BibliotecaItens::Titulo,
            BibliotecaItens::Autor,
            BibliotecaItens::Isbn,
            BibliotecaItens::Categoria,
            BibliotecaItens::QuantidadeTotal,
        ])
        .values_panic([
            i.id.into(),
            instituicao_id.into(),
            i.titulo.into(),
            i.autor.into(),
            i.isbn.map(|s| s.to_string()).into(),
            i.categoria.map(|s| s.to_string()).into(),
            i.quantidade_total.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Column order: id, titulo, autor, isbn, categoria, quantidade_total,
/// emprestados (active loans).
fn select_itens(instituicao_id: &str) -> sea_query::SelectStatement {
    Query::select()
        .column((BibliotecaItens::Table, BibliotecaItens::Id))
        .column((BibliotecaItens::Table, BibliotecaItens::Titulo))
        .column((BibliotecaItens::Table, BibliotecaItens::Autor))
        .column((BibliotecaItens::Table, BibliotecaItens::Isbn))
        .column((BibliotecaItens::Table, BibliotecaItens::Categoria))
        .column((BibliotecaItens::Table, BibliotecaItens::QuantidadeTotal))
        .expr_as(
            Func::count(Expr::col((Emprestimos::Table, Emprestimos::Id))),
            Alias::new("emprestados"),
        )
        .from(BibliotecaItens::Table)
        .left_join(
            Emprestimos::Table,
            Expr::col((Emprestimos::Table, Emprestimos::ItemId))
                .equals((BibliotecaItens::Table, BibliotecaItens::Id))
                .and(Expr::col((Emprestimos::Table, Emprestimos::Status)).eq("ATIVO")),
        )
        .and_where(
            Expr::col((BibliotecaItens::Table, BibliotecaItens::InstituicaoId)).eq(instituicao_id),
        )
        .group_by_col((BibliotecaItens::Table, BibliotecaItens::Id))
        .to_owned()
}

pub fn get_item(instituicao_id: &str, id: &str) -> Built {
    select_itens(instituicao_id)
        .and_where(Expr::col((BibliotecaItens::Table, BibliotecaItens::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn list_itens(instituicao_id: &str) -> Built {
    select_itens(instituicao_id)
        .order_by((BibliotecaItens::Table, BibliotecaItens::Titulo), Order::Asc)
        .build(SqliteQueryBuilder)
}

// ── Empréstimos ────────────────────────────────────────────────────────────

pub fn insert_emprestimo(
    instituicao_id: &str,
    id: &str,
    item_id: &str,
    usuario_id: &str,
    data_emprestimo: &str,
    data_prevista_devolucao: &str,
) -> Built {
    Query::insert()
        .into_table(Emprestimos::Table)
        .columns([
            Emprestimos::Id,
            Emprestimos::InstituicaoId,
            Emprestimos::ItemId,
            Emprestimos::UsuarioId,
            Emprestimos::DataEmprestimo,
            Emprestimos::DataPrevistaDevolucao,
        ])
        .values_panic([
            id.into(),
            instituicao_id.into(),
            item_id.into(),
            usuario_id.into(),
            data_emprestimo.into(),
            data_prevista_devolucao.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Column order: id, item_id, item titulo, usuario_id, data_emprestimo,
/// data_prevista_devolucao, data_devolucao, status.
fn select_emprestimos(instituicao_id: &str) -> sea_query::SelectStatement {
    Query::select()
        .column((Emprestimos::Table, Emprestimos::Id))
        .column((Emprestimos::Table, Emprestimos::ItemId))
        .column((BibliotecaItens::Table, BibliotecaItens::Titulo))
        .column((Emprestimos::Table, Emprestimos::UsuarioId))
        .column((Emprestimos::Table, Emprestimos::DataEmprestimo))
        .column((Emprestimos::Table, Emprestimos::DataPrevistaDevolucao))
        .column((Emprestimos::Table, Emprestimos::DataDevolucao))
        .column((Emprestimos::Table, Emprestimos::Status))
        .from(Emprestimos::Table)
        .inner_join(
            BibliotecaItens::Table,
            Expr::col((BibliotecaItens::Table, BibliotecaItens::Id))
                .equals((Emprestimos::Table, Emprestimos::ItemId)),
        )
        .and_where(Expr::col((Emprestimos::Table, Emprestimos::InstituicaoId)).eq(instituicao_id))
        .to_owned()
}

pub fn get_emprestimo(instituicao_id: &str, id: &str) -> Built {
    select_emprestimos(instituicao_id)
        .and_where(Expr::col((Emprestimos::Table, Emprestimos::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn list_emprestimos(
    instituicao_id: &str,
    usuario_id: Option<&str>,
    status: Option<&str>,
) -> Built {
    let mut q = select_emprestimos(instituicao_id);
    if let Some(u) = usuario_id {
        q.and_where(Expr::col((Emprestimos::Table, Emprestimos::UsuarioId)).eq(u));
    }
    if let Some(s) = status {
        q.and_where(Expr::col((Emprestimos::Table, Emprestimos::Status)).eq(s));
    }
    q.order_by((Emprestimos::Table, Emprestimos::DataEmprestimo), Order::Desc)
        .build(SqliteQueryBuilder)
}

/// Active loans of a borrower (returns count).
pub fn count_ativos(instituicao_id: &str, usuario_id: &str) -> Built {
    Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Emprestimos::Table)
        .and_where(Expr::col(Emprestimos::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(Emprestimos::UsuarioId).eq(usuario_id))
        .and_where(Expr::col(Emprestimos::Status).eq("ATIVO"))
        .build(SqliteQueryBuilder)
}

/// Active loans of a borrower already past due on `hoje` (returns count).
pub fn count_atrasados(instituicao_id: &str, usuario_id: &str, hoje: &str) -> Built {
    Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Emprestimos::Table)
        .and_where(Expr::col(Emprestimos::InstituicaoId).eq(instituicao_id))
        .and_where(Expr::col(Emprestimos::UsuarioId).eq(usuario_id))
        .and_where(Expr::col(Emprestimos::Status).eq("ATIVO"))
        .and_where(Expr::col(Emprestimos::DataPrevistaDevolucao).lt(hoje))
        .build(SqliteQueryBuilder)
}

pub fn devolver(instituicao_id: &str, id: &str, data_devolucao: &str) -> Built {
    Query::update()
        .table(Emprestimos::Table)
        .value(Emprestimos::Status, "DEVOLVIDO")
        .value(Emprestimos::DataDevolucao, data_devolucao)
        .and_where(Expr::col(Emprestimos::Id).eq(id))
        .and_where(Expr::col(Emprestimos::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}
