use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;

use dsicola_api::db;
use dsicola_api::{
    Capability, CreateEmprestimoRequest, CreateItemRequest, EmprestimoQuery, EmprestimoResponse,
    EmprestimoStatus, ItemResponse, ListResponse, service,
};
use dsicola_core::library::{check_devolucao, validate_quantidade_total};

use super::auth::AuthUser;
use super::{hoje, new_id, user_role};
use crate::AppConfig;
use crate::error::ApiErr;
use crate::rows;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt, sq_query_row};

fn load_item(conn: &Connection, inst: &str, id: &str) -> Result<ItemResponse, ApiErr> {
    sq_query_opt(conn, db::biblioteca::get_item(inst, id), rows::item)
        .map_err(ApiErr::from_db("load item"))?
        .ok_or_else(|| ApiErr::not_found("item not found"))
}

fn load_emprestimo(conn: &Connection, inst: &str, id: &str) -> Result<EmprestimoResponse, ApiErr> {
    let hoje = hoje();
    sq_query_opt(conn, db::biblioteca::get_emprestimo(inst, id), |row| {
        rows::emprestimo(row, hoje)
    })
    .map_err(ApiErr::from_db("load emprestimo"))?
    .ok_or_else(|| ApiErr::not_found("emprestimo not found"))
}

fn count(conn: &Connection, built: db::Built) -> Result<i64, ApiErr> {
    sq_query_row(conn, built, |row| row.get(0)).map_err(ApiErr::from_db("count emprestimos"))
}

pub async fn create_item(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiErr> {
    user.require(Capability::ManageLibrary)?;
    let inst = user.tenant()?;
    let titulo = service::validate_text("titulo", &req.titulo, 300)?;
    let autor = service::validate_text("autor", &req.autor, 200)?;
    let isbn = service::optional_text(req.isbn.as_deref());
    let categoria = service::optional_text(req.categoria.as_deref());
    let quantidade_total = validate_quantidade_total(req.quantidade_total)?;

    let conn = db.conn();
    let id = new_id();
    sq_execute(
        &conn,
        db::biblioteca::insert_item(
            inst,
            &db::biblioteca::NewItem {
                id: &id,
                titulo: &titulo,
                autor: &autor,
                isbn: isbn.as_deref(),
                categoria: categoria.as_deref(),
                quantidade_total,
            },
        ),
    )
    .map_err(ApiErr::from_db("insert item"))?;

    Ok((StatusCode::CREATED, Json(load_item(&conn, inst, &id)?)))
}

/// Every authenticated member of the institution can browse the catalogue.
pub async fn list_itens(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ListResponse<ItemResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    let items = sq_query_map(&conn, db::biblioteca::list_itens(inst), rows::item)
        .map_err(ApiErr::from_db("list itens"))?;
    Ok(Json(items.into()))
}

/// Lend one copy. The borrower must have no overdue loan and stay under the
/// active-loan limit.
pub async fn create_emprestimo(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    user: AuthUser,
    Json(req): Json<CreateEmprestimoRequest>,
) -> Result<(StatusCode, Json<EmprestimoResponse>), ApiErr> {
    user.require(Capability::ManageLibrary)?;
    let inst = user.tenant()?;
    let politica = config.politica_emprestimo;

    let conn = db.conn();
    user_role(&conn, inst, &req.usuario_id)?;
    let item = load_item(&conn, inst, &req.item_id)?;
    let hoje = hoje();
    let hoje_str = service::format_date(hoje);
    let ativos = count(&conn, db::biblioteca::count_ativos(inst, &req.usuario_id))?;
    let atrasados = count(
        &conn,
        db::biblioteca::count_atrasados(inst, &req.usuario_id, &hoje_str),
    )?;
    politica.check_emprestimo(item.disponiveis, ativos, atrasados)?;

    let id = new_id();
    sq_execute(
        &conn,
        db::biblioteca::insert_emprestimo(
            inst,
            &id,
            &item.id,
            &req.usuario_id,
            &hoje_str,
            &service::format_date(politica.data_prevista(hoje)),
        ),
    )
    .map_err(ApiErr::from_db("insert emprestimo"))?;

    tracing::info!(
        item_id = %item.id,
        usuario_id = %req.usuario_id,
        emprestimo_id = %id,
        "item lent"
    );
    Ok((StatusCode::CREATED, Json(load_emprestimo(&conn, inst, &id)?)))
}

/// Borrowers without the library capability see only their own loans.
pub async fn list_emprestimos(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<EmprestimoQuery>,
) -> Result<Json<ListResponse<EmprestimoResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let usuario_id = if user.role.allows(Capability::ManageLibrary) {
        q.usuario_id.as_deref()
    } else {
        Some(user.user_id.as_str())
    };

    let conn = db.conn();
    let hoje = hoje();
    let mut items = sq_query_map(
        &conn,
        db::biblioteca::list_emprestimos(
            inst,
            usuario_id,
            q.status.as_ref().map(EmprestimoStatus::as_str),
        ),
        |row| rows::emprestimo(row, hoje),
    )
    .map_err(ApiErr::from_db("list emprestimos"))?;
    if q.atrasado {
        items.retain(|e| e.atrasado);
    }
    Ok(Json(items.into()))
}

pub async fn devolver_emprestimo(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<EmprestimoResponse>, ApiErr> {
    user.require(Capability::ManageLibrary)?;
    let inst = user.tenant()?;

    let conn = db.conn();
    let emprestimo = load_emprestimo(&conn, inst, &id)?;
    check_devolucao(emprestimo.status)?;
    sq_execute(
        &conn,
        db::biblioteca::devolver(inst, &id, &service::format_date(hoje())),
    )
    .map_err(ApiErr::from_db("return emprestimo"))?;

    if emprestimo.atrasado {
        tracing::warn!(
            emprestimo_id = %id,
            prevista = %emprestimo.data_prevista_devolucao,
            "item returned late"
        );
    } else {
        tracing::info!(emprestimo_id = %id, "item returned");
    }
    Ok(Json(load_emprestimo(&conn, inst, &id)?))
}
