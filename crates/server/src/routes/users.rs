use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use dsicola_api::db;
use dsicola_api::{
    Capability, CreateUserRequest, ListResponse, SetAtivoRequest, UserListQuery, UserResponse,
    crypto, service,
};

use super::auth::AuthUser;
use super::new_id;
use crate::error::ApiErr;
use crate::rows;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt, sq_query_row};
use crate::AppConfig;

fn load_user(conn: &rusqlite::Connection, inst: &str, id: &str) -> Result<UserResponse, ApiErr> {
    sq_query_opt(conn, db::users::get_in_tenant(inst, id), rows::user)
        .map_err(ApiErr::from_db("load user"))?
        .ok_or_else(|| ApiErr::not_found("user not found"))
}

/// Create an account inside the caller's institution. The account must
/// change its password at first login.
pub async fn create_user(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    user: AuthUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiErr> {
    user.require(Capability::ManageUsers)?;
    let inst = user.tenant()?;
    if !user.role.can_assign(req.role) {
        return Err(ApiErr::forbidden(format!(
            "{} cannot create {} accounts",
            user.role, req.role
        )));
    }

    let email = service::validate_email(&req.email)?;
    let nome = service::validate_text("nome", &req.nome, 200)?;
    service::validate_password(&req.password)?;
    let numero = service::optional_text(req.numero_identificacao.as_deref());
    let telefone = service::optional_text(req.telefone.as_deref());

    let conn = db.conn();
    let taken: bool = sq_query_row(&conn, db::users::email_exists(&email), |row| row.get(0))
        .map_err(ApiErr::from_db("check email"))?;
    if taken {
        return Err(ApiErr::conflict("email already registered"));
    }

    let password_hash = crypto::hash_password(&req.password, config.pbkdf2_iterations)?;
    let id = new_id();
    sq_execute(
        &conn,
        db::users::insert(&db::users::NewUser {
            id: &id,
            instituicao_id: Some(inst),
            email: &email,
            nome: &nome,
            role: req.role.as_str(),
            password_hash: &password_hash,
            numero_identificacao: numero.as_deref(),
            telefone: telefone.as_deref(),
            must_change_password: true,
        }),
    )
    .map_err(ApiErr::from_write("insert user", "email already registered"))?;

    tracing::info!(user_id = %id, role = %req.role, created_by = %user.user_id, "user created");
    Ok((StatusCode::CREATED, Json(load_user(&conn, inst, &id)?)))
}

pub async fn list_users(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<UserListQuery>,
) -> Result<Json<ListResponse<UserResponse>>, ApiErr> {
    user.require(Capability::ManageUsers)?;
    let inst = user.tenant()?;
    let conn = db.conn();
    let items = sq_query_map(
        &conn,
        db::users::list(inst, q.role.as_ref().map(|r| r.as_str())),
        rows::user,
    )
    .map_err(ApiErr::from_db("list users"))?;
    Ok(Json(items.into()))
}

/// Anyone may read their own account; reading others needs `ManageUsers`.
pub async fn get_user(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiErr> {
    let conn = db.conn();
    if id == user.user_id {
        return sq_query_opt(&conn, db::users::get_by_id(&id), rows::user)
            .map_err(ApiErr::from_db("load user"))?
            .map(Json)
            .ok_or_else(|| ApiErr::not_found("user not found"));
    }
    user.require(Capability::ManageUsers)?;
    Ok(Json(load_user(&conn, user.tenant()?, &id)?))
}

pub async fn set_user_ativo(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<SetAtivoRequest>,
) -> Result<Json<UserResponse>, ApiErr> {
    user.require(Capability::ManageUsers)?;
    let inst = user.tenant()?;
    if id == user.user_id {
        return Err(ApiErr::bad_request("cannot change your own active flag"));
    }

    let conn = db.conn();
    let target = load_user(&conn, inst, &id)?;
    if !user.role.can_assign(target.role) {
        return Err(ApiErr::forbidden(format!(
            "{} cannot manage {} accounts",
            user.role, target.role
        )));
    }

    sq_execute(&conn, db::users::set_ativo(inst, &id, req.ativo))
        .map_err(ApiErr::from_db("set user ativo"))?;
    if !req.ativo {
        sq_execute(&conn, db::users::delete_refresh_tokens_for_user(&id))
            .map_err(ApiErr::from_db("revoke refresh tokens"))?;
    }

    tracing::info!(user_id = %id, ativo = req.ativo, "user active flag changed");
    Ok(Json(load_user(&conn, inst, &id)?))
}
