use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use dsicola_api::db;
use dsicola_api::{
    Capability, CreateInstituicaoRequest, CreateInstituicaoResponse, InstituicaoResponse,
    ListResponse, Role, SetAtivoRequest, crypto, service,
};

use super::auth::AuthUser;
use super::new_id;
use crate::error::ApiErr;
use crate::rows;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt, sq_query_row};
use crate::AppConfig;

fn load_instituicao(conn: &rusqlite::Connection, id: &str) -> Result<InstituicaoResponse, ApiErr> {
    sq_query_opt(conn, db::instituicoes::get_by_id(id), rows::instituicao)
        .map_err(ApiErr::from_db("load institution"))?
        .ok_or_else(|| ApiErr::not_found("institution not found"))
}

/// Register a school together with its first administrator.
pub async fn create_instituicao(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    user: AuthUser,
    Json(req): Json<CreateInstituicaoRequest>,
) -> Result<(StatusCode, Json<CreateInstituicaoResponse>), ApiErr> {
    user.require(Capability::ManageInstitutions)?;

    let nome = service::validate_text("nome", &req.nome, 200)?;
    let sigla = service::validate_sigla(&req.sigla)?;
    let email = req
        .email
        .as_deref()
        .map(service::validate_email)
        .transpose()?;
    let telefone = service::optional_text(req.telefone.as_deref());
    let endereco = service::optional_text(req.endereco.as_deref());

    let admin_email = service::validate_email(&req.admin.email)?;
    let admin_nome = service::validate_text("admin.nome", &req.admin.nome, 200)?;
    service::validate_password(&req.admin.password)?;
    let password_hash = crypto::hash_password(&req.admin.password, config.pbkdf2_iterations)?;

    let mut conn = db.conn();
    let sigla_taken = sq_query_opt(&conn, db::instituicoes::find_by_sigla(&sigla), |row| {
        row.get::<_, String>(0)
    })
    .map_err(ApiErr::from_db("check sigla"))?;
    if sigla_taken.is_some() {
        return Err(ApiErr::conflict(format!("sigla {sigla} is already in use")));
    }
    let email_taken: bool = sq_query_row(&conn, db::users::email_exists(&admin_email), |row| {
        row.get(0)
    })
    .map_err(ApiErr::from_db("check email"))?;
    if email_taken {
        return Err(ApiErr::conflict("admin email already registered"));
    }

    let inst_id = new_id();
    let admin_id = new_id();
    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin transaction"))?;
    sq_execute(
        &tx,
        db::instituicoes::insert(&db::instituicoes::NewInstituicao {
            id: &inst_id,
            nome: &nome,
            sigla: &sigla,
            tipo_academico: req.tipo_academico.as_str(),
            email: email.as_deref(),
            telefone: telefone.as_deref(),
            endereco: endereco.as_deref(),
        }),
    )
    .map_err(ApiErr::from_write("insert institution", "sigla is already in use"))?;
    sq_execute(
        &tx,
        db::users::insert(&db::users::NewUser {
            id: &admin_id,
            instituicao_id: Some(&inst_id),
            email: &admin_email,
            nome: &admin_nome,
            role: Role::Admin.as_str(),
            password_hash: &password_hash,
            numero_identificacao: None,
            telefone: None,
            must_change_password: true,
        }),
    )
    .map_err(ApiErr::from_write("insert admin", "admin email already registered"))?;
    tx.commit().map_err(ApiErr::from_db("commit institution"))?;

    let instituicao = load_instituicao(&conn, &inst_id)?;
    let admin = sq_query_opt(&conn, db::users::get_by_id(&admin_id), rows::user)
        .map_err(ApiErr::from_db("load admin"))?
        .ok_or_else(|| ApiErr::internal("admin missing after insert"))?;

    tracing::info!(instituicao_id = %inst_id, sigla = %sigla, "institution created");
    Ok((
        StatusCode::CREATED,
        Json(CreateInstituicaoResponse { instituicao, admin }),
    ))
}

pub async fn list_instituicoes(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ListResponse<InstituicaoResponse>>, ApiErr> {
    user.require(Capability::ManageInstitutions)?;
    let conn = db.conn();
    let items = sq_query_map(&conn, db::instituicoes::list(), rows::instituicao)
        .map_err(ApiErr::from_db("list institutions"))?;
    Ok(Json(items.into()))
}

/// The caller's own institution.
pub async fn instituicao_atual(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<InstituicaoResponse>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    Ok(Json(load_instituicao(&conn, inst)?))
}

pub async fn set_instituicao_ativo(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<SetAtivoRequest>,
) -> Result<Json<InstituicaoResponse>, ApiErr> {
    user.require(Capability::ManageInstitutions)?;
    let conn = db.conn();
    let affected = sq_execute(&conn, db::instituicoes::set_ativo(&id, req.ativo))
        .map_err(ApiErr::from_db("set institution ativo"))?;
    if affected == 0 {
        return Err(ApiErr::not_found("institution not found"));
    }
    tracing::info!(instituicao_id = %id, ativo = req.ativo, "institution active flag changed");
    Ok(Json(load_instituicao(&conn, &id)?))
}
