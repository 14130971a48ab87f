use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;

use dsicola_api::db;
use dsicola_api::{
    AlunoTurmaResponse, AnoLetivoStatus, Capability, CreateTurmaRequest, ListResponse,
    TurmaListQuery, TurmaResponse, service,
};
use dsicola_core::enrollment::validate_capacidade;

use super::auth::AuthUser;
use super::estrutura::check_estrutura;
use super::{load_ano, new_id, tipo_academico};
use crate::error::ApiErr;
use crate::rows;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt};

pub(crate) fn load_turma(conn: &Connection, inst: &str, id: &str) -> Result<TurmaResponse, ApiErr> {
    sq_query_opt(conn, db::turmas::get(inst, id), rows::turma)
        .map_err(ApiErr::from_db("load turma"))?
        .ok_or_else(|| ApiErr::not_found("turma not found"))
}

pub async fn create_turma(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateTurmaRequest>,
) -> Result<(StatusCode, Json<TurmaResponse>), ApiErr> {
    user.require(Capability::ManageAcademicStructure)?;
    let inst = user.tenant()?;
    let nome = service::validate_text("nome", &req.nome, 64)?;
    validate_capacidade(req.capacidade)?;
    let classe_id = service::optional_text(req.classe_id.as_deref());
    let curso_id = service::optional_text(req.curso_id.as_deref());

    let conn = db.conn();
    let ano = load_ano(&conn, inst, &req.ano_letivo_id)?;
    if ano.status == AnoLetivoStatus::Encerrado {
        return Err(ApiErr::conflict(format!(
            "ano letivo {} is {}",
            ano.ano, ano.status
        )));
    }
    tipo_academico(&conn, inst)?.check_vinculo(classe_id.is_some(), curso_id.is_some())?;
    check_estrutura(&conn, inst, classe_id.as_deref(), curso_id.as_deref())?;

    let id = new_id();
    sq_execute(
        &conn,
        db::turmas::insert(
            inst,
            &db::turmas::NewTurma {
                id: &id,
                ano_letivo_id: &ano.id,
                nome: &nome,
                classe_id: classe_id.as_deref(),
                curso_id: curso_id.as_deref(),
                turno: req.turno.as_str(),
                capacidade: req.capacidade,
            },
        ),
    )
    .map_err(ApiErr::from_write(
        "insert turma",
        "a turma with this name already exists in the ano letivo",
    ))?;

    tracing::info!(instituicao_id = %inst, turma_id = %id, "turma created");
    Ok((StatusCode::CREATED, Json(load_turma(&conn, inst, &id)?)))
}

pub async fn list_turmas(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<TurmaListQuery>,
) -> Result<Json<ListResponse<TurmaResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    let items = sq_query_map(
        &conn,
        db::turmas::list(inst, q.ano_letivo_id.as_deref()),
        rows::turma,
    )
    .map_err(ApiErr::from_db("list turmas"))?;
    Ok(Json(items.into()))
}

pub async fn get_turma(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<TurmaResponse>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    Ok(Json(load_turma(&conn, inst, &id)?))
}

/// Students actively enrolled in the turma.
pub async fn list_alunos_turma(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ListResponse<AlunoTurmaResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    load_turma(&conn, inst, &id)?;
    let items = sq_query_map(&conn, db::turmas::list_alunos(inst, &id), rows::aluno_turma)
        .map_err(ApiErr::from_db("list alunos da turma"))?;
    Ok(Json(items.into()))
}
