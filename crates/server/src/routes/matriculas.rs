//! Annual enrollment (matrícula anual) and class enrollment (matrícula em
//! turma).
//!
//! A class enrollment always hangs off an `ATIVA` matrícula anual of the
//! same ano letivo; cancelling the annual one cancels its class enrollments.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;

use dsicola_api::db;
use dsicola_api::{
    Capability, CreateMatriculaAnualRequest, CreateMatriculaRequest, ListResponse,
    MatriculaAnualQuery, MatriculaAnualResponse, MatriculaAnualStatus, MatriculaQuery,
    MatriculaResponse, Role, service,
};
use dsicola_core::enrollment::{check_cancelamento, check_matricula_anual, check_matricula_turma};

use super::auth::AuthUser;
use super::estrutura::check_estrutura;
use super::turmas::load_turma;
use super::{ensure_role, load_ano, new_id, tipo_academico};
use crate::error::ApiErr;
use crate::rows;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt, sq_query_row};

fn load_anual(
    conn: &Connection,
    inst: &str,
    id: &str,
) -> Result<MatriculaAnualResponse, ApiErr> {
    sq_query_opt(conn, db::matriculas::get_anual(inst, id), rows::matricula_anual)
        .map_err(ApiErr::from_db("load matricula anual"))?
        .ok_or_else(|| ApiErr::not_found("matricula anual not found"))
}

// ---------------------------------------------------------------------------
// Matrícula anual
// ---------------------------------------------------------------------------

pub async fn create_matricula_anual(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateMatriculaAnualRequest>,
) -> Result<(StatusCode, Json<MatriculaAnualResponse>), ApiErr> {
    user.require(Capability::ManageEnrollment)?;
    let inst = user.tenant()?;
    let classe_id = service::optional_text(req.classe_id.as_deref());
    let curso_id = service::optional_text(req.curso_id.as_deref());

    let conn = db.conn();
    ensure_role(&conn, inst, &req.aluno_id, Role::Aluno)?;
    let ano = load_ano(&conn, inst, &req.ano_letivo_id)?;
    check_matricula_anual(ano.status)?;
    tipo_academico(&conn, inst)?.check_vinculo(classe_id.is_some(), curso_id.is_some())?;
    check_estrutura(&conn, inst, classe_id.as_deref(), curso_id.as_deref())?;

    let id = new_id();
    sq_execute(
        &conn,
        db::matriculas::insert_anual(
            inst,
            &db::matriculas::NewMatriculaAnual {
                id: &id,
                aluno_id: &req.aluno_id,
                ano_letivo_id: &ano.id,
                classe_id: classe_id.as_deref(),
                curso_id: curso_id.as_deref(),
            },
        ),
    )
    .map_err(ApiErr::from_write(
        "insert matricula anual",
        "student already has a matricula anual for this ano letivo",
    ))?;

    tracing::info!(
        instituicao_id = %inst,
        aluno_id = %req.aluno_id,
        ano = ano.ano,
        "matricula anual created"
    );
    Ok((StatusCode::CREATED, Json(load_anual(&conn, inst, &id)?)))
}

/// A student only ever sees their own enrollments.
pub async fn list_matriculas_anuais(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<MatriculaAnualQuery>,
) -> Result<Json<ListResponse<MatriculaAnualResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let aluno_id = if user.is(Role::Aluno) {
        Some(user.user_id.as_str())
    } else {
        q.aluno_id.as_deref()
    };
    let conn = db.conn();
    let items = sq_query_map(
        &conn,
        db::matriculas::list_anuais(
            inst,
            q.ano_letivo_id.as_deref(),
            aluno_id,
            q.status.as_ref().map(MatriculaAnualStatus::as_str),
        ),
        rows::matricula_anual,
    )
    .map_err(ApiErr::from_db("list matriculas anuais"))?;
    Ok(Json(items.into()))
}

pub async fn cancelar_matricula_anual(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MatriculaAnualResponse>, ApiErr> {
    user.require(Capability::ManageEnrollment)?;
    let inst = user.tenant()?;

    let mut conn = db.conn();
    let anual = load_anual(&conn, inst, &id)?;
    check_cancelamento(anual.status)?;

    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin transaction"))?;
    sq_execute(
        &tx,
        db::matriculas::set_anual_status(inst, &id, MatriculaAnualStatus::Cancelada.as_str()),
    )
    .map_err(ApiErr::from_db("cancel matricula anual"))?;
    let turmas = sq_execute(&tx, db::matriculas::cancel_for_anual(inst, &id))
        .map_err(ApiErr::from_db("cancel class enrollments"))?;
    tx.commit().map_err(ApiErr::from_db("commit cancellation"))?;

    tracing::info!(
        matricula_anual_id = %id,
        turmas_canceladas = turmas,
        "matricula anual cancelled"
    );
    Ok(Json(load_anual(&conn, inst, &id)?))
}

// ---------------------------------------------------------------------------
// Matrícula em turma
// ---------------------------------------------------------------------------

pub async fn create_matricula(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateMatriculaRequest>,
) -> Result<(StatusCode, Json<MatriculaResponse>), ApiErr> {
    user.require(Capability::ManageEnrollment)?;
    let inst = user.tenant()?;

    let conn = db.conn();
    ensure_role(&conn, inst, &req.aluno_id, Role::Aluno)?;
    let turma = load_turma(&conn, inst, &req.turma_id)?;

    let anual = sq_query_opt(
        &conn,
        db::matriculas::find_anual(inst, &req.aluno_id, &turma.ano_letivo_id),
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                rows::enum_col::<MatriculaAnualStatus>(row, 1)?,
            ))
        },
    )
    .map_err(ApiErr::from_db("find matricula anual"))?;
    let ocupadas: i64 = sq_query_row(&conn, db::matriculas::count_ativas(inst, &turma.id), |row| {
        row.get(0)
    })
    .map_err(ApiErr::from_db("count seats"))?;
    check_matricula_turma(anual.as_ref().map(|(_, s)| *s), turma.capacidade, ocupadas)?;
    let Some((anual_id, _)) = anual else {
        return Err(ApiErr::conflict("student has no matricula anual"));
    };

    let id = new_id();
    sq_execute(
        &conn,
        db::matriculas::insert(inst, &id, &req.aluno_id, &turma.id, &anual_id),
    )
    .map_err(ApiErr::from_write(
        "insert matricula",
        "student is already enrolled in this turma",
    ))?;

    tracing::info!(aluno_id = %req.aluno_id, turma_id = %turma.id, "matricula created");
    let created = sq_query_opt(&conn, db::matriculas::get(inst, &id), rows::matricula)
        .map_err(ApiErr::from_db("load matricula"))?
        .ok_or_else(|| ApiErr::internal("matricula missing after insert"))?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_matriculas(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<MatriculaQuery>,
) -> Result<Json<ListResponse<MatriculaResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let aluno_id = if user.is(Role::Aluno) {
        Some(user.user_id.as_str())
    } else {
        q.aluno_id.as_deref()
    };
    let conn = db.conn();
    let items = sq_query_map(
        &conn,
        db::matriculas::list(inst, q.turma_id.as_deref(), aluno_id),
        rows::matricula,
    )
    .map_err(ApiErr::from_db("list matriculas"))?;
    Ok(Json(items.into()))
}
