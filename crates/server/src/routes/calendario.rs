use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use dsicola_api::db;
use dsicola_api::{
    AnoLetivoResponse, AnoLetivoStatus, Capability, CreateAnoLetivoRequest, ListResponse,
    PeriodoEstado, PeriodosResponse, service,
};
use dsicola_core::academic::validate_ano_letivo;

use super::auth::AuthUser;
use super::{ano_ativo, load_ano, load_calendario, new_id};
use crate::error::ApiErr;
use crate::rows;
use crate::storage::{Db, sq_execute, sq_query_map};

pub async fn create_ano_letivo(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateAnoLetivoRequest>,
) -> Result<(StatusCode, Json<AnoLetivoResponse>), ApiErr> {
    user.require(Capability::ManageAcademicStructure)?;
    let inst = user.tenant()?;

    let inicio = service::parse_date("data_inicio", &req.data_inicio)?;
    let fim = service::parse_date("data_fim", &req.data_fim)?;
    validate_ano_letivo(req.ano, inicio, fim)?;

    let conn = db.conn();
    let id = new_id();
    sq_execute(
        &conn,
        db::calendario::insert_ano(
            inst,
            &id,
            req.ano,
            &service::format_date(inicio),
            &service::format_date(fim),
        ),
    )
    .map_err(ApiErr::from_write(
        "insert ano letivo",
        "an ano letivo with this year already exists",
    ))?;

    tracing::info!(instituicao_id = %inst, ano = req.ano, "ano letivo created");
    Ok((StatusCode::CREATED, Json(load_ano(&conn, inst, &id)?)))
}

pub async fn list_anos_letivos(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ListResponse<AnoLetivoResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    let items = sq_query_map(&conn, db::calendario::list_anos(inst), rows::ano_letivo)
        .map_err(ApiErr::from_db("list anos letivos"))?;
    Ok(Json(items.into()))
}

/// `PLANEJADO -> ATIVO`. An institution runs one active year at a time.
pub async fn iniciar_ano_letivo(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<AnoLetivoResponse>, ApiErr> {
    user.require(Capability::ManageAcademicStructure)?;
    let inst = user.tenant()?;

    let conn = db.conn();
    let ano = load_ano(&conn, inst, &id)?;
    let next = ano.status.iniciar()?;
    if let Some(ativo) = ano_ativo(&conn, inst)? {
        return Err(ApiErr::conflict(format!(
            "ano letivo {} is already {}",
            ativo.ano,
            AnoLetivoStatus::Ativo
        )));
    }

    sq_execute(&conn, db::calendario::set_ano_status(inst, &id, next.as_str()))
        .map_err(ApiErr::from_db("start ano letivo"))?;

    tracing::info!(instituicao_id = %inst, ano = ano.ano, "ano letivo started");
    Ok(Json(load_ano(&conn, inst, &id)?))
}

/// Teaching periods of the year plus `ANO`, each with its closed flag.
pub async fn list_periodos(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PeriodosResponse>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    let ano = load_ano(&conn, inst, &id)?;
    let calendario = load_calendario(&conn, inst, &ano)?;

    Ok(Json(PeriodosResponse {
        ano_letivo_id: ano.id,
        tipo_academico: calendario.tipo(),
        status: calendario.status(),
        periodos: calendario
            .periodos()
            .into_iter()
            .map(|(periodo, encerrado)| PeriodoEstado { periodo, encerrado })
            .collect(),
    }))
}
