//! Closing and reopening academic periods.
//!
//! Closing `ANO` closes the year itself: its status becomes `ENCERRADO` and
//! every active matrícula anual is concluded. Reopening `ANO` undoes both.

use axum::{
    Json,
    extract::{Query, State},
};
use rusqlite::Connection;

use dsicola_api::db;
use dsicola_api::{
    AnoLetivoStatus, Capability, EncerramentoQuery, EncerramentoResponse, EncerrarRequest,
    ListResponse, ReabrirRequest,
};

use super::auth::AuthUser;
use super::{ano_ativo, load_ano, load_calendario, new_id, now_string};
use crate::error::ApiErr;
use crate::rows;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt, sq_query_row};

fn find_encerramento(
    conn: &Connection,
    inst: &str,
    ano_letivo_id: &str,
    periodo: &str,
) -> Result<Option<EncerramentoResponse>, ApiErr> {
    sq_query_opt(
        conn,
        db::calendario::get_encerramento(inst, ano_letivo_id, periodo),
        rows::encerramento,
    )
    .map_err(ApiErr::from_db("load encerramento"))
}

pub async fn list_encerramentos(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<EncerramentoQuery>,
) -> Result<Json<ListResponse<EncerramentoResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    load_ano(&conn, inst, &q.ano_letivo_id)?;
    let items = sq_query_map(
        &conn,
        db::calendario::list_encerramentos(inst, &q.ano_letivo_id),
        rows::encerramento,
    )
    .map_err(ApiErr::from_db("list encerramentos"))?;
    Ok(Json(items.into()))
}

pub async fn encerrar(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<EncerrarRequest>,
) -> Result<Json<EncerramentoResponse>, ApiErr> {
    user.require(Capability::CloseAcademicPeriod)?;
    let inst = user.tenant()?;

    let mut conn = db.conn();
    let ano = load_ano(&conn, inst, &req.ano_letivo_id)?;
    let calendario = load_calendario(&conn, inst, &ano)?;
    let pendentes: i64 = sq_query_row(&conn, db::planos::count_pendentes(inst, &ano.id), |row| {
        row.get(0)
    })
    .map_err(ApiErr::from_db("count pending planos"))?;
    calendario.check_encerrar(req.periodo, usize::try_from(pendentes).unwrap_or_default())?;

    let periodo = req.periodo.as_str();
    let existente = find_encerramento(&conn, inst, &ano.id, periodo)?;
    let now = now_string()?;
    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin transaction"))?;
    match &existente {
        Some(e) => sq_execute(&tx, db::calendario::reencerrar(inst, &e.id, &user.user_id, &now)),
        None => sq_execute(
            &tx,
            db::calendario::insert_encerramento(
                inst,
                &new_id(),
                &ano.id,
                periodo,
                &user.user_id,
                &now,
            ),
        ),
    }
    .map_err(ApiErr::from_write("close period", "period is already being closed"))?;
    if req.periodo.is_ano() {
        sq_execute(
            &tx,
            db::calendario::set_ano_status(inst, &ano.id, AnoLetivoStatus::Encerrado.as_str()),
        )
        .map_err(ApiErr::from_db("close ano letivo"))?;
        let concluidas = sq_execute(&tx, db::matriculas::concluir_anuais(inst, &ano.id))
            .map_err(ApiErr::from_db("conclude matriculas anuais"))?;
        tracing::info!(ano_letivo_id = %ano.id, concluidas, "matriculas anuais concluded");
    }
    tx.commit().map_err(ApiErr::from_db("commit encerramento"))?;

    tracing::info!(
        instituicao_id = %inst,
        ano_letivo_id = %ano.id,
        periodo,
        encerrado_por = %user.user_id,
        "period closed"
    );
    find_encerramento(&conn, inst, &ano.id, periodo)?
        .ok_or_else(|| ApiErr::internal("encerramento missing after close"))
        .map(Json)
}

/// Reopen a closed period. Only the latest closed period can be reopened,
/// and a justification is kept on the record.
pub async fn reabrir(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<ReabrirRequest>,
) -> Result<Json<EncerramentoResponse>, ApiErr> {
    user.require(Capability::ReopenAcademicPeriod)?;
    let inst = user.tenant()?;

    let mut conn = db.conn();
    let ano = load_ano(&conn, inst, &req.ano_letivo_id)?;
    load_calendario(&conn, inst, &ano)?.check_reabrir(req.periodo, &req.justificativa)?;
    if req.periodo.is_ano() {
        if let Some(ativo) = ano_ativo(&conn, inst)?.filter(|a| a.id != ano.id) {
            return Err(ApiErr::conflict(format!(
                "ano letivo {} is already {}; close it before reopening {}",
                ativo.ano,
                AnoLetivoStatus::Ativo,
                ano.ano
            )));
        }
    }

    let periodo = req.periodo.as_str();
    let encerramento = find_encerramento(&conn, inst, &ano.id, periodo)?
        .ok_or_else(|| ApiErr::not_found("encerramento not found"))?;
    let justificativa = req.justificativa.trim();
    let now = now_string()?;
    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin transaction"))?;
    sq_execute(
        &tx,
        db::calendario::reabrir(inst, &encerramento.id, justificativa, &user.user_id, &now),
    )
    .map_err(ApiErr::from_db("reopen period"))?;
    if req.periodo.is_ano() {
        sq_execute(
            &tx,
            db::calendario::set_ano_status(inst, &ano.id, AnoLetivoStatus::Ativo.as_str()),
        )
        .map_err(ApiErr::from_db("reopen ano letivo"))?;
        sq_execute(&tx, db::matriculas::reativar_anuais(inst, &ano.id))
            .map_err(ApiErr::from_db("reactivate matriculas anuais"))?;
    }
    tx.commit().map_err(ApiErr::from_db("commit reabertura"))?;

    tracing::warn!(
        instituicao_id = %inst,
        ano_letivo_id = %ano.id,
        periodo,
        reaberto_por = %user.user_id,
        justificativa,
        "period reopened"
    );
    find_encerramento(&conn, inst, &ano.id, periodo)?
        .ok_or_else(|| ApiErr::internal("encerramento missing after reopen"))
        .map(Json)
}
