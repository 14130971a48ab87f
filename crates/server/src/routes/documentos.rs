use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Datelike;

use dsicola_api::db;
use dsicola_api::{
    Capability, DocumentoQuery, DocumentoResponse, EmitirDocumentoRequest, ListResponse, Role,
    TipoDocumento,
};
use dsicola_core::documents::numero_documento;

use super::auth::AuthUser;
use super::{ensure_role, hoje, new_id};
use crate::error::ApiErr;
use crate::rows;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt, sq_query_row};

/// Issue an official document. Numbers are sequential per institution, type
/// and calendar year; the sequence is read and written in one transaction.
pub async fn emitir_documento(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<EmitirDocumentoRequest>,
) -> Result<(StatusCode, Json<DocumentoResponse>), ApiErr> {
    user.require(Capability::IssueDocuments)?;
    let inst = user.tenant()?;

    let mut conn = db.conn();
    ensure_role(&conn, inst, &req.aluno_id, Role::Aluno)?;
    if req.tipo == TipoDocumento::DeclaracaoMatricula {
        let ativa: bool = sq_query_row(
            &conn,
            db::matriculas::has_anual_ativa(inst, &req.aluno_id),
            |row| row.get(0),
        )
        .map_err(ApiErr::from_db("check matricula anual"))?;
        if !ativa {
            return Err(ApiErr::conflict("student has no active matricula anual"));
        }
    }

    let ano = hoje().year();
    let id = new_id();
    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin transaction"))?;
    let ultima: Option<i64> = sq_query_row(
        &tx,
        db::documentos::max_sequencia(inst, req.tipo.as_str(), ano),
        |row| row.get(0),
    )
    .map_err(ApiErr::from_db("read document sequence"))?;
    let sequencia = ultima.unwrap_or(0) + 1;
    let numero = numero_documento(req.tipo, ano, sequencia);
    sq_execute(
        &tx,
        db::documentos::insert(
            inst,
            &db::documentos::NewDocumento {
                id: &id,
                aluno_id: &req.aluno_id,
                tipo: req.tipo.as_str(),
                ano,
                sequencia,
                numero: &numero,
                emitido_por: &user.user_id,
            },
        ),
    )
    .map_err(ApiErr::from_write(
        "insert documento",
        "document number already taken, retry",
    ))?;
    tx.commit().map_err(ApiErr::from_db("commit documento"))?;

    tracing::info!(
        instituicao_id = %inst,
        aluno_id = %req.aluno_id,
        numero = %numero,
        "document issued"
    );
    let documento = sq_query_opt(&conn, db::documentos::get(inst, &id), rows::documento)
        .map_err(ApiErr::from_db("load documento"))?
        .ok_or_else(|| ApiErr::internal("documento missing after insert"))?;
    Ok((StatusCode::CREATED, Json(documento)))
}

/// Students see only their own documents.
pub async fn list_documentos(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<DocumentoQuery>,
) -> Result<Json<ListResponse<DocumentoResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let aluno_id = if user.is(Role::Aluno) {
        Some(user.user_id.as_str())
    } else {
        user.require(Capability::IssueDocuments)?;
        q.aluno_id.as_deref()
    };
    let conn = db.conn();
    let items = sq_query_map(&conn, db::documentos::list(inst, aluno_id), rows::documento)
        .map_err(ApiErr::from_db("list documentos"))?;
    Ok(Json(items.into()))
}
