use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;

use dsicola_api::db;
use dsicola_api::{
    AvaliacaoListQuery, AvaliacaoResponse, Capability, CreateAvaliacaoRequest, ListResponse,
    NotaLoteRequest, NotaLoteResponse, NotaResponse, Role, service,
};
use dsicola_core::grading::{validate_nota, validate_peso};

use super::auth::AuthUser;
use super::{is_enrolled, new_id, now_string, plano_aberto};
use crate::error::ApiErr;
use crate::rows;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt};

fn load_avaliacao(conn: &Connection, inst: &str, id: &str) -> Result<AvaliacaoResponse, ApiErr> {
    sq_query_opt(conn, db::avaliacoes::get(inst, id), rows::avaliacao)
        .map_err(ApiErr::from_db("load avaliacao"))?
        .ok_or_else(|| ApiErr::not_found("avaliacao not found"))
}

pub async fn create_avaliacao(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateAvaliacaoRequest>,
) -> Result<(StatusCode, Json<AvaliacaoResponse>), ApiErr> {
    user.require(Capability::RecordGrades)?;
    let inst = user.tenant()?;
    let descricao = service::validate_text("descricao", &req.descricao, 200)?;
    let peso = validate_peso(req.peso.unwrap_or(1.0))?;
    let data = service::parse_date("data", &req.data)?;

    let conn = db.conn();
    let plano = plano_aberto(&conn, &user, &req.plano_id, req.periodo)?;

    let id = new_id();
    sq_execute(
        &conn,
        db::avaliacoes::insert(
            inst,
            &db::avaliacoes::NewAvaliacao {
                id: &id,
                plano_id: &plano.id,
                periodo: req.periodo.as_str(),
                tipo: req.tipo.as_str(),
                descricao: &descricao,
                peso,
                data: &service::format_date(data),
            },
        ),
    )
    .map_err(ApiErr::from_db("insert avaliacao"))?;

    tracing::info!(plano_id = %plano.id, avaliacao_id = %id, periodo = %req.periodo, "avaliacao created");
    Ok((StatusCode::CREATED, Json(load_avaliacao(&conn, inst, &id)?)))
}

pub async fn list_avaliacoes(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<AvaliacaoListQuery>,
) -> Result<Json<ListResponse<AvaliacaoResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    let items = sq_query_map(
        &conn,
        db::avaliacoes::list(inst, q.plano_id.as_deref()),
        rows::avaliacao,
    )
    .map_err(ApiErr::from_db("list avaliacoes"))?;
    Ok(Json(items.into()))
}

/// Record the grades of one assessment. The whole batch is rejected when any
/// grade is out of range or any student is not enrolled in the turma.
pub async fn lancar_notas(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<NotaLoteRequest>,
) -> Result<Json<NotaLoteResponse>, ApiErr> {
    user.require(Capability::RecordGrades)?;
    let inst = user.tenant()?;
    if req.notas.is_empty() {
        return Err(ApiErr::bad_request("notas must not be empty"));
    }
    let valores = req
        .notas
        .iter()
        .map(|n| validate_nota(n.valor))
        .collect::<Result<Vec<f64>, _>>()?;

    let mut conn = db.conn();
    let avaliacao = load_avaliacao(&conn, inst, &req.avaliacao_id)?;
    let plano = plano_aberto(&conn, &user, &avaliacao.plano_id, avaliacao.periodo)?;
    for nota in &req.notas {
        if !is_enrolled(&conn, inst, &plano.turma_id, &nota.aluno_id)? {
            return Err(ApiErr::bad_request(format!(
                "aluno {} is not enrolled in the turma",
                nota.aluno_id
            )));
        }
    }

    let now = now_string()?;
    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin transaction"))?;
    for (nota, valor) in req.notas.iter().zip(valores) {
        let observacao = service::optional_text(nota.observacao.as_deref());
        sq_execute(
            &tx,
            db::avaliacoes::upsert_nota(
                inst,
                &db::avaliacoes::NotaUpsert {
                    id: &new_id(),
                    avaliacao_id: &avaliacao.id,
                    aluno_id: &nota.aluno_id,
                    valor,
                    observacao: observacao.as_deref(),
                    lancado_por: &user.user_id,
                    updated_at: &now,
                },
            ),
        )
        .map_err(ApiErr::from_db("upsert nota"))?;
    }
    tx.commit().map_err(ApiErr::from_db("commit notas"))?;

    tracing::info!(
        avaliacao_id = %avaliacao.id,
        gravadas = req.notas.len(),
        lancado_por = %user.user_id,
        "notas recorded"
    );
    Ok(Json(NotaLoteResponse {
        avaliacao_id: avaliacao.id,
        gravadas: req.notas.len(),
    }))
}

/// Students see only their own grade.
pub async fn list_notas(
    State(db): State<Db>,
    user: AuthUser,
    Path(avaliacao_id): Path<String>,
) -> Result<Json<ListResponse<NotaResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    load_avaliacao(&conn, inst, &avaliacao_id)?;
    let mut items = sq_query_map(&conn, db::avaliacoes::list_notas(inst, &avaliacao_id), rows::nota)
        .map_err(ApiErr::from_db("list notas"))?;
    if user.is(Role::Aluno) {
        items.retain(|n| n.aluno_id == user.user_id);
    }
    Ok(Json(items.into()))
}
