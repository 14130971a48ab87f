use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;

use dsicola_api::db;
use dsicola_api::{
    AulaListQuery, AulaResponse, Capability, CreateAulaRequest, ListResponse, PresencaLoteRequest,
    PresencaLoteResponse, PresencaResponse, PresencaStatus, ResumoPresencaQuery,
    ResumoPresencaResponse, Role, service,
};
use dsicola_core::attendance::{ResumoFrequencia, validate_quantidade};

use super::auth::AuthUser;
use super::{is_enrolled, load_plano, new_id, plano_aberto};
use crate::error::ApiErr;
use crate::rows;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt};

fn load_aula(conn: &Connection, inst: &str, id: &str) -> Result<AulaResponse, ApiErr> {
    sq_query_opt(conn, db::aulas::get(inst, id), rows::aula)
        .map_err(ApiErr::from_db("load aula"))?
        .ok_or_else(|| ApiErr::not_found("aula not found"))
}

/// Log a lesson given under an approved plan.
pub async fn create_aula(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateAulaRequest>,
) -> Result<(StatusCode, Json<AulaResponse>), ApiErr> {
    user.require(Capability::RecordAttendance)?;
    let inst = user.tenant()?;
    let data = service::parse_date("data", &req.data)?;
    let conteudo = service::validate_text("conteudo", &req.conteudo, 2000)?;
    let quantidade = validate_quantidade(req.quantidade.unwrap_or(1))?;

    let conn = db.conn();
    let plano = plano_aberto(&conn, &user, &req.plano_id, req.periodo)?;

    let id = new_id();
    sq_execute(
        &conn,
        db::aulas::insert(
            inst,
            &db::aulas::NewAula {
                id: &id,
                plano_id: &plano.id,
                data: &service::format_date(data),
                periodo: req.periodo.as_str(),
                conteudo: &conteudo,
                quantidade,
                created_by: &user.user_id,
            },
        ),
    )
    .map_err(ApiErr::from_db("insert aula"))?;

    Ok((StatusCode::CREATED, Json(load_aula(&conn, inst, &id)?)))
}

pub async fn list_aulas(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<AulaListQuery>,
) -> Result<Json<ListResponse<AulaResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    let items = sq_query_map(&conn, db::aulas::list(inst, q.plano_id.as_deref()), rows::aula)
        .map_err(ApiErr::from_db("list aulas"))?;
    Ok(Json(items.into()))
}

/// Record attendance for a logged lesson. Re-sending a student overwrites
/// their previous record.
pub async fn lancar_presencas(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<PresencaLoteRequest>,
) -> Result<Json<PresencaLoteResponse>, ApiErr> {
    user.require(Capability::RecordAttendance)?;
    let inst = user.tenant()?;
    if req.presencas.is_empty() {
        return Err(ApiErr::bad_request("presencas must not be empty"));
    }

    let mut conn = db.conn();
    let aula = load_aula(&conn, inst, &req.aula_id)?;
    let plano = plano_aberto(&conn, &user, &aula.plano_id, aula.periodo)?;
    for p in &req.presencas {
        if !is_enrolled(&conn, inst, &plano.turma_id, &p.aluno_id)? {
            return Err(ApiErr::bad_request(format!(
                "aluno {} is not enrolled in the turma",
                p.aluno_id
            )));
        }
    }

    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin transaction"))?;
    for p in &req.presencas {
        let observacao = service::optional_text(p.observacao.as_deref());
        sq_execute(
            &tx,
            db::aulas::upsert_presenca(
                inst,
                &new_id(),
                &aula.id,
                &p.aluno_id,
                p.status.as_str(),
                observacao.as_deref(),
            ),
        )
        .map_err(ApiErr::from_db("upsert presenca"))?;
    }
    tx.commit().map_err(ApiErr::from_db("commit presencas"))?;

    Ok(Json(PresencaLoteResponse {
        aula_id: aula.id,
        gravadas: req.presencas.len(),
    }))
}

pub async fn list_presencas(
    State(db): State<Db>,
    user: AuthUser,
    Path(aula_id): Path<String>,
) -> Result<Json<ListResponse<PresencaResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    load_aula(&conn, inst, &aula_id)?;
    let mut items = sq_query_map(&conn, db::aulas::list_presencas(inst, &aula_id), rows::presenca)
        .map_err(ApiErr::from_db("list presencas"))?;
    if user.is(Role::Aluno) {
        items.retain(|p| p.aluno_id == user.user_id);
    }
    Ok(Json(items.into()))
}

/// Attendance under a plan, keyed by `aluno_id`.
pub(crate) fn frequencias(
    conn: &Connection,
    inst: &str,
    plano_id: &str,
    aluno_id: Option<&str>,
) -> Result<HashMap<String, ResumoFrequencia>, ApiErr> {
    let registos = sq_query_map(
        conn,
        db::relatorios::frequencia_do_plano(inst, plano_id, aluno_id),
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                rows::enum_col::<PresencaStatus>(row, 1)?,
                row.get::<_, i64>(2)?,
            ))
        },
    )
    .map_err(ApiErr::from_db("load attendance"))?;

    let mut por_aluno: HashMap<String, ResumoFrequencia> = HashMap::new();
    for (aluno, status, total) in registos {
        por_aluno.entry(aluno).or_default().registar(status, total);
    }
    Ok(por_aluno)
}

/// Attendance rate of every student enrolled in the plan's turma.
pub async fn resumo_presencas(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<ResumoPresencaQuery>,
) -> Result<Json<ListResponse<ResumoPresencaResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    let plano = load_plano(&conn, inst, &q.plano_id)?;
    let so_aluno = user.is(Role::Aluno).then_some(user.user_id.as_str());
    if user.is(Role::Professor) && plano.professor_id != user.user_id {
        return Err(ApiErr::forbidden("plano de ensino belongs to another professor"));
    }

    let por_aluno = frequencias(&conn, inst, &plano.id, so_aluno)?;
    let alunos = sq_query_map(&conn, db::turmas::list_alunos(inst, &plano.turma_id), rows::aluno_turma)
        .map_err(ApiErr::from_db("list alunos da turma"))?;

    let items = alunos
        .into_iter()
        .filter(|a| so_aluno.is_none_or(|id| id == a.aluno_id))
        .map(|a| {
            let resumo = por_aluno.get(&a.aluno_id).copied().unwrap_or_default();
            ResumoPresencaResponse {
                aluno_id: a.aluno_id,
                aluno_nome: a.nome,
                aulas: resumo.aulas,
                presencas: resumo.presencas,
                faltas: resumo.faltas,
                justificadas: resumo.justificadas,
                frequencia: resumo.frequencia(),
                abaixo_do_minimo: resumo.abaixo_do_minimo(),
            }
        })
        .collect::<Vec<_>>();
    Ok(Json(items.into()))
}
