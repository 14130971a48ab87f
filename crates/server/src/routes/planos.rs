use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;

use dsicola_api::db;
use dsicola_api::{
    AnoLetivoStatus, Capability, CreatePlanoRequest, ListResponse, PlanoAulaRequest,
    PlanoAulaResponse, PlanoDetailResponse, PlanoListQuery, PlanoResponse, PlanoStatus,
    RejeitarPlanoRequest, Role, UpdatePlanoRequest, service,
};
use dsicola_core::plano::{PlanoAcao, check_submissao, validate_motivo};

use super::auth::AuthUser;
use super::turmas::load_turma;
use super::{ensure_role, load_ano, load_plano, new_id, now_string, tipo_academico};
use crate::error::ApiErr;
use crate::rows;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt, sq_query_row};

/// Professors work on their own plans only.
fn ensure_owner(user: &AuthUser, plano: &PlanoResponse) -> Result<(), ApiErr> {
    if user.is(Role::Professor) && plano.professor_id != user.user_id {
        return Err(ApiErr::forbidden("plano de ensino belongs to another professor"));
    }
    Ok(())
}

fn ensure_can_view(user: &AuthUser, plano: &PlanoResponse) -> Result<(), ApiErr> {
    if user.is(Role::Aluno) {
        return Err(ApiErr::forbidden("students cannot read teaching plans"));
    }
    ensure_owner(user, plano)
}

fn validate_carga(carga: i64) -> Result<i64, ApiErr> {
    if carga < 0 {
        return Err(ApiErr::bad_request("carga_horaria_total must not be negative"));
    }
    Ok(carga)
}

fn load_detail(conn: &Connection, inst: &str, id: &str) -> Result<PlanoDetailResponse, ApiErr> {
    let plano = load_plano(conn, inst, id)?;
    let aulas = sq_query_map(conn, db::planos::list_aulas(inst, &plano.id), rows::plano_aula)
        .map_err(ApiErr::from_db("list plano aulas"))?;
    Ok(PlanoDetailResponse { plano, aulas })
}

pub async fn create_plano(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreatePlanoRequest>,
) -> Result<(StatusCode, Json<PlanoResponse>), ApiErr> {
    user.require(Capability::EditTeachingPlan)?;
    let inst = user.tenant()?;
    validate_carga(req.carga_horaria_total)?;

    let conn = db.conn();
    let professor_id = if user.is(Role::Professor) {
        user.user_id.clone()
    } else {
        let id = req
            .professor_id
            .clone()
            .ok_or_else(|| ApiErr::bad_request("professor_id is required"))?;
        ensure_role(&conn, inst, &id, Role::Professor)?;
        id
    };

    let turma = load_turma(&conn, inst, &req.turma_id)?;
    sq_query_opt(&conn, db::estrutura::get_disciplina(inst, &req.disciplina_id), |row| {
        row.get::<_, String>(0)
    })
    .map_err(ApiErr::from_db("load disciplina"))?
    .ok_or_else(|| ApiErr::not_found("disciplina not found"))?;
    let ano = load_ano(&conn, inst, &turma.ano_letivo_id)?;
    if ano.status == AnoLetivoStatus::Encerrado {
        return Err(ApiErr::conflict(format!("ano letivo {} is closed", ano.ano)));
    }

    let id = new_id();
    sq_execute(
        &conn,
        db::planos::insert(
            inst,
            &db::planos::NewPlano {
                id: &id,
                professor_id: &professor_id,
                disciplina_id: &req.disciplina_id,
                turma_id: &turma.id,
                ano_letivo_id: &ano.id,
                ementa: req.ementa.trim(),
                objetivos: req.objetivos.trim(),
                metodologia: req.metodologia.trim(),
                carga_horaria_total: req.carga_horaria_total,
            },
        ),
    )
    .map_err(ApiErr::from_write(
        "insert plano",
        "a plano de ensino already exists for this disciplina and turma",
    ))?;

    tracing::info!(plano_id = %id, professor_id = %professor_id, "plano de ensino created");
    Ok((StatusCode::CREATED, Json(load_plano(&conn, inst, &id)?)))
}

pub async fn list_planos(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<PlanoListQuery>,
) -> Result<Json<ListResponse<PlanoResponse>>, ApiErr> {
    let inst = user.tenant()?;
    if user.is(Role::Aluno) {
        return Err(ApiErr::forbidden("students cannot read teaching plans"));
    }
    let professor_id = if user.is(Role::Professor) {
        Some(user.user_id.as_str())
    } else {
        q.professor_id.as_deref()
    };

    let conn = db.conn();
    let items = sq_query_map(
        &conn,
        db::planos::list(
            inst,
            &db::planos::PlanoFilter {
                turma_id: q.turma_id.as_deref(),
                professor_id,
                ano_letivo_id: q.ano_letivo_id.as_deref(),
                status: q.status.as_ref().map(PlanoStatus::as_str),
            },
        ),
        rows::plano,
    )
    .map_err(ApiErr::from_db("list planos"))?;
    Ok(Json(items.into()))
}

pub async fn get_plano(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PlanoDetailResponse>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    let detail = load_detail(&conn, inst, &id)?;
    ensure_can_view(&user, &detail.plano)?;
    Ok(Json(detail))
}

/// Editing a rejected plan puts it back in `RASCUNHO`.
pub async fn update_plano(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdatePlanoRequest>,
) -> Result<Json<PlanoResponse>, ApiErr> {
    user.require(Capability::EditTeachingPlan)?;
    let inst = user.tenant()?;

    let conn = db.conn();
    let plano = load_plano(&conn, inst, &id)?;
    ensure_owner(&user, &plano)?;
    let next = plano.status.transition(PlanoAcao::Editar)?;

    let carga = validate_carga(req.carga_horaria_total.unwrap_or(plano.carga_horaria_total))?;
    let now = now_string()?;
    sq_execute(
        &conn,
        db::planos::update(
            inst,
            &id,
            &db::planos::PlanoEdit {
                ementa: req.ementa.as_deref().map_or(plano.ementa.as_str(), str::trim),
                objetivos: req
                    .objetivos
                    .as_deref()
                    .map_or(plano.objetivos.as_str(), str::trim),
                metodologia: req
                    .metodologia
                    .as_deref()
                    .map_or(plano.metodologia.as_str(), str::trim),
                carga_horaria_total: carga,
                status: next.as_str(),
                updated_at: &now,
            },
        ),
    )
    .map_err(ApiErr::from_db("update plano"))?;

    Ok(Json(load_plano(&conn, inst, &id)?))
}

/// Append a planned lesson. `ordem` follows the existing ones.
pub async fn add_plano_aula(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<PlanoAulaRequest>,
) -> Result<(StatusCode, Json<PlanoAulaResponse>), ApiErr> {
    user.require(Capability::EditTeachingPlan)?;
    let inst = user.tenant()?;
    let titulo = service::validate_text("titulo", &req.titulo, 200)?;
    let descricao = service::optional_text(req.descricao.as_deref());
    if req.quantidade_aulas <= 0 {
        return Err(ApiErr::bad_request("quantidade_aulas must be greater than zero"));
    }

    let mut conn = db.conn();
    let plano = load_plano(&conn, inst, &id)?;
    ensure_owner(&user, &plano)?;
    let next = plano.status.transition(PlanoAcao::Editar)?;
    let tipo = tipo_academico(&conn, inst)?;
    if !req.periodo.is_teaching_period_of(tipo) {
        return Err(ApiErr::bad_request(format!(
            "{} is not a period of a {tipo} institution",
            req.periodo
        )));
    }

    let now = now_string()?;
    let aula_id = new_id();
    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin transaction"))?;
    let existentes: i64 = sq_query_row(&tx, db::planos::count_aulas(inst, &id), |row| row.get(0))
        .map_err(ApiErr::from_db("count plano aulas"))?;
    let ordem = existentes + 1;
    sq_execute(
        &tx,
        db::planos::insert_aula(
            inst,
            &db::planos::NewPlanoAula {
                id: &aula_id,
                plano_id: &id,
                ordem,
                titulo: &titulo,
                descricao: descricao.as_deref(),
                periodo: req.periodo.as_str(),
                quantidade_aulas: req.quantidade_aulas,
            },
        ),
    )
    .map_err(ApiErr::from_db("insert plano aula"))?;
    if next != plano.status {
        sq_execute(
            &tx,
            db::planos::set_status(inst, &id, next.as_str(), plano.observacao.as_deref(), &now),
        )
        .map_err(ApiErr::from_db("reset plano status"))?;
    }
    tx.commit().map_err(ApiErr::from_db("commit plano aula"))?;

    Ok((
        StatusCode::CREATED,
        Json(PlanoAulaResponse {
            id: aula_id,
            ordem,
            titulo,
            descricao,
            periodo: req.periodo,
            quantidade_aulas: req.quantidade_aulas,
        }),
    ))
}

pub async fn submeter_plano(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PlanoResponse>, ApiErr> {
    user.require(Capability::EditTeachingPlan)?;
    let inst = user.tenant()?;

    let conn = db.conn();
    let plano = load_plano(&conn, inst, &id)?;
    ensure_owner(&user, &plano)?;
    let next = plano.status.transition(PlanoAcao::Submeter)?;
    let aulas: i64 = sq_query_row(&conn, db::planos::count_aulas(inst, &id), |row| row.get(0))
        .map_err(ApiErr::from_db("count plano aulas"))?;
    check_submissao(
        plano.carga_horaria_total,
        usize::try_from(aulas).unwrap_or_default(),
    )?;

    let now = now_string()?;
    sq_execute(&conn, db::planos::set_status(inst, &id, next.as_str(), None, &now))
        .map_err(ApiErr::from_db("submit plano"))?;

    tracing::info!(plano_id = %id, "plano de ensino submitted");
    Ok(Json(load_plano(&conn, inst, &id)?))
}

pub async fn aprovar_plano(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PlanoResponse>, ApiErr> {
    user.require(Capability::ApproveTeachingPlan)?;
    let inst = user.tenant()?;

    let conn = db.conn();
    let plano = load_plano(&conn, inst, &id)?;
    plano.status.transition(PlanoAcao::Aprovar)?;

    let now = now_string()?;
    sq_execute(&conn, db::planos::aprovar(inst, &id, &user.user_id, &now))
        .map_err(ApiErr::from_db("approve plano"))?;

    tracing::info!(plano_id = %id, aprovado_por = %user.user_id, "plano de ensino approved");
    Ok(Json(load_plano(&conn, inst, &id)?))
}

pub async fn rejeitar_plano(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<RejeitarPlanoRequest>,
) -> Result<Json<PlanoResponse>, ApiErr> {
    user.require(Capability::ApproveTeachingPlan)?;
    let inst = user.tenant()?;
    let motivo = validate_motivo(&req.motivo)?;

    let conn = db.conn();
    let plano = load_plano(&conn, inst, &id)?;
    let next = plano.status.transition(PlanoAcao::Rejeitar)?;

    let now = now_string()?;
    sq_execute(
        &conn,
        db::planos::set_status(inst, &id, next.as_str(), Some(&motivo), &now),
    )
    .map_err(ApiErr::from_db("reject plano"))?;

    tracing::info!(plano_id = %id, "plano de ensino rejected");
    Ok(Json(load_plano(&conn, inst, &id)?))
}
