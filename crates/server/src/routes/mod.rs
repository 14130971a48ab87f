pub mod auth;
pub mod aulas;
pub mod avaliacoes;
pub mod biblioteca;
pub mod calendario;
pub mod documentos;
pub mod encerramentos;
pub mod estrutura;
pub mod financeiro;
pub mod health;
pub mod instituicoes;
pub mod matriculas;
pub mod planos;
pub mod relatorios;
pub mod rh;
pub mod turmas;
pub mod users;

use chrono::NaiveDate;
use rusqlite::Connection;

use dsicola_api::db;
use dsicola_api::{AnoLetivoResponse, PlanoResponse, Role, TipoAcademico, service};
use dsicola_core::academic::{Calendario, Periodo};

use crate::error::ApiErr;
use crate::rows;
use crate::storage::{sq_query_map, sq_query_opt, sq_query_row};

// ---------------------------------------------------------------------------
// Clock and ids
// ---------------------------------------------------------------------------

pub(crate) fn now_unix() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

/// Current time in the stored `datetime` format.
pub(crate) fn now_string() -> Result<String, ApiErr> {
    Ok(service::sqlite_datetime(now_unix())?)
}

pub(crate) fn hoje() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Shared loaders
// ---------------------------------------------------------------------------

pub(crate) fn tipo_academico(conn: &Connection, inst: &str) -> Result<TipoAcademico, ApiErr> {
    sq_query_opt(conn, db::instituicoes::get_tipo(inst), |row| {
        rows::enum_col(row, 0)
    })
    .map_err(ApiErr::from_db("load tipo academico"))?
    .ok_or_else(|| ApiErr::not_found("institution not found"))
}

pub(crate) fn load_ano(conn: &Connection, inst: &str, id: &str) -> Result<AnoLetivoResponse, ApiErr> {
    sq_query_opt(conn, db::calendario::get_ano(inst, id), rows::ano_letivo)
        .map_err(ApiErr::from_db("load ano letivo"))?
        .ok_or_else(|| ApiErr::not_found("ano letivo not found"))
}

pub(crate) fn ano_ativo(conn: &Connection, inst: &str) -> Result<Option<AnoLetivoResponse>, ApiErr> {
    sq_query_opt(conn, db::calendario::get_ano_ativo(inst), rows::ano_letivo)
        .map_err(ApiErr::from_db("load active ano letivo"))
}

/// Closing state of a year as the rules in `dsicola_core::academic` see it.
pub(crate) fn load_calendario(
    conn: &Connection,
    inst: &str,
    ano: &AnoLetivoResponse,
) -> Result<Calendario, ApiErr> {
    let tipo = tipo_academico(conn, inst)?;
    let fechados = sq_query_map(conn, db::calendario::periodos_fechados(inst, &ano.id), |row| {
        rows::enum_col::<Periodo>(row, 0)
    })
    .map_err(ApiErr::from_db("load closed periods"))?;
    Ok(Calendario::new(tipo, ano.status, fechados))
}

pub(crate) fn load_plano(conn: &Connection, inst: &str, id: &str) -> Result<PlanoResponse, ApiErr> {
    sq_query_opt(conn, db::planos::get(inst, id), rows::plano)
        .map_err(ApiErr::from_db("load plano"))?
        .ok_or_else(|| ApiErr::not_found("plano de ensino not found"))
}

/// Load the plan a grade, lesson or attendance record is filed under and
/// check that `periodo` may still be written. Professors record only under
/// their own plans.
pub(crate) fn plano_aberto(
    conn: &Connection,
    user: &auth::AuthUser,
    plano_id: &str,
    periodo: Periodo,
) -> Result<PlanoResponse, ApiErr> {
    let inst = user.tenant()?;
    let plano = load_plano(conn, inst, plano_id)?;
    if user.is(Role::Professor) && plano.professor_id != user.user_id {
        return Err(ApiErr::forbidden("plano de ensino belongs to another professor"));
    }
    plano.status.ensure_aprovado()?;
    let ano = load_ano(conn, inst, &plano.ano_letivo_id)?;
    load_calendario(conn, inst, &ano)?.ensure_editable(periodo)?;
    Ok(plano)
}

/// Is the student actively enrolled in the turma?
pub(crate) fn is_enrolled(
    conn: &Connection,
    inst: &str,
    turma_id: &str,
    aluno_id: &str,
) -> Result<bool, ApiErr> {
    sq_query_row(conn, db::matriculas::is_enrolled(inst, turma_id, aluno_id), |row| {
        row.get(0)
    })
    .map_err(ApiErr::from_db("check enrollment"))
}

/// Role of an account of the tenant; `404` when there is none.
pub(crate) fn user_role(conn: &Connection, inst: &str, user_id: &str) -> Result<Role, ApiErr> {
    sq_query_opt(conn, db::users::get_role(inst, user_id), |row| {
        rows::enum_col::<Role>(row, 0)
    })
    .map_err(ApiErr::from_db("load user role"))?
    .ok_or_else(|| ApiErr::not_found("user not found"))
}

/// Check that `user_id` is an account of the tenant with `role`.
pub(crate) fn ensure_role(
    conn: &Connection,
    inst: &str,
    user_id: &str,
    role: Role,
) -> Result<(), ApiErr> {
    let found = user_role(conn, inst, user_id)?;
    if found != role {
        return Err(ApiErr::bad_request(format!(
            "user {user_id} is {found}, expected {role}"
        )));
    }
    Ok(())
}
