//! Classes, cursos and disciplinas.

use axum::{Json, extract::State, http::StatusCode};
use rusqlite::Connection;

use dsicola_api::db::{self, Built};
use dsicola_api::{
    Capability, ClasseResponse, CreateClasseRequest, CreateCursoRequest,
    CreateDisciplinaRequest, CursoResponse, DisciplinaResponse, ListResponse, TipoAcademico,
    service,
};

use super::auth::AuthUser;
use super::{new_id, tipo_academico};
use crate::error::ApiErr;
use crate::rows;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt, sq_query_row};

fn exists(conn: &Connection, built: Built, what: &str) -> Result<(), ApiErr> {
    let found: bool = sq_query_row(conn, built, |row| row.get(0))
        .map_err(ApiErr::from_db("check reference"))?;
    if found {
        Ok(())
    } else {
        Err(ApiErr::not_found(format!("{what} not found")))
    }
}

/// Referenced classe/curso must exist in the tenant.
pub(crate) fn check_estrutura(
    conn: &Connection,
    inst: &str,
    classe_id: Option<&str>,
    curso_id: Option<&str>,
) -> Result<(), ApiErr> {
    if let Some(id) = classe_id {
        exists(conn, db::estrutura::classe_exists(inst, id), "classe")?;
    }
    if let Some(id) = curso_id {
        exists(conn, db::estrutura::curso_exists(inst, id), "curso")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

pub async fn create_classe(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateClasseRequest>,
) -> Result<(StatusCode, Json<ClasseResponse>), ApiErr> {
    user.require(Capability::ManageAcademicStructure)?;
    let inst = user.tenant()?;
    let nome = service::validate_text("nome", &req.nome, 64)?;
    if !(1..=13).contains(&req.nivel) {
        return Err(ApiErr::bad_request("nivel must be between 1 and 13"));
    }

    let conn = db.conn();
    if tipo_academico(&conn, inst)? != TipoAcademico::Secundario {
        return Err(ApiErr::bad_request(
            "classes only exist in secondary institutions",
        ));
    }
    let id = new_id();
    sq_execute(&conn, db::estrutura::insert_classe(inst, &id, &nome, req.nivel))
        .map_err(ApiErr::from_write("insert classe", "a classe with this name already exists"))?;

    Ok((
        StatusCode::CREATED,
        Json(ClasseResponse {
            id,
            nome,
            nivel: req.nivel,
        }),
    ))
}

pub async fn list_classes(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ListResponse<ClasseResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    let items = sq_query_map(&conn, db::estrutura::list_classes(inst), rows::classe)
        .map_err(ApiErr::from_db("list classes"))?;
    Ok(Json(items.into()))
}

// ---------------------------------------------------------------------------
// Cursos
// ---------------------------------------------------------------------------

pub async fn create_curso(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateCursoRequest>,
) -> Result<(StatusCode, Json<CursoResponse>), ApiErr> {
    user.require(Capability::ManageAcademicStructure)?;
    let inst = user.tenant()?;
    let nome = service::validate_text("nome", &req.nome, 200)?;
    let codigo = service::validate_text("codigo", &req.codigo, 32)?.to_uppercase();
    if !(1..=8).contains(&req.duracao_anos) {
        return Err(ApiErr::bad_request("duracao_anos must be between 1 and 8"));
    }

    let conn = db.conn();
    if tipo_academico(&conn, inst)? != TipoAcademico::Superior {
        return Err(ApiErr::bad_request(
            "cursos only exist in higher-education institutions",
        ));
    }
    let id = new_id();
    sq_execute(
        &conn,
        db::estrutura::insert_curso(inst, &id, &nome, &codigo, req.duracao_anos),
    )
    .map_err(ApiErr::from_write("insert curso", "a curso with this codigo already exists"))?;

    Ok((
        StatusCode::CREATED,
        Json(CursoResponse {
            id,
            nome,
            codigo,
            duracao_anos: req.duracao_anos,
        }),
    ))
}

pub async fn list_cursos(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ListResponse<CursoResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    let items = sq_query_map(&conn, db::estrutura::list_cursos(inst), rows::curso)
        .map_err(ApiErr::from_db("list cursos"))?;
    Ok(Json(items.into()))
}

// ---------------------------------------------------------------------------
// Disciplinas
// ---------------------------------------------------------------------------

pub async fn create_disciplina(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateDisciplinaRequest>,
) -> Result<(StatusCode, Json<DisciplinaResponse>), ApiErr> {
    user.require(Capability::ManageAcademicStructure)?;
    let inst = user.tenant()?;
    let nome = service::validate_text("nome", &req.nome, 200)?;
    let codigo = service::validate_text("codigo", &req.codigo, 32)?.to_uppercase();
    if req.carga_horaria <= 0 {
        return Err(ApiErr::bad_request("carga_horaria must be greater than zero"));
    }
    let classe_id = service::optional_text(req.classe_id.as_deref());
    let curso_id = service::optional_text(req.curso_id.as_deref());

    let conn = db.conn();
    // A disciplina may be shared across classes/cursos; a link is optional
    // but must match the institution type when present.
    if classe_id.is_some() || curso_id.is_some() {
        tipo_academico(&conn, inst)?.check_vinculo(classe_id.is_some(), curso_id.is_some())?;
    }
    check_estrutura(&conn, inst, classe_id.as_deref(), curso_id.as_deref())?;

    let id = new_id();
    sq_execute(
        &conn,
        db::estrutura::insert_disciplina(
            inst,
            &db::estrutura::NewDisciplina {
                id: &id,
                nome: &nome,
                codigo: &codigo,
                carga_horaria: req.carga_horaria,
                classe_id: classe_id.as_deref(),
                curso_id: curso_id.as_deref(),
            },
        ),
    )
    .map_err(ApiErr::from_write(
        "insert disciplina",
        "a disciplina with this codigo already exists",
    ))?;

    let created = sq_query_opt(&conn, db::estrutura::get_disciplina(inst, &id), rows::disciplina)
        .map_err(ApiErr::from_db("load disciplina"))?
        .ok_or_else(|| ApiErr::internal("disciplina missing after insert"))?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_disciplinas(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ListResponse<DisciplinaResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let conn = db.conn();
    let items = sq_query_map(&conn, db::estrutura::list_disciplinas(inst), rows::disciplina)
        .map_err(ApiErr::from_db("list disciplinas"))?;
    Ok(Json(items.into()))
}
