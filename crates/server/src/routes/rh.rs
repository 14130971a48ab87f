//! Staff records, their change history and monthly payroll.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;

use dsicola_api::db;
use dsicola_api::{
    Capability, CreateFuncionarioRequest, CreateHistoricoRhRequest, FolhaQuery, FolhaResponse,
    FuncionarioQuery, FuncionarioResponse, FuncionarioStatus, GerarFolhaRequest, GerarResponse,
    HistoricoRhQuery, HistoricoRhResponse, ListResponse, TipoAlteracao,
    UpdateFuncionarioRequest, service,
};
use dsicola_core::finance::parse_referencia;
use dsicola_core::payroll::{calcular_folha, check_pagamento_folha};

use super::auth::AuthUser;
use super::{new_id, now_string, user_role};
use crate::error::ApiErr;
use crate::rows;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt};

fn load_funcionario(conn: &Connection, inst: &str, id: &str) -> Result<FuncionarioResponse, ApiErr> {
    sq_query_opt(conn, db::rh::get_funcionario(inst, id), rows::funcionario)
        .map_err(ApiErr::from_db("load funcionario"))?
        .ok_or_else(|| ApiErr::not_found("funcionario not found"))
}

fn load_folha(conn: &Connection, inst: &str, id: &str) -> Result<FolhaResponse, ApiErr> {
    sq_query_opt(conn, db::rh::get_folha(inst, id), rows::folha)
        .map_err(ApiErr::from_db("load folha"))?
        .ok_or_else(|| ApiErr::not_found("folha de pagamento not found"))
}

fn validate_salario(salario: i64) -> Result<i64, ApiErr> {
    if salario < 0 {
        return Err(ApiErr::bad_request("salario_base must not be negative"));
    }
    Ok(salario)
}

/// One history entry of a field change.
struct Alteracao {
    tipo: TipoAlteracao,
    descricao: &'static str,
    anterior: String,
    novo: String,
}

fn record_historico(
    conn: &Connection,
    inst: &str,
    funcionario_id: &str,
    registrado_por: &str,
    a: &Alteracao,
) -> Result<(), ApiErr> {
    sq_execute(
        conn,
        db::rh::insert_historico(
            inst,
            &db::rh::NewHistorico {
                id: &new_id(),
                funcionario_id,
                tipo_alteracao: a.tipo.as_str(),
                descricao: a.descricao,
                valor_anterior: Some(&a.anterior),
                valor_novo: Some(&a.novo),
                registrado_por,
            },
        ),
    )
    .map_err(ApiErr::from_db("insert historico rh"))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Funcionários
// ---------------------------------------------------------------------------

pub async fn create_funcionario(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateFuncionarioRequest>,
) -> Result<(StatusCode, Json<FuncionarioResponse>), ApiErr> {
    user.require(Capability::ManageHr)?;
    let inst = user.tenant()?;
    let nome = service::validate_text("nome", &req.nome, 200)?;
    let cargo = service::validate_text("cargo", &req.cargo, 100)?;
    let departamento = service::validate_text("departamento", &req.departamento, 100)?;
    let salario_base = validate_salario(req.salario_base)?;
    let admissao = service::format_date(service::parse_date("data_admissao", &req.data_admissao)?);
    let user_id = service::optional_text(req.user_id.as_deref());

    let mut conn = db.conn();
    if let Some(uid) = &user_id {
        user_role(&conn, inst, uid)?;
    }

    let id = new_id();
    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin transaction"))?;
    sq_execute(
        &tx,
        db::rh::insert_funcionario(
            inst,
            &db::rh::NewFuncionario {
                id: &id,
                user_id: user_id.as_deref(),
                nome: &nome,
                cargo: &cargo,
                departamento: &departamento,
                salario_base,
                data_admissao: &admissao,
            },
        ),
    )
    .map_err(ApiErr::from_db("insert funcionario"))?;
    sq_execute(
        &tx,
        db::rh::insert_historico(
            inst,
            &db::rh::NewHistorico {
                id: &new_id(),
                funcionario_id: &id,
                tipo_alteracao: TipoAlteracao::Admissao.as_str(),
                descricao: "admissao",
                valor_anterior: None,
                valor_novo: Some(&cargo),
                registrado_por: &user.user_id,
            },
        ),
    )
    .map_err(ApiErr::from_db("insert historico rh"))?;
    tx.commit().map_err(ApiErr::from_db("commit funcionario"))?;

    tracing::info!(instituicao_id = %inst, funcionario_id = %id, "funcionario admitted");
    Ok((StatusCode::CREATED, Json(load_funcionario(&conn, inst, &id)?)))
}

pub async fn list_funcionarios(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<FuncionarioQuery>,
) -> Result<Json<ListResponse<FuncionarioResponse>>, ApiErr> {
    user.require(Capability::ManageHr)?;
    let inst = user.tenant()?;
    let conn = db.conn();
    let items = sq_query_map(
        &conn,
        db::rh::list_funcionarios(inst, q.status.as_ref().map(FuncionarioStatus::as_str)),
        rows::funcionario,
    )
    .map_err(ApiErr::from_db("list funcionarios"))?;
    Ok(Json(items.into()))
}

/// Apply a partial update. Every changed field leaves a history entry in
/// the same transaction.
pub async fn update_funcionario(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateFuncionarioRequest>,
) -> Result<Json<FuncionarioResponse>, ApiErr> {
    user.require(Capability::ManageHr)?;
    let inst = user.tenant()?;
    let cargo = req
        .cargo
        .as_deref()
        .map(|c| service::validate_text("cargo", c, 100))
        .transpose()?;
    let departamento = req
        .departamento
        .as_deref()
        .map(|d| service::validate_text("departamento", d, 100))
        .transpose()?;
    let salario = req.salario_base.map(validate_salario).transpose()?;

    let mut conn = db.conn();
    let atual = load_funcionario(&conn, inst, &id)?;

    let mut alteracoes = Vec::new();
    if let Some(c) = cargo.as_ref().filter(|c| **c != atual.cargo) {
        alteracoes.push(Alteracao {
            tipo: TipoAlteracao::Cargo,
            descricao: "mudanca de cargo",
            anterior: atual.cargo.clone(),
            novo: c.clone(),
        });
    }
    if let Some(d) = departamento.as_ref().filter(|d| **d != atual.departamento) {
        alteracoes.push(Alteracao {
            tipo: TipoAlteracao::Departamento,
            descricao: "mudanca de departamento",
            anterior: atual.departamento.clone(),
            novo: d.clone(),
        });
    }
    if let Some(s) = salario.filter(|s| *s != atual.salario_base) {
        alteracoes.push(Alteracao {
            tipo: TipoAlteracao::Salario,
            descricao: "alteracao salarial",
            anterior: atual.salario_base.to_string(),
            novo: s.to_string(),
        });
    }
    if let Some(s) = req.status.filter(|s| *s != atual.status) {
        alteracoes.push(Alteracao {
            tipo: TipoAlteracao::Status,
            descricao: "mudanca de situacao",
            anterior: atual.status.to_string(),
            novo: s.to_string(),
        });
    }
    if alteracoes.is_empty() {
        return Ok(Json(atual));
    }

    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin transaction"))?;
    sq_execute(
        &tx,
        db::rh::update_funcionario(
            inst,
            &id,
            &db::rh::FuncionarioEdit {
                cargo: cargo.as_deref().unwrap_or(&atual.cargo),
                departamento: departamento.as_deref().unwrap_or(&atual.departamento),
                salario_base: salario.unwrap_or(atual.salario_base),
                status: req.status.unwrap_or(atual.status).as_str(),
            },
        ),
    )
    .map_err(ApiErr::from_db("update funcionario"))?;
    for a in &alteracoes {
        record_historico(&tx, inst, &id, &user.user_id, a)?;
    }
    tx.commit().map_err(ApiErr::from_db("commit funcionario"))?;

    tracing::info!(funcionario_id = %id, alteracoes = alteracoes.len(), "funcionario updated");
    Ok(Json(load_funcionario(&conn, inst, &id)?))
}

// ---------------------------------------------------------------------------
// Histórico
// ---------------------------------------------------------------------------

pub async fn list_historico(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<HistoricoRhQuery>,
) -> Result<Json<ListResponse<HistoricoRhResponse>>, ApiErr> {
    user.require(Capability::ManageHr)?;
    let inst = user.tenant()?;
    let conn = db.conn();
    let items = sq_query_map(
        &conn,
        db::rh::list_historico(inst, q.funcionario_id.as_deref()),
        rows::historico,
    )
    .map_err(ApiErr::from_db("list historico rh"))?;
    Ok(Json(items.into()))
}

/// Record an event that is not a field change (training, warning, leave).
pub async fn create_historico(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateHistoricoRhRequest>,
) -> Result<(StatusCode, Json<HistoricoRhResponse>), ApiErr> {
    user.require(Capability::ManageHr)?;
    let inst = user.tenant()?;
    let descricao = service::validate_text("descricao", &req.descricao, 1000)?;
    let anterior = service::optional_text(req.valor_anterior.as_deref());
    let novo = service::optional_text(req.valor_novo.as_deref());

    let conn = db.conn();
    let funcionario = load_funcionario(&conn, inst, &req.funcionario_id)?;

    let id = new_id();
    sq_execute(
        &conn,
        db::rh::insert_historico(
            inst,
            &db::rh::NewHistorico {
                id: &id,
                funcionario_id: &funcionario.id,
                tipo_alteracao: req.tipo_alteracao.as_str(),
                descricao: &descricao,
                valor_anterior: anterior.as_deref(),
                valor_novo: novo.as_deref(),
                registrado_por: &user.user_id,
            },
        ),
    )
    .map_err(ApiErr::from_db("insert historico rh"))?;

    let created = sq_query_map(
        &conn,
        db::rh::list_historico(inst, Some(&funcionario.id)),
        rows::historico,
    )
    .map_err(ApiErr::from_db("load historico rh"))?
    .into_iter()
    .find(|h| h.id == id)
    .ok_or_else(|| ApiErr::internal("historico missing after insert"))?;
    Ok((StatusCode::CREATED, Json(created)))
}

// ---------------------------------------------------------------------------
// Folha de pagamento
// ---------------------------------------------------------------------------

/// Generate the payslips of a referência for every `ATIVO` employee.
/// Employees already paid for the referência are skipped.
pub async fn gerar_folhas(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<GerarFolhaRequest>,
) -> Result<Json<GerarResponse>, ApiErr> {
    user.require(Capability::ManageHr)?;
    let inst = user.tenant()?;
    let referencia = req.referencia.trim();
    parse_referencia(referencia)?;

    let mut conn = db.conn();
    let funcionarios = sq_query_map(
        &conn,
        db::rh::list_funcionarios(inst, Some(FuncionarioStatus::Ativo.as_str())),
        rows::funcionario,
    )
    .map_err(ApiErr::from_db("list funcionarios"))?;
    if let Some(l) = req
        .lancamentos
        .iter()
        .find(|l| !funcionarios.iter().any(|f| f.id == l.funcionario_id))
    {
        return Err(ApiErr::bad_request(format!(
            "funcionario {} is not an active employee",
            l.funcionario_id
        )));
    }

    let folhas = funcionarios
        .iter()
        .map(|f| {
            let lancamento = req
                .lancamentos
                .iter()
                .find(|l| l.funcionario_id == f.id)
                .map(|l| l.lancamento)
                .unwrap_or_default();
            calcular_folha(f.salario_base, &lancamento).map(|folha| (f.id.as_str(), folha))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin transaction"))?;
    let mut criadas = 0;
    for &(funcionario_id, folha) in &folhas {
        criadas += sq_execute(
            &tx,
            db::rh::insert_folha(
                inst,
                &db::rh::NewFolha {
                    id: &new_id(),
                    funcionario_id,
                    referencia,
                    salario_base: folha.salario_base,
                    subsidios: folha.subsidios,
                    descontos: folha.descontos,
                    desconto_faltas: folha.desconto_faltas,
                    inss: folha.inss,
                    valor_liquido: folha.valor_liquido,
                },
            ),
        )
        .map_err(ApiErr::from_db("insert folha"))?;
    }
    tx.commit().map_err(ApiErr::from_db("commit folhas"))?;

    let ignoradas = folhas.len() - criadas;
    tracing::info!(instituicao_id = %inst, referencia, criadas, ignoradas, "payroll generated");
    Ok(Json(GerarResponse { criadas, ignoradas }))
}

pub async fn list_folhas(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<FolhaQuery>,
) -> Result<Json<ListResponse<FolhaResponse>>, ApiErr> {
    user.require(Capability::ManageHr)?;
    let inst = user.tenant()?;
    let conn = db.conn();
    let items = sq_query_map(&conn, db::rh::list_folhas(inst, q.referencia.as_deref()), rows::folha)
        .map_err(ApiErr::from_db("list folhas"))?;
    Ok(Json(items.into()))
}

pub async fn pagar_folha(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<FolhaResponse>, ApiErr> {
    user.require(Capability::ManageHr)?;
    let inst = user.tenant()?;

    let conn = db.conn();
    let folha = load_folha(&conn, inst, &id)?;
    check_pagamento_folha(folha.status)?;
    let now = now_string()?;
    sq_execute(&conn, db::rh::pagar_folha(inst, &id, &now))
        .map_err(ApiErr::from_db("pay folha"))?;

    tracing::info!(folha_id = %id, valor_liquido = folha.valor_liquido, "payslip paid");
    Ok(Json(load_folha(&conn, inst, &id)?))
}
