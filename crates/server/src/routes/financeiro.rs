//! Tuition (mensalidades), payments and the late-fee policy.
//!
//! Charges on unpaid mensalidades are evaluated on every read against the
//! institution's current policy. Paying freezes them.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use rusqlite::Connection;

use dsicola_api::db;
use dsicola_api::{
    Capability, ConfiguracaoMultas, CreateMensalidadeRequest, GerarMensalidadesRequest,
    GerarResponse, ListResponse, MensalidadeQuery, MensalidadeResponse, MensalidadeStatus,
    PagarMensalidadeRequest, Role, service,
};
use dsicola_core::finance::{
    Encargos, calcular_encargos, check_cancelamento, check_pagamento, parse_referencia,
    status_efetivo, validate_valor, vencimento_para,
};

use super::auth::AuthUser;
use super::{ano_ativo, ensure_role, hoje, new_id, now_string};
use crate::error::ApiErr;
use crate::rows::{self, MensalidadeRow};
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt};

fn load_config(conn: &Connection, inst: &str) -> Result<ConfiguracaoMultas, ApiErr> {
    let cfg = sq_query_opt(conn, db::financeiro::get_config(inst), rows::configuracao)
        .map_err(ApiErr::from_db("load configuracao de multas"))?;
    Ok(cfg.unwrap_or_default())
}

fn load_mensalidade(conn: &Connection, inst: &str, id: &str) -> Result<MensalidadeRow, ApiErr> {
    sq_query_opt(conn, db::financeiro::get(inst, id), rows::mensalidade)
        .map_err(ApiErr::from_db("load mensalidade"))?
        .ok_or_else(|| ApiErr::not_found("mensalidade not found"))
}

/// Evaluate a stored row on `data`. Paid rows keep the charges frozen at
/// payment; cancelled rows carry none.
fn avaliar(m: MensalidadeRow, data: NaiveDate, cfg: &ConfiguracaoMultas) -> MensalidadeResponse {
    let status = status_efetivo(m.status, m.data_vencimento, data, cfg);
    let encargos = match m.status {
        MensalidadeStatus::Pago => {
            let pago_em = m
                .data_pagamento
                .as_deref()
                .and_then(|d| d.get(..10))
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
            Encargos {
                dias_atraso: pago_em
                    .map(|d| (d - m.data_vencimento).num_days().max(0))
                    .unwrap_or_default(),
                multa: m.multa,
                juros: m.juros,
            }
        }
        MensalidadeStatus::Cancelado => Encargos::default(),
        _ => calcular_encargos(m.valor, m.data_vencimento, data, cfg),
    };
    MensalidadeResponse {
        id: m.id,
        aluno_id: m.aluno_id,
        aluno_nome: m.aluno_nome,
        referencia: m.referencia,
        valor: m.valor,
        data_vencimento: service::format_date(m.data_vencimento),
        status,
        dias_atraso: encargos.dias_atraso,
        multa: encargos.multa,
        juros: encargos.juros,
        total: encargos.total(m.valor),
        valor_pago: m.valor_pago,
        data_pagamento: m.data_pagamento,
        metodo_pagamento: m.metodo_pagamento,
        created_at: m.created_at,
    }
}

// ---------------------------------------------------------------------------
// Configuração de multas
// ---------------------------------------------------------------------------

/// The institution's policy, or the platform default when none was saved.
pub async fn get_configuracao(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ConfiguracaoMultas>, ApiErr> {
    if !user.role.allows(Capability::ManageFinance) {
        user.require(Capability::ViewReports)?;
    }
    let inst = user.tenant()?;
    let conn = db.conn();
    Ok(Json(load_config(&conn, inst)?))
}

pub async fn update_configuracao(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<ConfiguracaoMultas>,
) -> Result<Json<ConfiguracaoMultas>, ApiErr> {
    user.require(Capability::ManageFinance)?;
    let inst = user.tenant()?;
    req.validate()?;

    let now = now_string()?;
    let conn = db.conn();
    sq_execute(
        &conn,
        db::financeiro::upsert_config(
            inst,
            req.percentual_multa,
            req.percentual_juros_dia,
            req.dias_tolerancia,
            &now,
        ),
    )
    .map_err(ApiErr::from_db("save configuracao de multas"))?;

    tracing::info!(
        instituicao_id = %inst,
        percentual_multa = req.percentual_multa,
        percentual_juros_dia = req.percentual_juros_dia,
        dias_tolerancia = req.dias_tolerancia,
        "late-fee policy updated"
    );
    Ok(Json(load_config(&conn, inst)?))
}

// ---------------------------------------------------------------------------
// Mensalidades
// ---------------------------------------------------------------------------

pub async fn create_mensalidade(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateMensalidadeRequest>,
) -> Result<(StatusCode, Json<MensalidadeResponse>), ApiErr> {
    user.require(Capability::ManageFinance)?;
    let inst = user.tenant()?;
    let referencia = req.referencia.trim();
    parse_referencia(referencia)?;
    let valor = validate_valor("valor", req.valor)?;
    let vencimento = service::parse_date("data_vencimento", &req.data_vencimento)?;

    let conn = db.conn();
    ensure_role(&conn, inst, &req.aluno_id, Role::Aluno)?;

    let id = new_id();
    let inserted = sq_execute(
        &conn,
        db::financeiro::insert(
            inst,
            &id,
            &req.aluno_id,
            referencia,
            valor,
            &service::format_date(vencimento),
        ),
    )
    .map_err(ApiErr::from_db("insert mensalidade"))?;
    if inserted == 0 {
        return Err(ApiErr::conflict(format!(
            "student already has a mensalidade for {referencia}"
        )));
    }

    let cfg = load_config(&conn, inst)?;
    let created = load_mensalidade(&conn, inst, &id)?;
    Ok((StatusCode::CREATED, Json(avaliar(created, hoje(), &cfg))))
}

/// Students see only their own. The status filter matches the effective
/// status, so `ATRASADO` works even though it is never stored.
pub async fn list_mensalidades(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<MensalidadeQuery>,
) -> Result<Json<ListResponse<MensalidadeResponse>>, ApiErr> {
    let inst = user.tenant()?;
    let aluno_id = if user.is(Role::Aluno) {
        Some(user.user_id.as_str())
    } else {
        user.require(Capability::ManageFinance)?;
        q.aluno_id.as_deref()
    };

    let conn = db.conn();
    let cfg = load_config(&conn, inst)?;
    let stored = sq_query_map(
        &conn,
        db::financeiro::list(inst, aluno_id, q.referencia.as_deref()),
        rows::mensalidade,
    )
    .map_err(ApiErr::from_db("list mensalidades"))?;

    let data = hoje();
    let items = stored
        .into_iter()
        .map(|m| avaliar(m, data, &cfg))
        .filter(|m| q.status.is_none_or(|s| s == m.status))
        .collect::<Vec<_>>();
    Ok(Json(items.into()))
}

/// Create one mensalidade per student actively enrolled in the current
/// year. Students already billed for the referência are skipped.
pub async fn gerar_mensalidades(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<GerarMensalidadesRequest>,
) -> Result<Json<GerarResponse>, ApiErr> {
    user.require(Capability::ManageFinance)?;
    let inst = user.tenant()?;
    let referencia = req.referencia.trim();
    let vencimento = vencimento_para(referencia, req.dia_vencimento)?;
    let valor = validate_valor("valor", req.valor)?;

    let mut conn = db.conn();
    let ano = ano_ativo(&conn, inst)?
        .ok_or_else(|| ApiErr::conflict("no active ano letivo"))?;
    let alunos = sq_query_map(&conn, db::matriculas::alunos_ativos(inst, &ano.id), |row| {
        row.get::<_, String>(0)
    })
    .map_err(ApiErr::from_db("list enrolled students"))?;

    let vencimento = service::format_date(vencimento);
    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin transaction"))?;
    let mut criadas = 0;
    for aluno in &alunos {
        criadas += sq_execute(
            &tx,
            db::financeiro::insert(inst, &new_id(), aluno, referencia, valor, &vencimento),
        )
        .map_err(ApiErr::from_db("insert mensalidade"))?;
    }
    tx.commit().map_err(ApiErr::from_db("commit mensalidades"))?;

    let ignoradas = alunos.len() - criadas;
    tracing::info!(
        instituicao_id = %inst,
        referencia,
        criadas,
        ignoradas,
        "mensalidades generated"
    );
    Ok(Json(GerarResponse { criadas, ignoradas }))
}

pub async fn pagar_mensalidade(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<PagarMensalidadeRequest>,
) -> Result<Json<MensalidadeResponse>, ApiErr> {
    user.require(Capability::ManageFinance)?;
    let inst = user.tenant()?;
    let valor_pago = validate_valor("valor", req.valor)?;

    let conn = db.conn();
    let cfg = load_config(&conn, inst)?;
    let m = load_mensalidade(&conn, inst, &id)?;
    let data = hoje();
    let encargos = calcular_encargos(m.valor, m.data_vencimento, data, &cfg);
    check_pagamento(
        status_efetivo(m.status, m.data_vencimento, data, &cfg),
        encargos.total(m.valor),
        valor_pago,
    )?;

    let now = now_string()?;
    sq_execute(
        &conn,
        db::financeiro::pagar(
            inst,
            &id,
            &db::financeiro::Pagamento {
                multa: encargos.multa,
                juros: encargos.juros,
                valor_pago,
                data_pagamento: &now,
                metodo_pagamento: req.metodo_pagamento.as_str(),
            },
        ),
    )
    .map_err(ApiErr::from_db("register payment"))?;

    tracing::info!(
        mensalidade_id = %id,
        valor_pago,
        multa = encargos.multa,
        juros = encargos.juros,
        metodo = %req.metodo_pagamento,
        "mensalidade paid"
    );
    let paga = load_mensalidade(&conn, inst, &id)?;
    Ok(Json(avaliar(paga, data, &cfg)))
}

pub async fn cancelar_mensalidade(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MensalidadeResponse>, ApiErr> {
    user.require(Capability::ManageFinance)?;
    let inst = user.tenant()?;

    let conn = db.conn();
    let m = load_mensalidade(&conn, inst, &id)?;
    check_cancelamento(m.status)?;
    sq_execute(
        &conn,
        db::financeiro::set_status(inst, &id, MensalidadeStatus::Cancelado.as_str()),
    )
    .map_err(ApiErr::from_db("cancel mensalidade"))?;

    tracing::info!(mensalidade_id = %id, "mensalidade cancelled");
    let cfg = load_config(&conn, inst)?;
    let cancelada = load_mensalidade(&conn, inst, &id)?;
    Ok(Json(avaliar(cancelada, hoje(), &cfg)))
}
