//! Official reports: the student report card (boletim) and the grade sheet
//! of one disciplina in one turma (pauta).
//!
//! Both are computed on read from grades and attendance. A situação other
//! than `EM_CURSO` only appears once the year is closed.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rusqlite::{Connection, Row};

use dsicola_api::db;
use dsicola_api::{
    AnoLetivoResponse, AnoLetivoStatus, BoletimLinha, BoletimQuery, BoletimResponse, Capability,
    MediaPeriodoResponse, PautaLinha, PautaResponse, Periodo, Role,
};
use dsicola_core::academic::Calendario;
use dsicola_core::grading::{self, NotaLancada, ResultadoDisciplina, Situacao};

use super::aulas::frequencias;
use super::auth::AuthUser;
use super::{ano_ativo, ensure_role, load_ano, load_calendario, load_plano};
use crate::error::ApiErr;
use crate::rows;
use crate::storage::{Db, sq_query_map, sq_query_opt};

fn ano_encerrado(ano: &AnoLetivoResponse, calendario: &Calendario) -> bool {
    ano.status == AnoLetivoStatus::Encerrado || calendario.is_closed(Periodo::Ano)
}

/// Row of `notas_do_plano` keyed by student.
fn nota_lancada(row: &Row<'_>) -> rusqlite::Result<(String, NotaLancada)> {
    Ok((
        row.get(0)?,
        NotaLancada {
            periodo: rows::enum_col(row, 1)?,
            tipo: rows::enum_col(row, 2)?,
            peso: row.get(3)?,
            valor: row.get(4)?,
        },
    ))
}

fn notas_por_aluno(
    conn: &Connection,
    inst: &str,
    plano_id: &str,
    aluno_id: Option<&str>,
) -> Result<HashMap<String, Vec<NotaLancada>>, ApiErr> {
    let notas = sq_query_map(
        conn,
        db::relatorios::notas_do_plano(inst, plano_id, aluno_id),
        nota_lancada,
    )
    .map_err(ApiErr::from_db("load notas"))?;
    let mut por_aluno: HashMap<String, Vec<NotaLancada>> = HashMap::new();
    for (aluno, nota) in notas {
        por_aluno.entry(aluno).or_default().push(nota);
    }
    Ok(por_aluno)
}

fn medias(r: &ResultadoDisciplina) -> Vec<MediaPeriodoResponse> {
    r.medias
        .iter()
        .map(|m| MediaPeriodoResponse {
            periodo: m.periodo,
            media: m.media,
        })
        .collect()
}

/// Report card of one student for one year (the active one by default).
/// Students may only read their own.
pub async fn boletim(
    State(db): State<Db>,
    user: AuthUser,
    Path(aluno_id): Path<String>,
    Query(q): Query<BoletimQuery>,
) -> Result<Json<BoletimResponse>, ApiErr> {
    if user.is(Role::Aluno) {
        if aluno_id != user.user_id {
            return Err(ApiErr::forbidden("students can only read their own boletim"));
        }
    } else {
        user.require(Capability::ViewReports)?;
    }
    let inst = user.tenant()?;

    let conn = db.conn();
    ensure_role(&conn, inst, &aluno_id, Role::Aluno)?;
    let aluno = sq_query_opt(&conn, db::users::get_in_tenant(inst, &aluno_id), rows::user)
        .map_err(ApiErr::from_db("load aluno"))?
        .ok_or_else(|| ApiErr::not_found("user not found"))?;
    let instituicao = sq_query_opt(&conn, db::instituicoes::get_by_id(inst), rows::instituicao)
        .map_err(ApiErr::from_db("load instituicao"))?
        .ok_or_else(|| ApiErr::not_found("institution not found"))?;
    let ano = match &q.ano_letivo_id {
        Some(id) => load_ano(&conn, inst, id)?,
        None => ano_ativo(&conn, inst)?
            .ok_or_else(|| ApiErr::not_found("no active ano letivo"))?,
    };
    let calendario = load_calendario(&conn, inst, &ano)?;
    let encerrado = ano_encerrado(&ano, &calendario);

    let planos = sq_query_map(
        &conn,
        db::relatorios::planos_do_aluno(inst, &aluno_id, &ano.id),
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    )
    .map_err(ApiErr::from_db("list planos do aluno"))?;

    let mut disciplinas = Vec::with_capacity(planos.len());
    for (plano_id, disciplina_id, disciplina_nome, turma_id) in planos {
        let notas = notas_por_aluno(&conn, inst, &plano_id, Some(&aluno_id))?
            .remove(&aluno_id)
            .unwrap_or_default();
        let r = grading::resultado(calendario.tipo(), &notas);
        let frequencia = frequencias(&conn, inst, &plano_id, Some(&aluno_id))?
            .get(&aluno_id)
            .and_then(|f| f.frequencia());
        disciplinas.push(BoletimLinha {
            medias: medias(&r),
            situacao: grading::situacao(r.media_final, frequencia, encerrado),
            plano_id,
            disciplina_id,
            disciplina_nome,
            turma_id,
            exame: r.exame,
            recurso: r.recurso,
            media_final: r.media_final,
            frequencia,
        });
    }
    let media_geral = grading::media_geral(disciplinas.iter().map(|d| d.media_final));

    Ok(Json(BoletimResponse {
        instituicao: instituicao.nome,
        aluno_id,
        aluno_nome: aluno.nome,
        ano_letivo_id: ano.id,
        ano: ano.ano,
        disciplinas,
        media_geral,
    }))
}

/// Grade sheet of a plan: every student actively enrolled in its turma.
pub async fn pauta(
    State(db): State<Db>,
    user: AuthUser,
    Path(plano_id): Path<String>,
) -> Result<Json<PautaResponse>, ApiErr> {
    user.require(Capability::ViewReports)?;
    let inst = user.tenant()?;

    let conn = db.conn();
    let plano = load_plano(&conn, inst, &plano_id)?;
    if user.is(Role::Professor) && plano.professor_id != user.user_id {
        return Err(ApiErr::forbidden("plano de ensino belongs to another professor"));
    }
    let (turma_id, turma_nome, disciplina_nome) = sq_query_opt(
        &conn,
        db::relatorios::cabecalho_pauta(inst, &plano.id),
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)),
    )
    .map_err(ApiErr::from_db("load pauta header"))?
    .ok_or_else(|| ApiErr::not_found("plano de ensino not found"))?;

    let ano = load_ano(&conn, inst, &plano.ano_letivo_id)?;
    let calendario = load_calendario(&conn, inst, &ano)?;
    let encerrado = ano_encerrado(&ano, &calendario);

    let alunos = sq_query_map(&conn, db::turmas::list_alunos(inst, &turma_id), rows::aluno_turma)
        .map_err(ApiErr::from_db("list alunos da turma"))?;
    let mut notas = notas_por_aluno(&conn, inst, &plano.id, None)?;
    let presencas = frequencias(&conn, inst, &plano.id, None)?;

    let linhas = alunos
        .into_iter()
        .map(|a| {
            let r = grading::resultado(
                calendario.tipo(),
                &notas.remove(&a.aluno_id).unwrap_or_default(),
            );
            let frequencia = presencas.get(&a.aluno_id).and_then(|f| f.frequencia());
            PautaLinha {
                medias: medias(&r),
                situacao: grading::situacao(r.media_final, frequencia, encerrado),
                aluno_id: a.aluno_id,
                aluno_nome: a.nome,
                exame: r.exame,
                recurso: r.recurso,
                media_final: r.media_final,
                frequencia,
            }
        })
        .collect::<Vec<_>>();

    let aprovados = linhas
        .iter()
        .filter(|l| l.situacao == Situacao::Aprovado)
        .count();
    tracing::debug!(plano_id = %plano.id, alunos = linhas.len(), aprovados, "pauta computed");
    Ok(Json(PautaResponse {
        plano_id: plano.id,
        turma_id,
        turma_nome,
        disciplina_nome,
        linhas,
    }))
}
