//! Row mappers matching the column orders of `dsicola_api::db` builders.

use chrono::NaiveDate;
use rusqlite::{Row, types::Type};
use std::str::FromStr;

use dsicola_api::*;

fn conversion(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

/// Read a text column holding one of the upper-case domain enums.
pub fn enum_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = RuleError>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion(idx, e))
}

fn opt_enum_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = RuleError>,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| s.parse().map_err(|e| conversion(idx, e)))
        .transpose()
}

pub fn date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| conversion(idx, e))
}

pub fn instituicao(row: &Row<'_>) -> rusqlite::Result<InstituicaoResponse> {
    Ok(InstituicaoResponse {
        id: row.get(0)?,
        nome: row.get(1)?,
        sigla: row.get(2)?,
        tipo_academico: enum_col(row, 3)?,
        email: row.get(4)?,
        telefone: row.get(5)?,
        endereco: row.get(6)?,
        ativo: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn user(row: &Row<'_>) -> rusqlite::Result<UserResponse> {
    Ok(UserResponse {
        id: row.get(0)?,
        instituicao_id: row.get(1)?,
        email: row.get(2)?,
        nome: row.get(3)?,
        role: enum_col(row, 4)?,
        numero_identificacao: row.get(5)?,
        telefone: row.get(6)?,
        ativo: row.get(7)?,
        must_change_password: row.get(8)?,
        created_at: row.get(9)?,
    })
}

pub fn ano_letivo(row: &Row<'_>) -> rusqlite::Result<AnoLetivoResponse> {
    Ok(AnoLetivoResponse {
        id: row.get(0)?,
        ano: row.get(1)?,
        data_inicio: row.get(2)?,
        data_fim: row.get(3)?,
        status: enum_col(row, 4)?,
        created_at: row.get(5)?,
    })
}

pub fn encerramento(row: &Row<'_>) -> rusqlite::Result<EncerramentoResponse> {
    Ok(EncerramentoResponse {
        id: row.get(0)?,
        ano_letivo_id: row.get(1)?,
        periodo: enum_col(row, 2)?,
        status: enum_col(row, 3)?,
        encerrado_por: row.get(4)?,
        encerrado_em: row.get(5)?,
        justificativa_reabertura: row.get(6)?,
        reaberto_por: row.get(7)?,
        reaberto_em: row.get(8)?,
    })
}

pub fn classe(row: &Row<'_>) -> rusqlite::Result<ClasseResponse> {
    Ok(ClasseResponse {
        id: row.get(0)?,
        nome: row.get(1)?,
        nivel: row.get(2)?,
    })
}

pub fn curso(row: &Row<'_>) -> rusqlite::Result<CursoResponse> {
    Ok(CursoResponse {
        id: row.get(0)?,
        nome: row.get(1)?,
        codigo: row.get(2)?,
        duracao_anos: row.get(3)?,
    })
}

pub fn disciplina(row: &Row<'_>) -> rusqlite::Result<DisciplinaResponse> {
    Ok(DisciplinaResponse {
        id: row.get(0)?,
        nome: row.get(1)?,
        codigo: row.get(2)?,
        carga_horaria: row.get(3)?,
        classe_id: row.get(4)?,
        curso_id: row.get(5)?,
    })
}

pub fn turma(row: &Row<'_>) -> rusqlite::Result<TurmaResponse> {
    Ok(TurmaResponse {
        id: row.get(0)?,
        nome: row.get(1)?,
        ano_letivo_id: row.get(2)?,
        classe_id: row.get(3)?,
        curso_id: row.get(4)?,
        turno: enum_col(row, 5)?,
        capacidade: row.get(6)?,
        ocupadas: row.get(7)?,
    })
}

pub fn aluno_turma(row: &Row<'_>) -> rusqlite::Result<AlunoTurmaResponse> {
    Ok(AlunoTurmaResponse {
        matricula_id: row.get(0)?,
        aluno_id: row.get(1)?,
        nome: row.get(2)?,
        numero_identificacao: row.get(3)?,
        status: enum_col(row, 4)?,
    })
}

pub fn matricula_anual(row: &Row<'_>) -> rusqlite::Result<MatriculaAnualResponse> {
    Ok(MatriculaAnualResponse {
        id: row.get(0)?,
        aluno_id: row.get(1)?,
        aluno_nome: row.get(2)?,
        ano_letivo_id: row.get(3)?,
        classe_id: row.get(4)?,
        curso_id: row.get(5)?,
        status: enum_col(row, 6)?,
        created_at: row.get(7)?,
    })
}

pub fn matricula(row: &Row<'_>) -> rusqlite::Result<MatriculaResponse> {
    Ok(MatriculaResponse {
        id: row.get(0)?,
        aluno_id: row.get(1)?,
        turma_id: row.get(2)?,
        matricula_anual_id: row.get(3)?,
        status: enum_col(row, 4)?,
        created_at: row.get(5)?,
    })
}

pub fn plano(row: &Row<'_>) -> rusqlite::Result<PlanoResponse> {
    Ok(PlanoResponse {
        id: row.get(0)?,
        professor_id: row.get(1)?,
        disciplina_id: row.get(2)?,
        turma_id: row.get(3)?,
        ano_letivo_id: row.get(4)?,
        ementa: row.get(5)?,
        objetivos: row.get(6)?,
        metodologia: row.get(7)?,
        carga_horaria_total: row.get(8)?,
        status: enum_col(row, 9)?,
        observacao: row.get(10)?,
        aprovado_por: row.get(11)?,
        aprovado_em: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

pub fn plano_aula(row: &Row<'_>) -> rusqlite::Result<PlanoAulaResponse> {
    Ok(PlanoAulaResponse {
        id: row.get(0)?,
        ordem: row.get(1)?,
        titulo: row.get(2)?,
        descricao: row.get(3)?,
        periodo: enum_col(row, 4)?,
        quantidade_aulas: row.get(5)?,
    })
}

pub fn avaliacao(row: &Row<'_>) -> rusqlite::Result<AvaliacaoResponse> {
    Ok(AvaliacaoResponse {
        id: row.get(0)?,
        plano_id: row.get(1)?,
        periodo: enum_col(row, 2)?,
        tipo: enum_col(row, 3)?,
        descricao: row.get(4)?,
        peso: row.get(5)?,
        data: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub fn nota(row: &Row<'_>) -> rusqlite::Result<NotaResponse> {
    Ok(NotaResponse {
        id: row.get(0)?,
        avaliacao_id: row.get(1)?,
        aluno_id: row.get(2)?,
        aluno_nome: row.get(3)?,
        valor: row.get(4)?,
        observacao: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub fn aula(row: &Row<'_>) -> rusqlite::Result<AulaResponse> {
    Ok(AulaResponse {
        id: row.get(0)?,
        plano_id: row.get(1)?,
        data: row.get(2)?,
        periodo: enum_col(row, 3)?,
        conteudo: row.get(4)?,
        quantidade: row.get(5)?,
        created_by: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub fn presenca(row: &Row<'_>) -> rusqlite::Result<PresencaResponse> {
    Ok(PresencaResponse {
        aluno_id: row.get(0)?,
        aluno_nome: row.get(1)?,
        status: enum_col(row, 2)?,
        observacao: row.get(3)?,
    })
}

/// A stored mensalidade before charges are evaluated.
pub struct MensalidadeRow {
    pub id: String,
    pub aluno_id: String,
    pub aluno_nome: String,
    pub referencia: String,
    pub valor: i64,
    pub data_vencimento: NaiveDate,
    pub status: MensalidadeStatus,
    pub multa: i64,
    pub juros: i64,
    pub valor_pago: Option<i64>,
    pub data_pagamento: Option<String>,
    pub metodo_pagamento: Option<MetodoPagamento>,
    pub created_at: String,
}

pub fn mensalidade(row: &Row<'_>) -> rusqlite::Result<MensalidadeRow> {
    Ok(MensalidadeRow {
        id: row.get(0)?,
        aluno_id: row.get(1)?,
        aluno_nome: row.get(2)?,
        referencia: row.get(3)?,
        valor: row.get(4)?,
        data_vencimento: date_col(row, 5)?,
        status: enum_col(row, 6)?,
        multa: row.get(7)?,
        juros: row.get(8)?,
        valor_pago: row.get(9)?,
        data_pagamento: row.get(10)?,
        metodo_pagamento: opt_enum_col(row, 11)?,
        created_at: row.get(12)?,
    })
}

pub fn configuracao(row: &Row<'_>) -> rusqlite::Result<ConfiguracaoMultas> {
    Ok(ConfiguracaoMultas {
        percentual_multa: row.get(0)?,
        percentual_juros_dia: row.get(1)?,
        dias_tolerancia: row.get(2)?,
    })
}

pub fn funcionario(row: &Row<'_>) -> rusqlite::Result<FuncionarioResponse> {
    Ok(FuncionarioResponse {
        id: row.get(0)?,
        user_id: row.get(1)?,
        nome: row.get(2)?,
        cargo: row.get(3)?,
        departamento: row.get(4)?,
        salario_base: row.get(5)?,
        data_admissao: row.get(6)?,
        status: enum_col(row, 7)?,
        created_at: row.get(8)?,
    })
}

pub fn historico(row: &Row<'_>) -> rusqlite::Result<HistoricoRhResponse> {
    Ok(HistoricoRhResponse {
        id: row.get(0)?,
        funcionario_id: row.get(1)?,
        tipo_alteracao: enum_col(row, 2)?,
        descricao: row.get(3)?,
        valor_anterior: row.get(4)?,
        valor_novo: row.get(5)?,
        registrado_por: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub fn folha(row: &Row<'_>) -> rusqlite::Result<FolhaResponse> {
    Ok(FolhaResponse {
        id: row.get(0)?,
        funcionario_id: row.get(1)?,
        funcionario_nome: row.get(2)?,
        referencia: row.get(3)?,
        salario_base: row.get(4)?,
        subsidios: row.get(5)?,
        descontos: row.get(6)?,
        desconto_faltas: row.get(7)?,
        inss: row.get(8)?,
        valor_liquido: row.get(9)?,
        status: enum_col(row, 10)?,
        pago_em: row.get(11)?,
    })
}

pub fn item(row: &Row<'_>) -> rusqlite::Result<ItemResponse> {
    let quantidade_total: i64 = row.get(5)?;
    let emprestados: i64 = row.get(6)?;
    Ok(ItemResponse {
        id: row.get(0)?,
        titulo: row.get(1)?,
        autor: row.get(2)?,
        isbn: row.get(3)?,
        categoria: row.get(4)?,
        quantidade_total,
        disponiveis: (quantidade_total - emprestados).max(0),
    })
}

/// `hoje` decides the derived `atrasado` flag.
pub fn emprestimo(row: &Row<'_>, hoje: NaiveDate) -> rusqlite::Result<EmprestimoResponse> {
    let status: EmprestimoStatus = enum_col(row, 7)?;
    let prevista = date_col(row, 5)?;
    Ok(EmprestimoResponse {
        id: row.get(0)?,
        item_id: row.get(1)?,
        item_titulo: row.get(2)?,
        usuario_id: row.get(3)?,
        data_emprestimo: row.get(4)?,
        data_prevista_devolucao: row.get(5)?,
        data_devolucao: row.get(6)?,
        status,
        atrasado: dsicola_core::library::atrasado(status, prevista, hoje),
    })
}

pub fn documento(row: &Row<'_>) -> rusqlite::Result<DocumentoResponse> {
    Ok(DocumentoResponse {
        id: row.get(0)?,
        aluno_id: row.get(1)?,
        tipo: enum_col(row, 2)?,
        numero: row.get(3)?,
        emitido_por: row.get(4)?,
        created_at: row.get(5)?,
    })
}
