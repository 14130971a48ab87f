//! Compile-time–checked column identifiers for all tables.

use sea_query::Iden;

#[derive(Iden)]
pub enum Instituicoes {
    Table,
    Id,
    Nome,
    Sigla,
    TipoAcademico,
    Email,
    Telefone,
    Endereco,
    Ativo,
    CreatedAt,
}

#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    InstituicaoId,
    Email,
    Nome,
    Role,
    PasswordHash,
    NumeroIdentificacao,
    Telefone,
    Ativo,
    MustChangePassword,
    CreatedAt,
}

#[derive(Iden)]
pub enum RefreshTokens {
    Table,
    Id,
    UserId,
    TokenHash,
    ExpiresAt,
    CreatedAt,
}

#[derive(Iden)]
pub enum AnosLetivos {
    Table,
    Id,
    InstituicaoId,
    Ano,
    DataInicio,
    DataFim,
    Status,
    CreatedAt,
}

#[derive(Iden)]
pub enum Encerramentos {
    Table,
    Id,
    InstituicaoId,
    AnoLetivoId,
    Periodo,
    Status,
    EncerradoPor,
    EncerradoEm,
    JustificativaReabertura,
    ReabertoPor,
    ReabertoEm,
}

#[derive(Iden)]
pub enum Classes {
    Table,
    Id,
    InstituicaoId,
    Nome,
    Nivel,
    CreatedAt,
}

#[derive(Iden)]
pub enum Cursos {
    Table,
    Id,
    InstituicaoId,
    Nome,
    Codigo,
    DuracaoAnos,
    CreatedAt,
}

#[derive(Iden)]
pub enum Disciplinas {
    Table,
    Id,
    InstituicaoId,
    Nome,
    Codigo,
    CargaHoraria,
    ClasseId,
    CursoId,
    CreatedAt,
}

#[derive(Iden)]
pub enum Turmas {
    Table,
    Id,
    InstituicaoId,
    AnoLetivoId,
    Nome,
    ClasseId,
    CursoId,
    Turno,
    Capacidade,
    CreatedAt,
}

#[derive(Iden)]
pub enum MatriculasAnuais {
    Table,
    Id,
    InstituicaoId,
    AlunoId,
    AnoLetivoId,
    ClasseId,
    CursoId,
    Status,
    CreatedAt,
}

#[derive(Iden)]
pub enum Matriculas {
    Table,
    Id,
    InstituicaoId,
    AlunoId,
    TurmaId,
    MatriculaAnualId,
    Status,
    CreatedAt,
}

#[derive(Iden)]
pub enum PlanosEnsino {
    Table,
    Id,
    InstituicaoId,
    ProfessorId,
    DisciplinaId,
    TurmaId,
    AnoLetivoId,
    Ementa,
    Objetivos,
    Metodologia,
    CargaHorariaTotal,
    Status,
    Observacao,
    AprovadoPor,
    AprovadoEm,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum PlanoAulas {
    Table,
    Id,
    InstituicaoId,
    PlanoId,
    Ordem,
    Titulo,
    Descricao,
    Periodo,
    QuantidadeAulas,
}

#[derive(Iden)]
pub enum Avaliacoes {
    Table,
    Id,
    InstituicaoId,
    PlanoId,
    Periodo,
    Tipo,
    Descricao,
    Peso,
    Data,
    CreatedAt,
}

#[derive(Iden)]
pub enum Notas {
    Table,
    Id,
    InstituicaoId,
    AvaliacaoId,
    AlunoId,
    Valor,
    Observacao,
    LancadoPor,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Aulas {
    Table,
    Id,
    InstituicaoId,
    PlanoId,
    Data,
    Periodo,
    Conteudo,
    Quantidade,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
pub enum Presencas {
    Table,
    Id,
    InstituicaoId,
    AulaId,
    AlunoId,
    Status,
    Observacao,
}

#[derive(Iden)]
pub enum ConfiguracaoMultas {
    Table,
    InstituicaoId,
    PercentualMulta,
    PercentualJurosDia,
    DiasTolerancia,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Mensalidades {
    Table,
    Id,
    InstituicaoId,
    AlunoId,
    Referencia,
    Valor,
    DataVencimento,
    Status,
    Multa,
    Juros,
    ValorPago,
    DataPagamento,
    MetodoPagamento,
    CreatedAt,
}

#[derive(Iden)]
pub enum Funcionarios {
    Table,
    Id,
    InstituicaoId,
    UserId,
    Nome,
    Cargo,
    Departamento,
    SalarioBase,
    DataAdmissao,
    Status,
    CreatedAt,
}

#[derive(Iden)]
pub enum HistoricoRh {
    Table,
    Id,
    InstituicaoId,
    FuncionarioId,
    TipoAlteracao,
    Descricao,
    ValorAnterior,
    ValorNovo,
    RegistradoPor,
    CreatedAt,
}

#[derive(Iden)]
pub enum FolhasPagamento {
    Table,
    Id,
    InstituicaoId,
    FuncionarioId,
    Referencia,
    SalarioBase,
    Subsidios,
    Descontos,
    DescontoFaltas,
    Inss,
    ValorLiquido,
    Status,
    PagoEm,
    CreatedAt,
}

#[derive(Iden)]
pub enum BibliotecaItens {
    Table,
    Id,
    InstituicaoId,
    Titulo,
    Autor,
    Isbn,
    Categoria,
    QuantidadeTotal,
    CreatedAt,
}

#[derive(Iden)]
pub enum Emprestimos {
    Table,
    Id,
    InstituicaoId,
    ItemId,
    UsuarioId,
    DataEmprestimo,
    DataPrevistaDevolucao,
    DataDevolucao,
    Status,
}

#[derive(Iden)]
pub enum Documentos {
    Table,
    Id,
    InstituicaoId,
    AlunoId,
    Tipo,
    Ano,
    Sequencia,
    Numero,
    EmitidoPor,
    CreatedAt,
}
