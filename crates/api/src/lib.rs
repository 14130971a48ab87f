//! Shared API types, crypto, and SQL builders for DSICOLA.
//!
//! This crate is the **single source of truth** for all API request/response
//! types. Dates travel as `YYYY-MM-DD` strings, timestamps as SQLite
//! `YYYY-MM-DD HH:MM:SS` strings and money as integer centavos.

use serde::{Deserialize, Serialize};

#[cfg(feature = "backend")]
pub mod crypto;
#[cfg(feature = "backend")]
pub mod db;
pub mod deploy;
#[cfg(feature = "backend")]
pub mod service;

pub use dsicola_core::academic::{
    AnoLetivoStatus, EncerramentoStatus, Periodo, TipoAcademico, Turno,
};
pub use dsicola_core::access::{Capability, Role};
pub use dsicola_core::attendance::PresencaStatus;
pub use dsicola_core::documents::TipoDocumento;
pub use dsicola_core::enrollment::{MatriculaAnualStatus, MatriculaStatus};
pub use dsicola_core::finance::{ConfiguracaoMultas, MensalidadeStatus, MetodoPagamento};
pub use dsicola_core::grading::{Situacao, TipoAvaliacao};
pub use dsicola_core::library::EmprestimoStatus;
pub use dsicola_core::payroll::{
    FolhaStatus, FuncionarioStatus, LancamentoFolha, TipoAlteracao,
};
pub use dsicola_core::plano::PlanoStatus;
pub use dsicola_core::RuleError;

// ─── Common ──────────────────────────────────────────────────────────────────

/// Generic success response for operations that don't return data.
#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Envelope for every list endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

/// Body of `PUT .../ativo` toggles.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetAtivoRequest {
    pub ativo: bool,
}

/// Returned by `GET /api/health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ─── Auth ────────────────────────────────────────────────────────────────────

/// Email + password login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned on successful login / refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user_id: String,
    pub nome: String,
    pub role: Role,
    pub instituicao_id: Option<String>,
    pub must_change_password: bool,
}

/// Refresh token request.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Logout request (invalidate refresh token).
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// Change password request (redefinir senha).
#[derive(Debug, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// Account as returned by user endpoints and `GET /api/auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub instituicao_id: Option<String>,
    pub email: String,
    pub nome: String,
    pub role: Role,
    pub numero_identificacao: Option<String>,
    pub telefone: Option<String>,
    pub ativo: bool,
    pub must_change_password: bool,
    pub created_at: String,
}

/// `POST /api/users` creates an aluno, professor or staff account.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub nome: String,
    pub role: Role,
    pub password: String,
    #[serde(default)]
    pub numero_identificacao: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<Role>,
}

// ─── Instituições ────────────────────────────────────────────────────────────

/// First administrator created together with an institution.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminInicial {
    pub email: String,
    pub nome: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInstituicaoRequest {
    pub nome: String,
    pub sigla: String,
    pub tipo_academico: TipoAcademico,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub endereco: Option<String>,
    pub admin: AdminInicial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstituicaoResponse {
    pub id: String,
    pub nome: String,
    pub sigla: String,
    pub tipo_academico: TipoAcademico,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub endereco: Option<String>,
    pub ativo: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInstituicaoResponse {
    pub instituicao: InstituicaoResponse,
    pub admin: UserResponse,
}

// ─── Calendário ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAnoLetivoRequest {
    pub ano: i32,
    pub data_inicio: String,
    pub data_fim: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnoLetivoResponse {
    pub id: String,
    pub ano: i32,
    pub data_inicio: String,
    pub data_fim: String,
    pub status: AnoLetivoStatus,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PeriodoEstado {
    pub periodo: Periodo,
    pub encerrado: bool,
}

/// `GET /api/anos-letivos/:id/periodos`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PeriodosResponse {
    pub ano_letivo_id: String,
    pub tipo_academico: TipoAcademico,
    pub status: AnoLetivoStatus,
    pub periodos: Vec<PeriodoEstado>,
}

// ─── Estrutura ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateClasseRequest {
    pub nome: String,
    pub nivel: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClasseResponse {
    pub id: String,
    pub nome: String,
    pub nivel: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCursoRequest {
    pub nome: String,
    pub codigo: String,
    pub duracao_anos: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CursoResponse {
    pub id: String,
    pub nome: String,
    pub codigo: String,
    pub duracao_anos: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateDisciplinaRequest {
    pub nome: String,
    pub codigo: String,
    pub carga_horaria: i64,
    #[serde(default)]
    pub classe_id: Option<String>,
    #[serde(default)]
    pub curso_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DisciplinaResponse {
    pub id: String,
    pub nome: String,
    pub codigo: String,
    pub carga_horaria: i64,
    pub classe_id: Option<String>,
    pub curso_id: Option<String>,
}

// ─── Turmas ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTurmaRequest {
    pub nome: String,
    pub ano_letivo_id: String,
    #[serde(default)]
    pub classe_id: Option<String>,
    #[serde(default)]
    pub curso_id: Option<String>,
    pub turno: Turno,
    pub capacidade: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TurmaResponse {
    pub id: String,
    pub nome: String,
    pub ano_letivo_id: String,
    pub classe_id: Option<String>,
    pub curso_id: Option<String>,
    pub turno: Turno,
    pub capacidade: i64,
    /// Seats taken by active class enrollments.
    pub ocupadas: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct TurmaListQuery {
    pub ano_letivo_id: Option<String>,
}

/// A student enrolled in a turma.
#[derive(Debug, Serialize, Deserialize)]
pub struct AlunoTurmaResponse {
    pub matricula_id: String,
    pub aluno_id: String,
    pub nome: String,
    pub numero_identificacao: Option<String>,
    pub status: MatriculaStatus,
}

// ─── Matrículas ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateMatriculaAnualRequest {
    pub aluno_id: String,
    pub ano_letivo_id: String,
    #[serde(default)]
    pub classe_id: Option<String>,
    #[serde(default)]
    pub curso_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MatriculaAnualResponse {
    pub id: String,
    pub aluno_id: String,
    pub aluno_nome: String,
    pub ano_letivo_id: String,
    pub classe_id: Option<String>,
    pub curso_id: Option<String>,
    pub status: MatriculaAnualStatus,
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MatriculaAnualQuery {
    pub ano_letivo_id: Option<String>,
    pub aluno_id: Option<String>,
    pub status: Option<MatriculaAnualStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateMatriculaRequest {
    pub aluno_id: String,
    pub turma_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MatriculaResponse {
    pub id: String,
    pub aluno_id: String,
    pub turma_id: String,
    pub matricula_anual_id: String,
    pub status: MatriculaStatus,
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MatriculaQuery {
    pub turma_id: Option<String>,
    pub aluno_id: Option<String>,
}

// ─── Plano de ensino ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePlanoRequest {
    pub disciplina_id: String,
    pub turma_id: String,
    /// Required when an administrator creates the plan on a professor's behalf.
    #[serde(default)]
    pub professor_id: Option<String>,
    #[serde(default)]
    pub ementa: String,
    #[serde(default)]
    pub objetivos: String,
    #[serde(default)]
    pub metodologia: String,
    #[serde(default)]
    pub carga_horaria_total: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdatePlanoRequest {
    pub ementa: Option<String>,
    pub objetivos: Option<String>,
    pub metodologia: Option<String>,
    pub carga_horaria_total: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanoAulaRequest {
    pub titulo: String,
    #[serde(default)]
    pub descricao: Option<String>,
    pub periodo: Periodo,
    pub quantidade_aulas: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanoAulaResponse {
    pub id: String,
    pub ordem: i64,
    pub titulo: String,
    pub descricao: Option<String>,
    pub periodo: Periodo,
    pub quantidade_aulas: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanoResponse {
    pub id: String,
    pub professor_id: String,
    pub disciplina_id: String,
    pub turma_id: String,
    pub ano_letivo_id: String,
    pub ementa: String,
    pub objetivos: String,
    pub metodologia: String,
    pub carga_horaria_total: i64,
    pub status: PlanoStatus,
    /// Rejection reason of the last review.
    pub observacao: Option<String>,
    pub aprovado_por: Option<String>,
    pub aprovado_em: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanoDetailResponse {
    #[serde(flatten)]
    pub plano: PlanoResponse,
    pub aulas: Vec<PlanoAulaResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RejeitarPlanoRequest {
    pub motivo: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlanoListQuery {
    pub turma_id: Option<String>,
    pub professor_id: Option<String>,
    pub ano_letivo_id: Option<String>,
    pub status: Option<PlanoStatus>,
}

// ─── Avaliações e notas ──────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAvaliacaoRequest {
    pub plano_id: String,
    pub periodo: Periodo,
    pub tipo: TipoAvaliacao,
    pub descricao: String,
    #[serde(default)]
    pub peso: Option<f64>,
    pub data: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvaliacaoResponse {
    pub id: String,
    pub plano_id: String,
    pub periodo: Periodo,
    pub tipo: TipoAvaliacao,
    pub descricao: String,
    pub peso: f64,
    pub data: String,
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AvaliacaoListQuery {
    pub plano_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotaItem {
    pub aluno_id: String,
    pub valor: f64,
    #[serde(default)]
    pub observacao: Option<String>,
}

/// `POST /api/notas/avaliacao/lote`: all grades of one assessment.
#[derive(Debug, Serialize, Deserialize)]
pub struct NotaLoteRequest {
    pub avaliacao_id: String,
    pub notas: Vec<NotaItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotaLoteResponse {
    pub avaliacao_id: String,
    pub gravadas: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotaResponse {
    pub id: String,
    pub avaliacao_id: String,
    pub aluno_id: String,
    pub aluno_nome: String,
    pub valor: f64,
    pub observacao: Option<String>,
    pub updated_at: String,
}

// ─── Aulas e presenças ───────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAulaRequest {
    pub plano_id: String,
    pub data: String,
    pub periodo: Periodo,
    pub conteudo: String,
    #[serde(default)]
    pub quantidade: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AulaResponse {
    pub id: String,
    pub plano_id: String,
    pub data: String,
    pub periodo: Periodo,
    pub conteudo: String,
    pub quantidade: i64,
    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AulaListQuery {
    pub plano_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PresencaItem {
    pub aluno_id: String,
    pub status: PresencaStatus,
    #[serde(default)]
    pub observacao: Option<String>,
}

/// `POST /api/presencas`: attendance of one logged lesson.
#[derive(Debug, Serialize, Deserialize)]
pub struct PresencaLoteRequest {
    pub aula_id: String,
    pub presencas: Vec<PresencaItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PresencaLoteResponse {
    pub aula_id: String,
    pub gravadas: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PresencaResponse {
    pub aluno_id: String,
    pub aluno_nome: String,
    pub status: PresencaStatus,
    pub observacao: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResumoPresencaQuery {
    pub plano_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResumoPresencaResponse {
    pub aluno_id: String,
    pub aluno_nome: String,
    pub aulas: i64,
    pub presencas: i64,
    pub faltas: i64,
    pub justificadas: i64,
    pub frequencia: Option<f64>,
    pub abaixo_do_minimo: bool,
}

// ─── Encerramentos ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct EncerrarRequest {
    pub ano_letivo_id: String,
    pub periodo: Periodo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReabrirRequest {
    pub ano_letivo_id: String,
    pub periodo: Periodo,
    pub justificativa: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EncerramentoResponse {
    pub id: String,
    pub ano_letivo_id: String,
    pub periodo: Periodo,
    pub status: EncerramentoStatus,
    pub encerrado_por: String,
    pub encerrado_em: String,
    pub justificativa_reabertura: Option<String>,
    pub reaberto_por: Option<String>,
    pub reaberto_em: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EncerramentoQuery {
    pub ano_letivo_id: String,
}

// ─── Financeiro ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateMensalidadeRequest {
    pub aluno_id: String,
    pub referencia: String,
    /// Centavos.
    pub valor: i64,
    pub data_vencimento: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GerarMensalidadesRequest {
    pub referencia: String,
    /// Centavos.
    pub valor: i64,
    pub dia_vencimento: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GerarResponse {
    pub criadas: usize,
    pub ignoradas: usize,
}

/// A mensalidade with its charges evaluated today (or frozen at payment).
#[derive(Debug, Serialize, Deserialize)]
pub struct MensalidadeResponse {
    pub id: String,
    pub aluno_id: String,
    pub aluno_nome: String,
    pub referencia: String,
    pub valor: i64,
    pub data_vencimento: String,
    pub status: MensalidadeStatus,
    pub dias_atraso: i64,
    pub multa: i64,
    pub juros: i64,
    pub total: i64,
    pub valor_pago: Option<i64>,
    pub data_pagamento: Option<String>,
    pub metodo_pagamento: Option<MetodoPagamento>,
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MensalidadeQuery {
    pub aluno_id: Option<String>,
    pub status: Option<MensalidadeStatus>,
    pub referencia: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PagarMensalidadeRequest {
    /// Centavos.
    pub valor: i64,
    pub metodo_pagamento: MetodoPagamento,
}

// ─── RH ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateFuncionarioRequest {
    pub nome: String,
    pub cargo: String,
    pub departamento: String,
    /// Centavos.
    pub salario_base: i64,
    pub data_admissao: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateFuncionarioRequest {
    pub cargo: Option<String>,
    pub departamento: Option<String>,
    pub salario_base: Option<i64>,
    pub status: Option<FuncionarioStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FuncionarioQuery {
    pub status: Option<FuncionarioStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuncionarioResponse {
    pub id: String,
    pub user_id: Option<String>,
    pub nome: String,
    pub cargo: String,
    pub departamento: String,
    pub salario_base: i64,
    pub data_admissao: String,
    pub status: FuncionarioStatus,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateHistoricoRhRequest {
    pub funcionario_id: String,
    pub tipo_alteracao: TipoAlteracao,
    pub descricao: String,
    #[serde(default)]
    pub valor_anterior: Option<String>,
    #[serde(default)]
    pub valor_novo: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoricoRhResponse {
    pub id: String,
    pub funcionario_id: String,
    pub tipo_alteracao: TipoAlteracao,
    pub descricao: String,
    pub valor_anterior: Option<String>,
    pub valor_novo: Option<String>,
    pub registrado_por: String,
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoricoRhQuery {
    pub funcionario_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LancamentoFolhaItem {
    pub funcionario_id: String,
    #[serde(flatten)]
    pub lancamento: LancamentoFolha,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GerarFolhaRequest {
    pub referencia: String,
    /// Per-employee variable inputs; employees not listed get none.
    #[serde(default)]
    pub lancamentos: Vec<LancamentoFolhaItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FolhaResponse {
    pub id: String,
    pub funcionario_id: String,
    pub funcionario_nome: String,
    pub referencia: String,
    pub salario_base: i64,
    pub subsidios: i64,
    pub descontos: i64,
    pub desconto_faltas: i64,
    pub inss: i64,
    pub valor_liquido: i64,
    pub status: FolhaStatus,
    pub pago_em: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FolhaQuery {
    pub referencia: Option<String>,
}

// ─── Biblioteca ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateItemRequest {
    pub titulo: String,
    pub autor: String,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub categoria: Option<String>,
    pub quantidade_total: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemResponse {
    pub id: String,
    pub titulo: String,
    pub autor: String,
    pub isbn: Option<String>,
    pub categoria: Option<String>,
    pub quantidade_total: i64,
    pub disponiveis: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEmprestimoRequest {
    pub item_id: String,
    pub usuario_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmprestimoResponse {
    pub id: String,
    pub item_id: String,
    pub item_titulo: String,
    pub usuario_id: String,
    pub data_emprestimo: String,
    pub data_prevista_devolucao: String,
    pub data_devolucao: Option<String>,
    pub status: EmprestimoStatus,
    pub atrasado: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct EmprestimoQuery {
    pub usuario_id: Option<String>,
    pub status: Option<EmprestimoStatus>,
    /// Only loans past their due date.
    #[serde(default)]
    pub atrasado: bool,
}

// ─── Relatórios oficiais ─────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct BoletimQuery {
    pub ano_letivo_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MediaPeriodoResponse {
    pub periodo: Periodo,
    pub media: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BoletimLinha {
    pub plano_id: String,
    pub disciplina_id: String,
    pub disciplina_nome: String,
    pub turma_id: String,
    pub medias: Vec<MediaPeriodoResponse>,
    pub exame: Option<f64>,
    pub recurso: Option<f64>,
    pub media_final: Option<f64>,
    pub frequencia: Option<f64>,
    pub situacao: Situacao,
}

/// `GET /api/relatorios-oficiais/boletim/:aluno_id`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BoletimResponse {
    pub instituicao: String,
    pub aluno_id: String,
    pub aluno_nome: String,
    pub ano_letivo_id: String,
    pub ano: i32,
    pub disciplinas: Vec<BoletimLinha>,
    pub media_geral: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PautaLinha {
    pub aluno_id: String,
    pub aluno_nome: String,
    pub medias: Vec<MediaPeriodoResponse>,
    pub exame: Option<f64>,
    pub recurso: Option<f64>,
    pub media_final: Option<f64>,
    pub frequencia: Option<f64>,
    pub situacao: Situacao,
}

/// `GET /api/relatorios-oficiais/pauta/:plano_id`: grade sheet of one
/// disciplina in one turma.
#[derive(Debug, Serialize, Deserialize)]
pub struct PautaResponse {
    pub plano_id: String,
    pub turma_id: String,
    pub turma_nome: String,
    pub disciplina_nome: String,
    pub linhas: Vec<PautaLinha>,
}

// ─── Documentos ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct EmitirDocumentoRequest {
    pub aluno_id: String,
    pub tipo: TipoDocumento,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentoResponse {
    pub id: String,
    pub aluno_id: String,
    pub tipo: TipoDocumento,
    pub numero: String,
    pub emitido_por: String,
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentoQuery {
    pub aluno_id: Option<String>,
}

// ─── Service Error ──────────────────────────────────────────────────────────

/// Framework-agnostic service error.
///
/// Each variant maps to an HTTP status code. The server converts this into
/// its own response type.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ServiceError {
    /// HTTP status code as a `u16`.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Internal(m) => m,
        }
    }

    /// Build a closure that wraps a DB/IO error as `Internal`.
    pub fn from_db<E: std::fmt::Display>(context: &str) -> impl FnOnce(E) -> Self + '_ {
        move |e| Self::Internal(format!("{context}: {e}"))
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ServiceError {}

impl From<RuleError> for ServiceError {
    fn from(e: RuleError) -> Self {
        if e.is_invalid_input() {
            Self::BadRequest(e.to_string())
        } else {
            Self::Conflict(e.to_string())
        }
    }
}

// ─── Error (JSON shape) ─────────────────────────────────────────────────────

/// JSON error shape `{ "error": "..." }` returned by all error responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl From<&ServiceError> for ApiError {
    fn from(e: &ServiceError) -> Self {
        Self {
            error: e.message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_errors_map_to_status() {
        let bad: ServiceError = RuleError::invalid("valor", "out of range").into();
        assert_eq!(bad.status_code(), 400);
        let conflict: ServiceError = RuleError::precondition("plan not approved").into();
        assert_eq!(conflict.status_code(), 409);
        assert_eq!(conflict.message(), "plan not approved");
    }

    #[test]
    fn enums_serialize_as_database_text() {
        let req: EncerrarRequest =
            serde_json::from_str(r#"{"ano_letivo_id":"a","periodo":"TRIMESTRE_2"}"#).unwrap();
        assert_eq!(req.periodo, Periodo::Trimestre2);
        let item: LancamentoFolhaItem =
            serde_json::from_str(r#"{"funcionario_id":"f","faltas":2}"#).unwrap();
        assert_eq!(item.lancamento.faltas, 2);
        assert_eq!(item.lancamento.subsidios, 0);
    }

    #[test]
    fn plan_detail_flattens_plan_fields() {
        let detail = PlanoDetailResponse {
            plano: PlanoResponse {
                id: "p1".into(),
                professor_id: "u1".into(),
                disciplina_id: "d1".into(),
                turma_id: "t1".into(),
                ano_letivo_id: "a1".into(),
                ementa: String::new(),
                objetivos: String::new(),
                metodologia: String::new(),
                carga_horaria_total: 60,
                status: PlanoStatus::Rascunho,
                observacao: None,
                aprovado_por: None,
                aprovado_em: None,
                created_at: "2026-01-01 00:00:00".into(),
                updated_at: "2026-01-01 00:00:00".into(),
            },
            aulas: vec![],
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["status"], "RASCUNHO");
        assert!(json["aulas"].as_array().unwrap().is_empty());
    }
}
