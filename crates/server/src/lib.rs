//! DSICOLA HTTP server: Axum routes over a single SQLite database shared by
//! every institution.

mod error;
mod rows;
pub mod routes;
pub mod storage;

use axum::{
    Router,
    extract::FromRef,
    routing::{get, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use dsicola_api::crypto::DEFAULT_PBKDF2_ITERATIONS;
use dsicola_api::deploy;
use dsicola_core::library::PoliticaEmprestimo;

pub use error::ApiErr;
pub use storage::Db;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: AppConfig,
}

/// Server configuration loaded from environment variables.
#[derive(Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub jwt_secret: String,
    pub pbkdf2_iterations: u32,
    pub politica_emprestimo: PoliticaEmprestimo,
    pub cors_permissive: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let env = |key: &str| std::env::var(key).ok().filter(|s| !s.is_empty());

        let jwt_secret = env(deploy::ENV_JWT_SECRET).unwrap_or_default();
        if jwt_secret.is_empty() {
            tracing::warn!("JWT_SECRET not set, every authenticated request will be rejected");
        }

        let defaults = PoliticaEmprestimo::default();
        Self {
            base_url: env(deploy::ENV_BASE_URL).unwrap_or_else(|| "http://localhost:3000".into()),
            jwt_secret,
            pbkdf2_iterations: deploy::parse_positive(
                env(deploy::ENV_PBKDF2_ITERATIONS).as_deref(),
                DEFAULT_PBKDF2_ITERATIONS,
            ),
            politica_emprestimo: PoliticaEmprestimo {
                dias_emprestimo: deploy::parse_positive(
                    env(deploy::ENV_LOAN_DAYS).as_deref(),
                    defaults.dias_emprestimo,
                ),
                max_ativos: deploy::parse_positive(
                    env(deploy::ENV_MAX_ACTIVE_LOANS).as_deref(),
                    defaults.max_ativos,
                ),
            },
            cors_permissive: deploy::parse_bool_flag(
                env(deploy::ENV_CORS_PERMISSIVE).as_deref(),
                true,
            ),
        }
    }
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    use routes::*;

    let api = Router::new()
        // Health
        .route("/health", get(health::health))
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/password", put(auth::change_password))
        // Users
        .route("/users", post(users::create_user).get(users::list_users))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/ativo", put(users::set_user_ativo))
        // Instituições
        .route(
            "/instituicoes",
            post(instituicoes::create_instituicao).get(instituicoes::list_instituicoes),
        )
        .route("/instituicoes/atual", get(instituicoes::instituicao_atual))
        .route("/instituicoes/{id}/ativo", put(instituicoes::set_instituicao_ativo))
        // Calendário
        .route(
            "/anos-letivos",
            post(calendario::create_ano_letivo).get(calendario::list_anos_letivos),
        )
        .route("/anos-letivos/{id}/iniciar", post(calendario::iniciar_ano_letivo))
        .route("/anos-letivos/{id}/periodos", get(calendario::list_periodos))
        // Estrutura
        .route(
            "/classes",
            post(estrutura::create_classe).get(estrutura::list_classes),
        )
        .route(
            "/cursos",
            post(estrutura::create_curso).get(estrutura::list_cursos),
        )
        .route(
            "/disciplinas",
            post(estrutura::create_disciplina).get(estrutura::list_disciplinas),
        )
        // Turmas
        .route("/turmas", post(turmas::create_turma).get(turmas::list_turmas))
        .route("/turmas/{id}", get(turmas::get_turma))
        .route("/turmas/{id}/alunos", get(turmas::list_alunos_turma))
        // Matrículas
        .route(
            "/matriculas-anuais",
            post(matriculas::create_matricula_anual).get(matriculas::list_matriculas_anuais),
        )
        .route(
            "/matriculas-anuais/{id}/cancelar",
            post(matriculas::cancelar_matricula_anual),
        )
        .route(
            "/matriculas",
            post(matriculas::create_matricula).get(matriculas::list_matriculas),
        )
        // Plano de ensino
        .route(
            "/plano-ensino",
            post(planos::create_plano).get(planos::list_planos),
        )
        .route(
            "/plano-ensino/{id}",
            get(planos::get_plano).put(planos::update_plano),
        )
        .route("/plano-ensino/{id}/aulas", post(planos::add_plano_aula))
        .route("/plano-ensino/{id}/submeter", post(planos::submeter_plano))
        .route("/plano-ensino/{id}/aprovar", post(planos::aprovar_plano))
        .route("/plano-ensino/{id}/rejeitar", post(planos::rejeitar_plano))
        // Avaliações e notas
        .route(
            "/avaliacoes",
            post(avaliacoes::create_avaliacao).get(avaliacoes::list_avaliacoes),
        )
        .route("/notas/avaliacao/lote", post(avaliacoes::lancar_notas))
        .route("/notas/avaliacao/{id}", get(avaliacoes::list_notas))
        // Aulas e presenças
        .route("/aulas", post(aulas::create_aula).get(aulas::list_aulas))
        .route("/presencas", post(aulas::lancar_presencas))
        .route("/presencas/aula/{id}", get(aulas::list_presencas))
        .route("/presencas/resumo", get(aulas::resumo_presencas))
        // Encerramentos
        .route("/encerramentos", get(encerramentos::list_encerramentos))
        .route("/encerramentos/encerrar", post(encerramentos::encerrar))
        .route("/encerramentos/reabrir", post(encerramentos::reabrir))
        // Financeiro
        .route(
            "/configuracao-multas",
            get(financeiro::get_configuracao).put(financeiro::update_configuracao),
        )
        .route(
            "/mensalidades",
            post(financeiro::create_mensalidade).get(financeiro::list_mensalidades),
        )
        .route("/mensalidades/gerar", post(financeiro::gerar_mensalidades))
        .route("/mensalidades/{id}/pagar", post(financeiro::pagar_mensalidade))
        .route(
            "/mensalidades/{id}/cancelar",
            post(financeiro::cancelar_mensalidade),
        )
        // RH
        .route(
            "/funcionarios",
            post(rh::create_funcionario).get(rh::list_funcionarios),
        )
        .route("/funcionarios/{id}", put(rh::update_funcionario))
        .route(
            "/historico-rh",
            get(rh::list_historico).post(rh::create_historico),
        )
        .route("/folhas-pagamento", get(rh::list_folhas))
        .route("/folhas-pagamento/gerar", post(rh::gerar_folhas))
        .route("/folhas-pagamento/{id}/pagar", post(rh::pagar_folha))
        // Biblioteca
        .route(
            "/biblioteca/itens",
            post(biblioteca::create_item).get(biblioteca::list_itens),
        )
        .route(
            "/biblioteca/emprestimos",
            post(biblioteca::create_emprestimo).get(biblioteca::list_emprestimos),
        )
        .route(
            "/biblioteca/emprestimos/{id}/devolver",
            post(biblioteca::devolver_emprestimo),
        )
        // Relatórios oficiais
        .route(
            "/relatorios-oficiais/boletim/{aluno_id}",
            get(relatorios::boletim),
        )
        .route(
            "/relatorios-oficiais/pauta/{plano_id}",
            get(relatorios::pauta),
        )
        // Documentos
        .route(
            "/documentos",
            post(documentos::emitir_documento).get(documentos::list_documentos),
        );

    let cors_permissive = state.config.cors_permissive;
    let mut app = Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app.with_state(state)
}
