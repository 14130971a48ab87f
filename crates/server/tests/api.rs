use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Datelike;
use serde_json::{Value, json};
use tower::ServiceExt;

use dsicola_core::library::PoliticaEmprestimo;
use dsicola_server::{AppConfig, AppState, build_router, storage};

const SUPER_EMAIL: &str = "root@dsicola.test";
const SUPER_PASSWORD: &str = "super-secret-1";
const PASSWORD: &str = "password-123";

struct TestContext {
    app: Router,
    _dir: tempfile::TempDir,
}

struct Resp {
    status: StatusCode,
    body: Value,
}

impl TestContext {
    fn new() -> Self {
        Self::with_politica(PoliticaEmprestimo::default())
    }

    fn with_politica(politica_emprestimo: PoliticaEmprestimo) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = storage::init_db(dir.path()).unwrap();
        storage::bootstrap_super_admin(&store, SUPER_EMAIL, SUPER_PASSWORD, 1_000).unwrap();
        let app = build_router(AppState {
            db: store,
            config: AppConfig {
                base_url: "http://localhost:3000".into(),
                jwt_secret: "test-secret".into(),
                pbkdf2_iterations: 1_000,
                politica_emprestimo,
                cors_permissive: false,
            },
        });
        Self { app, _dir: dir }
    }

    async fn send(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        tenant: Option<&str>,
        body: Option<Value>,
    ) -> Resp {
        let mut req = Request::builder().method(method).uri(format!("/api{path}"));
        if let Some(token) = token {
            req = req.header("authorization", format!("Bearer {token}"));
        }
        if let Some(tenant) = tenant {
            req = req.header("x-instituicao-id", tenant);
        }
        let req = match body {
            Some(body) => req
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Resp { status, body }
    }

    async fn get(&self, path: &str, token: &str) -> Resp {
        self.send("GET", path, Some(token), None, None).await
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> Resp {
        self.send("POST", path, Some(token), None, Some(body)).await
    }

    async fn put(&self, path: &str, token: &str, body: Value) -> Resp {
        self.send("PUT", path, Some(token), None, Some(body)).await
    }

    async fn login(&self, email: &str, password: &str) -> Value {
        let resp = self
            .send(
                "POST",
                "/auth/login",
                None,
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "login {email}: {}", resp.body);
        resp.body
    }

    async fn super_token(&self) -> String {
        token(&self.login(SUPER_EMAIL, SUPER_PASSWORD).await)
    }

    /// Create an institution and log its admin in. Returns `(instituicao_id, admin_token)`.
    async fn instituicao(&self, sigla: &str, tipo: &str) -> (String, String) {
        let root = self.super_token().await;
        let admin_email = format!("admin@{}.test", sigla.to_lowercase());
        let resp = self
            .post(
                "/instituicoes",
                &root,
                json!({
                    "nome": format!("Escola {sigla}"),
                    "sigla": sigla,
                    "tipo_academico": tipo,
                    "admin": { "email": admin_email, "nome": "Diretor", "password": PASSWORD },
                }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "create instituicao: {}", resp.body);
        let inst = id(&resp.body["instituicao"]);
        let admin = token(&self.login(&admin_email, PASSWORD).await);
        (inst, admin)
    }

    async fn user(&self, admin: &str, email: &str, role: &str) -> (String, String) {
        let resp = self
            .post(
                "/users",
                admin,
                json!({ "email": email, "nome": email, "role": role, "password": PASSWORD }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "create user {email}: {}", resp.body);
        let user_id = id(&resp.body);
        let token = token(&self.login(email, PASSWORD).await);
        (user_id, token)
    }

    async fn created(&self, path: &str, token: &str, body: Value) -> String {
        let resp = self.post(path, token, body).await;
        assert_eq!(resp.status, StatusCode::CREATED, "POST {path}: {}", resp.body);
        id(&resp.body)
    }
}

fn token(body: &Value) -> String {
    body["access_token"].as_str().unwrap().to_string()
}

fn id(body: &Value) -> String {
    body["id"].as_str().unwrap().to_string()
}

fn items(body: &Value) -> &Vec<Value> {
    body["items"].as_array().unwrap()
}

/// A secondary school with a started year, one turma, one disciplina, one
/// professor and one student enrolled in the turma.
struct Escola {
    admin: String,
    ano: i32,
    ano_id: String,
    classe_id: String,
    turma_id: String,
    disciplina_id: String,
    professor_id: String,
    professor: String,
    anual_id: String,
    aluno_id: String,
    aluno: String,
}

async fn escola(ctx: &TestContext, sigla: &str) -> Escola {
    let (_, admin) = ctx.instituicao(sigla, "SECUNDARIO").await;
    let ano = chrono::Utc::now().year();
    let ano_id = ctx
        .created(
            "/anos-letivos",
            &admin,
            json!({
                "ano": ano,
                "data_inicio": format!("{ano}-02-01"),
                "data_fim": format!("{}-12-15", ano),
            }),
        )
        .await;
    let resp = ctx.post(&format!("/anos-letivos/{ano_id}/iniciar"), &admin, json!({})).await;
    assert_eq!(resp.status, StatusCode::OK, "iniciar: {}", resp.body);
    assert_eq!(resp.body["status"], "ATIVO");

    let classe_id = ctx
        .created("/classes", &admin, json!({ "nome": "10ª Classe", "nivel": 10 }))
        .await;
    let disciplina_id = ctx
        .created(
            "/disciplinas",
            &admin,
            json!({ "nome": "Matemática", "codigo": "MAT10", "carga_horaria": 120, "classe_id": classe_id }),
        )
        .await;
    let turma_id = ctx
        .created(
            "/turmas",
            &admin,
            json!({
                "nome": "10A",
                "ano_letivo_id": ano_id,
                "classe_id": classe_id,
                "turno": "MANHA",
                "capacidade": 30,
            }),
        )
        .await;

    let lower = sigla.to_lowercase();
    let (professor_id, professor) = ctx
        .user(&admin, &format!("prof@{lower}.test"), "PROFESSOR")
        .await;
    let (aluno_id, aluno) = ctx.user(&admin, &format!("aluno@{lower}.test"), "ALUNO").await;

    let anual_id = ctx
        .created(
            "/matriculas-anuais",
            &admin,
            json!({ "aluno_id": aluno_id, "ano_letivo_id": ano_id, "classe_id": classe_id }),
        )
        .await;
    ctx.created(
        "/matriculas",
        &admin,
        json!({ "aluno_id": aluno_id, "turma_id": turma_id }),
    )
    .await;

    Escola {
        admin,
        ano,
        ano_id,
        classe_id,
        anual_id,
        turma_id,
        disciplina_id,
        professor_id,
        professor,
        aluno_id,
        aluno,
    }
}

/// Plan created by the professor, with one lesson, still in `RASCUNHO`.
async fn plano_rascunho(ctx: &TestContext, e: &Escola) -> String {
    let plano_id = ctx
        .created(
            "/plano-ensino",
            &e.professor,
            json!({
                "disciplina_id": e.disciplina_id,
                "turma_id": e.turma_id,
                "ementa": "Álgebra e funções",
                "carga_horaria_total": 120,
            }),
        )
        .await;
    ctx.created(
        &format!("/plano-ensino/{plano_id}/aulas"),
        &e.professor,
        json!({ "titulo": "Equações do 1º grau", "periodo": "TRIMESTRE_1", "quantidade_aulas": 4 }),
    )
    .await;
    plano_id
}

async fn plano_aprovado(ctx: &TestContext, e: &Escola) -> String {
    let plano_id = plano_rascunho(ctx, e).await;
    let resp = ctx
        .post(&format!("/plano-ensino/{plano_id}/submeter"), &e.professor, json!({}))
        .await;
    assert_eq!(resp.status, StatusCode::OK, "submeter: {}", resp.body);
    let resp = ctx
        .post(&format!("/plano-ensino/{plano_id}/aprovar"), &e.admin, json!({}))
        .await;
    assert_eq!(resp.status, StatusCode::OK, "aprovar: {}", resp.body);
    assert_eq!(resp.body["status"], "APROVADO");
    plano_id
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_is_public() {
    let ctx = TestContext::new();
    let resp = ctx.send("GET", "/health", None, None, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], "ok");
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let ctx = TestContext::new();
    let resp = ctx
        .send(
            "POST",
            "/auth/login",
            None,
            None,
            Some(json!({ "email": SUPER_EMAIL, "password": "not-the-password" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_rotates_token() {
    let ctx = TestContext::new();
    let login = ctx.login(SUPER_EMAIL, SUPER_PASSWORD).await;
    let refresh = login["refresh_token"].as_str().unwrap();

    let resp = ctx
        .send("POST", "/auth/refresh", None, None, Some(json!({ "refresh_token": refresh })))
        .await;
    assert_eq!(resp.status, StatusCode::OK, "refresh: {}", resp.body);
    assert_ne!(resp.body["refresh_token"], login["refresh_token"]);

    let reused = ctx
        .send("POST", "/auth/refresh", None, None, Some(json!({ "refresh_token": refresh })))
        .await;
    assert_eq!(reused.status, StatusCode::UNAUTHORIZED, "old refresh token must be spent");
}

#[tokio::test]
async fn missing_or_bad_token_is_unauthorized() {
    let ctx = TestContext::new();
    let resp = ctx.send("GET", "/auth/me", None, None, None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    let resp = ctx.get("/auth/me", "garbage").await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn new_users_must_change_password() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.instituicao("ESA", "SECUNDARIO").await;
    ctx.user(&admin, "sec@esa.test", "SECRETARIA").await;
    let login = ctx.login("sec@esa.test", PASSWORD).await;
    assert_eq!(login["must_change_password"], true);
    let secretaria = token(&login);

    let resp = ctx
        .put(
            "/auth/password",
            &secretaria,
            json!({ "current_password": PASSWORD, "new_password": "a-better-pass-1" }),
        )
        .await;
    assert!(resp.status.is_success(), "change password: {}", resp.body);

    let relogin = ctx.login("sec@esa.test", "a-better-pass-1").await;
    assert_eq!(relogin["must_change_password"], false);
}

// ---------------------------------------------------------------------------
// Tenancy and roles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tenants_are_isolated() {
    let ctx = TestContext::new();
    let (_, admin_a) = ctx.instituicao("ESA", "SECUNDARIO").await;
    let (_, admin_b) = ctx.instituicao("ESB", "SECUNDARIO").await;
    let (aluno_b, _) = ctx.user(&admin_b, "aluno@esb.test", "ALUNO").await;

    let resp = ctx.get(&format!("/users/{aluno_b}"), &admin_a).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = ctx.get("/users", &admin_a).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(
        items(&resp.body).iter().all(|u| u["id"] != aluno_b.as_str()),
        "admin A must not see users of B"
    );
}

#[tokio::test]
async fn super_admin_needs_tenant_header() {
    let ctx = TestContext::new();
    let (inst, _) = ctx.instituicao("ESA", "SECUNDARIO").await;
    let root = ctx.super_token().await;

    let resp = ctx.get("/anos-letivos", &root).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = ctx
        .send("GET", "/anos-letivos", Some(&root), Some(&inst), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
}

#[tokio::test]
async fn only_super_admin_creates_institutions() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.instituicao("ESA", "SECUNDARIO").await;
    let resp = ctx
        .post(
            "/instituicoes",
            &admin,
            json!({
                "nome": "Outra",
                "sigla": "OUT",
                "tipo_academico": "SUPERIOR",
                "admin": { "email": "x@out.test", "nome": "X", "password": PASSWORD },
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_cannot_create_admins() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.instituicao("ESA", "SECUNDARIO").await;
    let resp = ctx
        .post(
            "/users",
            &admin,
            json!({ "email": "a2@esa.test", "nome": "A2", "role": "ADMIN", "password": PASSWORD }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn student_cannot_manage_finance() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let resp = ctx
        .post(
            "/mensalidades",
            &e.aluno,
            json!({
                "aluno_id": e.aluno_id,
                "referencia": "2099-01",
                "valor": 5000,
                "data_vencimento": "2099-01-10",
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Academic flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn secondary_turma_requires_classe() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let resp = ctx
        .post(
            "/turmas",
            &e.admin,
            json!({ "nome": "10B", "ano_letivo_id": e.ano_id, "turno": "TARDE", "capacidade": 30 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_enrollment_conflicts() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let resp = ctx
        .post(
            "/matriculas",
            &e.admin,
            json!({ "aluno_id": e.aluno_id, "turma_id": e.turma_id }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    let resp = ctx.get(&format!("/turmas/{}/alunos", e.turma_id), &e.admin).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(items(&resp.body).len(), 1);
}

#[tokio::test]
async fn enrollment_requires_matricula_anual() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let (outro, _) = ctx.user(&e.admin, "outro@esa.test", "ALUNO").await;
    let resp = ctx
        .post("/matriculas", &e.admin, json!({ "aluno_id": outro, "turma_id": e.turma_id }))
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unapproved_plan_blocks_assessments() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let plano_id = plano_rascunho(&ctx, &e).await;

    let resp = ctx
        .post(
            "/avaliacoes",
            &e.professor,
            json!({
                "plano_id": plano_id,
                "periodo": "TRIMESTRE_1",
                "tipo": "PROVA",
                "descricao": "Prova 1",
                "data": "2026-03-10",
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT, "{}", resp.body);
}

#[tokio::test]
async fn rejected_plan_returns_to_draft_on_edit() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let plano_id = plano_rascunho(&ctx, &e).await;
    ctx.post(&format!("/plano-ensino/{plano_id}/submeter"), &e.professor, json!({}))
        .await;

    let resp = ctx
        .post(&format!("/plano-ensino/{plano_id}/aprovar"), &e.professor, json!({}))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN, "professors cannot approve");

    let resp = ctx
        .post(
            &format!("/plano-ensino/{plano_id}/rejeitar"),
            &e.admin,
            json!({ "motivo": "Falta bibliografia" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
    assert_eq!(resp.body["status"], "REJEITADO");
    assert_eq!(resp.body["observacao"], "Falta bibliografia");

    ctx.created(
        &format!("/plano-ensino/{plano_id}/aulas"),
        &e.professor,
        json!({ "titulo": "Bibliografia", "periodo": "TRIMESTRE_1", "quantidade_aulas": 1 }),
    )
    .await;
    let resp = ctx.get(&format!("/plano-ensino/{plano_id}"), &e.professor).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["plano"]["status"], "RASCUNHO");
    assert_eq!(resp.body["aulas"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn grades_follow_period_closing() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let plano_id = plano_aprovado(&ctx, &e).await;

    let avaliacao_id = ctx
        .created(
            "/avaliacoes",
            &e.professor,
            json!({
                "plano_id": plano_id,
                "periodo": "TRIMESTRE_1",
                "tipo": "PROVA",
                "descricao": "Prova 1",
                "data": "2026-03-10",
            }),
        )
        .await;

    let out_of_range = ctx
        .post(
            "/notas/avaliacao/lote",
            &e.professor,
            json!({ "avaliacao_id": avaliacao_id, "notas": [{ "aluno_id": e.aluno_id, "valor": 21.0 }] }),
        )
        .await;
    assert_eq!(out_of_range.status, StatusCode::BAD_REQUEST);

    let resp = ctx
        .post(
            "/notas/avaliacao/lote",
            &e.professor,
            json!({ "avaliacao_id": avaliacao_id, "notas": [{ "aluno_id": e.aluno_id, "valor": 14.0 }] }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "lancar notas: {}", resp.body);
    assert_eq!(resp.body["gravadas"], 1);

    // Closing the trimester locks its grades.
    let resp = ctx
        .post(
            "/encerramentos/encerrar",
            &e.admin,
            json!({ "ano_letivo_id": e.ano_id, "periodo": "TRIMESTRE_1" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "encerrar: {}", resp.body);
    assert_eq!(resp.body["status"], "ENCERRADO");

    let locked = ctx
        .post(
            "/notas/avaliacao/lote",
            &e.professor,
            json!({ "avaliacao_id": avaliacao_id, "notas": [{ "aluno_id": e.aluno_id, "valor": 16.0 }] }),
        )
        .await;
    assert_eq!(locked.status, StatusCode::CONFLICT, "{}", locked.body);

    let out_of_order = ctx
        .post(
            "/encerramentos/encerrar",
            &e.admin,
            json!({ "ano_letivo_id": e.ano_id, "periodo": "TRIMESTRE_3" }),
        )
        .await;
    assert_eq!(out_of_order.status, StatusCode::CONFLICT);

    let resp = ctx
        .post(
            "/encerramentos/reabrir",
            &e.admin,
            json!({ "ano_letivo_id": e.ano_id, "periodo": "TRIMESTRE_1", "justificativa": "  " }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST, "justificativa is required");

    let resp = ctx
        .post(
            "/encerramentos/reabrir",
            &e.admin,
            json!({
                "ano_letivo_id": e.ano_id,
                "periodo": "TRIMESTRE_1",
                "justificativa": "Correção de nota",
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "reabrir: {}", resp.body);
    assert_eq!(resp.body["status"], "REABERTO");

    let resp = ctx
        .post(
            "/notas/avaliacao/lote",
            &e.professor,
            json!({ "avaliacao_id": avaliacao_id, "notas": [{ "aluno_id": e.aluno_id, "valor": 16.0 }] }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "after reopening: {}", resp.body);
}

#[tokio::test]
async fn closing_requires_approved_plans() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    plano_rascunho(&ctx, &e).await;
    let resp = ctx
        .post(
            "/encerramentos/encerrar",
            &e.admin,
            json!({ "ano_letivo_id": e.ano_id, "periodo": "TRIMESTRE_1" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT, "{}", resp.body);
}

#[tokio::test]
async fn boletim_is_private_to_the_student() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let plano_id = plano_aprovado(&ctx, &e).await;
    let avaliacao_id = ctx
        .created(
            "/avaliacoes",
            &e.professor,
            json!({
                "plano_id": plano_id,
                "periodo": "TRIMESTRE_1",
                "tipo": "TESTE",
                "descricao": "Teste 1",
                "data": "2026-03-12",
            }),
        )
        .await;
    ctx.post(
        "/notas/avaliacao/lote",
        &e.professor,
        json!({ "avaliacao_id": avaliacao_id, "notas": [{ "aluno_id": e.aluno_id, "valor": 12.5 }] }),
    )
    .await;

    let resp = ctx
        .get(&format!("/relatorios-oficiais/boletim/{}", e.aluno_id), &e.aluno)
        .await;
    assert_eq!(resp.status, StatusCode::OK, "boletim: {}", resp.body);
    let disciplinas = resp.body["disciplinas"].as_array().unwrap();
    assert_eq!(disciplinas.len(), 1);
    assert_eq!(disciplinas[0]["situacao"], "EM_CURSO");

    let (colega, colega_token) = ctx.user(&e.admin, "colega@esa.test", "ALUNO").await;
    let resp = ctx
        .get(&format!("/relatorios-oficiais/boletim/{}", e.aluno_id), &colega_token)
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = ctx
        .get(&format!("/relatorios-oficiais/boletim/{colega}"), &e.admin)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body["disciplinas"].as_array().unwrap().is_empty());

    let resp = ctx
        .get(&format!("/relatorios-oficiais/pauta/{plano_id}"), &e.professor)
        .await;
    assert_eq!(resp.status, StatusCode::OK, "pauta: {}", resp.body);
    assert_eq!(resp.body["linhas"].as_array().unwrap().len(), 1);
    assert_eq!(resp.body["linhas"][0]["aluno_id"], e.aluno_id.as_str());
}

// ---------------------------------------------------------------------------
// Finance
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mensalidade_payment_must_cover_total() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let mensalidade_id = ctx
        .created(
            "/mensalidades",
            &e.admin,
            json!({
                "aluno_id": e.aluno_id,
                "referencia": "2099-01",
                "valor": 5000,
                "data_vencimento": "2099-01-10",
            }),
        )
        .await;

    let short = ctx
        .post(
            &format!("/mensalidades/{mensalidade_id}/pagar"),
            &e.admin,
            json!({ "valor": 4000, "metodo_pagamento": "MULTICAIXA" }),
        )
        .await;
    assert_eq!(short.status, StatusCode::CONFLICT);

    let paid = ctx
        .post(
            &format!("/mensalidades/{mensalidade_id}/pagar"),
            &e.admin,
            json!({ "valor": 5000, "metodo_pagamento": "MULTICAIXA" }),
        )
        .await;
    assert_eq!(paid.status, StatusCode::OK, "pagar: {}", paid.body);
    assert_eq!(paid.body["status"], "PAGO");
    assert_eq!(paid.body["valor_pago"], 5000);

    let twice = ctx
        .post(
            &format!("/mensalidades/{mensalidade_id}/pagar"),
            &e.admin,
            json!({ "valor": 5000, "metodo_pagamento": "DINHEIRO" }),
        )
        .await;
    assert_eq!(twice.status, StatusCode::CONFLICT);

    let duplicate = ctx
        .post(
            "/mensalidades",
            &e.admin,
            json!({
                "aluno_id": e.aluno_id,
                "referencia": "2099-01",
                "valor": 5000,
                "data_vencimento": "2099-01-10",
            }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn overdue_mensalidade_accrues_charges() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    ctx.created(
        "/mensalidades",
        &e.admin,
        json!({
            "aluno_id": e.aluno_id,
            "referencia": "2020-01",
            "valor": 10000,
            "data_vencimento": "2020-01-10",
        }),
    )
    .await;

    let resp = ctx.get("/mensalidades", &e.aluno).await;
    assert_eq!(resp.status, StatusCode::OK);
    let list = items(&resp.body);
    assert_eq!(list.len(), 1);
    let m = &list[0];
    assert_eq!(m["status"], "ATRASADO");
    assert_eq!(m["multa"], 1000);
    assert!(m["juros"].as_i64().unwrap() > 0);
    assert_eq!(
        m["total"].as_i64().unwrap(),
        10000 + m["multa"].as_i64().unwrap() + m["juros"].as_i64().unwrap()
    );
}

#[tokio::test]
async fn gerar_mensalidades_skips_existing() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let body = json!({ "referencia": "2099-03", "valor": 7500, "dia_vencimento": 10 });

    let first = ctx.post("/mensalidades/gerar", &e.admin, body.clone()).await;
    assert_eq!(first.status, StatusCode::OK, "gerar: {}", first.body);
    assert_eq!(first.body["criadas"], 1);
    assert_eq!(first.body["ignoradas"], 0);

    let second = ctx.post("/mensalidades/gerar", &e.admin, body).await;
    assert_eq!(second.body["criadas"], 0);
    assert_eq!(second.body["ignoradas"], 1);
}

// ---------------------------------------------------------------------------
// Library
// ---------------------------------------------------------------------------

#[tokio::test]
async fn loans_respect_active_limit() {
    let ctx = TestContext::with_politica(PoliticaEmprestimo {
        dias_emprestimo: 7,
        max_ativos: 1,
    });
    let e = escola(&ctx, "ESA").await;
    let (_, bibliotecario) = ctx.user(&e.admin, "bib@esa.test", "BIBLIOTECARIO").await;
    let item_id = ctx
        .created(
            "/biblioteca/itens",
            &bibliotecario,
            json!({ "titulo": "Os Lusíadas", "autor": "Camões", "quantidade_total": 2 }),
        )
        .await;

    let emprestimo_id = ctx
        .created(
            "/biblioteca/emprestimos",
            &bibliotecario,
            json!({ "item_id": item_id, "usuario_id": e.aluno_id }),
        )
        .await;

    let over_limit = ctx
        .post(
            "/biblioteca/emprestimos",
            &bibliotecario,
            json!({ "item_id": item_id, "usuario_id": e.aluno_id }),
        )
        .await;
    assert_eq!(over_limit.status, StatusCode::CONFLICT);

    let resp = ctx.get("/biblioteca/emprestimos", &e.aluno).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(items(&resp.body).len(), 1);
    assert_eq!(items(&resp.body)[0]["atrasado"], false);

    let returned = ctx
        .post(
            &format!("/biblioteca/emprestimos/{emprestimo_id}/devolver"),
            &bibliotecario,
            json!({}),
        )
        .await;
    assert_eq!(returned.status, StatusCode::OK, "devolver: {}", returned.body);
    assert_eq!(returned.body["status"], "DEVOLVIDO");

    let again = ctx
        .post(
            &format!("/biblioteca/emprestimos/{emprestimo_id}/devolver"),
            &bibliotecario,
            json!({}),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    ctx.created(
        "/biblioteca/emprestimos",
        &bibliotecario,
        json!({ "item_id": item_id, "usuario_id": e.aluno_id }),
    )
    .await;
}

#[tokio::test]
async fn loans_stop_when_no_copies_left() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let (_, bibliotecario) = ctx.user(&e.admin, "bib@esa.test", "BIBLIOTECARIO").await;
    let item_id = ctx
        .created(
            "/biblioteca/itens",
            &bibliotecario,
            json!({ "titulo": "Mayombe", "autor": "Pepetela", "quantidade_total": 1 }),
        )
        .await;
    ctx.created(
        "/biblioteca/emprestimos",
        &bibliotecario,
        json!({ "item_id": item_id, "usuario_id": e.aluno_id }),
    )
    .await;

    let resp = ctx
        .post(
            "/biblioteca/emprestimos",
            &bibliotecario,
            json!({ "item_id": item_id, "usuario_id": e.professor_id }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    let resp = ctx.get("/biblioteca/itens", &e.aluno).await;
    assert_eq!(items(&resp.body)[0]["disponiveis"], 0);
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[tokio::test]
async fn document_numbers_are_sequential() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let ano = chrono::Utc::now().year();

    let mut numeros = Vec::new();
    for _ in 0..2 {
        let resp = ctx
            .post(
                "/documentos",
                &e.admin,
                json!({ "aluno_id": e.aluno_id, "tipo": "DECLARACAO_MATRICULA" }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "emitir: {}", resp.body);
        numeros.push(resp.body["numero"].as_str().unwrap().to_string());
    }
    assert_eq!(numeros, [format!("DM-{ano}-00001"), format!("DM-{ano}-00002")]);

    let resp = ctx
        .post("/documentos", &e.admin, json!({ "aluno_id": e.aluno_id, "tipo": "BOLETIM" }))
        .await;
    assert_eq!(resp.body["numero"], format!("BL-{ano}-00001"));

    let resp = ctx.get("/documentos", &e.aluno).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(items(&resp.body).len(), 3);
}

#[tokio::test]
async fn declaracao_requires_active_enrollment() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let (sem_matricula, _) = ctx.user(&e.admin, "novo@esa.test", "ALUNO").await;
    let resp = ctx
        .post(
            "/documentos",
            &e.admin,
            json!({ "aluno_id": sem_matricula, "tipo": "DECLARACAO_MATRICULA" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Year closing
// ---------------------------------------------------------------------------

async fn encerrar(ctx: &TestContext, e: &Escola, ano_id: &str, periodo: &str) -> Resp {
    ctx.post(
        "/encerramentos/encerrar",
        &e.admin,
        json!({ "ano_letivo_id": ano_id, "periodo": periodo }),
    )
    .await
}

async fn encerrar_ano(ctx: &TestContext, e: &Escola) {
    for periodo in ["TRIMESTRE_1", "TRIMESTRE_2", "TRIMESTRE_3", "ANO"] {
        let resp = encerrar(ctx, e, &e.ano_id, periodo).await;
        assert_eq!(resp.status, StatusCode::OK, "encerrar {periodo}: {}", resp.body);
    }
}

async fn ano_status(ctx: &TestContext, e: &Escola, ano_id: &str) -> Value {
    let resp = ctx.get("/anos-letivos", &e.admin).await;
    assert_eq!(resp.status, StatusCode::OK);
    items(&resp.body)
        .iter()
        .find(|a| a["id"] == ano_id)
        .map(|a| a["status"].clone())
        .unwrap()
}

async fn anual_status(ctx: &TestContext, e: &Escola) -> Value {
    let resp = ctx
        .get(&format!("/matriculas-anuais?ano_letivo_id={}", e.ano_id), &e.admin)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    items(&resp.body)
        .iter()
        .find(|m| m["id"] == e.anual_id.as_str())
        .map(|m| m["status"].clone())
        .unwrap()
}

async fn situacao(ctx: &TestContext, e: &Escola) -> Value {
    let resp = ctx
        .get(
            &format!("/relatorios-oficiais/boletim/{}?ano_letivo_id={}", e.aluno_id, e.ano_id),
            &e.admin,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "boletim: {}", resp.body);
    resp.body["disciplinas"][0]["situacao"].clone()
}

#[tokio::test]
async fn closing_the_year_concludes_and_reopening_reverts() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let plano_id = plano_aprovado(&ctx, &e).await;
    let avaliacao_id = ctx
        .created(
            "/avaliacoes",
            &e.professor,
            json!({
                "plano_id": plano_id,
                "periodo": "TRIMESTRE_1",
                "tipo": "PROVA",
                "descricao": "Prova 1",
                "data": format!("{}-03-10", e.ano),
            }),
        )
        .await;
    let resp = ctx
        .post(
            "/notas/avaliacao/lote",
            &e.professor,
            json!({ "avaliacao_id": avaliacao_id, "notas": [{ "aluno_id": e.aluno_id, "valor": 14.0 }] }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let early = encerrar(&ctx, &e, &e.ano_id, "ANO").await;
    assert_eq!(early.status, StatusCode::CONFLICT, "ANO needs every trimester closed");

    encerrar_ano(&ctx, &e).await;
    assert_eq!(ano_status(&ctx, &e, &e.ano_id).await, "ENCERRADO");
    assert_eq!(anual_status(&ctx, &e).await, "CONCLUIDA");
    assert_eq!(situacao(&ctx, &e).await, "APROVADO");

    let resp = ctx
        .post(
            "/encerramentos/reabrir",
            &e.admin,
            json!({ "ano_letivo_id": e.ano_id, "periodo": "TRIMESTRE_3", "justificativa": "Erro" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT, "ANO must be reopened first");

    let resp = ctx
        .post(
            "/encerramentos/reabrir",
            &e.admin,
            json!({ "ano_letivo_id": e.ano_id, "periodo": "ANO", "justificativa": "Pauta corrigida" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "reabrir ANO: {}", resp.body);
    assert_eq!(ano_status(&ctx, &e, &e.ano_id).await, "ATIVO");
    assert_eq!(anual_status(&ctx, &e).await, "ATIVA");
    assert_eq!(situacao(&ctx, &e).await, "EM_CURSO");

    let resp = ctx.get("/encerramentos", &e.admin).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST, "ano_letivo_id is required");
    let resp = ctx
        .get(&format!("/encerramentos?ano_letivo_id={}", e.ano_id), &e.admin)
        .await;
    assert_eq!(items(&resp.body).len(), 4);
}

#[tokio::test]
async fn low_attendance_fails_the_year() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let plano_id = plano_aprovado(&ctx, &e).await;
    let avaliacao_id = ctx
        .created(
            "/avaliacoes",
            &e.professor,
            json!({
                "plano_id": plano_id,
                "periodo": "TRIMESTRE_1",
                "tipo": "PROVA",
                "descricao": "Prova 1",
                "data": format!("{}-03-10", e.ano),
            }),
        )
        .await;
    ctx.post(
        "/notas/avaliacao/lote",
        &e.professor,
        json!({ "avaliacao_id": avaliacao_id, "notas": [{ "aluno_id": e.aluno_id, "valor": 18.0 }] }),
    )
    .await;
    let aula_id = ctx
        .created(
            "/aulas",
            &e.professor,
            json!({
                "plano_id": plano_id,
                "data": format!("{}-03-02", e.ano),
                "periodo": "TRIMESTRE_1",
                "conteudo": "Revisão",
            }),
        )
        .await;
    ctx.post(
        "/presencas",
        &e.professor,
        json!({ "aula_id": aula_id, "presencas": [{ "aluno_id": e.aluno_id, "status": "AUSENTE" }] }),
    )
    .await;

    encerrar_ano(&ctx, &e).await;
    assert_eq!(situacao(&ctx, &e).await, "REPROVADO_POR_FALTAS");
}

#[tokio::test]
async fn reopening_a_year_conflicts_with_the_next_active_one() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    plano_aprovado(&ctx, &e).await;
    encerrar_ano(&ctx, &e).await;

    let seguinte = e.ano + 1;
    let novo_id = ctx
        .created(
            "/anos-letivos",
            &e.admin,
            json!({
                "ano": seguinte,
                "data_inicio": format!("{seguinte}-02-01"),
                "data_fim": format!("{seguinte}-12-15"),
            }),
        )
        .await;
    let resp = ctx
        .post(&format!("/anos-letivos/{novo_id}/iniciar"), &e.admin, json!({}))
        .await;
    assert_eq!(resp.status, StatusCode::OK, "iniciar: {}", resp.body);

    let resp = ctx
        .post(
            "/encerramentos/reabrir",
            &e.admin,
            json!({ "ano_letivo_id": e.ano_id, "periodo": "ANO", "justificativa": "Correção tardia" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT, "{}", resp.body);

    let resp = ctx.get("/anos-letivos", &e.admin).await;
    let ativos: Vec<&Value> = items(&resp.body)
        .iter()
        .filter(|a| a["status"] == "ATIVO")
        .map(|a| &a["ano"])
        .collect();
    assert_eq!(ativos, [&json!(seguinte)]);
    assert_eq!(ano_status(&ctx, &e, &e.ano_id).await, "ENCERRADO");
    assert_eq!(anual_status(&ctx, &e).await, "CONCLUIDA");
}

// ---------------------------------------------------------------------------
// Lessons and attendance
// ---------------------------------------------------------------------------

#[tokio::test]
async fn attendance_is_weighted_and_locked_by_closing() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let plano_id = plano_aprovado(&ctx, &e).await;

    let mut aulas = Vec::new();
    for (dia, quantidade, status) in [(2, 2, "PRESENTE"), (3, 1, "AUSENTE"), (4, 1, "JUSTIFICADO")] {
        let aula_id = ctx
            .created(
                "/aulas",
                &e.professor,
                json!({
                    "plano_id": plano_id,
                    "data": format!("{}-03-{dia:02}", e.ano),
                    "periodo": "TRIMESTRE_1",
                    "conteudo": format!("Aula {dia}"),
                    "quantidade": quantidade,
                }),
            )
            .await;
        let resp = ctx
            .post(
                "/presencas",
                &e.professor,
                json!({ "aula_id": aula_id, "presencas": [{ "aluno_id": e.aluno_id, "status": status }] }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "presencas: {}", resp.body);
        assert_eq!(resp.body["gravadas"], 1);
        aulas.push(aula_id);
    }

    let resp = ctx
        .get(&format!("/presencas/resumo?plano_id={plano_id}"), &e.professor)
        .await;
    assert_eq!(resp.status, StatusCode::OK, "resumo: {}", resp.body);
    let resumo = &items(&resp.body)[0];
    assert_eq!(resumo["aulas"], 4);
    assert_eq!(resumo["presencas"], 2);
    assert_eq!(resumo["faltas"], 1);
    assert_eq!(resumo["justificadas"], 1);
    assert_eq!(resumo["frequencia"], 75.0);
    assert_eq!(resumo["abaixo_do_minimo"], false);

    let resp = ctx.get(&format!("/presencas/aula/{}", aulas[1]), &e.professor).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(items(&resp.body)[0]["status"], "AUSENTE");

    let resp = encerrar(&ctx, &e, &e.ano_id, "TRIMESTRE_1").await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = ctx
        .post(
            "/aulas",
            &e.professor,
            json!({
                "plano_id": plano_id,
                "data": format!("{}-03-20", e.ano),
                "periodo": "TRIMESTRE_1",
                "conteudo": "Fora de prazo",
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    let resp = ctx
        .post(
            "/presencas",
            &e.professor,
            json!({ "aula_id": aulas[1], "presencas": [{ "aluno_id": e.aluno_id, "status": "JUSTIFICADO" }] }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    let resp = ctx
        .get(&format!("/aulas?plano_id={plano_id}"), &e.professor)
        .await;
    assert_eq!(items(&resp.body).len(), 3);
}

// ---------------------------------------------------------------------------
// Enrollment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancelling_matricula_anual_cascades() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;

    let resp = ctx
        .post(&format!("/matriculas-anuais/{}/cancelar", e.anual_id), &e.admin, json!({}))
        .await;
    assert_eq!(resp.status, StatusCode::OK, "cancelar: {}", resp.body);
    assert_eq!(resp.body["status"], "CANCELADA");

    let resp = ctx
        .get(&format!("/matriculas?aluno_id={}", e.aluno_id), &e.admin)
        .await;
    let matriculas = items(&resp.body);
    assert_eq!(matriculas.len(), 1);
    assert_eq!(matriculas[0]["status"], "CANCELADA");

    let resp = ctx.get(&format!("/turmas/{}/alunos", e.turma_id), &e.admin).await;
    assert!(items(&resp.body).is_empty());

    let again = ctx
        .post(&format!("/matriculas-anuais/{}/cancelar", e.anual_id), &e.admin, json!({}))
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn turma_capacity_is_enforced() {
    let ctx = TestContext::new();
    let e = escola(&ctx, "ESA").await;
    let pequena = ctx
        .created(
            "/turmas",
            &e.admin,
            json!({
                "nome": "10Z",
                "ano_letivo_id": e.ano_id,
                "classe_id": e.classe_id,
                "turno": "NOITE",
                "capacidade": 1,
            }),
        )
        .await;
    ctx.created(
        "/matriculas",
        &e.admin,
        json!({ "aluno_id": e.aluno_id, "turma_id": pequena }),
    )
    .await;

    let (outro, _) = ctx.user(&e.admin, "outro@esa.test", "ALUNO").await;
    ctx.created(
        "/matriculas-anuais",
        &e.admin,
        json!({ "aluno_id": outro, "ano_letivo_id": e.ano_id, "classe_id": e.classe_id }),
    )
    .await;
    let resp = ctx
        .post("/matriculas", &e.admin, json!({ "aluno_id": outro, "turma_id": pequena }))
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT, "{}", resp.body);
}

// ---------------------------------------------------------------------------
// Institutions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inactive_institution_blocks_sign_in() {
    let ctx = TestContext::new();
    let (inst, admin) = ctx.instituicao("ESA", "SECUNDARIO").await;
    let root = ctx.super_token().await;

    let resp = ctx
        .put(&format!("/instituicoes/{inst}/ativo"), &root, json!({ "ativo": false }))
        .await;
    assert!(resp.status.is_success(), "deactivate: {}", resp.body);

    let resp = ctx
        .send(
            "POST",
            "/auth/login",
            None,
            None,
            Some(json!({ "email": "admin@esa.test", "password": PASSWORD })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = ctx.get("/auth/me", &admin).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN, "existing tokens stop working too");

    let resp = ctx
        .put(&format!("/instituicoes/{inst}/ativo"), &root, json!({ "ativo": true }))
        .await;
    assert!(resp.status.is_success());
    ctx.login("admin@esa.test", PASSWORD).await;
}

// ---------------------------------------------------------------------------
// HR
// ---------------------------------------------------------------------------

#[tokio::test]
async fn funcionario_changes_are_recorded() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.instituicao("ESA", "SECUNDARIO").await;
    let (_, rh) = ctx.user(&admin, "rh@esa.test", "RH").await;

    let funcionario_id = ctx
        .created(
            "/funcionarios",
            &rh,
            json!({
                "nome": "Maria Domingos",
                "cargo": "Secretária",
                "departamento": "Secretaria",
                "salario_base": 150000,
                "data_admissao": "2024-01-15",
            }),
        )
        .await;

    let resp = ctx
        .put(
            &format!("/funcionarios/{funcionario_id}"),
            &rh,
            json!({ "cargo": "Chefe de Secretaria", "salario_base": 180000, "departamento": "Secretaria" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "update: {}", resp.body);
    assert_eq!(resp.body["cargo"], "Chefe de Secretaria");

    let resp = ctx
        .get(&format!("/historico-rh?funcionario_id={funcionario_id}"), &rh)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let mut tipos: Vec<&str> = items(&resp.body)
        .iter()
        .map(|h| h["tipo_alteracao"].as_str().unwrap())
        .collect();
    tipos.sort_unstable();
    assert_eq!(tipos, ["ADMISSAO", "CARGO", "SALARIO"]);
    let salario = items(&resp.body)
        .iter()
        .find(|h| h["tipo_alteracao"] == "SALARIO")
        .unwrap();
    assert_eq!(salario["valor_anterior"], "150000");
    assert_eq!(salario["valor_novo"], "180000");

    let (_, professor) = ctx.user(&admin, "prof@esa.test", "PROFESSOR").await;
    let resp = ctx.get("/historico-rh", &professor).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn payroll_is_generated_once_and_paid_once() {
    let ctx = TestContext::new();
    let (_, admin) = ctx.instituicao("ESA", "SECUNDARIO").await;
    let (_, rh) = ctx.user(&admin, "rh@esa.test", "RH").await;
    let funcionario_id = ctx
        .created(
            "/funcionarios",
            &rh,
            json!({
                "nome": "João Manuel",
                "cargo": "Professor",
                "departamento": "Pedagógico",
                "salario_base": 220000,
                "data_admissao": "2023-09-01",
            }),
        )
        .await;

    let body = json!({
        "referencia": "2026-05",
        "lancamentos": [{ "funcionario_id": funcionario_id, "subsidios": 10000, "faltas": 2 }],
    });
    let resp = ctx.post("/folhas-pagamento/gerar", &rh, body.clone()).await;
    assert_eq!(resp.status, StatusCode::OK, "gerar: {}", resp.body);
    assert_eq!(resp.body["criadas"], 1);
    let resp = ctx.post("/folhas-pagamento/gerar", &rh, body).await;
    assert_eq!(resp.body["criadas"], 0);
    assert_eq!(resp.body["ignoradas"], 1);

    let resp = ctx.get("/folhas-pagamento?referencia=2026-05", &rh).await;
    let folhas = items(&resp.body);
    assert_eq!(folhas.len(), 1);
    let folha = &folhas[0];
    assert_eq!(folha["desconto_faltas"], 20000);
    assert_eq!(folha["inss"], 6600);
    assert_eq!(folha["valor_liquido"], 220000 + 10000 - 20000 - 6600);
    let folha_id = id(folha);

    let paid = ctx
        .post(&format!("/folhas-pagamento/{folha_id}/pagar"), &rh, json!({}))
        .await;
    assert_eq!(paid.status, StatusCode::OK, "pagar: {}", paid.body);
    assert_eq!(paid.body["status"], "PAGA");
    let twice = ctx
        .post(&format!("/folhas-pagamento/{folha_id}/pagar"), &rh, json!({}))
        .await;
    assert_eq!(twice.status, StatusCode::CONFLICT);
}
