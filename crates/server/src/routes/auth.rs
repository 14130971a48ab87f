use axum::{
    Json,
    extract::{FromRef, FromRequestParts, State},
    http::request::Parts,
};

use dsicola_api::db;
use dsicola_api::service::{self, TokenSubject};
use dsicola_api::{
    AuthTokenResponse, Capability, ChangePasswordRequest, LoginRequest, LogoutRequest,
    OkResponse, RefreshRequest, Role, UserResponse, crypto,
};

use super::{now_string, now_unix};
use crate::error::ApiErr;
use crate::rows;
use crate::storage::{Db, sq_execute, sq_query_opt};
use crate::AppConfig;

/// Header a super admin uses to pick the institution it acts on.
pub const TENANT_HEADER: &str = "x-instituicao-id";

// ---------------------------------------------------------------------------
// Auth extractor
// ---------------------------------------------------------------------------

/// Authenticated user extracted from the `Authorization: Bearer <jwt>` header.
#[derive(Debug)]
pub struct AuthUser {
    pub user_id: String,
    pub nome: String,
    pub role: Role,
    instituicao_id: Option<String>,
}

impl AuthUser {
    pub fn require(&self, cap: Capability) -> Result<(), ApiErr> {
        if self.role.allows(cap) {
            Ok(())
        } else {
            Err(ApiErr::forbidden(format!(
                "role {} is not allowed to do this",
                self.role
            )))
        }
    }

    /// Institution every tenant-scoped query of this request runs against.
    pub fn tenant(&self) -> Result<&str, ApiErr> {
        match (&self.instituicao_id, self.role.is_super_admin()) {
            (Some(id), _) => Ok(id),
            (None, true) => Err(ApiErr::bad_request(
                "super admin requests on institution data need the X-Instituicao-Id header",
            )),
            (None, false) => Err(ApiErr::forbidden("account has no institution")),
        }
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}

struct AuthContext {
    nome: String,
    role: Role,
    instituicao_id: Option<String>,
    ativo: bool,
    instituicao_ativa: Option<bool>,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Db: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiErr;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        let db = Db::from_ref(state);

        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiErr::unauthorized("missing or invalid Authorization header"))?;

        let user_id = service::resolve_auth_token(token, &config.jwt_secret, now_unix())?;

        let conn = db.conn();
        let ctx = sq_query_opt(&conn, db::users::get_auth_context(&user_id), |row| {
            Ok(AuthContext {
                nome: row.get(1)?,
                role: rows::enum_col(row, 2)?,
                instituicao_id: row.get(3)?,
                ativo: row.get(4)?,
                instituicao_ativa: row.get(5)?,
            })
        })
        .map_err(ApiErr::from_db("load auth context"))?
        .ok_or_else(|| ApiErr::unauthorized("account no longer exists"))?;

        if !ctx.ativo {
            return Err(ApiErr::unauthorized("account is disabled"));
        }
        if ctx.instituicao_ativa == Some(false) {
            return Err(ApiErr::forbidden("institution is inactive"));
        }

        let instituicao_id = if ctx.role.is_super_admin() {
            match parts.headers.get(TENANT_HEADER).and_then(|v| v.to_str().ok()) {
                Some(id) => {
                    let exists =
                        sq_query_opt(&conn, db::instituicoes::get_tipo(id), |row| {
                            row.get::<_, String>(0)
                        })
                        .map_err(ApiErr::from_db("resolve tenant header"))?;
                    if exists.is_none() {
                        return Err(ApiErr::not_found("institution not found"));
                    }
                    Some(id.to_string())
                }
                None => None,
            }
        } else {
            ctx.instituicao_id
        };

        Ok(AuthUser {
            user_id,
            nome: ctx.nome,
            role: ctx.role,
            instituicao_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Login / refresh / logout
// ---------------------------------------------------------------------------

fn issue_tokens(
    conn: &rusqlite::Connection,
    config: &AppConfig,
    user: &UserResponse,
) -> Result<AuthTokenResponse, ApiErr> {
    let subject = TokenSubject {
        user_id: &user.id,
        nome: &user.nome,
        role: user.role,
        instituicao_id: user.instituicao_id.as_deref(),
        must_change_password: user.must_change_password,
    };
    let bundle = service::prepare_token_bundle(&config.jwt_secret, &subject, now_unix())?;
    sq_execute(
        conn,
        db::users::insert_refresh_token(
            &bundle.token_id,
            &user.id,
            &bundle.token_hash,
            &bundle.expires_at,
        ),
    )
    .map_err(ApiErr::from_db("insert refresh token"))?;
    Ok(bundle.response)
}

/// Users of an inactive institution cannot sign in.
fn ensure_can_sign_in(conn: &rusqlite::Connection, user: &UserResponse) -> Result<(), ApiErr> {
    if !user.ativo {
        return Err(ApiErr::unauthorized("account is disabled"));
    }
    if let Some(inst) = &user.instituicao_id {
        let ativa = sq_query_opt(conn, db::instituicoes::get_by_id(inst), |row| {
            row.get::<_, bool>(7)
        })
        .map_err(ApiErr::from_db("load institution"))?;
        if ativa != Some(true) {
            return Err(ApiErr::forbidden("institution is inactive"));
        }
    }
    Ok(())
}

pub async fn login(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthTokenResponse>, ApiErr> {
    let email = req.email.trim().to_lowercase();
    if config.jwt_secret.is_empty() {
        return Err(ApiErr::internal("JWT authentication not configured"));
    }

    let conn = db.conn();
    let found = sq_query_opt(&conn, db::users::get_by_email_for_login(&email), |row| {
        Ok((rows::user(row)?, row.get::<_, String>(10)?))
    })
    .map_err(ApiErr::from_db("login lookup"))?;

    let Some((user, password_hash)) = found else {
        return Err(ApiErr::unauthorized("invalid email or password"));
    };
    if !crypto::verify_password(&req.password, &password_hash) {
        tracing::info!(user_id = %user.id, "failed login attempt");
        return Err(ApiErr::unauthorized("invalid email or password"));
    }
    ensure_can_sign_in(&conn, &user)?;

    let response = issue_tokens(&conn, &config, &user)?;
    tracing::info!(user_id = %user.id, role = %user.role, "login");
    Ok(Json(response))
}

/// Exchange a refresh token for a new token pair. The old refresh token is
/// consumed.
pub async fn refresh(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AuthTokenResponse>, ApiErr> {
    let token_hash = crypto::hash_token(&req.refresh_token);
    let conn = db.conn();

    let stored = sq_query_opt(&conn, db::users::get_refresh_token(&token_hash), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })
    .map_err(ApiErr::from_db("refresh lookup"))?;
    let Some((user_id, expires_at)) = stored else {
        return Err(ApiErr::unauthorized("invalid refresh token"));
    };

    sq_execute(&conn, db::users::delete_refresh_token(&token_hash))
        .map_err(ApiErr::from_db("delete refresh token"))?;
    if expires_at < now_string()? {
        return Err(ApiErr::unauthorized("refresh token expired"));
    }

    let user = sq_query_opt(&conn, db::users::get_by_id(&user_id), rows::user)
        .map_err(ApiErr::from_db("load user"))?
        .ok_or_else(|| ApiErr::unauthorized("account no longer exists"))?;
    ensure_can_sign_in(&conn, &user)?;

    Ok(Json(issue_tokens(&conn, &config, &user)?))
}

pub async fn logout(
    State(db): State<Db>,
    Json(req): Json<LogoutRequest>,
) -> Result<Json<OkResponse>, ApiErr> {
    let token_hash = crypto::hash_token(&req.refresh_token);
    let conn = db.conn();
    sq_execute(&conn, db::users::delete_refresh_token(&token_hash))
        .map_err(ApiErr::from_db("logout"))?;
    Ok(Json(OkResponse { ok: true }))
}

// ---------------------------------------------------------------------------
// Current user
// ---------------------------------------------------------------------------

pub async fn me(State(db): State<Db>, user: AuthUser) -> Result<Json<UserResponse>, ApiErr> {
    let conn = db.conn();
    sq_query_opt(&conn, db::users::get_by_id(&user.user_id), rows::user)
        .map_err(ApiErr::from_db("load user"))?
        .map(Json)
        .ok_or_else(|| ApiErr::not_found("user not found"))
}

/// Redefinir senha. Signs the user out everywhere else.
pub async fn change_password(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    user: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<OkResponse>, ApiErr> {
    service::validate_password(&req.new_password)?;

    let conn = db.conn();
    let current_hash = sq_query_opt(&conn, db::users::get_password_hash(&user.user_id), |row| {
        row.get::<_, String>(0)
    })
    .map_err(ApiErr::from_db("load password hash"))?
    .ok_or_else(|| ApiErr::not_found("user not found"))?;

    if !crypto::verify_password(&req.current_password, &current_hash) {
        return Err(ApiErr::unauthorized("current password is incorrect"));
    }

    let new_hash = crypto::hash_password(&req.new_password, config.pbkdf2_iterations)?;
    sq_execute(&conn, db::users::update_password(&user.user_id, &new_hash))
        .map_err(ApiErr::from_db("update password"))?;
    sq_execute(&conn, db::users::delete_refresh_tokens_for_user(&user.user_id))
        .map_err(ApiErr::from_db("revoke refresh tokens"))?;

    tracing::info!(user_id = %user.user_id, "password changed");
    Ok(Json(OkResponse { ok: true }))
}
