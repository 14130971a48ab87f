//! User / auth query builders.

use sea_query::{Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{Instituicoes, RefreshTokens, Users};

// ── Columns ────────────────────────────────────────────────────────────────

/// Column order: id, instituicao_id, email, nome, role, numero_identificacao,
/// telefone, ativo, must_change_password, created_at.
fn user_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.column((Users::Table, Users::Id))
        .column((Users::Table, Users::InstituicaoId))
        .column((Users::Table, Users::Email))
        .column((Users::Table, Users::Nome))
        .column((Users::Table, Users::Role))
        .column((Users::Table, Users::NumeroIdentificacao))
        .column((Users::Table, Users::Telefone))
        .column((Users::Table, Users::Ativo))
        .column((Users::Table, Users::MustChangePassword))
        .column((Users::Table, Users::CreatedAt))
}

// ── User lookups ───────────────────────────────────────────────────────────

/// Find user by id, regardless of tenant (for `/auth/me`).
pub fn get_by_id(user_id: &str) -> Built {
    let mut q = Query::select().to_owned();
    user_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Find a user that belongs to the given institution.
pub fn get_in_tenant(instituicao_id: &str, user_id: &str) -> Built {
    let mut q = Query::select().to_owned();
    user_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .and_where(Expr::col(Users::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

/// User columns followed by `password_hash`.
pub fn get_by_email_for_login(email: &str) -> Built {
    let mut q = Query::select().to_owned();
    user_columns(&mut q);
    q.column(Users::PasswordHash)
        .from(Users::Table)
        .and_where(Expr::col(Users::Email).eq(email))
        .build(SqliteQueryBuilder)
}

/// Returns id, nome, role, instituicao_id, ativo, and the institution's
/// ativo flag (NULL for global accounts).
pub fn get_auth_context(user_id: &str) -> Built {
    Query::select()
        .column((Users::Table, Users::Id))
        .column((Users::Table, Users::Nome))
        .column((Users::Table, Users::Role))
        .column((Users::Table, Users::InstituicaoId))
        .column((Users::Table, Users::Ativo))
        .column((Instituicoes::Table, Instituicoes::Ativo))
        .from(Users::Table)
        .left_join(
            Instituicoes::Table,
            Expr::col((Instituicoes::Table, Instituicoes::Id))
                .equals((Users::Table, Users::InstituicaoId)),
        )
        .and_where(Expr::col((Users::Table, Users::Id)).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Check email existence.
pub fn email_exists(email: &str) -> Built {
    Query::select()
        .expr(Expr::expr(Func::count(Expr::col(Asterisk))).gt(0))
        .from(Users::Table)
        .and_where(Expr::col(Users::Email).eq(email))
        .build(SqliteQueryBuilder)
}

/// Does any super admin exist yet?
pub fn super_admin_exists() -> Built {
    Query::select()
        .expr(Expr::expr(Func::count(Expr::col(Asterisk))).gt(0))
        .from(Users::Table)
        .and_where(Expr::col(Users::Role).eq("SUPER_ADMIN"))
        .build(SqliteQueryBuilder)
}

pub fn list(instituicao_id: &str, role: Option<&str>) -> Built {
    let mut q = Query::select().to_owned();
    user_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col(Users::InstituicaoId).eq(instituicao_id));
    if let Some(role) = role {
        q.and_where(Expr::col(Users::Role).eq(role));
    }
    q.order_by(Users::Nome, Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Role of a user inside a tenant (returns role).
pub fn get_role(instituicao_id: &str, user_id: &str) -> Built {
    Query::select()
        .column(Users::Role)
        .from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .and_where(Expr::col(Users::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

// ── User writes ────────────────────────────────────────────────────────────

pub struct NewUser<'a> {
    pub id: &'a str,
    pub instituicao_id: Option<&'a str>,
    pub email: &'a str,
    pub nome: &'a str,
    pub role: &'a str,
    pub password_hash: &'a str,
    pub numero_identificacao: Option<&'a str>,
    pub telefone: Option<&'a str>,
    pub must_change_password: bool,
}

pub fn insert(u: &NewUser<'_>) -> Built {
    Query::insert()
        .into_table(Users::Table)
        .columns([
            Users::Id,
            Users::InstituicaoId,
            Users::Email,
            Users::Nome,
            Users::Role,
            Users::PasswordHash,
            Users::NumeroIdentificacao,
            Users::Telefone,
            Users::MustChangePassword,
        ])
        .values_panic([
            u.id.into(),
            u.instituicao_id.map(|s| s.to_string()).into(),
            u.email.into(),
            u.nome.into(),
            u.role.into(),
            u.password_hash.into(),
            u.numero_identificacao.map(|s| s.to_string()).into(),
            u.telefone.map(|s| s.to_string()).into(),
            u.must_change_password.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Get the stored password hash for a user.
pub fn get_password_hash(user_id: &str) -> Built {
    Query::select()
        .column(Users::PasswordHash)
        .from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Update password and clear the forced-change flag.
pub fn update_password(user_id: &str, password_hash: &str) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::PasswordHash, password_hash)
        .value(Users::MustChangePassword, false)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

pub fn set_ativo(instituicao_id: &str, user_id: &str, ativo: bool) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::Ativo, ativo)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .and_where(Expr::col(Users::InstituicaoId).eq(instituicao_id))
        .build(SqliteQueryBuilder)
}

// ── Refresh tokens ─────────────────────────────────────────────────────────

pub fn insert_refresh_token(id: &str, user_id: &str, token_hash: &str, expires_at: &str) -> Built {
    Query::insert()
        .into_table(RefreshTokens::Table)
        .columns([
            RefreshTokens::Id,
            RefreshTokens::UserId,
            RefreshTokens::TokenHash,
            RefreshTokens::ExpiresAt,
        ])
        .values_panic([
            id.into(),
            user_id.into(),
            token_hash.into(),
            expires_at.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Returns user_id, expires_at.
pub fn get_refresh_token(token_hash: &str) -> Built {
    Query::select()
        .columns([RefreshTokens::UserId, RefreshTokens::ExpiresAt])
        .from(RefreshTokens::Table)
        .and_where(Expr::col(RefreshTokens::TokenHash).eq(token_hash))
        .build(SqliteQueryBuilder)
}

pub fn delete_refresh_token(token_hash: &str) -> Built {
    Query::delete()
        .from_table(RefreshTokens::Table)
        .and_where(Expr::col(RefreshTokens::TokenHash).eq(token_hash))
        .build(SqliteQueryBuilder)
}

/// Revoke every session of a user (password change, deactivation).
pub fn delete_refresh_tokens_for_user(user_id: &str) -> Built {
    Query::delete()
        .from_table(RefreshTokens::Table)
        .and_where(Expr::col(RefreshTokens::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_lookup_filters_by_institution() {
        let (sql, values) = get_in_tenant("inst-1", "user-1");
        assert!(sql.contains(r#""instituicao_id" = ?"#));
        assert_eq!(values.0.len(), 2);
    }

    #[test]
    fn list_adds_role_filter_only_when_given() {
        let (all, _) = list("inst-1", None);
        let (filtered, values) = list("inst-1", Some("ALUNO"));
        assert!(!all.contains(r#""role" = ?"#));
        assert!(filtered.contains(r#""role" = ?"#));
        assert_eq!(values.0.len(), 2);
    }
}
