//! Shared validation and token helpers, independent of the web framework.
//!
//! Route handlers stay thin adapters over these helpers and the rules in
//! `dsicola-core`.

use chrono::NaiveDate;

use crate::{AuthTokenResponse, Role, ServiceError};

// ─── Validation ─────────────────────────────────────────────────────────────

/// Validate and normalize an email address. Returns the lowercased, trimmed email.
pub fn validate_email(email: &str) -> Result<String, ServiceError> {
    let email = email.trim().to_lowercase();
    let valid_shape = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid_shape || email.len() > 254 {
        return Err(ServiceError::BadRequest("invalid email address".into()));
    }
    Ok(email)
}

/// Validate a password (8-128 characters).
pub fn validate_password(password: &str) -> Result<(), ServiceError> {
    let len = password.chars().count();
    if len < 8 {
        return Err(ServiceError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }
    if len > 128 {
        return Err(ServiceError::BadRequest(
            "password must be at most 128 characters".into(),
        ));
    }
    Ok(())
}

/// Validate a required free-text field. Returns the trimmed value.
pub fn validate_text(field: &str, value: &str, max: usize) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > max {
        return Err(ServiceError::BadRequest(format!(
            "{field} must be 1-{max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional field, mapping blank input to `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Institution acronyms are stored uppercased, letters and digits only.
pub fn validate_sigla(sigla: &str) -> Result<String, ServiceError> {
    let sigla = sigla.trim().to_uppercase();
    if sigla.is_empty()
        || sigla.len() > 16
        || !sigla.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(ServiceError::BadRequest(
            "sigla must be 1-16 letters, digits or '-'".into(),
        ));
    }
    Ok(sigla)
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ServiceError::BadRequest(format!("{field} must be a YYYY-MM-DD date")))
}

/// Format a date the way it is stored.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Unix seconds in SQLite `datetime` format.
pub fn sqlite_datetime(now_unix: u64) -> Result<String, ServiceError> {
    let dt = chrono::DateTime::from_timestamp(now_unix as i64, 0)
        .ok_or_else(|| ServiceError::Internal("invalid timestamp".into()))?;
    Ok(dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// Parse a column holding a `text_enum` value; a mismatch is a corrupt row.
pub fn parse_stored<T>(column: &str, raw: &str) -> Result<T, ServiceError>
where
    T: std::str::FromStr,
{
    raw.parse()
        .map_err(|_| ServiceError::Internal(format!("unexpected {column} value '{raw}'")))
}

// ─── Auth Token Resolution ──────────────────────────────────────────────────

/// Verify a bearer token and return the user id it was issued to.
pub fn resolve_auth_token(token: &str, jwt_secret: &str, now: u64) -> Result<String, ServiceError> {
    if jwt_secret.is_empty() {
        return Err(ServiceError::Unauthorized(
            "JWT authentication not configured".into(),
        ));
    }
    crate::crypto::verify_jwt(token, jwt_secret, now)
}

// ─── Token Bundle ───────────────────────────────────────────────────────────

/// Pre-computed token bundle returned by [`prepare_token_bundle`].
///
/// The caller only needs to insert the refresh token row.
pub struct TokenBundle {
    /// SHA-256 hash of the refresh token (stored in DB).
    pub token_hash: String,
    /// UUID primary key for the refresh_tokens row.
    pub token_id: String,
    /// `datetime` string for the refresh token expiry (DB column value).
    pub expires_at: String,
    /// Ready-to-return API response.
    pub response: AuthTokenResponse,
}

/// Identity carried into the token response.
pub struct TokenSubject<'a> {
    pub user_id: &'a str,
    pub nome: &'a str,
    pub role: Role,
    pub instituicao_id: Option<&'a str>,
    pub must_change_password: bool,
}

/// Build a [`TokenBundle`] containing a JWT, refresh token, and the auth response.
pub fn prepare_token_bundle(
    jwt_secret: &str,
    subject: &TokenSubject<'_>,
    now_unix: u64,
) -> Result<TokenBundle, ServiceError> {
    use crate::crypto;

    let access_token = crypto::sign_jwt(subject.user_id, jwt_secret, now_unix);
    let refresh_token = crypto::generate_token()?;
    let token_hash = crypto::hash_token(&refresh_token);
    let token_id = uuid::Uuid::new_v4().to_string();
    let expires_at = sqlite_datetime(now_unix + crypto::REFRESH_EXPIRY_SECS)?;

    let response = AuthTokenResponse {
        access_token,
        refresh_token,
        expires_in: crypto::JWT_EXPIRY_SECS,
        user_id: subject.user_id.to_string(),
        nome: subject.nome.to_string(),
        role: subject.role,
        instituicao_id: subject.instituicao_id.map(str::to_string),
        must_change_password: subject.must_change_password,
    };

    Ok(TokenBundle {
        token_hash,
        token_id,
        expires_at,
        response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email("  Ana@Escola.AO ").unwrap(), "ana@escola.ao");
        assert!(validate_email("ana").is_err());
        assert!(validate_email("@escola.ao").is_err());
        assert!(validate_email("ana@local").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_text() {
        assert_eq!(validate_text("nome", "  Turma A ", 64).unwrap(), "Turma A");
        assert!(validate_text("nome", "   ", 64).is_err());
        assert!(validate_text("nome", &"x".repeat(65), 64).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(Some(" 923 ")), Some("923".into()));
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn test_validate_sigla() {
        assert_eq!(validate_sigla(" ipl ").unwrap(), "IPL");
        assert!(validate_sigla("A B").is_err());
        assert!(validate_sigla("").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(format_date(parse_date("data", "2026-02-01").unwrap()), "2026-02-01");
        assert!(parse_date("data", "01/02/2026").is_err());
    }

    #[test]
    fn test_sqlite_datetime() {
        assert_eq!(sqlite_datetime(0).unwrap(), "1970-01-01 00:00:00");
    }

    #[test]
    fn token_bundle_carries_identity() {
        let subject = TokenSubject {
            user_id: "u1",
            nome: "Ana",
            role: Role::Secretaria,
            instituicao_id: Some("i1"),
            must_change_password: true,
        };
        let bundle = prepare_token_bundle("secret", &subject, 1_000).unwrap();
        assert_eq!(bundle.response.role, Role::Secretaria);
        assert_eq!(
            crate::crypto::verify_jwt(&bundle.response.access_token, "secret", 1_001).unwrap(),
            "u1"
        );
        assert_eq!(
            bundle.token_hash,
            crate::crypto::hash_token(&bundle.response.refresh_token)
        );
        assert!(bundle.response.must_change_password);
    }

    #[test]
    fn auth_requires_configured_secret() {
        let err = resolve_auth_token("x.y.z", "", 0).unwrap_err();
        assert_eq!(err.status_code(), 401);
    }
}
