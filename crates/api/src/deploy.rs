//! Environment variables read by the server at startup.

pub const ENV_DATA_DIR: &str = "DSICOLA_DATA_DIR";
pub const ENV_PORT: &str = "PORT";
pub const ENV_BASE_URL: &str = "BASE_URL";
pub const ENV_JWT_SECRET: &str = "JWT_SECRET";
pub const ENV_PBKDF2_ITERATIONS: &str = "DSICOLA_PBKDF2_ITERATIONS";
pub const ENV_SUPERADMIN_EMAIL: &str = "DSICOLA_SUPERADMIN_EMAIL";
pub const ENV_SUPERADMIN_PASSWORD: &str = "DSICOLA_SUPERADMIN_PASSWORD";
pub const ENV_LOAN_DAYS: &str = "DSICOLA_LOAN_DAYS";
pub const ENV_MAX_ACTIVE_LOANS: &str = "DSICOLA_MAX_ACTIVE_LOANS";
/// Enables permissive CORS for browser clients on other origins.
pub const ENV_CORS_PERMISSIVE: &str = "DSICOLA_CORS_PERMISSIVE";

/// Parse a human-friendly boolean env flag value.
///
/// Accepted truthy values:
/// - `1`
/// - `true`
/// - `yes`
/// - `on`
pub fn parse_bool_flag(raw: Option<&str>, default: bool) -> bool {
    raw.map(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
    .unwrap_or(default)
}

/// Parse a positive integer setting, falling back to `default` when the
/// value is missing or not a positive number.
pub fn parse_positive<T>(raw: Option<&str>, default: T) -> T
where
    T: std::str::FromStr + PartialOrd + Default,
{
    raw.and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v > T::default())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_truthy_values() {
        for value in ["1", "true", "TRUE", "yes", "on"] {
            assert!(parse_bool_flag(Some(value), false));
        }
    }

    #[test]
    fn parses_falsy_values() {
        for value in ["0", "false", "no", "off", ""] {
            assert!(!parse_bool_flag(Some(value), true));
        }
    }

    #[test]
    fn uses_default_for_missing_value() {
        assert!(parse_bool_flag(None, true));
        assert!(!parse_bool_flag(None, false));
    }

    #[test]
    fn positive_numbers_fall_back_on_garbage() {
        assert_eq!(parse_positive(Some("21"), 14i64), 21);
        assert_eq!(parse_positive(Some("0"), 14i64), 14);
        assert_eq!(parse_positive(Some("-3"), 14i64), 14);
        assert_eq!(parse_positive(Some("abc"), 3u32), 3);
        assert_eq!(parse_positive(None, 600_000u32), 600_000);
    }
}
