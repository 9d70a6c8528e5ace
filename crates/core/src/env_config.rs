//! Environment variable parsing with warn-level logging for invalid values.

/// Parse an environment variable with a default fallback.
///
/// - Variable not set: returns `default` silently (expected case).
/// - Variable set but unparsable: logs a warning and returns `default`,
///   so a typo in an override never silently changes a policy bound.
pub fn env_parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    default: T,
) -> T {
    match std::env::var(var) {
        Ok(v) => match v.parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_value() {
        let var = "UCL_TEST_ENV_VALID_41923";
        unsafe { std::env::set_var(var, "250") };
        let result: usize = env_parse_with_default(var, 500);
        assert_eq!(result, 250);
        unsafe { std::env::remove_var(var) };
    }

    #[test]
    fn falls_back_on_invalid_value() {
        let var = "UCL_TEST_ENV_INVALID_41924";
        unsafe { std::env::set_var(var, "not-a-number") };
        let result: usize = env_parse_with_default(var, 500);
        assert_eq!(result, 500);
        unsafe { std::env::remove_var(var) };
    }

    #[test]
    fn falls_back_on_missing_var() {
        let var = "UCL_TEST_ENV_MISSING_41925";
        unsafe { std::env::remove_var(var) };
        let result: u32 = env_parse_with_default(var, 5);
        assert_eq!(result, 5);
    }
}
