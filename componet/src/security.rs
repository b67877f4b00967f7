//! Security utilities for query construction.
//!
//! Every identifier placed into generated SQL comes from the metadata registry
//! or the catalog configuration, never from free-form request text. These
//! helpers still validate and quote each one, and escape the few literals
//! (category key, year label, placeholder) that end up in `WHERE` clauses.

use crate::error::{ComponetError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Longest identifier accepted, per dotted part.
const MAX_IDENTIFIER_LEN: usize = 128;

/// Longest literal accepted in a filter clause.
const MAX_LITERAL_LEN: usize = 256;

/// A secure string that automatically clears its contents when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SecureString(String);

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString(***)")
    }
}

impl SecureString {
    /// Create a new secure string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the string value. Use carefully and avoid storing the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Convert to a regular string. The SecureString will be zeroized.
    pub fn into_string(mut self) -> String {
        let value = std::mem::take(&mut self.0);
        self.0.zeroize();
        value
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// SQL identifier validation and escaping utilities.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Validates and quotes a single SQL identifier (column or table name).
    ///
    /// # Examples
    /// ```rust
    /// use componet::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::escape_identifier("part_mpn").unwrap(), "\"part_mpn\"");
    /// assert!(SqlSecurity::escape_identifier("mpn; DROP TABLE parts--").is_err());
    /// ```
    pub fn escape_identifier(identifier: &str) -> Result<String> {
        Self::validate_identifier(identifier)?;
        Ok(format!("\"{identifier}\""))
    }

    /// Validates and quotes a possibly schema-qualified name such as
    /// `public.final`, quoting each part separately.
    pub fn escape_qualified_name(name: &str) -> Result<String> {
        let parts = name
            .split('.')
            .map(Self::escape_identifier)
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join("."))
    }

    /// Validates a single SQL identifier without quoting it.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(ComponetError::SecurityError(
                "SQL identifier cannot be empty or whitespace-only".to_string(),
            ));
        }

        if identifier.len() > MAX_IDENTIFIER_LEN {
            return Err(ComponetError::SecurityError(format!(
                "SQL identifier too long (max {MAX_IDENTIFIER_LEN} characters)"
            )));
        }

        static IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
            // This regex is compile-time constant and known to be valid
            #[allow(clippy::expect_used)]
            Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$")
                .expect("Hard-coded regex pattern should be valid")
        });

        if !IDENTIFIER_REGEX.is_match(identifier) {
            return Err(ComponetError::SecurityError(format!(
                "Invalid SQL identifier format: '{identifier}'. Identifiers must start with a letter or underscore and contain only letters, numbers, and underscores"
            )));
        }

        Ok(())
    }

    /// Escapes a string literal for use in a filter clause, including the
    /// surrounding single quotes.
    ///
    /// # Examples
    /// ```rust
    /// use componet::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::escape_literal("6331").unwrap(), "'6331'");
    /// assert_eq!(SqlSecurity::escape_literal("O'Brien").unwrap(), "'O''Brien'");
    /// ```
    pub fn escape_literal(value: &str) -> Result<String> {
        if value.len() > MAX_LITERAL_LEN {
            return Err(ComponetError::SecurityError(format!(
                "SQL literal too long (max {MAX_LITERAL_LEN} characters)"
            )));
        }

        if value.contains('\0') {
            return Err(ComponetError::SecurityError(
                "SQL literal cannot contain null bytes".to_string(),
            ));
        }

        Ok(format!("'{}'", value.replace('\'', "''")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_identifier_valid() {
        assert_eq!(
            SqlSecurity::escape_identifier("part_specs_capacitance_display_value").unwrap(),
            "\"part_specs_capacitance_display_value\""
        );
        assert_eq!(SqlSecurity::escape_identifier("_volume").unwrap(), "\"_volume\"");
    }

    #[test]
    fn test_escape_identifier_invalid() {
        assert!(SqlSecurity::escape_identifier("").is_err());
        assert!(SqlSecurity::escape_identifier("   ").is_err());
        assert!(SqlSecurity::escape_identifier("1column").is_err());
        assert!(SqlSecurity::escape_identifier("col\"umn").is_err());
        assert!(SqlSecurity::escape_identifier("a b").is_err());
        assert!(SqlSecurity::escape_identifier("x; DROP TABLE final").is_err());
        assert!(SqlSecurity::escape_identifier(&"a".repeat(MAX_IDENTIFIER_LEN + 1)).is_err());
    }

    #[test]
    fn test_escape_qualified_name() {
        assert_eq!(
            SqlSecurity::escape_qualified_name("public.final").unwrap(),
            "\"public\".\"final\""
        );
        assert_eq!(
            SqlSecurity::escape_qualified_name("parts").unwrap(),
            "\"parts\""
        );
        assert!(SqlSecurity::escape_qualified_name("public..final").is_err());
        assert!(SqlSecurity::escape_qualified_name("public.final--").is_err());
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(SqlSecurity::escape_literal("nan").unwrap(), "'nan'");
        assert_eq!(
            SqlSecurity::escape_literal("' OR '1'='1").unwrap(),
            "''' OR ''1''=''1'"
        );
        assert!(SqlSecurity::escape_literal("bad\0value").is_err());
        assert!(SqlSecurity::escape_literal(&"9".repeat(MAX_LITERAL_LEN + 1)).is_err());
    }

    #[test]
    fn test_secure_string_debug_hides_value() {
        let secret = SecureString::new("hunter2");
        assert_eq!(format!("{secret:?}"), "SecureString(***)");
        assert_eq!(secret.expose(), "hunter2");
        assert_eq!(secret.into_string(), "hunter2");
    }
}
