// ABOUTME: Identifier helpers shared by the connection provider and filter builder
// ABOUTME: Validates and quotes SQL identifiers, sanitizes caller input for logs

use anyhow::{bail, Result};

/// Validate a PostgreSQL identifier such as a schema name
///
/// PostgreSQL identifiers accepted here must:
/// - Be 1-63 characters long
/// - Start with a letter (a-z, A-Z) or underscore (_)
/// - Contain only letters, digits (0-9), or underscores
///
/// # Security
///
/// The configured schema name is interpolated into `SET search_path`, which
/// cannot take a bound parameter. It MUST pass this check first.
///
/// # Examples
///
/// ```
/// # use fleet_records::utils::validate_postgres_identifier;
/// assert!(validate_postgres_identifier("airline").is_ok());
/// assert!(validate_postgres_identifier("_staging").is_ok());
/// assert!(validate_postgres_identifier("123abc").is_err());
/// assert!(validate_postgres_identifier("airline; DROP TABLE users").is_err());
/// ```
pub fn validate_postgres_identifier(identifier: &str) -> Result<()> {
    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        bail!("Identifier cannot be empty or whitespace-only");
    }

    // PostgreSQL limit is 63 bytes
    if trimmed.len() > 63 {
        bail!(
            "Identifier '{}' exceeds maximum length of 63 characters (got {})",
            sanitize_identifier(trimmed),
            trimmed.len()
        );
    }

    let Some(first_char) = trimmed.chars().next() else {
        bail!("Identifier cannot be empty or whitespace-only");
    };

    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        bail!(
            "Identifier '{}' must start with a letter or underscore, not '{}'",
            sanitize_identifier(trimmed),
            first_char
        );
    }

    for (i, c) in trimmed.chars().enumerate() {
        if !c.is_ascii_alphanumeric() && c != '_' {
            bail!(
                "Identifier '{}' contains invalid character '{}' at position {}. \
                 Only letters, digits, and underscores are allowed",
                sanitize_identifier(trimmed),
                if c.is_control() {
                    format!("\\x{:02x}", c as u32)
                } else {
                    c.to_string()
                },
                i
            );
        }
    }

    Ok(())
}

/// Double-quote an identifier for use in SQL text
///
/// Embedded double quotes are doubled. Callers still validate the identifier
/// first; quoting only preserves its case.
pub fn quote_ident(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Sanitize caller-supplied text for display in logs and error messages
///
/// Removes control characters and limits length to 100 chars so a rejected
/// filter attribute cannot forge log lines.
///
/// **Note**: This is for display purposes only. It does not make text safe
/// to put into SQL.
///
/// # Examples
///
/// ```
/// # use fleet_records::utils::sanitize_identifier;
/// assert_eq!(sanitize_identifier("firstname"), "firstname");
/// assert_eq!(sanitize_identifier("first\nname"), "firstname");
/// assert_eq!(sanitize_identifier(&"a".repeat(200)).len(), 100);
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}
