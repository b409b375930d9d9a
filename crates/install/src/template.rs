//! Service-unit template substitution
//!
//! Rendering is deterministic: the unit carries the resolved executable
//! path and application directory byte-for-byte, and no placeholder token
//! survives rendering.

use atgmlogger_errors::{Error, InstallError};

/// Placeholder for the daemon executable path
pub const TOKEN_EXEC_PATH: &str = "@EXECPATH@";

/// Placeholder for the application directory
pub const TOKEN_APP_DIR: &str = "@APPDIR@";

/// Render the service-unit template
///
/// # Errors
///
/// Returns an error if any placeholder token survives substitution.
pub fn render_service_unit(template: &str, exec_path: &str, app_dir: &str) -> Result<String, Error> {
    let rendered = template
        .replace(TOKEN_EXEC_PATH, exec_path)
        .replace(TOKEN_APP_DIR, app_dir);

    if let Some(token) = leftover_token(&rendered) {
        return Err(InstallError::UnresolvedToken { token }.into());
    }
    Ok(rendered)
}

/// Find a surviving `@NAME@` placeholder, if any
///
/// A token is a non-empty run of uppercase ASCII between two `@` signs.
fn leftover_token(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut start = None;
    for (i, &b) in bytes.iter().enumerate() {
        match (start, b) {
            (None, b'@') => start = Some(i),
            (Some(s), b'@') => {
                if i > s + 1 {
                    return Some(text[s..=i].to_string());
                }
                // "@@" or token opening right after a close
                start = Some(i);
            }
            (Some(_), c) if c.is_ascii_uppercase() => {}
            (Some(_), _) => start = None,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::assets;

    #[test]
    fn substitutes_exact_strings_with_no_leftover_tokens() {
        // Caller-supplied values pass through byte-for-byte
        let rendered = render_service_unit(
            assets::SERVICE_TEMPLATE,
            "/usr/bin/python3.6",
            "/opt/SerialLogger",
        )
        .expect("render");

        assert!(rendered.contains("ExecStart=/usr/bin/python3.6 "));
        assert!(rendered.contains("WorkingDirectory=/opt/SerialLogger"));
        assert!(!rendered.contains(TOKEN_EXEC_PATH));
        assert!(!rendered.contains(TOKEN_APP_DIR));
        assert!(leftover_token(&rendered).is_none());
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = render_service_unit(assets::SERVICE_TEMPLATE, "/opt/atgmlogger/atgmlogger", "/opt/atgmlogger").expect("render");
        let b = render_service_unit(assets::SERVICE_TEMPLATE, "/opt/atgmlogger/atgmlogger", "/opt/atgmlogger").expect("render");
        assert_eq!(a, b);
    }

    #[test]
    fn unresolved_token_is_fatal() {
        let err = render_service_unit("ExecStart=@EXECPATH@ @UNKNOWN@\n", "/bin/x", "/opt/x")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Install(InstallError::UnresolvedToken { ref token }) if token == "@UNKNOWN@"
        ));
    }

    #[test]
    fn email_like_text_is_not_a_token() {
        assert!(leftover_token("Contact=ops@example.org\n").is_none());
        assert!(leftover_token("a @@ b").is_none());
    }
}
