use crate::error::{AppError, Result};
use crate::models::live_session::SessionKind;

/// Maximum length of a session title, in characters.
pub const MAX_TITLE_CHARS: usize = 200;
/// Maximum length of a session id.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Validates a session title.
///
/// # Returns
///
/// The trimmed title.
pub fn validate_title(title: Option<&str>) -> Result<String> {
    let title = title.map(str::trim).unwrap_or_default();

    if title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }

    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::Validation(format!(
            "title must be at most {} characters",
            MAX_TITLE_CHARS
        )));
    }

    Ok(title.to_string())
}

/// Validates a session id supplied by a caller.
pub fn validate_session_id(session_id: Option<&str>) -> Result<&str> {
    let session_id = session_id.map(str::trim).unwrap_or_default();

    if session_id.is_empty() {
        return Err(AppError::Validation("session_id is required".to_string()));
    }

    if session_id.len() > MAX_SESSION_ID_LEN {
        return Err(AppError::Validation(format!(
            "session_id must be at most {} characters",
            MAX_SESSION_ID_LEN
        )));
    }

    Ok(session_id)
}

/// Parses a session kind.
pub fn parse_kind(kind: Option<&str>) -> Result<SessionKind> {
    let kind = kind.ok_or_else(|| AppError::Validation("kind is required".to_string()))?;
    kind.parse().map_err(AppError::Validation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_trimmed_and_required() {
        assert_eq!(validate_title(Some("  Sprint Retro ")).unwrap(), "Sprint Retro");
        assert!(validate_title(Some("   ")).is_err());
        assert!(validate_title(None).is_err());
        assert!(validate_title(Some(&"a".repeat(MAX_TITLE_CHARS + 1))).is_err());
        assert!(validate_title(Some(&"é".repeat(MAX_TITLE_CHARS))).is_ok());
    }

    #[test]
    fn session_id_is_required() {
        assert_eq!(validate_session_id(Some("live_1_abc")).unwrap(), "live_1_abc");
        assert!(matches!(validate_session_id(None), Err(AppError::Validation(_))));
        assert!(matches!(validate_session_id(Some("")), Err(AppError::Validation(_))));
    }

    #[test]
    fn kind_must_be_known() {
        assert_eq!(parse_kind(Some("audio")).unwrap(), SessionKind::Audio);
        assert_eq!(parse_kind(Some("video")).unwrap(), SessionKind::Video);
        assert!(parse_kind(Some("screen")).is_err());
        assert!(parse_kind(None).is_err());
    }
}
