//! Session cookie construction and token extraction.

use crate::config::SessionConfig;
use axum::http::{header, request::Parts};

/// Build the Set-Cookie value carrying a session token.
pub fn create_session_cookie(token: &str, config: &SessionConfig) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite={}; Max-Age={}",
        config.cookie_name,
        token,
        same_site_attr(&config.cookie_same_site),
        config.duration.as_secs()
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build the Set-Cookie value that clears the session cookie on logout.
pub fn clear_session_cookie(config: &SessionConfig) -> String {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite={}; Max-Age=0",
        config.cookie_name,
        same_site_attr(&config.cookie_same_site)
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn same_site_attr(value: &str) -> &'static str {
    match value.to_ascii_lowercase().as_str() {
        "strict" => "Strict",
        "none" => "None",
        _ => "Lax",
    }
}

/// Pull a session token out of a request, checking in order:
///
/// 1. the session cookie
/// 2. an `Authorization: Bearer` header
/// 3. the `st` query parameter
///
/// The first source that yields a non-empty value wins. The query parameter
/// exists for tooling convenience; tokens passed that way can end up in access
/// logs, so browser clients should stick to the cookie.
pub fn extract_token(parts: &Parts, config: &SessionConfig) -> Option<String> {
    token_from_cookie(parts, &config.cookie_name)
        .or_else(|| token_from_bearer(parts))
        .or_else(|| token_from_query(parts))
}

fn token_from_cookie(parts: &Parts, cookie_name: &str) -> Option<String> {
    let cookies = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == cookie_name && !value.is_empty()).then(|| value.to_string())
    })
}

fn token_from_bearer(parts: &Parts) -> Option<String> {
    let auth = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn token_from_query(parts: &Parts) -> Option<String> {
    let query = parts.uri.query()?;
    query.split('&').find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == "st" && !value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn session_config() -> SessionConfig {
        SessionConfig::default()
    }

    fn parts_for(builder: axum::http::request::Builder) -> Parts {
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_cookie_format() {
        let cookie = create_session_cookie("abc123", &session_config());
        assert_eq!(cookie, "st=abc123; Path=/; HttpOnly; SameSite=Lax; Max-Age=14400");
    }

    #[test]
    fn test_cookie_secure_flag() {
        let mut config = session_config();
        config.cookie_secure = true;
        config.cookie_same_site = "strict".to_string();

        let cookie = create_session_cookie("abc123", &config);
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie(&session_config());
        assert_eq!(cookie, "st=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    }

    #[test]
    fn test_extract_from_cookie() {
        let parts = parts_for(Request::builder().uri("/me").header("cookie", "theme=dark; st=tok_cookie"));
        assert_eq!(extract_token(&parts, &session_config()), Some("tok_cookie".to_string()));
    }

    #[test]
    fn test_extract_from_bearer() {
        let parts = parts_for(Request::builder().uri("/me").header("authorization", "Bearer tok_bearer"));
        assert_eq!(extract_token(&parts, &session_config()), Some("tok_bearer".to_string()));
    }

    #[test]
    fn test_extract_from_query() {
        let parts = parts_for(Request::builder().uri("/me?foo=1&st=tok_query"));
        assert_eq!(extract_token(&parts, &session_config()), Some("tok_query".to_string()));
    }

    #[test]
    fn test_cookie_wins_over_bearer_and_query() {
        let parts = parts_for(
            Request::builder()
                .uri("/me?st=tok_query")
                .header("cookie", "st=tok_cookie")
                .header("authorization", "Bearer tok_bearer"),
        );
        assert_eq!(extract_token(&parts, &session_config()), Some("tok_cookie".to_string()));
    }

    #[test]
    fn test_bearer_wins_over_query() {
        let parts = parts_for(
            Request::builder()
                .uri("/me?st=tok_query")
                .header("authorization", "Bearer tok_bearer"),
        );
        assert_eq!(extract_token(&parts, &session_config()), Some("tok_bearer".to_string()));
    }

    #[test]
    fn test_empty_sources_are_skipped() {
        let parts = parts_for(
            Request::builder()
                .uri("/me?st=tok_query")
                .header("cookie", "st=")
                .header("authorization", "Bearer "),
        );
        assert_eq!(extract_token(&parts, &session_config()), Some("tok_query".to_string()));
    }

    #[test]
    fn test_no_token_anywhere() {
        let parts = parts_for(Request::builder().uri("/me"));
        assert_eq!(extract_token(&parts, &session_config()), None);
    }

    #[test]
    fn test_custom_cookie_name() {
        let mut config = session_config();
        config.cookie_name = "session_id".to_string();

        let parts = parts_for(Request::builder().uri("/me").header("cookie", "st=wrong; session_id=right"));
        assert_eq!(extract_token(&parts, &config), Some("right".to_string()));
    }
}
