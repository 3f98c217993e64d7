//! Curl-equivalent rendering
//!
//! Every probe report carries a reproducible curl invocation: method, URL,
//! merged headers, and body exactly as sent, secrets included verbatim (the
//! surface is staff-gated already). `parse_curl_args` is the inverse, used to
//! check round-trip fidelity.

use crate::error::{Error, Result};
use crate::request::{ExecutionRequest, Method};

/// Argument vector of the equivalent curl invocation.
pub fn curl_args(request: &ExecutionRequest) -> Vec<String> {
    let mut args = vec![
        "curl".to_string(),
        "-X".to_string(),
        request.method.as_str().to_string(),
    ];

    for (name, value) in request.merged_headers() {
        args.push("-H".to_string());
        args.push(format!("{name}: {value}"));
    }

    if let Some(body) = request.effective_body() {
        args.push("-d".to_string());
        args.push(body.to_string());
    }

    args.push(request.url.clone());
    args
}

/// Shell-quoted single-line form of [`curl_args`].
pub fn curl_command(request: &ExecutionRequest) -> String {
    curl_args(request)
        .iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a curl-style argument vector back into a request.
///
/// Understands `-X/--request`, `-H/--header`, `-d/--data`, `-b/--cookie`,
/// and a bare URL; unknown flags are ignored for compatibility. A data flag
/// upgrades GET to POST, matching curl itself.
pub fn parse_curl_args(args: &[String]) -> Result<ExecutionRequest> {
    let mut method = Method::Get;
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut body: Option<String> = None;
    let mut url: Option<String> = None;

    let mut i = 0;
    if args.first().map(String::as_str) == Some("curl") {
        i = 1;
    }

    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "-X" | "--request" => {
                i += 1;
                if let Some(value) = args.get(i) {
                    method = value.parse()?;
                }
            }
            "-H" | "--header" => {
                i += 1;
                if let Some(value) = args.get(i) {
                    let (name, value) = value
                        .split_once(':')
                        .ok_or_else(|| Error::Other(format!("malformed header: {value}")))?;
                    headers.push((name.trim().to_string(), value.trim().to_string()));
                }
            }
            "-b" | "--cookie" => {
                i += 1;
                if let Some(value) = args.get(i) {
                    // Cookies render as a header on the wire, so they parse
                    // back as one.
                    headers.push(("Cookie".to_string(), value.clone()));
                }
            }
            "-d" | "--data" => {
                i += 1;
                if let Some(value) = args.get(i) {
                    body = Some(value.clone());
                    if method == Method::Get {
                        method = Method::Post;
                    }
                }
            }
            _ if !arg.starts_with('-') => {
                url = Some(arg.clone());
            }
            _ => {
                // Ignore unknown options for compatibility
            }
        }
        i += 1;
    }

    let url = url.ok_or_else(|| Error::Other("no URL specified".to_string()))?;

    let mut request = ExecutionRequest::new(method, url);
    request.headers = headers;
    request.body = body;
    Ok(request)
}

/// Single-quote an argument for a POSIX shell when needed.
fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'/' | b':'));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::AuthSpec;

    #[test]
    fn renders_method_headers_body_and_url() {
        let request = ExecutionRequest::new(Method::Post, "https://example.com/items/")
            .header("Content-Type", "application/json")
            .body(r#"{"name":"x"}"#)
            .auth(AuthSpec::Bearer {
                token: "abc123".to_string(),
            });

        let command = curl_command(&request);
        assert!(command.starts_with("curl -X POST"));
        assert!(command.contains("'Authorization: Bearer abc123'"));
        assert!(command.contains("'Content-Type: application/json'"));
        assert!(command.contains(r#"-d '{"name":"x"}'"#));
        assert!(command.ends_with("https://example.com/items/"));
    }

    #[test]
    fn round_trip_reproduces_the_request() {
        let request = ExecutionRequest::new(Method::Put, "https://example.com/items/7/")
            .header("Accept", "application/json")
            .header("X-Probe", "1")
            .body("payload")
            .auth(AuthSpec::Token {
                token: "tok".to_string(),
            });

        let parsed = parse_curl_args(&curl_args(&request)).unwrap();

        assert_eq!(parsed.method, request.method);
        assert_eq!(parsed.url, request.url);
        assert_eq!(parsed.body.as_deref(), Some("payload"));
        // Auth materials were merged into plain headers on render; the parsed
        // request carries the identical wire-level header set.
        assert_eq!(parsed.merged_headers(), request.merged_headers());
    }

    #[test]
    fn data_flag_upgrades_get_to_post() {
        let args: Vec<String> = ["curl", "-d", "a=1", "https://example.com/"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let parsed = parse_curl_args(&args).unwrap();
        assert_eq!(parsed.method, Method::Post);
        assert_eq!(parsed.body.as_deref(), Some("a=1"));
    }

    #[test]
    fn cookie_flag_becomes_cookie_header_not_url() {
        let args: Vec<String> = ["curl", "http://example.com/", "-b", "sessionid=sid"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let parsed = parse_curl_args(&args).unwrap();
        assert_eq!(parsed.url, "http://example.com/");
        assert_eq!(
            parsed.headers,
            vec![("Cookie".to_string(), "sessionid=sid".to_string())]
        );
    }

    #[test]
    fn missing_url_is_an_error() {
        let args: Vec<String> = ["curl", "-X", "GET"].iter().map(|s| s.to_string()).collect();
        let err = parse_curl_args(&args).unwrap_err();
        assert!(err.to_string().contains("no URL"));
    }

    #[test]
    fn quoting_escapes_single_quotes() {
        assert_eq!(shell_quote("plain-arg"), "plain-arg");
        assert_eq!(shell_quote("has space"), "'has space'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn session_cookie_appears_in_command() {
        let request = ExecutionRequest::new(Method::Get, "https://example.com/").auth(
            AuthSpec::Session {
                session_id: "sid".to_string(),
            },
        );

        let command = curl_command(&request);
        assert!(command.contains("'Cookie: sessionid=sid'"));
    }
}
