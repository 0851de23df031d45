use super::token::GOOGLE_SCOPES;
use crate::error::{auth_error, SyncResult};
use tiny_http::{Response, Server};
use tracing::{info, warn};
use url::Url;

/// Result of a redirect hitting the local callback server
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Callback {
    Code { code: String, state: String },
    Denied(String),
    /// Not an OAuth redirect (favicon and the like)
    Ignored,
}

/// An authorization code together with the redirect URI it was issued for
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    pub code: String,
    pub redirect_uri: String,
}

/// Build the Google consent screen URL
pub fn authorization_url(
    auth_url: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> SyncResult<Url> {
    let scope = GOOGLE_SCOPES.join(" ");
    Url::parse_with_params(
        auth_url,
        &[
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("scope", scope.as_str()),
            ("state", state),
        ],
    )
    .map_err(|e| auth_error(&format!("Failed to build authorization URL: {}", e)))
}

/// Open the consent screen in a browser and wait for the redirect on
/// `127.0.0.1:<port>`
pub async fn request_authorization_code(
    auth_url: &str,
    client_id: &str,
    redirect_port: u16,
) -> SyncResult<AuthorizationCode> {
    // Generate random state for security
    let state = uuid::Uuid::new_v4().to_string();
    let redirect_uri = format!("http://127.0.0.1:{}", redirect_port);
    let consent_url = authorization_url(auth_url, client_id, &redirect_uri, &state)?;

    let code = tokio::task::spawn_blocking(move || {
        wait_for_callback(consent_url.as_str(), redirect_port, &state)
    })
    .await
    .map_err(|e| auth_error(&format!("Authorization task failed: {}", e)))??;

    Ok(AuthorizationCode { code, redirect_uri })
}

fn wait_for_callback(consent_url: &str, redirect_port: u16, state: &str) -> SyncResult<String> {
    // Start local server before the browser can redirect to it
    let server = Server::http(("127.0.0.1", redirect_port))
        .map_err(|e| auth_error(&format!("Failed to start callback server: {}", e)))?;

    info!("Opening browser for Google authorization...");
    if let Err(e) = webbrowser::open(consent_url) {
        warn!("Could not open a browser ({}), visit this URL manually:", e);
    }
    info!("Authorization URL: {}", consent_url);
    info!("Waiting for authorization callback on port {}...", redirect_port);

    loop {
        let request = server
            .recv()
            .map_err(|e| auth_error(&format!("Callback server failed: {}", e)))?;

        let callback = parse_callback(request.url());
        let (reply, outcome) = match callback {
            Callback::Ignored => {
                if let Err(e) = request.respond(Response::empty(404)) {
                    warn!("Failed to answer unrelated request: {}", e);
                }
                continue;
            }
            Callback::Denied(reason) => (
                "Authorization was denied. You can close this window.",
                Err(auth_error(&format!("Authorization denied: {}", reason))),
            ),
            Callback::Code { state: returned, .. } if returned != state => (
                "Authorization failed. You can close this window.",
                Err(auth_error("State mismatch in authorization callback")),
            ),
            Callback::Code { code, .. } => (
                "Authorization successful! You can close this window.",
                Ok(code),
            ),
        };

        if let Err(e) = request.respond(Response::from_string(reply)) {
            warn!("Failed to answer the browser: {}", e);
        }
        return outcome;
    }
}

/// Pull the code (or error) out of the redirect request path
pub(crate) fn parse_callback(request_url: &str) -> Callback {
    let Ok(url) = Url::parse("http://localhost").and_then(|base| base.join(request_url)) else {
        return Callback::Ignored;
    };

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => return Callback::Denied(value.into_owned()),
            _ => {}
        }
    }

    match code {
        Some(code) => Callback::Code {
            code,
            state: state.unwrap_or_default(),
        },
        None => Callback::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_callback() {
        assert_eq!(
            parse_callback("/?state=abc&code=4%2F0Ab&scope=x"),
            Callback::Code {
                code: "4/0Ab".to_string(),
                state: "abc".to_string(),
            }
        );
        assert_eq!(
            parse_callback("/?error=access_denied&state=abc"),
            Callback::Denied("access_denied".to_string())
        );
        assert_eq!(parse_callback("/favicon.ico"), Callback::Ignored);
        assert_eq!(parse_callback("/?state=abc"), Callback::Ignored);
    }

    #[test]
    fn test_authorization_url() {
        let url = authorization_url(
            "https://accounts.google.com/o/oauth2/v2/auth",
            "client-id",
            "http://localhost:8080",
            "state-1",
        )
        .unwrap();

        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["client_id"], "client-id");
        assert_eq!(pairs["redirect_uri"], "http://localhost:8080");
        assert_eq!(pairs["access_type"], "offline");
        assert_eq!(pairs["state"], "state-1");
        assert_eq!(
            pairs["scope"],
            "https://www.googleapis.com/auth/calendar https://mail.google.com/"
        );
    }
}
