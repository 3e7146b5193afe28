use crate::config::RunConfig;
use crate::error::{Result, ScoutError};
use headless_chrome::{Browser, Tab};
use std::{collections::HashMap, ffi::OsStr, sync::Arc, time::Duration};

/// Bound on resolving a WebSocket endpoint from a debugging port
const ENDPOINT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Keep the browser's idle timeout well above any scenario duration
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// What teardown is allowed to do with the underlying browser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownAction {
    /// Session launched the browser: close it
    Close,
    /// Session attached to someone else's browser: disconnect, never close
    Disconnect,
}

impl TeardownAction {
    /// Owned sessions get the destructive close; attached ones never do
    pub fn for_session(owned: bool) -> Self {
        if owned {
            TeardownAction::Close
        } else {
            TeardownAction::Disconnect
        }
    }
}

/// A controllable browser, either launched by this process or attached over
/// a remote debugging endpoint.
///
/// Teardown runs on drop so every exit path (success, error, panic) honors
/// the ownership rule: launched browsers are closed, attached browsers are
/// only disconnected.
pub struct BrowserSession {
    browser: Browser,

    /// True when this process launched the browser and is responsible for
    /// shutting it down
    owned: bool,
}

impl BrowserSession {
    /// Obtain a controllable browser according to the run configuration:
    /// attach to an explicit endpoint, resolve one from a debugging port, or
    /// launch a fresh local instance.
    pub fn acquire(config: &RunConfig) -> Result<Self> {
        if let Some(endpoint) = &config.connect_endpoint {
            return Self::attach(endpoint.clone());
        }

        if let Some(port) = config.connect_port {
            let endpoint = resolve_debugger_endpoint(port)?;
            return Self::attach(endpoint);
        }

        Self::launch(config)
    }

    fn attach(endpoint: String) -> Result<Self> {
        log::info!("attaching to remote debugging endpoint {}", endpoint);

        let browser = Browser::connect(endpoint)
            .map_err(|e| ScoutError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            browser,
            owned: false,
        })
    }

    fn launch(config: &RunConfig) -> Result<Self> {
        // Keep the formatted arg alive for the &OsStr borrow below
        let proxy_arg = config
            .proxy
            .as_deref()
            .map(|proxy| format!("--proxy-server={}", proxy));

        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Strip the automation banner flag and the Blink automation marker to
        // keep anti-bot services from flagging the session outright
        launch_opts
            .ignore_default_args
            .push(OsStr::new("--enable-automation"));
        launch_opts
            .args
            .push(OsStr::new("--disable-blink-features=AutomationControlled"));
        launch_opts.args.push(OsStr::new("--disable-dev-shm-usage"));

        if let Some(ref arg) = proxy_arg {
            launch_opts.args.push(OsStr::new(arg));
        }

        launch_opts.headless = config.headless;
        launch_opts.sandbox = false;
        launch_opts.idle_browser_timeout = IDLE_BROWSER_TIMEOUT;

        let browser =
            Browser::new(launch_opts).map_err(|e| ScoutError::LaunchFailed(e.to_string()))?;

        Ok(Self {
            browser,
            owned: true,
        })
    }

    /// Whether teardown will close the browser
    pub fn owned(&self) -> bool {
        self.owned
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// All tabs currently known to the browser
    pub fn tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| ScoutError::TabOperationFailed(format!("failed to get tabs: {}", e)))?
            .clone();

        Ok(tabs)
    }

    /// A usable page: the first existing tab, or a new one when attaching to
    /// a browser that has none
    pub fn page(&self) -> Result<Arc<Tab>> {
        if let Some(tab) = self.tabs()?.into_iter().next() {
            return Ok(tab);
        }

        self.browser
            .new_tab()
            .map_err(|e| ScoutError::TabOperationFailed(format!("failed to create tab: {}", e)))
    }

    /// Best-effort page priming: present the request headers of a local
    /// shopper instead of a bare automation default
    pub fn prepare_page(&self, tab: &Arc<Tab>) {
        let mut headers = HashMap::new();
        headers.insert("Accept-Language", "ru-RU,ru;q=0.9,en-US;q=0.8");

        if let Err(e) = tab.set_extra_http_headers(headers) {
            log::debug!("failed to set extra headers: {}", e);
        }
    }

    /// Supply proxy credentials as page-level basic authentication
    pub fn apply_page_auth(&self, tab: &Arc<Tab>, config: &RunConfig) -> Result<()> {
        let (Some(username), Some(password)) = (
            config.proxy_username.clone(),
            config.proxy_password.clone(),
        ) else {
            return Ok(());
        };

        tab.authenticate(Some(username), Some(password))
            .map_err(|e| ScoutError::TabOperationFailed(format!("failed to set page auth: {}", e)))?;

        Ok(())
    }

    /// Whether the underlying browser still answers at all
    pub fn is_alive(&self) -> bool {
        match self.tabs() {
            Ok(tabs) => tabs
                .first()
                .map(|tab| tab.evaluate("1 + 1", false).is_ok())
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        match TeardownAction::for_session(self.owned) {
            TeardownAction::Close => {
                log::debug!("closing owned browser session");
                // headless_chrome closes the process once the Browser drops;
                // closing the tabs first makes the shutdown orderly
                if let Ok(guard) = self.browser.get_tabs().lock() {
                    for tab in guard.iter() {
                        let _ = tab.close(false);
                    }
                }
            }
            TeardownAction::Disconnect => {
                log::debug!("disconnecting from attached browser; leaving it running");
            }
        }
    }
}

/// Resolve a WebSocket debugger URL from a local remote-debugging port via
/// the browser's `/json/version` endpoint
pub fn resolve_debugger_endpoint(port: u16) -> Result<String> {
    let url = format!("http://127.0.0.1:{}/json/version", port);

    let client = reqwest::blocking::Client::builder()
        .timeout(ENDPOINT_RESOLVE_TIMEOUT)
        .build()
        .map_err(|e| ScoutError::ConnectionFailed(e.to_string()))?;

    let response = client
        .get(&url)
        .send()
        .map_err(|e| ScoutError::ConnectionFailed(format!("{} unreachable: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(ScoutError::ConnectionFailed(format!(
            "{} returned HTTP {}",
            url,
            response.status()
        )));
    }

    let body: serde_json::Value = response
        .json()
        .map_err(|e| ScoutError::ConnectionFailed(format!("{} returned non-JSON: {}", url, e)))?;

    let endpoint = debugger_url_from_version(&body)?;
    log::info!("resolved debugging port {} to endpoint {}", port, endpoint);
    Ok(endpoint)
}

/// Pull the WebSocket debugger URL out of a `/json/version` response body
fn debugger_url_from_version(body: &serde_json::Value) -> Result<String> {
    match body.get("webSocketDebuggerUrl").and_then(|v| v.as_str()) {
        Some(ws_url) if !ws_url.is_empty() => Ok(ws_url.to_string()),
        _ => Err(ScoutError::ConnectionFailed(
            "version response carries no webSocketDebuggerUrl".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    #[test]
    fn test_teardown_action_ownership() {
        assert_eq!(TeardownAction::for_session(true), TeardownAction::Close);
        assert_eq!(
            TeardownAction::for_session(false),
            TeardownAction::Disconnect
        );
    }

    #[test]
    fn test_debugger_url_extraction() {
        let body = json!({
            "Browser": "Chrome/120.0.0.0",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/browser/abc"
        });
        assert_eq!(
            debugger_url_from_version(&body).unwrap(),
            "ws://127.0.0.1:9222/devtools/browser/abc"
        );
    }

    #[test]
    fn test_debugger_url_missing_or_empty_fails() {
        for body in [json!({"Browser": "Chrome"}), json!({"webSocketDebuggerUrl": ""})] {
            assert!(matches!(
                debugger_url_from_version(&body),
                Err(ScoutError::ConnectionFailed(_))
            ));
        }
    }

    /// Serve exactly one canned HTTP response on a loopback port
    fn serve_once(status_line: &'static str, body: String) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let port = listener.local_addr().unwrap().port();

        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        port
    }

    #[test]
    fn test_resolve_endpoint_from_version_response() {
        let port = serve_once(
            "200 OK",
            json!({"webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/browser/xyz"})
                .to_string(),
        );

        let endpoint = resolve_debugger_endpoint(port).expect("endpoint resolves");
        assert_eq!(endpoint, "ws://127.0.0.1:9222/devtools/browser/xyz");
    }

    #[test]
    fn test_resolve_endpoint_missing_field_is_connection_error() {
        let port = serve_once("200 OK", json!({"Browser": "Chrome/120"}).to_string());

        assert!(matches!(
            resolve_debugger_endpoint(port),
            Err(ScoutError::ConnectionFailed(_))
        ));
    }

    #[test]
    fn test_resolve_endpoint_http_error_is_connection_error() {
        let port = serve_once("503 Service Unavailable", "{}".to_string());

        assert!(matches!(
            resolve_debugger_endpoint(port),
            Err(ScoutError::ConnectionFailed(_))
        ));
    }

    #[test]
    fn test_resolve_endpoint_unreachable_port_is_connection_error() {
        // Bind and immediately drop to get a port nothing listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        assert!(matches!(
            resolve_debugger_endpoint(port),
            Err(ScoutError::ConnectionFailed(_))
        ));
    }
}
