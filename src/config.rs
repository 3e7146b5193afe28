use crate::error::{Result, ScoutError};
use std::time::Duration;

/// Default navigation timeout when the caller does not override it
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Named end-to-end flows the scenario runner knows how to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Scenario {
    /// Navigate to the target URL, survive the challenge, extract a full record
    FullParse,
    /// Open the site root and check that the storefront responds at all
    Probe,
    /// Open the target product page without extracting anything
    OpenProduct,
    /// Open the site root without extracting anything
    OpenRoot,
    /// Find a product link on the site root, then run full extraction on it
    DiscoverParse,
    /// Find a product link on the site root and just open it
    DiscoverOpen,
}

/// How the resulting record is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Text,
    Json,
}

/// Resolved run configuration consumed by the scenario runner
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Target product page URL (required by the product-targeting scenarios)
    pub url: Option<String>,

    /// Run the browser without a visible window
    pub headless: bool,

    /// Upper bound for each navigation wait
    pub timeout: Duration,

    /// Proxy server URL passed to the browser at launch
    pub proxy: Option<String>,

    /// Proxy credentials, applied as page-level basic authentication
    pub proxy_username: Option<String>,
    pub proxy_password: Option<String>,

    /// WebSocket debugger URL of an already-running browser to attach to
    pub connect_endpoint: Option<String>,

    /// Local remote-debugging port to resolve an endpoint from
    pub connect_port: Option<u16>,

    pub scenario: Scenario,

    /// Hold the (headful) browser open for manual follow-up after a full parse
    pub keep_browser_open: bool,

    pub output: OutputFormat,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            url: None,
            headless: true,
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
            proxy_username: None,
            proxy_password: None,
            connect_endpoint: None,
            connect_port: None,
            scenario: Scenario::FullParse,
            keep_browser_open: false,
            output: OutputFormat::Text,
        }
    }
}

impl RunConfig {
    /// Reject invalid combinations before any browser work begins
    pub fn validate(&self) -> Result<()> {
        if self.connect_endpoint.is_some() && self.connect_port.is_some() {
            return Err(ScoutError::ConfigConflict(
                "connect endpoint and connect port are mutually exclusive; supply one or the other"
                    .to_string(),
            ));
        }

        if self.url.is_none() && self.scenario.requires_url() {
            return Err(ScoutError::InvalidConfig(format!(
                "scenario {:?} requires a target URL",
                self.scenario
            )));
        }

        Ok(())
    }
}

impl Scenario {
    /// Whether the scenario needs an explicit product URL to work on
    pub fn requires_url(&self) -> bool {
        matches!(self, Scenario::FullParse | Scenario::OpenProduct)
    }
}
