//! product-scout CLI
//!
//! Resolves command-line flags into a run configuration, executes the
//! selected scenario, and renders the resulting record.

use anyhow::Context;
use clap::Parser;
use product_scout::{OutputFormat, RunConfig, Scenario, output, scenario};
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "product-scout",
    version,
    about = "Scrape a product page through a real browser, surviving basic anti-bot challenges"
)]
struct Cli {
    /// Product page URL (required by full-parse and open-product scenarios)
    url: Option<String>,

    /// Scenario to run
    #[arg(long, value_enum, default_value = "full-parse")]
    scenario: Scenario,

    /// Launch the browser with a visible window (default: headless)
    #[arg(long)]
    headed: bool,

    /// Navigation timeout in milliseconds
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,

    /// Proxy server URL handed to the browser at launch
    #[arg(long)]
    proxy: Option<String>,

    /// Proxy username, applied as page-level basic authentication
    #[arg(long)]
    proxy_username: Option<String>,

    /// Proxy password, applied as page-level basic authentication
    #[arg(long)]
    proxy_password: Option<String>,

    /// WebSocket debugger URL of a running browser to attach to
    /// (e.g. produced by antidetect profile tooling)
    #[arg(long, conflicts_with = "connect_port")]
    connect_endpoint: Option<String>,

    /// Local remote-debugging port to resolve an endpoint from
    #[arg(long)]
    connect_port: Option<u16>,

    /// Keep the (headed) browser open for manual follow-up after a full parse
    #[arg(long)]
    keep_browser_open: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    output: OutputFormat,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig {
            url: self.url,
            headless: !self.headed,
            timeout: Duration::from_millis(self.timeout_ms),
            proxy: self.proxy,
            proxy_username: self.proxy_username,
            proxy_password: self.proxy_password,
            connect_endpoint: self.connect_endpoint,
            connect_port: self.connect_port,
            scenario: self.scenario,
            keep_browser_open: self.keep_browser_open,
            output: self.output,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config();

    let record = scenario::run(&config).context("scenario failed")?;
    let rendered = output::render(&record, config.output)?;
    println!("{}", rendered);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["product-scout", "https://example.com/product/1"]);
        let config = cli.into_config();

        assert_eq!(config.url.as_deref(), Some("https://example.com/product/1"));
        assert!(config.headless);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.scenario, Scenario::FullParse);
        assert_eq!(config.output, OutputFormat::Text);
    }

    #[test]
    fn test_headed_and_scenario_flags() {
        let cli = Cli::parse_from([
            "product-scout",
            "--headed",
            "--scenario",
            "probe",
            "--output",
            "json",
        ]);
        let config = cli.into_config();

        assert!(!config.headless);
        assert_eq!(config.scenario, Scenario::Probe);
        assert_eq!(config.output, OutputFormat::Json);
    }

    #[test]
    fn test_connect_flags_conflict_at_parse_time() {
        let result = Cli::try_parse_from([
            "product-scout",
            "--connect-endpoint",
            "ws://127.0.0.1:9222/devtools/browser/abc",
            "--connect-port",
            "9222",
        ]);
        assert!(result.is_err());
    }
}
