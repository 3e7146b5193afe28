//! Named end-to-end flows composing session acquisition, click navigation,
//! challenge handling and extraction.
//!
//! The runner owns the teardown policy: the session drops on every exit path,
//! which closes an owned browser and merely disconnects from an attached one.

use crate::browser::navigate;
use crate::browser::session::BrowserSession;
use crate::challenge::{self, ChallengeHandler};
use crate::config::{RunConfig, Scenario};
use crate::error::{Result, ScoutError};
use crate::extract::{PageSnapshot, ProductRecord};
use headless_chrome::Tab;
use std::sync::Arc;
use std::time::Duration;

/// Storefront root, used by the probe, open-root and discovery scenarios
pub const SITE_ROOT_URL: &str = "https://www.ozon.ru/";

/// Search input that signals the storefront actually rendered
const SEARCH_INPUT_SELECTOR: &str = r#"[data-widget="searchBarDesktop"] input"#;

/// Picks the first product link off the current page
const PRODUCT_LINK_SCRIPT: &str = r#"(() => {
    const link = document.querySelector('a[href*="/product/"]');
    return link ? link.href : null;
})()"#;

/// Poll interval while holding an open browser for manual follow-up
const ALIVE_POLL: Duration = Duration::from_secs(2);

/// Execute the configured scenario and return its product record.
pub fn run(config: &RunConfig) -> Result<ProductRecord> {
    config.validate()?;

    let session = BrowserSession::acquire(config)?;
    let result = run_scenario(&session, config);

    // Manual follow-up only makes sense when there is a window to follow up in
    if config.keep_browser_open && !config.headless && config.scenario == Scenario::FullParse {
        hold_for_follow_up(&session);
    }

    // Teardown happens when the session drops: close if owned, else disconnect
    result
}

fn run_scenario(session: &BrowserSession, config: &RunConfig) -> Result<ProductRecord> {
    let tab = session.page()?;
    session.prepare_page(&tab);
    session.apply_page_auth(&tab, config)?;

    match config.scenario {
        Scenario::FullParse => {
            let url = target_url(config)?;
            let tab = navigate::click_through(&tab, &url, config.timeout)?;
            parse_product_page(&tab, config)
        }
        Scenario::Probe => probe(&tab, config),
        Scenario::OpenProduct => {
            let url = target_url(config)?;
            open_only(&tab, &url, config)
        }
        Scenario::OpenRoot => open_only(&tab, SITE_ROOT_URL, config),
        Scenario::DiscoverParse => discover(session, &tab, config, true),
        Scenario::DiscoverOpen => discover(session, &tab, config, false),
    }
}

/// Full extraction of the page the tab currently shows, with challenge
/// recovery in front of it
fn parse_product_page(tab: &Arc<Tab>, config: &RunConfig) -> Result<ProductRecord> {
    let snapshot = PageSnapshot::capture(tab)?;
    let handler = ChallengeHandler::new(config.headless);

    let clean = handler.resolve(snapshot, challenge::await_manual_signal, || {
        // Settle after the manual fix; a wait timeout here is irrelevant
        let _ = tab.wait_until_navigated();
        PageSnapshot::capture(tab)
    })?;

    Ok(ProductRecord::from_snapshot(&clean, Some(tab.get_url())))
}

/// Reachability probe: open the storefront root and check that the search
/// input renders (best effort)
fn probe(tab: &Arc<Tab>, config: &RunConfig) -> Result<ProductRecord> {
    let tab = navigate::click_through(tab, SITE_ROOT_URL, config.timeout)?;

    if let Err(e) = tab.wait_for_element_with_custom_timeout(SEARCH_INPUT_SELECTOR, config.timeout)
    {
        log::warn!("storefront search input did not appear: {}", e);
    }

    Ok(minimal_record(&tab))
}

fn open_only(tab: &Arc<Tab>, url: &str, config: &RunConfig) -> Result<ProductRecord> {
    let tab = navigate::click_through(tab, url, config.timeout)?;
    Ok(minimal_record(&tab))
}

/// Open the site root, follow the first product link (in a fresh tab, the way
/// a user would), then parse it or just report it
fn discover(
    session: &BrowserSession,
    tab: &Arc<Tab>,
    config: &RunConfig,
    parse: bool,
) -> Result<ProductRecord> {
    let root_tab = navigate::click_through(tab, SITE_ROOT_URL, config.timeout)?;

    let product_url = first_product_link(&root_tab)?;
    log::info!("discovered product link {}", product_url);

    let product_tab =
        navigate::click_through_new_tab(session, &root_tab, &product_url, config.timeout)?;

    if parse {
        parse_product_page(&product_tab, config)
    } else {
        Ok(minimal_record(&product_tab))
    }
}

fn first_product_link(tab: &Arc<Tab>) -> Result<String> {
    let result = tab
        .evaluate(PRODUCT_LINK_SCRIPT, false)
        .map_err(|e| ScoutError::EvaluationFailed(format!("product link lookup failed: {}", e)))?;

    result
        .value
        .as_ref()
        .and_then(|v| v.as_str())
        .filter(|href| !href.is_empty())
        .map(String::from)
        .ok_or_else(|| {
            ScoutError::NavigationFailed("no product link found on the site root".to_string())
        })
}

fn minimal_record(tab: &Arc<Tab>) -> ProductRecord {
    let title = tab.get_title().ok().filter(|t| !t.is_empty());
    ProductRecord::minimal(title, Some(tab.get_url()))
}

fn target_url(config: &RunConfig) -> Result<String> {
    config.url.clone().ok_or_else(|| {
        ScoutError::InvalidConfig("scenario requires a target URL".to_string())
    })
}

/// Block until the operator is done with the open browser window: Enter on a
/// terminal, browser disconnection otherwise
fn hold_for_follow_up(session: &BrowserSession) {
    use std::io::{BufRead, IsTerminal};

    log::info!("keeping browser open for manual follow-up");
    let stdin = std::io::stdin();

    if stdin.is_terminal() {
        println!("Browser stays open. Press Enter to close and finish.");
        let mut line = String::new();
        let _ = stdin.lock().read_line(&mut line);
    } else {
        while session.is_alive() {
            std::thread::sleep(ALIVE_POLL);
        }
        log::info!("browser went away; proceeding to teardown");
    }
}
