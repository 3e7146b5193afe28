//! Click-simulated navigation.
//!
//! A direct `Page.navigate` is the loudest automation signal a page can see.
//! Both strategies here instead load a blank launchpad document, inject a
//! hidden anchor pointing at the target, and click it, so the browser emits
//! the same navigation telemetry as a user-initiated link click.
//!
//! The two strategies deliberately differ in how a wait timeout is treated:
//! same-tab navigation keeps whatever state the tab reached (the caller can
//! still evaluate it), while the new-tab variant fails hard when no tab was
//! captured, because there is nothing to evaluate at all.

use crate::browser::session::BrowserSession;
use crate::error::{Result, ScoutError};
use headless_chrome::Tab;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Delay between loading the launchpad document and dispatching the click
const SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Poll interval while waiting for a clicked-open tab to appear
const NEW_TAB_POLL: Duration = Duration::from_millis(250);

/// Poll interval for the `document.readyState` fallback wait
const READY_POLL: Duration = Duration::from_millis(500);

/// Navigate the given tab to `url` by clicking a synthesized link.
///
/// A navigation-wait timeout is non-fatal: the tab is returned with whatever
/// state it reached and the caller evaluates it best-effort.
pub fn click_through(tab: &Arc<Tab>, url: &str, timeout: Duration) -> Result<Arc<Tab>> {
    prepare_launchpad(tab);
    std::thread::sleep(SETTLE_DELAY);

    tab.evaluate(&anchor_click_script(url, false), false)
        .map_err(|e| {
            ScoutError::NavigationFailed(format!("failed to dispatch click for {}: {}", url, e))
        })?;

    tab.set_default_timeout(timeout);
    if let Err(e) = tab.wait_until_navigated() {
        log::warn!(
            "navigation wait for {} did not complete ({}); continuing with current page state",
            url,
            e
        );
    }

    Ok(tab.clone())
}

/// Navigate to `url` in a new tab opened by clicking a `target="_blank"`
/// link, and return the captured tab brought to the foreground.
///
/// The tab list is snapshotted before the click, so a tab that appears
/// immediately afterwards is still caught. If no new tab shows up within
/// `timeout` the navigation fails: there is no page to evaluate.
pub fn click_through_new_tab(
    session: &BrowserSession,
    tab: &Arc<Tab>,
    url: &str,
    timeout: Duration,
) -> Result<Arc<Tab>> {
    prepare_launchpad(tab);
    std::thread::sleep(SETTLE_DELAY);

    let known: HashSet<String> = session
        .tabs()?
        .iter()
        .map(|t| t.get_target_id().clone())
        .collect();

    tab.evaluate(&anchor_click_script(url, true), false)
        .map_err(|e| {
            ScoutError::NavigationFailed(format!("failed to dispatch click for {}: {}", url, e))
        })?;

    let deadline = Instant::now() + timeout;
    let new_tab = loop {
        let fresh = session
            .tabs()?
            .into_iter()
            .find(|t| !known.contains(t.get_target_id()));

        if let Some(t) = fresh {
            break t;
        }

        if Instant::now() >= deadline {
            return Err(ScoutError::NavigationFailed(format!(
                "no new tab appeared within {:?} after clicking through to {}",
                timeout, url
            )));
        }

        std::thread::sleep(NEW_TAB_POLL);
    };

    if let Err(e) = new_tab.activate() {
        log::debug!("could not bring new tab to front: {}", e);
    }

    new_tab.set_default_timeout(timeout);
    if let Err(e) = new_tab.wait_until_navigated() {
        log::debug!(
            "navigation wait on new tab failed ({}); falling back to readyState polling",
            e
        );
        wait_for_ready_state(&new_tab, deadline);
    }

    Ok(new_tab)
}

/// Best-effort load of a neutral blank document to click from
fn prepare_launchpad(tab: &Arc<Tab>) {
    if let Err(e) = tab
        .navigate_to("about:blank")
        .and_then(|t| t.wait_until_navigated())
    {
        log::warn!(
            "failed to load blank launchpad page: {}; clicking from current page",
            e
        );
    }
}

/// Build the in-page script that injects a hidden anchor and clicks it.
/// The URL is embedded through JSON escaping so arbitrary targets are safe.
fn anchor_click_script(url: &str, new_tab: bool) -> String {
    let href = serde_json::Value::String(url.to_string());
    let target = if new_tab { "a.target = '_blank';" } else { "" };

    format!(
        r#"(() => {{
    const a = document.createElement('a');
    a.href = {href};
    {target}
    a.style.display = 'none';
    document.body.appendChild(a);
    a.click();
    return a.href;
}})()"#
    )
}

/// Poll `document.readyState` until the page is at least interactive or the
/// deadline passes (logged, not fatal: the tab itself was captured)
fn wait_for_ready_state(tab: &Arc<Tab>, deadline: Instant) {
    while Instant::now() < deadline {
        match tab.evaluate("document.readyState", false) {
            Ok(result) => {
                if let Some(state) = result.value.as_ref().and_then(|v| v.as_str()) {
                    if state == "interactive" || state == "complete" {
                        return;
                    }
                }
            }
            Err(e) => log::debug!("readyState probe failed: {}", e),
        }

        std::thread::sleep(READY_POLL);
    }

    log::warn!("new tab never reached an interactive readyState before the deadline");
}
