//! Anti-bot challenge detection and recovery.
//!
//! The marketplace answers suspicious clients with an interstitial page
//! instead of the product. In headless mode nobody can solve it, so the run
//! fails immediately. In headful mode the operator gets exactly one chance:
//! solve the challenge in the visible browser window, signal completion, and
//! the page is re-evaluated.

use crate::error::{Result, ScoutError};
use crate::extract::PageSnapshot;
use std::io::{BufRead, IsTerminal, Write};
use std::time::Duration;

/// Title fragments that identify the challenge interstitial, matched
/// case-insensitively
pub const CHALLENGE_TITLE_KEYWORDS: &[&str] = &["antibot", "доступ ограничен"];

/// How long to wait for a manual fix when stdin is not a terminal
const NON_INTERACTIVE_WAIT: Duration = Duration::from_secs(30);

/// Detection predicate over a page title
pub fn title_indicates_challenge(title: &str) -> bool {
    let lowered = title.to_lowercase();
    CHALLENGE_TITLE_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

/// States of the challenge-recovery machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeState {
    /// No challenge on the page; extraction may proceed
    Normal,
    /// A freshly captured snapshot matched the detection predicate
    ChallengeDetected,
    /// Headful mode: blocked on the operator solving the challenge
    AwaitingManualResolution,
    /// Manual signal received; the page gets re-evaluated once
    Retried,
    /// Challenge cannot be resolved; the scenario aborts
    Fatal,
}

/// Drives a snapshot through the challenge state machine.
///
/// The manual wait and the snapshot re-capture are injected so the machine
/// can run against canned snapshots in tests. Production wiring lives in the
/// scenario runner.
pub struct ChallengeHandler {
    headless: bool,
}

impl ChallengeHandler {
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }

    /// Resolve `snapshot` to a challenge-free snapshot or fail.
    ///
    /// At most one manual-retry cycle runs: `manual_wait` blocks until the
    /// operator signals, `recapture` re-evaluates the page afterwards.
    pub fn resolve<W, R>(
        &self,
        snapshot: PageSnapshot,
        mut manual_wait: W,
        mut recapture: R,
    ) -> Result<PageSnapshot>
    where
        W: FnMut(),
        R: FnMut() -> Result<PageSnapshot>,
    {
        let mut current = snapshot;
        let mut state = if current.is_challenge {
            ChallengeState::ChallengeDetected
        } else {
            ChallengeState::Normal
        };

        loop {
            state = match state {
                ChallengeState::Normal => return Ok(current),

                ChallengeState::ChallengeDetected => {
                    if self.headless {
                        return Err(challenge_error(&current, false));
                    }
                    log::warn!("{}", challenge_message(&current));
                    ChallengeState::AwaitingManualResolution
                }

                ChallengeState::AwaitingManualResolution => {
                    manual_wait();
                    ChallengeState::Retried
                }

                ChallengeState::Retried => {
                    current = recapture()?;
                    if current.is_challenge {
                        ChallengeState::Fatal
                    } else {
                        log::info!("challenge cleared after manual intervention");
                        ChallengeState::Normal
                    }
                }

                ChallengeState::Fatal => return Err(challenge_error(&current, true)),
            };
        }
    }
}

/// Block until the operator signals that the challenge is solved: one line of
/// input on an interactive terminal, a fixed delay otherwise
pub fn await_manual_signal() {
    let stdin = std::io::stdin();

    if stdin.is_terminal() {
        print!("Solve the challenge in the browser window, then press Enter to continue: ");
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        if let Err(e) = stdin.lock().read_line(&mut line) {
            log::warn!("failed to read manual-continue signal: {}", e);
        }
    } else {
        log::info!(
            "stdin is not a terminal; waiting {:?} for a manual fix",
            NON_INTERACTIVE_WAIT
        );
        std::thread::sleep(NON_INTERACTIVE_WAIT);
    }
}

fn challenge_message(snapshot: &PageSnapshot) -> String {
    let token_part = match &snapshot.challenge_token {
        Some(token) => format!(" (token: {})", token),
        None => String::new(),
    };

    format!(
        "anti-bot challenge detected{}; consider a residential proxy, \
         reusing cookies from a manual session, or slower navigation",
        token_part
    )
}

fn challenge_error(snapshot: &PageSnapshot, after_retry: bool) -> ScoutError {
    let mut message = challenge_message(snapshot);
    if after_retry {
        message = format!("still active after manual retry: {}", message);
    }
    ScoutError::ChallengeActive(message)
}
