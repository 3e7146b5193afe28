use crate::challenge;
use crate::error::{Result, ScoutError};
use crate::extract::jsonld::{self, LinkedDataNode};
use headless_chrome::Tab;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Raw payload returned by the page-side capture script
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCapture {
    title: Option<String>,
    heading: Option<String>,
    price_text: Option<String>,
    challenge_token: Option<String>,
    #[serde(default)]
    ld_blocks: Vec<String>,
}

/// Point-in-time capture of the rendered page, re-taken whenever page state
/// may have changed (initial load, post-manual-retry)
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    pub title: Option<String>,
    pub is_challenge: bool,
    pub challenge_token: Option<String>,
    pub heading: Option<String>,
    pub price_text: Option<String>,
    /// First Product node found in the linked data, if any
    pub product_node: Option<Value>,
    /// Breadcrumb labels across every BreadcrumbList, document order,
    /// duplicates retained
    pub breadcrumbs: Vec<String>,
    /// Raw linked-data block texts, kept for diagnostics
    pub raw_linked_data: Vec<String>,
}

impl PageSnapshot {
    /// Run the capture script against the tab and assemble a snapshot
    pub fn capture(tab: &Arc<Tab>) -> Result<Self> {
        let js_code = include_str!("snapshot.js");

        let result = tab
            .evaluate(js_code, false)
            .map_err(|e| ScoutError::EvaluationFailed(format!("capture script failed: {}", e)))?;

        let json_value = result.value.ok_or_else(|| {
            ScoutError::EvaluationFailed("capture script returned no value".to_string())
        })?;

        // The script returns a JSON string; parse the string, then the payload
        let json_str: String = serde_json::from_value(json_value).map_err(|e| {
            ScoutError::EvaluationFailed(format!("capture result is not a string: {}", e))
        })?;

        let raw: RawCapture = serde_json::from_str(&json_str).map_err(|e| {
            ScoutError::EvaluationFailed(format!("failed to parse capture payload: {}", e))
        })?;

        Ok(Self::from_capture(raw))
    }

    fn from_capture(raw: RawCapture) -> Self {
        let is_challenge = raw
            .title
            .as_deref()
            .is_some_and(challenge::title_indicates_challenge);

        let mut product_node = None;
        let mut breadcrumbs = Vec::new();

        for node in jsonld::parse_blocks(&raw.ld_blocks) {
            match jsonld::classify(node) {
                LinkedDataNode::Product(value) => {
                    if product_node.is_none() {
                        product_node = Some(value);
                    }
                }
                LinkedDataNode::BreadcrumbList(value) => {
                    breadcrumbs.extend(jsonld::breadcrumb_labels(&value));
                }
                LinkedDataNode::Other(_) => {}
            }
        }

        Self {
            title: raw.title,
            is_challenge,
            challenge_token: raw.challenge_token,
            heading: raw.heading,
            price_text: raw.price_text,
            product_node,
            breadcrumbs,
            raw_linked_data: raw.ld_blocks,
        }
    }
}
