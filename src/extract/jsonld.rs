//! Linked-data (JSON-LD) block parsing and field coercion.
//!
//! Marketplace pages embed Schema.org data in `<script type="application/ld+json">`
//! blocks. The blocks are frequently sloppy: wrapped in `@graph` envelopes,
//! typed as either a string or a list of strings, carrying numbers as strings
//! and names as strings, objects or lists of either. Everything here coerces
//! defensively and never fails the pipeline over a single bad block.

use serde_json::Value;

/// A classified linked-data node
#[derive(Debug, Clone, PartialEq)]
pub enum LinkedDataNode {
    Product(Value),
    BreadcrumbList(Value),
    Other(Value),
}

/// Parse every linked-data block into a flat list of candidate nodes.
///
/// Each block gets a strict parse first; on failure, one salvage re-parse with
/// all whitespace runs (newlines included) collapsed to single spaces. Blocks
/// that still fail are skipped without surfacing an error.
pub fn parse_blocks(blocks: &[String]) -> Vec<Value> {
    let mut nodes = Vec::new();

    for block in blocks {
        let parsed = serde_json::from_str::<Value>(block).or_else(|strict_err| {
            serde_json::from_str::<Value>(&collapse_whitespace(block)).map_err(|_| strict_err)
        });

        match parsed {
            Ok(value) => flatten_into(value, &mut nodes),
            Err(e) => log::debug!("skipping unparseable linked-data block: {}", e),
        }
    }

    nodes
}

/// Unwrap `@graph` envelopes and top-level arrays into individual nodes
fn flatten_into(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => out.extend(items),
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove("@graph") {
                out.extend(items);
            } else {
                out.push(Value::Object(map));
            }
        }
        // Scalars at the top level carry no usable data
        _ => {}
    }
}

/// Classify a node by its declared `@type` (string or list of strings)
pub fn classify(node: Value) -> LinkedDataNode {
    if declares_type(&node, "Product") {
        LinkedDataNode::Product(node)
    } else if declares_type(&node, "BreadcrumbList") {
        LinkedDataNode::BreadcrumbList(node)
    } else {
        LinkedDataNode::Other(node)
    }
}

fn declares_type(node: &Value, wanted: &str) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t == wanted,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(wanted)),
        _ => false,
    }
}

/// Labels of one breadcrumb list: an item's direct `name`, else the `name` of
/// its nested `item` reference; entries without a string label are dropped
pub fn breadcrumb_labels(node: &Value) -> Vec<String> {
    let Some(items) = node.get("itemListElement").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|entry| {
            entry
                .get("name")
                .and_then(Value::as_str)
                .or_else(|| {
                    entry
                        .get("item")
                        .and_then(|item| item.get("name"))
                        .and_then(Value::as_str)
                })
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(String::from)
        })
        .collect()
}

/// String field coercion: strings pass through, numbers are formatted
pub fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Number field coercion: JSON numbers pass through, strings go through
/// [`parse_amount`]
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Count coercion for review/rating counters
pub fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .ok(),
        _ => None,
    }
}

/// Resolve a name that may be a plain string, an object carrying a `name`
/// field, or a list of either; the first non-empty resolution wins
pub fn resolve_name(value: &Value) -> Option<String> {
    match value {
        Value::String(_) | Value::Number(_) => as_string(value),
        Value::Object(_) => value.get("name").and_then(resolve_name),
        Value::Array(items) => items.iter().find_map(resolve_name),
        _ => None,
    }
}

/// Parse a displayed amount: strip everything except digits, comma and
/// period, then treat the comma as a decimal separator. Anything that does
/// not come out as a finite number is treated as absent.
pub fn parse_amount(text: &str) -> Option<f64> {
    let filtered: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    filtered
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Infer a currency code from a symbol found in raw price text
pub fn infer_currency(text: &str) -> Option<&'static str> {
    const SYMBOLS: &[(char, &str)] = &[('₽', "RUB"), ('$', "USD"), ('€', "EUR")];

    SYMBOLS
        .iter()
        .find(|(symbol, _)| text.contains(*symbol))
        .map(|(_, code)| *code)
}

/// Image field coercion: a single value becomes a one-element sequence; a
/// list keeps its order. Entries may be URL strings or `ImageObject`s with a
/// `url` field.
pub fn as_image_list(value: &Value) -> Vec<String> {
    fn image_url(entry: &Value) -> Option<String> {
        match entry {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Object(_) => entry.get("url").and_then(Value::as_str).map(String::from),
            _ => None,
        }
    }

    match value {
        Value::Array(items) => items.iter().filter_map(image_url).collect(),
        other => image_url(other).into_iter().collect(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_blocks_strict() {
        let blocks = vec![r#"{"@type": "Product", "name": "Widget"}"#.to_string()];
        let nodes = parse_blocks(&blocks);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0]["name"], "Widget");
    }

    #[test]
    fn test_parse_blocks_salvages_whitespace_damage() {
        // Literal newlines inside a JSON string are invalid; the salvage pass
        // collapses them to spaces and the block parses
        let blocks = vec![
            "{\"@type\": \"Product\",\n \"name\": \"Widget\nPro\"}".to_string(),
        ];
        let nodes = parse_blocks(&blocks);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0]["name"], "Widget Pro");
    }

    #[test]
    fn test_parse_blocks_skips_hopeless_blocks() {
        let blocks = vec![
            "{definitely not json".to_string(),
            r#"{"@type": "Product"}"#.to_string(),
        ];
        let nodes = parse_blocks(&blocks);
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_graph_envelope_flattened() {
        let blocks = vec![json!({
            "@context": "https://schema.org",
            "@graph": [
                {"@type": "WebSite", "name": "Shop"},
                {"@type": "Product", "name": "Widget"}
            ]
        })
        .to_string()];

        let nodes = parse_blocks(&blocks);
        assert_eq!(nodes.len(), 2);
        let product = nodes
            .into_iter()
            .find_map(|n| match classify(n) {
                LinkedDataNode::Product(v) => Some(v),
                _ => None,
            })
            .unwrap();
        assert_eq!(product["name"], "Widget");
    }

    #[test]
    fn test_top_level_array_flattened() {
        let blocks = vec![json!([
            {"@type": "BreadcrumbList", "itemListElement": []},
            {"@type": "Product", "name": "Widget"}
        ])
        .to_string()];

        assert_eq!(parse_blocks(&blocks).len(), 2);
    }

    #[test]
    fn test_classify_type_list() {
        let node = json!({"@type": ["Thing", "Product"], "name": "Widget"});
        assert!(matches!(classify(node), LinkedDataNode::Product(_)));

        let node = json!({"@type": "BreadcrumbList"});
        assert!(matches!(classify(node), LinkedDataNode::BreadcrumbList(_)));

        let node = json!({"@type": "Organization"});
        assert!(matches!(classify(node), LinkedDataNode::Other(_)));
    }

    #[test]
    fn test_breadcrumbs_concatenate_in_order_with_duplicates() {
        let lists = [
            json!({
                "@type": "BreadcrumbList",
                "itemListElement": [
                    {"position": 1, "name": "A"},
                    {"position": 2, "name": "B"}
                ]
            }),
            json!({
                "@type": "BreadcrumbList",
                "itemListElement": [
                    {"position": 1, "name": "A"},
                    {"position": 2, "name": "C"}
                ]
            }),
        ];

        let labels: Vec<String> = lists.iter().flat_map(breadcrumb_labels).collect();
        assert_eq!(labels, vec!["A", "B", "A", "C"]);
    }

    #[test]
    fn test_breadcrumb_nested_item_name_and_dropped_entries() {
        let list = json!({
            "@type": "BreadcrumbList",
            "itemListElement": [
                {"position": 1, "item": {"@id": "/electronics", "name": "Electronics"}},
                {"position": 2, "item": {"@id": "/phones"}},
                {"position": 3, "name": "  "},
                {"position": 4, "name": "Smartphones"}
            ]
        });

        assert_eq!(
            breadcrumb_labels(&list),
            vec!["Electronics", "Smartphones"]
        );
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("7 999 ₽"), Some(7999.0));
        assert_eq!(parse_amount("$19.99"), Some(19.99));
        assert_eq!(parse_amount("1 249,50"), Some(1249.5));
        assert_eq!(parse_amount("free"), None);
        assert_eq!(parse_amount(""), None);
        // Two separators survive the filter and fail the parse
        assert_eq!(parse_amount("1,299.99"), None);
    }

    #[test]
    fn test_infer_currency() {
        assert_eq!(infer_currency("7 999 ₽"), Some("RUB"));
        assert_eq!(infer_currency("$19.99"), Some("USD"));
        assert_eq!(infer_currency("49,90 €"), Some("EUR"));
        assert_eq!(infer_currency("19.99 CHF"), None);
    }

    #[test]
    fn test_resolve_name_shapes() {
        assert_eq!(resolve_name(&json!("Acme")), Some("Acme".to_string()));
        assert_eq!(
            resolve_name(&json!({"@type": "Brand", "name": "Acme"})),
            Some("Acme".to_string())
        );
        assert_eq!(
            resolve_name(&json!([{"name": ""}, "Acme Corp"])),
            Some("Acme Corp".to_string())
        );
        assert_eq!(resolve_name(&json!({"@type": "Brand"})), None);
    }

    #[test]
    fn test_as_number_from_string() {
        assert_eq!(as_number(&json!("4,5")), Some(4.5));
        assert_eq!(as_number(&json!(4.5)), Some(4.5));
        assert_eq!(as_number(&json!(null)), None);
    }

    #[test]
    fn test_as_count_from_string() {
        assert_eq!(as_count(&json!("1 024 reviews")), Some(1024));
        assert_eq!(as_count(&json!(128)), Some(128));
    }

    #[test]
    fn test_image_list_wrapping() {
        assert_eq!(
            as_image_list(&json!("https://cdn.example.com/1.jpg")),
            vec!["https://cdn.example.com/1.jpg"]
        );
        assert_eq!(
            as_image_list(&json!([
                "https://cdn.example.com/1.jpg",
                {"@type": "ImageObject", "url": "https://cdn.example.com/2.jpg"}
            ])),
            vec![
                "https://cdn.example.com/1.jpg",
                "https://cdn.example.com/2.jpg"
            ]
        );
        assert!(as_image_list(&json!(null)).is_empty());
    }
}
