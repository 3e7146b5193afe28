//! Rendering of product records for the CLI

use crate::config::OutputFormat;
use crate::error::{Result, ScoutError};
use crate::extract::ProductRecord;
use std::fmt::Write;

/// Render a record in the requested format
pub fn render(record: &ProductRecord, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(record)
            .map_err(|e| ScoutError::EvaluationFailed(format!("failed to serialize record: {}", e))),
        OutputFormat::Text => Ok(render_text(record)),
    }
}

fn render_text(record: &ProductRecord) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Title:        {}", record.title);

    if let Some(url) = &record.url {
        let _ = writeln!(out, "URL:          {}", url);
    }
    if let Some(sku) = &record.sku {
        let _ = writeln!(out, "SKU:          {}", sku);
    }
    if let Some(brand) = &record.brand {
        let _ = writeln!(out, "Brand:        {}", brand);
    }
    if let Some(seller) = &record.seller {
        let _ = writeln!(out, "Seller:       {}", seller);
    }

    match (&record.price.value, &record.price.currency) {
        (Some(value), Some(currency)) => {
            let _ = writeln!(out, "Price:        {} {}", value, currency);
        }
        (Some(value), None) => {
            let _ = writeln!(out, "Price:        {}", value);
        }
        _ => {}
    }
    if let Some(display) = &record.price.display_text {
        let _ = writeln!(out, "Price tag:    {}", display);
    }
    if let Some(availability) = &record.price.availability {
        let _ = writeln!(out, "Availability: {}", availability);
    }

    if let Some(rating) = &record.rating {
        match (rating.value, rating.review_count) {
            (Some(value), Some(count)) => {
                let _ = writeln!(out, "Rating:       {} ({} reviews)", value, count);
            }
            (Some(value), None) => {
                let _ = writeln!(out, "Rating:       {}", value);
            }
            (None, Some(count)) => {
                let _ = writeln!(out, "Reviews:      {}", count);
            }
            (None, None) => {}
        }
    }

    if !record.breadcrumbs.is_empty() {
        let _ = writeln!(out, "Breadcrumbs:  {}", record.breadcrumbs.join(" > "));
    }

    if !record.images.is_empty() {
        let _ = writeln!(out, "Images:");
        for image in &record.images {
            let _ = writeln!(out, "  - {}", image);
        }
    }

    if let Some(description) = &record.description {
        let _ = writeln!(out, "Description:  {}", description);
    }

    out
}
