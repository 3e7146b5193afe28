//! Extraction engine
//!
//! Turns a rendered product page into a normalized [`ProductRecord`]:
//! - [`snapshot`]: page-side capture of title, heading, price text, challenge
//!   token and raw linked-data blocks
//! - [`jsonld`]: Schema.org Product/BreadcrumbList parsing with defensive
//!   field coercion
//! - [`record`]: normalization of a snapshot into the canonical record

pub mod jsonld;
pub mod record;
pub mod snapshot;

pub use jsonld::LinkedDataNode;
pub use record::{PriceInfo, ProductRecord, RatingInfo};
pub use snapshot::PageSnapshot;
