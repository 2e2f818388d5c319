//! # giftsync-renderer
//!
//! Tera-based rendering of published gift artifacts.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use giftsync_core::GiftRecord;
//! use giftsync_renderer::{IndexContext, Renderer};
//!
//! fn render_collection(collection: &str, records: &[GiftRecord]) {
//!     if let Ok(renderer) = Renderer::new() {
//!         for record in records {
//!             if let Ok(page) = renderer.render_gift_page(record) {
//!                 println!("{}: {} bytes", record.artifact_path, page.len());
//!             }
//!         }
//!         let index = IndexContext::from_records(collection, records.iter());
//!         let _ = renderer.render_index(&index);
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{AttributeCtx, GiftCard, GiftPageContext, IndexContext};
pub use engine::{Renderer, TemplateEngine};
pub use error::RenderError;
