//! # giftsync-source
//!
//! Retrieval of raw gift data from the two upstream endpoints.
//!
//! - [`primary`]: structured JSON: descriptive fields, base attributes,
//!   original sender/recipient details. Failures are errors.
//! - [`secondary`]: HTML page with a labelled table: current owner and
//!   rarity percents. Failures degrade to an empty [`SecondaryData`].
//! - [`client`]: the [`GiftSource`] seam and its ureq-backed [`HttpSource`].

pub mod client;
pub mod error;
pub mod primary;
pub mod secondary;

pub use client::{GiftSource, HttpSource, SourceEndpoints};
pub use error::{ErrorKind, FetchError};
pub use primary::PrimaryData;
pub use secondary::SecondaryData;
