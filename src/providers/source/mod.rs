//! Tender listing sources.
//!
//! - [`HadListingSource`] - the public listing website
//! - [`FileListingSource`] - a saved page or a plain-text list

mod file;
mod had;
mod table;
mod traits;

pub use file::FileListingSource;
pub use had::{HadListingSource, ListingConfig, HAD_URL};
pub use table::{parse_listing_table, DEFAULT_TEXT_COLUMN};
pub use traits::{CandidateSource, Result, RetrievalError};
