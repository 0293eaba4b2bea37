pub mod extract;
pub mod traits;
pub mod types;
pub mod zoopla;

pub use traits::ListingSource;
pub use zoopla::ZooplaScraper;
