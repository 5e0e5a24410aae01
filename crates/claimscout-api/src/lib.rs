pub mod tmdb;
pub mod traits;

pub use traits::{CatalogService, MediaKind, Organization, SearchHit, TitleDetails};
