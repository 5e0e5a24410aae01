mod item;
mod link;

pub use item::{CandidateItem, CatalogMatch};
pub use link::LinkRecord;
