mod ids;
mod json_store;
mod paths;

pub use ids::next_id;
pub use json_store::{RecordStore, WriteAccess};
pub use paths::{PathResolver, StorageRoot};
