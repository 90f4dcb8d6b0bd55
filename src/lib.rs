#![forbid(unsafe_code)]

pub mod backup;
pub mod collections;
pub mod config;
pub mod http;
pub mod ipc;
pub mod matricule;
pub mod records;
pub mod service;
pub mod stats;
pub mod store;

pub use collections::{CollectionRegistry, CollectionSpec};
pub use config::AppConfig;
pub use http::{build_router, HttpState};
pub use matricule::MatriculePolicy;
pub use records::Record;
pub use service::{DataService, Mutation};
pub use stats::Stats;
pub use store::{PathResolver, RecordStore, WriteAccess};
