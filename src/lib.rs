pub mod cache;
pub mod capture;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod host;
pub mod layout;
pub mod selector;
pub mod processing {
    pub mod crop;
}
pub mod tasks {
    pub mod writer;
}
