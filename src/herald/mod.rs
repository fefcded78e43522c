pub mod config;
pub mod coordinator;
pub mod detect;
pub mod discord;
pub mod duration;
pub mod feed;
pub mod lifecycle;
pub mod lock;
pub mod message;
pub mod model;
pub mod reconcile;
pub mod store;
pub mod warn;
pub mod youtube;
