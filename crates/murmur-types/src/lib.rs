//! Plain-value types shared by the store, the service layer and the app shell.

pub mod api;
pub mod events;
pub mod models;
