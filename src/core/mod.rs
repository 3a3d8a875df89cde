pub mod models;
pub mod notifications;
pub mod poll;
pub mod session;
pub mod settings;
