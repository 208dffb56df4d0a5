pub mod app;
pub mod cli;
pub mod drag;
pub mod image;
pub mod logging;
pub mod realm;
pub mod settings;
pub mod storage;
pub mod store;
pub mod theme;
pub mod types;
pub mod ui;
