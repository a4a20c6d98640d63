pub mod api;
pub mod app;
pub mod app_store;
pub mod checkin;
pub mod circles;
pub mod cognitive;
pub mod config;
pub mod errors;
pub mod fasting;
pub mod handlers;
pub mod models;
pub mod offline;
pub mod push;
pub mod state;
pub mod stats;
pub mod storage;
pub mod sync;
pub mod timer;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use sync::spawn_background_sync;
