pub mod app;
pub mod lifecycle;

pub use app::App;
pub use lifecycle::{serve_with_shutdown, shutdown_signal, start_server};
