// Development server module
// Serves an `Application` over HTTP/1.1 until interrupted

pub mod connection;
pub mod listener;

// `loop` is a keyword, so the file is mounted under another name
#[path = "loop.rs"]
pub mod server_loop;

use crate::app::Application;
use crate::config::Config;

pub use listener::create_reusable_listener;
pub use server_loop::{run, start_server_loop};

/// Everything a connection task needs, shared behind an `Arc`
pub struct ServerState {
    pub app: Application,
    pub config: Config,
}

impl ServerState {
    pub const fn new(app: Application, config: Config) -> Self {
        Self { app, config }
    }
}
