pub mod http;
pub mod websocket;

// Re-exports
pub use http::http_router;
pub use websocket::{WebSocketState, serve_websocket};
