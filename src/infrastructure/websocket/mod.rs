pub mod server;
pub mod subscriber;

pub use server::TickStreamServer;
pub use subscriber::WebSocketSubscriber;
