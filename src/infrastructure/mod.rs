pub mod http_client_factory;
pub mod news;
pub mod observability;
pub mod price;
pub mod sentiment;
pub mod websocket;
