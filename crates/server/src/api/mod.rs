pub mod handlers;
pub mod middleware;
pub mod qbittorrent;
pub mod routes;
pub mod torznab;

pub use routes::create_router;
