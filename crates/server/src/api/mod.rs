pub mod audit;
pub mod books;
pub mod clubs;
pub mod events;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
