pub mod handlers;
pub mod jobs;
pub mod maintenance;
pub mod middleware;
pub mod orchestrator;
pub mod routes;

pub use routes::create_router;
