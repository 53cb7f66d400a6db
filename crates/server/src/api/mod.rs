pub mod activities;
pub mod collaborators;
pub mod contracts;
pub mod education;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod organization;
pub mod reference;
pub mod routes;
pub mod run;
pub mod tickets;

pub use routes::create_router;
