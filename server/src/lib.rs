pub mod listings;
pub mod routes;
pub mod server_state;
