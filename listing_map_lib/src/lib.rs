pub mod coordinate;
pub mod listing;
pub mod route;
