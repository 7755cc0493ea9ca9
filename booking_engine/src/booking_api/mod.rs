pub mod booking_objects;
pub mod confirmation_poller;
pub mod errors;
pub mod number_generator;
pub mod reconciliation_api;
