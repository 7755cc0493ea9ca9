mod booking_world;
mod setups;
mod steps;

pub use booking_world::BookingWorld;
