pub mod board;
pub mod events;
pub mod items;
pub mod notifications;
pub mod stats;
