pub mod hub;

pub use hub::{ChatHub, Subscription};
