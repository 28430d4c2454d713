pub mod dto;
pub mod error;
pub mod handlers;
pub mod hub_adapter;
pub mod relay;
pub mod routes;
