pub mod cards;
pub mod config;
pub mod dispatch;
pub mod event;
pub mod export;
pub mod gateway;
pub mod handlers;
pub mod ocr;
pub mod platform;
pub mod response;
pub mod server;
pub mod store;
