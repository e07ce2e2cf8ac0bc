pub mod campaign;
pub mod classify;
pub mod config;
pub mod contact;
pub mod gateway;
pub mod script;
pub mod terminal;
