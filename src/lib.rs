pub mod demo;
pub mod describe;
pub mod dsl;
pub mod engine;
pub mod error;
pub mod model;
pub mod registry;
pub mod session;
pub mod settings;
pub mod state;
