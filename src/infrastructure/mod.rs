pub mod request_generation;

pub use request_generation::{RequestGenerations, Settlement};
