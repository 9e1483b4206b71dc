pub mod checks;
pub mod engine;
pub mod independent;
