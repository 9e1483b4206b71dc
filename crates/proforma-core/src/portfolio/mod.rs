pub mod consolidation;
pub mod scenario;
