pub mod consistency;
pub mod export;
pub mod funding_gates;
pub mod identities;
pub mod schedule;
