pub mod amortization;
pub mod calculators;
pub mod prepayment;
