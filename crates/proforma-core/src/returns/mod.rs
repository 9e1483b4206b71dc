pub mod break_even;
pub mod dcf;
pub mod equity_multiple;
pub mod exit;
pub mod irr_vector;
