pub mod annual;
pub mod assumptions;
pub mod company;
pub mod simulator;
