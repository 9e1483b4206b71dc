pub mod audit;
pub mod financing;
pub mod portfolio;
pub mod proforma;
pub mod returns;
pub mod validation;
