pub mod breakdown;
pub mod financing;
