//! Domain utilities

pub mod tax_id;
