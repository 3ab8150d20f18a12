//! Customer lookup logic: the type-code catalog and the ordered probe plan.

pub mod catalog;
pub mod probe;

pub use catalog::{TypeCodeCatalog, STANDARD_TYPE_CODES};
pub use probe::{CodeProbe, ProbeOutcome, ProbePlan, ProbeStep};
