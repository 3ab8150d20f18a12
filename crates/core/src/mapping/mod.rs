//! Outbound customer payload mapping.

pub mod mapper;
pub mod municipality;
pub mod payload;
pub mod resolve;

pub use mapper::PayloadMapper;
pub use municipality::MunicipalityTable;
pub use payload::{CustomerPayload, WIRE_FIELDS};
pub use resolve::{left_pad_code, resolve_code, CodeSource, Resolved};
