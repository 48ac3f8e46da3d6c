pub mod charset;
pub mod kind;
pub mod marker;
pub mod source_unit;

pub use charset::Charset;
pub use kind::SourceKind;
pub use marker::{Marker, MarkerKind, Markers};
pub use source_unit::{
    FileAttributes, Import, OpaqueReason, Payload, SourceUnit, Syntax, stable_unit_id,
};
