pub mod columns;
pub mod compose;
pub mod constraint;
pub mod path;
pub mod predicate;
pub mod projection;
pub mod record;
pub mod signal;
pub mod vector;

pub use record::RecordId;
