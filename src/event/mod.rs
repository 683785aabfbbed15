//! Usage events: the canonical record shape, its pre-validation form, and
//! the two pure stages that move raw records between them.

mod model;
mod normalize;
mod validate;

pub use model::{Candidate, Event, RawRecord, REQUIRED_FIELDS};
pub use normalize::{normalize, normalize_all};
pub use validate::{Partitioned, is_valid, partition_valid};
