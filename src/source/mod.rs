//! Everything between an object notification and a list of raw records:
//! parsing the trigger, gating on file format, fetching the object and
//! decoding its content.

pub mod decode;
pub mod fetch;
pub mod format;
pub mod notification;

pub use decode::decode;
pub use fetch::{ObjectFetcher, StorageFetcher};
pub use format::FileFormat;
pub use notification::{Notification, ObjectRef};
