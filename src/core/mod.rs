//! Host-independent sync logic: resolution, value codec, color policy, schedules

pub mod codec;
pub mod names;
pub mod palette;
pub mod resolver;
pub mod schedule;
pub mod units;

pub use codec::{decode, encode, LinkLookup};
pub use palette::CellColor;
pub use resolver::resolve;
pub use schedule::{extract, ScheduleSnapshot};
