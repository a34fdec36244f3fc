pub mod clock;
pub mod memory;

pub use clock::{ManualClock, SystemClock};
pub use memory::MemoryCache;
