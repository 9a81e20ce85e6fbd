mod clock;
mod elapsed;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use elapsed::{format_elapsed, ElapsedTimer, NEVER_STARTED};
