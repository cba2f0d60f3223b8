use std::time::Duration;

/// Days the initial viewport skips forward past the early-term holiday week.
pub const DEFAULT_HOLIDAY_OFFSET_DAYS: u64 = 14;

/// FullCalendar's stock event color, used when no color matrix entry applies.
pub const DEFAULT_EVENT_COLOR: &str = "#3788d8";

/// Block names that are selected automatically when a term's blocks first resolve.
pub const FULL_TERM_BLOCK_NAMES: [&str; 2] = ["Full Semester", "Full Term"];

/// Buffering delay between a term change and its block list being offered, so a
/// dependent view can render before prior selections are matched against it.
pub const BLOCK_SETTLE_DELAY: Duration = Duration::from_millis(25);

/// How often the import status endpoint is polled.
pub const DEFAULT_UPDATE_POLL: Duration = Duration::from_millis(7500);

pub const DEFAULT_API_URL: &str = "http://localhost:8765/api/";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
