//! Line-oriented logging for the webhook service.
//!
//! Every line is `<UTC timestamp> <file>:<line> <message>`:
//!
//! ```text
//! 2026-02-11T21:33:12.000Z src/ingest.rs:133 webhook: saved message doc 3fQ0aLr9...
//! ```
//!
//! Lines go to stderr unless [`set_writer`] installs another sink. Colour is
//! used only on a terminal and never when `NO_COLOR` is set.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

static COLOUR: AtomicBool = AtomicBool::new(false);

static SINK: LazyLock<Mutex<Box<dyn Write + Send>>> =
    LazyLock::new(|| Mutex::new(Box::new(io::stderr())));

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const USER_ID_COLOUR: &str = "\x1b[96m";
const DOC_ID_COLOUR: &str = "\x1b[93m";

/// Platform user IDs are `U` plus 32 hex chars; a prefix identifies them.
const USER_ID_PREFIX_LEN: usize = 9;

/// Decide once at startup whether stderr gets ANSI colour.
pub fn init() {
    let wanted = std::env::var_os("NO_COLOR").is_none();
    COLOUR.store(wanted && io::stderr().is_terminal(), Ordering::Relaxed);
}

/// Send all later [`tlog!`] output to `sink`, uncoloured.
pub fn set_writer(sink: Box<dyn Write + Send>) {
    COLOUR.store(false, Ordering::Relaxed);
    *SINK.lock().unwrap_or_else(|p| p.into_inner()) = sink;
}

fn paint(colour: &str, text: &str) -> String {
    if COLOUR.load(Ordering::Relaxed) {
        format!("{colour}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// A platform user ID, shortened for log lines.
pub fn user_id(id: &str) -> String {
    let end = id
        .char_indices()
        .nth(USER_ID_PREFIX_LEN)
        .map_or(id.len(), |(i, _)| i);
    paint(USER_ID_COLOUR, &id[..end])
}

/// A message or document ID, kept whole so it can be looked up in the store.
pub fn doc_id(id: &str) -> String {
    paint(DOC_ID_COLOUR, id)
}

/// `(year, month, day)` for a count of days since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let day_of_era = z.rem_euclid(146_097);
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let shifted_month = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * shifted_month + 2) / 5 + 1;
    let month = if shifted_month < 10 {
        shifted_month + 3
    } else {
        shifted_month - 9
    };
    let year = year_of_era + era * 400 + i64::from(month <= 2);
    (year, month as u32, day as u32)
}

/// RFC 3339 UTC with millisecond precision.
fn rfc3339_millis(since_epoch: Duration) -> String {
    let secs = since_epoch.as_secs();
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    let of_day = secs % 86_400;
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
        of_day / 3600,
        of_day / 60 % 60,
        of_day % 60,
        since_epoch.subsec_millis()
    )
}

pub fn format_timestamp() -> String {
    rfc3339_millis(SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default())
}

/// Backend of [`tlog!`].
pub fn emit(file: &str, line: u32, msg: &str) {
    let prefix = format!("{} {file}:{line}", format_timestamp());
    let line = format!("{} {msg}", paint(DIM, &prefix));
    let mut sink = SINK.lock().unwrap_or_else(|p| p.into_inner());
    let _ = writeln!(sink, "{line}");
}

/// Log a formatted line tagged with the call site.
///
/// ```ignore
/// tlog!("profile: lookup failed for {}: {}", logging::user_id(uid), err);
/// ```
#[macro_export]
macro_rules! tlog {
    ($($arg:tt)*) => {{
        $crate::logging::emit(file!(), line!(), &format!($($arg)*));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn civil_dates_cross_leap_and_century_boundaries() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(-1), (1969, 12, 31));
        assert_eq!(civil_from_days(11_016), (2000, 2, 29));
        assert_eq!(civil_from_days(11_017), (2000, 3, 1));
        assert_eq!(civil_from_days(20_454), (2026, 1, 1));
    }

    #[test]
    fn timestamps_are_rfc3339_utc() {
        let at = Duration::from_millis(1_767_225_600_000 + 3_723_045);
        assert_eq!(rfc3339_millis(at), "2026-01-01T01:02:03.045Z");
        assert_eq!(format_timestamp().len(), 24);
    }

    #[test]
    fn ids_are_plain_without_colour() {
        COLOUR.store(false, Ordering::Relaxed);
        assert_eq!(user_id("U4af4980629abcdef"), "U4af49806");
        assert_eq!(user_id("U1"), "U1");
        assert_eq!(doc_id("3fQ0aLr9xYz"), "3fQ0aLr9xYz");
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn tlog_goes_to_installed_sink() {
        let captured = Captured::default();
        set_writer(Box::new(captured.clone()));
        crate::tlog!("webhook: test line {}", 7);
        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("src/logging.rs:"));
        assert!(out.contains(" webhook: test line 7\n"));
    }
}
