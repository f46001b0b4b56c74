use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static MINUTES_SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"try again in (\d+)m(\d+)").expect("valid regex"));

static SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"try again in (\d+(?:\.\d+)?)s").expect("valid regex"));

/// Safety margin added on top of the provider's suggested wait
const MARGIN_SECS: u64 = 10;

/// Used when the message carries no parsable hint
pub const DEFAULT_WAIT: Duration = Duration::from_secs(60);

/// Work out how long to sleep from a provider's rate-limit message,
/// e.g. "Please try again in 2m13.5s".
pub fn parse_wait_time(message: &str) -> Duration {
    if let Some(caps) = MINUTES_SECONDS.captures(message) {
        let minutes: u64 = caps[1].parse().unwrap_or(0);
        let seconds: u64 = caps[2].parse().unwrap_or(0);
        return Duration::from_secs(minutes * 60 + seconds + MARGIN_SECS);
    }

    if let Some(caps) = SECONDS.captures(message) {
        if let Ok(seconds) = caps[1].parse::<f64>() {
            return Duration::from_secs(seconds.ceil() as u64 + MARGIN_SECS);
        }
    }

    DEFAULT_WAIT
}
