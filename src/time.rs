use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Custom epoch: Saturday, January 1, 2022 00:00:00 UTC.
///
/// The identifier's 46-bit timestamp field counts milliseconds elapsed
/// since this instant, which keeps the field viable until roughly year
/// 4252 before it would spill into the node-id bits.
pub const CUSTOM_EPOCH: Duration = Duration::from_millis(1_640_995_200_000);

/// A source of current wall-clock time in **milliseconds since the Unix
/// epoch**.
///
/// The generator and its time advancer only ever observe time through this
/// trait, so tests can inject frozen or stepped clocks and production code
/// uses [`WallClock`].
///
/// # Example
///
/// ```
/// use permafrost::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> u64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl TimeSource for WallClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("System clock before UNIX_EPOCH")
            .as_millis() as u64
    }
}
