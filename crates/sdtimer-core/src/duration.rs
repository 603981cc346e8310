use serde::{Deserialize, Serialize};

/// A millisecond count decomposed into calendar-free display components.
///
/// `total_ms` always equals `((days * 24 + hours) * 60 + minutes) * 60_000
/// + seconds * 1000 + millis`; the decomposition is exact, never rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeParts {
    pub total_ms: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub millis: u64,
}

impl TimeParts {
    pub fn from_millis(total_ms: u64) -> Self {
        let millis = total_ms % 1000;
        let total_seconds = total_ms / 1000;
        let seconds = total_seconds % 60;
        let total_minutes = total_seconds / 60;
        let minutes = total_minutes % 60;
        let total_hours = total_minutes / 60;
        let hours = total_hours % 24;
        let days = total_hours / 24;
        Self {
            total_ms,
            days,
            hours,
            minutes,
            seconds,
            millis,
        }
    }

    /// Zero-padded clock display. Leading day/hour fields are elided while
    /// they are zero, so short countdowns read `mm:ss:mmm`.
    pub fn to_clock_string(&self) -> String {
        if self.days != 0 {
            format!(
                "{:02}:{:02}:{:02}:{:02}:{:03}",
                self.days, self.hours, self.minutes, self.seconds, self.millis
            )
        } else if self.hours != 0 {
            format!(
                "{:02}:{:02}:{:02}:{:03}",
                self.hours, self.minutes, self.seconds, self.millis
            )
        } else {
            format!("{:02}:{:02}:{:03}", self.minutes, self.seconds, self.millis)
        }
    }
}

/// Compose a millisecond count from display components (inverse of
/// [`TimeParts::from_millis`]).
pub fn compose_ms(days: u64, hours: u64, minutes: u64, seconds: u64, millis: u64) -> u64 {
    (((days * 24 + hours) * 60 + minutes) * 60 + seconds) * 1000 + millis
}

/// Human-readable rendering of a duration, coarsest unit only.
/// Used for notification text ("Timer has finished (after 5 minutes)").
pub fn humanize(total_ms: u64) -> String {
    fn plural(n: u64) -> &'static str {
        if n > 1 {
            "s"
        } else {
            ""
        }
    }
    let total_seconds = total_ms / 1000;
    let days = total_seconds / 86_400;
    if days > 0 {
        return format!("{} day{}", days, plural(days));
    }
    let hours = (total_seconds % 86_400) / 3600;
    if hours > 0 {
        return format!("{} hour{}", hours, plural(hours));
    }
    let minutes = (total_seconds % 3600) / 60;
    if minutes > 0 {
        return format!("{} minute{}", minutes, plural(minutes));
    }
    let seconds = total_seconds % 60;
    if seconds > 0 {
        return format!("{} second{}", seconds, plural(seconds));
    }
    "less than a second".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- spec: decomposition is exact ---

    #[test]
    fn zero_decomposes_to_all_zero_fields() {
        let t = TimeParts::from_millis(0);
        assert_eq!(t.total_ms, 0);
        assert_eq!((t.days, t.hours, t.minutes, t.seconds, t.millis), (0, 0, 0, 0, 0));
    }

    #[test]
    fn sub_second_input_only_sets_millis() {
        let t = TimeParts::from_millis(999);
        assert_eq!((t.days, t.hours, t.minutes, t.seconds, t.millis), (0, 0, 0, 0, 999));
    }

    #[test]
    fn exactly_one_minute() {
        let t = TimeParts::from_millis(60_000);
        assert_eq!((t.minutes, t.seconds, t.millis), (1, 0, 0));
    }

    #[test]
    fn mixed_components_decompose() {
        // 1d 2h 3m 4s 5ms
        let ms = compose_ms(1, 2, 3, 4, 5);
        let t = TimeParts::from_millis(ms);
        assert_eq!(t.days, 1);
        assert_eq!(t.hours, 2);
        assert_eq!(t.minutes, 3);
        assert_eq!(t.seconds, 4);
        assert_eq!(t.millis, 5);
    }

    #[test]
    fn hours_wrap_into_days() {
        let t = TimeParts::from_millis(25 * 3_600_000);
        assert_eq!(t.days, 1);
        assert_eq!(t.hours, 1);
    }

    // --- spec: recomposition round-trips ---

    #[test]
    fn recomposition_equals_input() {
        for ms in [0u64, 1, 999, 1000, 59_999, 60_000, 3_599_999, 86_400_000, 123_456_789] {
            let t = TimeParts::from_millis(ms);
            assert_eq!(
                compose_ms(t.days, t.hours, t.minutes, t.seconds, t.millis),
                ms,
                "round trip failed for {ms}"
            );
        }
    }

    // --- spec: clock display elides leading zero fields ---

    #[test]
    fn clock_string_without_hours() {
        let t = TimeParts::from_millis(4 * 60_000 + 7_000 + 89);
        assert_eq!(t.to_clock_string(), "04:07:089");
    }

    #[test]
    fn clock_string_with_hours() {
        let t = TimeParts::from_millis(compose_ms(0, 3, 4, 5, 6));
        assert_eq!(t.to_clock_string(), "03:04:05:006");
    }

    #[test]
    fn clock_string_with_days() {
        let t = TimeParts::from_millis(compose_ms(2, 3, 4, 5, 6));
        assert_eq!(t.to_clock_string(), "02:03:04:05:006");
    }

    // --- spec: humanize picks the coarsest unit ---

    #[test]
    fn humanize_sub_second() {
        assert_eq!(humanize(500), "less than a second");
    }

    #[test]
    fn humanize_singular_and_plural() {
        assert_eq!(humanize(1000), "1 second");
        assert_eq!(humanize(2000), "2 seconds");
        assert_eq!(humanize(60_000), "1 minute");
        assert_eq!(humanize(5 * 60_000), "5 minutes");
        assert_eq!(humanize(2 * 3_600_000), "2 hours");
        assert_eq!(humanize(3 * 86_400_000), "3 days");
    }

    #[test]
    fn humanize_ignores_finer_remainder() {
        // 1 hour 59 minutes reads as "1 hour"
        assert_eq!(humanize(3_600_000 + 59 * 60_000), "1 hour");
    }
}
