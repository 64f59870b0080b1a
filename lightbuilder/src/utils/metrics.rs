//! Stage timing helpers used by the heavier bake stages.

use std::time::{Duration, Instant};

pub fn measure<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let tt = Instant::now();
    let val = f();

    (val, tt.elapsed())
}

/// Formats a stage timing for logs.
#[cfg(feature = "metrics")]
pub fn display(tt: Duration) -> String {
    // Sub-millisecond precision only adds noise to the logs
    let tt = Duration::from_millis(tt.as_millis() as u64);

    humantime::format_duration(tt).to_string()
}

/// Formats a stage timing for logs.
#[cfg(not(feature = "metrics"))]
pub fn display(tt: Duration) -> String {
    format!("{:?}", tt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_returns_value() {
        let (val, tt) = measure(|| 2 + 2);

        assert_eq!(4, val);
        assert!(!display(tt).is_empty());
    }
}
