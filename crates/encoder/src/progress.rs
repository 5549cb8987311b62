//! Progress reporter for the encoder's `-progress` stream.
//!
//! Picks the elapsed time out of each chunk and moves a fixed-width
//! `indicatif` bar.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use regex::Regex;
use std::sync::LazyLock;

static RE_OUT_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"out_time_ms=(\d+)").expect("valid regex"));

/// Extracts the elapsed encode time in microseconds from a raw chunk.
pub fn parse_elapsed_micros(chunk: &str) -> Option<u64> {
    RE_OUT_TIME
        .captures(chunk)
        .and_then(|caps| caps[1].parse().ok())
}

/// Fraction of the encode done, clamped to `[0, 1]`.
///
/// Elapsed time is truncated to whole seconds first.
pub fn progress_ratio(elapsed_micros: u64, total_secs: f64) -> f64 {
    let elapsed_secs = (elapsed_micros / 1_000_000) as f64;
    (elapsed_secs / total_secs).clamp(0.0, 1.0)
}

/// Bar positions per job; the ratio is mapped onto this many steps.
const BAR_SCALE: u64 = 10_000;

const BAR_TEMPLATE: &str = "[{bar:30}] {percent}%";
const BAR_CHARS: &str = "█-";

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(BAR_CHARS)
}

/// Drives one job's progress bar from the encoder's progress stream.
pub struct ProgressReporter {
    bar: ProgressBar,
    total_secs: Option<f64>,
}

impl ProgressReporter {
    /// A bar drawn on stdout, or a hidden one when the duration is unknown.
    pub fn new(total_secs: Option<f64>) -> Self {
        Self::with_draw_target(total_secs, ProgressDrawTarget::stdout())
    }

    pub fn with_draw_target(total_secs: Option<f64>, target: ProgressDrawTarget) -> Self {
        let total_secs = total_secs.filter(|t| t.is_finite() && *t > 0.0);
        let bar = match total_secs {
            Some(_) => ProgressBar::with_draw_target(Some(BAR_SCALE), target).with_style(bar_style()),
            None => ProgressBar::hidden(),
        };
        Self { bar, total_secs }
    }

    /// Whether updates move the bar at all.
    pub fn is_active(&self) -> bool {
        self.total_secs.is_some()
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Advances the bar from one chunk of the progress stream.
    ///
    /// Chunks without an elapsed-time marker are ignored.
    pub fn update(&self, chunk: &str) {
        let Some(total) = self.total_secs else {
            return;
        };
        let Some(elapsed) = parse_elapsed_micros(chunk) else {
            return;
        };

        let ratio = progress_ratio(elapsed, total);
        self.bar.set_position((ratio * BAR_SCALE as f64).round() as u64);
    }

    /// Leaves the final bar on screen and moves to a fresh line.
    pub fn finish(&self) {
        if !self.bar.is_finished() {
            self.bar.finish();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hidden_reporter(total_secs: Option<f64>) -> ProgressReporter {
        ProgressReporter::with_draw_target(total_secs, ProgressDrawTarget::hidden())
    }

    #[test]
    fn test_parse_elapsed_micros() {
        assert_eq!(parse_elapsed_micros("out_time_ms=5000000"), Some(5_000_000));
        assert_eq!(
            parse_elapsed_micros("frame=120\nfps=30.0\nout_time_ms=4000000\nprogress=continue\n"),
            Some(4_000_000)
        );
        assert_eq!(parse_elapsed_micros("frame=120"), None);
        assert_eq!(parse_elapsed_micros("out_time_ms=N/A"), None);
    }

    #[test]
    fn test_progress_ratio_truncates_to_seconds() {
        // 9.9s of a 100s file is 9s, not 9.9s
        assert_eq!(progress_ratio(9_900_000, 100.0), 0.09);
    }

    #[test]
    fn test_progress_ratio_clamps_overrun() {
        assert_eq!(progress_ratio(500_000_000, 100.0), 1.0);
    }

    #[test]
    fn test_bar_template_is_valid() {
        assert!(ProgressStyle::with_template(BAR_TEMPLATE).is_ok());
    }

    #[test]
    fn test_update_moves_bar() {
        let reporter = hidden_reporter(Some(100.0));
        assert!(reporter.is_active());

        reporter.update("out_time_ms=25000000\n");
        assert_eq!(reporter.position(), BAR_SCALE / 4);

        reporter.update("frame=10\nout_time_ms=100000000\nprogress=end\n");
        assert_eq!(reporter.position(), BAR_SCALE);
    }

    #[test]
    fn test_update_without_marker_is_noop() {
        let reporter = hidden_reporter(Some(100.0));
        reporter.update("frame=10\nfps=24\n");
        reporter.update("frame=10\nfps=24\n");

        assert_eq!(reporter.position(), 0);
    }

    #[test]
    fn test_update_without_duration_never_moves() {
        for total in [None, Some(0.0), Some(-3.0), Some(f64::NAN)] {
            let reporter = hidden_reporter(total);
            assert!(!reporter.is_active());
            for secs in 0..10u64 {
                reporter.update(&format!("out_time_ms={}", secs * 1_000_000));
            }
            assert_eq!(reporter.position(), 0);
        }
    }

    #[test]
    fn test_finish_marks_bar_finished() {
        let reporter = hidden_reporter(Some(100.0));
        reporter.update("out_time_ms=50000000");
        reporter.finish();
        reporter.finish();

        assert!(reporter.is_finished());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_position_is_bounded(
            elapsed in 0u64..10_000_000_000,
            total in 0.5f64..100_000.0,
        ) {
            let ratio = progress_ratio(elapsed, total);
            prop_assert!((0.0..=1.0).contains(&ratio));

            let reporter = hidden_reporter(Some(total));
            reporter.update(&format!("out_time_ms={}", elapsed));
            prop_assert!(reporter.position() <= BAR_SCALE);
        }
    }
}
