use std::io::Write;
use std::time::Instant;

/// Sink for progress reporting: receives `(current, total, label)` updates.
///
/// Callers guarantee monotonically increasing `current` and exactly one
/// final `(total, total)` call before the reporting operation returns.
pub trait ProgressSink {
    fn update(&mut self, current: u64, total: u64, label: Option<&str>);
}

/// No-op sink for library use and tests.
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct SilentSink;

impl ProgressSink for SilentSink {
    fn update(&mut self, _current: u64, _total: u64, _label: Option<&str>) {}
}

const PROGRESS_BAR_CHAR: char = '\u{25B0}'; // ▰
const EMPTY_BAR_CHAR: char = '\u{2550}'; // ═
const BAR_WIDTH: usize = 40;

/// Single updating status line on stderr:
/// `| 42% |▰▰▰═══| 84/200 | label | Est = 3s |`.
///
/// `throttle` redraws only every n-th update; the final update is always
/// drawn. Out-of-order updates (current below the last drawn value) are
/// ignored so the line never goes backwards.
#[derive(Debug)]
pub struct LoadingBar {
    throttle: u64,
    last_drawn: u64,
    started: Instant,
    finished: bool,
}

impl LoadingBar {
    pub fn new() -> Self {
        Self::with_throttle(1)
    }

    /// `throttle == 0` draws every update.
    pub fn with_throttle(throttle: u64) -> Self {
        Self {
            throttle: throttle.max(1),
            last_drawn: 0,
            started: Instant::now(),
            finished: false,
        }
    }

    fn render(&self, current: u64, total: u64, label: Option<&str>) -> String {
        let total = total.max(1);
        let ratio = (current as f64 / total as f64).clamp(0.0, 1.0);
        let filled = (ratio * BAR_WIDTH as f64).round() as usize;

        let mut bar = String::with_capacity(BAR_WIDTH);
        for _ in 0..filled {
            bar.push(PROGRESS_BAR_CHAR);
        }
        for _ in filled..BAR_WIDTH {
            bar.push(EMPTY_BAR_CHAR);
        }

        let mut line = format!(
            "\r| {:3.0}% |{bar}| {current}/{total} |",
            ratio * 100.0
        );
        if let Some(label) = label {
            line.push_str(&format!(" {label} |"));
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        if current > 0 && current < total {
            let remaining = elapsed / current as f64 * (total - current) as f64;
            line.push_str(&format!(" Est = {remaining:.0}s |"));
        } else if current >= total {
            line.push_str(&format!(" {elapsed:.2}s |"));
        }
        line
    }
}

impl Default for LoadingBar {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for LoadingBar {
    fn update(&mut self, current: u64, total: u64, label: Option<&str>) {
        if self.finished || current < self.last_drawn {
            return;
        }
        let is_final = current >= total;
        if !is_final && current % self.throttle != 0 {
            return;
        }
        self.last_drawn = current;

        let line = self.render(current, total, label);
        let mut err = std::io::stderr();
        let _ = err.write_all(line.as_bytes());
        if is_final {
            let _ = err.write_all(b"\n");
            self.finished = true;
        }
        let _ = err.flush();
    }
}

/// Sink enregistrant les appels, pour vérifier le contrat de progression
/// dans les tests du moteur.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub calls: Vec<(u64, u64)>,
}

#[cfg(test)]
impl ProgressSink for RecordingSink {
    fn update(&mut self, current: u64, total: u64, _label: Option<&str>) {
        self.calls.push((current, total));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_formats_percentage_and_counts() {
        let bar = LoadingBar::new();
        let line = bar.render(84, 200, Some("attracteur: z^2 + const"));
        assert!(line.contains("42%"));
        assert!(line.contains("84/200"));
        assert!(line.contains("attracteur: z^2 + const"));
    }

    #[test]
    fn test_render_full_bar_at_completion() {
        let bar = LoadingBar::new();
        let line = bar.render(10, 10, None);
        assert!(line.contains("100%"));
        assert!(!line.contains(EMPTY_BAR_CHAR));
    }

    #[test]
    fn test_throttled_bar_still_draws_final_update() {
        let mut bar = LoadingBar::with_throttle(50);
        // ni 3 ni 7 ne seraient dessinés, mais l'appel final l'est toujours
        bar.update(3, 7, None);
        bar.update(7, 7, None);
        assert!(bar.finished);
    }
}
