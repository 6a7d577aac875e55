//! Run reports printed after the main span and the convergence phase.

use buddynet::{Duration, SimStats};

/// Traffic and convergence figures for the main span.
#[derive(Debug, Clone)]
pub struct SimReport {
    pub presence_updates: u64,
    pub messages_sent: u64,
    pub messages_dropped: u64,
    pub messages_per_second: f64,
    pub mean_convergence_time: Duration,
    pub mean_sleep_time: Duration,
}

impl SimReport {
    pub fn from_stats(stats: &SimStats, elapsed: Duration) -> Self {
        Self {
            presence_updates: stats.presence_updates,
            messages_sent: stats.messages_sent,
            messages_dropped: stats.messages_dropped,
            messages_per_second: stats.messages_per_second(elapsed),
            mean_convergence_time: stats.mean_convergence_time(),
            mean_sleep_time: stats.mean_sleep_time(),
        }
    }

    /// Print the report block to stdout.
    pub fn print_summary(&self) {
        println!("Total Presence Updates: {}", self.presence_updates);
        println!("Total Messages Sent: {}", self.messages_sent);
        println!("Total Messages Dropped: {}", self.messages_dropped);
        println!("Messages / Second: {:.3}", self.messages_per_second);
        println!(
            "Average Time to Converge: {}s",
            self.mean_convergence_time.as_secs()
        );
        println!("Average Sleep Time: {}s", self.mean_sleep_time.as_secs());
    }
}

/// Accuracy figures measured after the convergence phase.
#[derive(Debug, Clone)]
pub struct ConvergenceReport {
    pub total_buddy_records: u64,
    pub total_correct_buddy_records: u64,
    pub accuracy: f64,
}

impl ConvergenceReport {
    pub fn from_stats(stats: &SimStats) -> Self {
        Self {
            total_buddy_records: stats.total_buddy_records,
            total_correct_buddy_records: stats.total_correct_buddy_records,
            accuracy: stats.accuracy(),
        }
    }

    /// Print the report block to stdout.
    pub fn print_summary(&self) {
        println!("Total Buddy Records: {}", self.total_buddy_records);
        println!(
            "Total Correct Buddy Records: {}",
            self.total_correct_buddy_records
        );
        println!("Accuracy Rate: {:.4}", self.accuracy);
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Figures captured when the main span ended.
    pub main: SimReport,
    /// Accuracy after the forced-online convergence phase.
    pub convergence: ConvergenceReport,
}

impl RunSummary {
    /// Print both report blocks in run order.
    pub fn print_summary(&self) {
        self.main.print_summary();
        self.convergence.print_summary();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_snapshots_stats() {
        let mut stats = SimStats::new();
        for _ in 0..120 {
            stats.increment_messages_sent();
        }
        for _ in 0..6 {
            stats.increment_messages_dropped();
        }
        stats.increment_presence_updates();
        stats.add_convergence_time(Duration::from_secs(45));

        let report = SimReport::from_stats(&stats, Duration::from_secs(60));
        assert_eq!(report.messages_sent, 120);
        assert_eq!(report.messages_dropped, 6);
        assert!((report.messages_per_second - 2.0).abs() < f64::EPSILON);
        assert_eq!(report.mean_convergence_time, Duration::from_secs(45));
    }

    #[test]
    fn test_convergence_report_accuracy() {
        let mut stats = SimStats::new();
        for _ in 0..10 {
            stats.increment_buddy_records();
        }
        for _ in 0..9 {
            stats.increment_correct_buddy_records();
        }

        let report = ConvergenceReport::from_stats(&stats);
        assert_eq!(report.total_buddy_records, 10);
        assert!((report.accuracy - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_run_reports_zero_accuracy() {
        let stats = SimStats::new();
        let report = ConvergenceReport::from_stats(&stats);
        assert_eq!(report.accuracy, 0.0);
    }
}
