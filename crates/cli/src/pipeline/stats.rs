//! Capture run statistics.

use std::time::Duration;

use capture::SessionReport;

/// Statistics from a capture run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Wall time from connect to teardown
    pub duration: Duration,

    /// Number of cameras (one per vehicle)
    pub cameras: usize,

    /// Session report
    pub report: SessionReport,
}

impl RunStats {
    /// World ticks per second of wall time
    pub fn ticks_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.report.ticks as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Capture Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Ticks/s: {:.2}", self.ticks_per_sec());
        println!("   ├─ Cameras: {}", self.cameras);
        match &self.report.run_dir {
            Some(dir) => println!("   └─ Output: {}", dir.display()),
            None => println!("   └─ Output: none"),
        }

        println!("\n{}", self.report.summary);

        let teardown = &self.report.teardown;
        println!("🧹 Teardown");
        println!(
            "   ├─ World settings restored: {}",
            self.report.settings_restored
        );
        println!("   ├─ Actors destroyed: {}", teardown.destroyed);
        if teardown.purged > 0 {
            println!("   ├─ Other actors purged: {}", teardown.purged);
        }
        if teardown.failed.is_empty() {
            println!("   └─ Left behind: none");
        } else {
            println!("   └─ Left behind: {:?}", teardown.failed);
        }

        println!();
    }
}
