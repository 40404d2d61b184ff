use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_red, bright_yellow};

/// Progress tracking for the three cleanup phases
pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    pub fn start_phase_1(target_count: usize) -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Phases").underlined());
        let pb = create_spinner(
            bright_yellow(format!("Phase 1/3: Resolving {target_count} targets")).to_string(),
        );
        Self { pb }
    }

    pub fn finish_phase_1_start_phase_2(self, project_count: usize) -> Self {
        self.pb.finish_with_message(
            bright_green(format!("Phase 1/3: Found {project_count} projects ✓")).to_string(),
        );
        let pb = create_spinner(bright_yellow("Phase 2/3: Searching for old pipelines").to_string());
        Self { pb }
    }

    pub fn finish_phase_2_start_phase_3(self, pipeline_count: usize) -> Self {
        self.pb.finish_with_message(
            bright_green(format!("Phase 2/3: Found {pipeline_count} old pipelines ✓")).to_string(),
        );
        let pb = create_spinner(bright_yellow("Phase 3/3: Deleting old pipelines").to_string());
        Self { pb }
    }

    pub fn finish_phase_3(self, deleted: usize, failed: usize) {
        if failed == 0 {
            self.pb.finish_with_message(
                bright_green(format!("Phase 3/3: Deleted {deleted} pipelines ✓")).to_string(),
            );
        } else {
            self.pb.finish_with_message(
                bright_red(format!(
                    "Phase 3/3: Deleted {deleted} pipelines, {failed} failed ✗"
                ))
                .to_string(),
            );
        }
        eprintln!();
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
