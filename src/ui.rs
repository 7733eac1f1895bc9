use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

/// Stage progress on stderr. Stdout is reserved for the JSON result.
#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    stderr_is_tty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, stderr_is_tty: bool) -> Self {
        Self {
            mode,
            stderr_is_tty,
        }
    }

    pub fn from_flag(flag: &str, stderr_is_tty: bool) -> Self {
        let mode = match flag {
            "plain" => UiMode::Plain,
            "pretty" => UiMode::Pretty,
            _ => UiMode::Auto,
        };
        Self::new(mode, stderr_is_tty)
    }

    fn pretty(&self) -> bool {
        match self.mode {
            UiMode::Plain => false,
            UiMode::Pretty | UiMode::Auto => self.stderr_is_tty,
        }
    }

    /// Start a stage. Call `Stage::done` on success; dropping it marks failure.
    pub fn stage(&self, name: &str) -> Stage {
        let spinner = if self.pretty() {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(format!("{name}…"));
            Some(spinner)
        } else {
            eprintln!("==> {}", name);
            None
        };
        Stage {
            name: name.to_string(),
            start: Instant::now(),
            spinner,
            finished: false,
        }
    }
}

pub struct Stage {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
    finished: bool,
}

impl Stage {
    pub fn done(mut self) {
        self.finish("✔");
    }

    fn finish(&mut self, mark: &str) {
        if self.finished {
            return;
        }
        self.finished = true;
        let message = format!(
            "{} {} ({})",
            mark,
            self.name,
            format_duration(self.start.elapsed())
        );
        match &self.spinner {
            Some(spinner) => spinner.finish_with_message(message),
            None => eprintln!("{message}"),
        }
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        self.finish("✘");
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
