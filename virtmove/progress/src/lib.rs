use std::time::Duration;

use enum_dispatch::enum_dispatch;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

pub mod messages;

/// The environment variable name that is used to determine the mode of progress reporting.
pub const VIRTMOVE_PROGRESS_ENV: &str = "VIRTMOVE_PROGRESS_MODE";

/// Operator facing reporting of what a command is doing.
///
/// This is separate from `tracing`: logs are for debugging the tool, progress is what the person
/// running it needs to read (warnings before a confirmation prompt, which file was written).
#[enum_dispatch]
pub trait Progress: Sized {
    /// Create a subtask report from this task.
    fn subtask(&self, text: &str) -> Self;

    /// When task is done successfully
    fn success(&mut self, msg: Option<&str>);

    /// When task is done with failure
    fn failure(&mut self, msg: Option<&str>);

    /// When you want to issue a warning on current task
    fn warning(&self, msg: &str);

    /// When you want to print a message.
    fn info(&self, msg: &str);
}

/// `ProgressTracker` specifies the way progress is reported.
#[derive(Debug)]
#[enum_dispatch(Progress)]
pub enum ProgressTracker {
    /// Display dynamic progress with spinners.
    SpinnerProgress(SpinnerProgress),

    /// Display simple human-readable messages in new lines.
    SimpleProgress(SimpleProgress),

    /// Do not output progress.
    NullProgress(NullProgress),
}

impl ProgressTracker {
    /// Get the progress tracker from environment or return a default ([`SpinnerProgress`]).
    pub fn from_env(text: &str) -> Self {
        Self::try_from_env(text).unwrap_or_else(|| SpinnerProgress::new(text).into())
    }

    /// Get the progress tracker from environment.
    pub fn try_from_env(text: &str) -> Option<Self> {
        let progress = match std::env::var(VIRTMOVE_PROGRESS_ENV).as_deref() {
            Ok("dumb" | "simple") => SimpleProgress::new(text).into(),
            Ok("off") => NullProgress.into(),
            Ok("std" | "standard") => SpinnerProgress::new(text).into(),
            _ => return None,
        };

        Some(progress)
    }
}

#[derive(Debug)]
pub struct NullProgress;

impl Progress for NullProgress {
    fn subtask(&self, _: &str) -> NullProgress {
        NullProgress
    }

    fn success(&mut self, _: Option<&str>) {}

    fn failure(&mut self, _: Option<&str>) {}

    fn warning(&self, _: &str) {}

    fn info(&self, _: &str) {}
}

/// Line based output, for terminals where the spinner redraws get in the way (CI logs, pipes).
#[derive(Debug)]
pub struct SimpleProgress;

impl SimpleProgress {
    pub fn new(text: &str) -> SimpleProgress {
        println!("{text}");
        SimpleProgress
    }
}

impl Progress for SimpleProgress {
    fn subtask(&self, text: &str) -> SimpleProgress {
        println!("  {text}");
        SimpleProgress
    }

    fn success(&mut self, msg: Option<&str>) {
        if let Some(msg) = msg {
            println!("✓ {msg}");
        }
    }

    fn failure(&mut self, msg: Option<&str>) {
        if let Some(msg) = msg {
            eprintln!("x {msg}");
        }
    }

    fn warning(&self, msg: &str) {
        eprintln!("[WARNING] {msg}");
    }

    fn info(&self, msg: &str) {
        println!("{msg}");
    }
}

fn spinner(indent: usize) -> ProgressBar {
    let template = format!("{indent}{{spinner}} {{msg}}", indent = "  ".repeat(indent));
    let style = ProgressStyle::default_spinner()
        .template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    ProgressBar::hidden().with_style(style)
}

#[derive(Debug)]
pub struct SpinnerProgress {
    done: bool,
    root_progress: MultiProgress,
    progress: ProgressBar,
    indent: usize,
}

impl SpinnerProgress {
    pub fn new(text: &str) -> SpinnerProgress {
        let root_progress = MultiProgress::new();

        SpinnerProgress::attached(root_progress, 0, text)
    }

    fn attached(root_progress: MultiProgress, indent: usize, text: &str) -> SpinnerProgress {
        let progress = spinner(indent);
        progress.set_message(text.to_string());
        root_progress.add(progress.clone());
        progress.enable_steady_tick(Duration::from_millis(60));

        SpinnerProgress {
            done: false,
            root_progress,
            progress,
            indent,
        }
    }

    fn print(&self, msg: &str) {
        let _ = self.root_progress.println(msg);
    }
}

impl Progress for SpinnerProgress {
    fn subtask(&self, text: &str) -> SpinnerProgress {
        SpinnerProgress::attached(self.root_progress.clone(), self.indent + 1, text)
    }

    fn success(&mut self, msg: Option<&str>) {
        self.done = true;
        let msg = msg.map(ToString::to_string).unwrap_or_else(|| self.progress.message());
        self.progress.finish_with_message(format!("✓ {msg}"));
    }

    fn failure(&mut self, msg: Option<&str>) {
        self.done = true;
        let msg = msg.map(ToString::to_string).unwrap_or_else(|| self.progress.message());
        self.progress.abandon_with_message(format!("x {msg}"));
    }

    fn warning(&self, msg: &str) {
        self.print(&format!("! {msg}"));
    }

    fn info(&self, msg: &str) {
        self.print(&format!("* {msg}"));
    }
}

impl Drop for SpinnerProgress {
    fn drop(&mut self) {
        if !self.done {
            self.failure(None);
        }
    }
}
