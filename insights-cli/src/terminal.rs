//! Terminal implementation of the display surface.

use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::{Color, Colorize};
use insights_core::{
    Delivery, ExportArtifact, InsightsError, Level, Notification, Region, Surface, UserPreferences,
};

pub struct TerminalSurface {
    assume_yes: bool,
    downloads: PathBuf,
    regions: HashSet<Region>,
    dark: AtomicBool,
}

impl TerminalSurface {
    /// Only renders into `regions` are printed; everything else is dropped.
    pub fn new(assume_yes: bool, downloads: PathBuf, regions: &[Region]) -> Self {
        Self {
            assume_yes,
            downloads,
            regions: regions.iter().copied().collect(),
            dark: AtomicBool::new(false),
        }
    }

    pub fn dark(&self) -> bool {
        self.dark.load(Ordering::Relaxed)
    }
}

pub fn level_color(level: Level, dark: bool) -> Color {
    match (level, dark) {
        (Level::Success, false) => Color::Green,
        (Level::Success, true) => Color::BrightGreen,
        (Level::Error, false) => Color::Red,
        (Level::Error, true) => Color::BrightRed,
        (Level::Warning, false) => Color::Yellow,
        (Level::Warning, true) => Color::BrightYellow,
        (Level::Info, false) => Color::Blue,
        (Level::Info, true) => Color::BrightCyan,
    }
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Success => "ok",
        Level::Error => "error",
        Level::Warning => "warning",
        Level::Info => "info",
    }
}

/// `y` or `yes`, any case. Everything else declines.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn open_in_viewer(path: &Path) -> io::Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };
    command.arg(path).spawn().map(|_| ())
}

impl Surface for TerminalSurface {
    fn apply_preferences(&self, prefs: &UserPreferences) {
        self.dark.store(prefs.dark_mode, Ordering::Relaxed);
        tracing::debug!(font_size = %prefs.font_size, dark = prefs.dark_mode, "preferences applied");
    }

    fn show_overlay(&self, message: &str) {
        eprintln!("{}", message.dimmed());
    }

    fn hide_overlay(&self) {}

    fn notify(&self, notification: Notification) {
        let color = level_color(notification.level, self.dark());
        let line = format!("[{}] {}", level_tag(notification.level), notification.message);
        eprintln!("{}", line.color(color).bold());
    }

    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{} [y/N] ", prompt.yellow());
        let _ = io::stderr().flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_affirmative(&answer),
            Err(e) => {
                tracing::warn!(error = %e, "could not read confirmation");
                false
            }
        }
    }

    fn render(&self, region: Region, content: &str) {
        if content.is_empty() || !self.regions.contains(&region) {
            return;
        }
        if region == Region::ConversationTitle {
            println!("{}", format!("== {} ==", content).bold());
        } else {
            println!("{}\n", content);
        }
    }

    fn deliver(&self, artifact: ExportArtifact) -> Result<PathBuf, InsightsError> {
        let path = artifact.write_to(&self.downloads)?;
        println!("Saved {}", path.display());
        if artifact.delivery == Delivery::Open {
            if let Err(e) = open_in_viewer(&path) {
                tracing::warn!(error = %e, path = %path.display(), "could not open viewer");
            }
        }
        Ok(path)
    }
}
