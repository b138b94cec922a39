use std::io::Write;
use std::time::{Duration, Instant};

use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, execute};
use owo_colors::OwoColorize;

use agon_downloader::DownloadEvent;

use crate::utils::*;

/// Two-line terminal renderer driven by download events.
///
/// Events carry the authoritative counters; `tick` only redraws so the
/// spinner keeps moving while the stream is quiet.
pub struct DownloadProgressRenderer {
    enabled: bool,
    initialized: bool,
    spinner_step: usize,
    started_at: Option<Instant>,
    downloaded: u64,
    total: Option<u64>,
    finished: bool,
}

impl DownloadProgressRenderer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            initialized: false,
            spinner_step: 0,
            started_at: None,
            downloaded: 0,
            total: None,
            finished: false,
        }
    }

    pub fn handle(&mut self, event: DownloadEvent) {
        if !self.enabled {
            return;
        }

        match event {
            DownloadEvent::Started { total_bytes } => {
                self.total = total_bytes;
                self.downloaded = 0;
                self.finished = false;
                self.started_at = Some(Instant::now());
            }
            DownloadEvent::Progress {
                downloaded_bytes,
                total_bytes,
                elapsed,
            } => {
                self.total = total_bytes;
                self.downloaded = downloaded_bytes;
                self.started_at = Some(Instant::now() - elapsed);
            }
            DownloadEvent::Finished {
                downloaded_bytes,
                elapsed,
            } => {
                self.downloaded = downloaded_bytes;
                self.started_at = Some(Instant::now() - elapsed);
                self.finished = true;
            }
        }

        self.draw();
    }

    pub fn tick(&mut self) {
        if !self.enabled || self.finished || self.started_at.is_none() {
            return;
        }
        self.draw();
    }

    fn draw(&mut self) {
        let elapsed = self
            .started_at
            .map(|started| started.elapsed())
            .unwrap_or(Duration::ZERO);

        let mut stdout = std::io::stdout();

        if !self.initialized {
            let _ = writeln!(stdout);
            let _ = writeln!(stdout);
            self.initialized = true;
        }

        let spinner = if self.finished {
            "✓".to_string()
        } else {
            const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
            let frame = FRAMES[self.spinner_step % FRAMES.len()];
            self.spinner_step = self.spinner_step.wrapping_add(1);
            frame.to_string()
        };

        let ratio = self
            .total
            .map(|total_bytes| {
                if total_bytes == 0 {
                    1.0
                } else {
                    self.downloaded as f64 / total_bytes as f64
                }
            })
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);

        let bar_width = 45.0;
        let filled = (ratio * bar_width).round();
        let empty = bar_width - filled;
        let bar = format!(
            "[{}{}]",
            "█".repeat(filled as usize),
            " ".repeat(empty as usize)
        );

        let speed_bps = if elapsed.as_secs_f64() > 0.0 {
            self.downloaded as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let speed_text = format!("{}/s", format_bytes_f64(speed_bps));

        let eta = self
            .total
            .and_then(|total_bytes| estimate_eta(self.downloaded, total_bytes, elapsed));
        let downloaded_text = format_bytes(self.downloaded);
        let total_text = self
            .total
            .map(format_bytes)
            .unwrap_or_else(|| "unknown".to_string());
        let eta_text = eta
            .map(format_duration)
            .unwrap_or_else(|| "--:--".to_string());

        let spinner = spinner.cyan();
        let bar = bar.green();
        let downloaded_text = downloaded_text.yellow();
        let total_text = total_text.dimmed();
        let eta_text = eta_text.magenta();

        let _ = execute!(stdout, cursor::MoveUp(2), Clear(ClearType::FromCursorDown));
        let _ = writeln!(stdout, "[{spinner}] {bar}  eta {eta_text}");
        let _ = writeln!(
            stdout,
            "{downloaded_text:>14} / {total_text:<14}  {speed_text:>30}"
        );
        let _ = stdout.flush();
    }
}
