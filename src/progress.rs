use indicatif::{ProgressBar, ProgressStyle};

const BAR_STYLE: &str = "{msg:<30} {bar} {binary_bytes:<10} / {binary_total_bytes:<10} {binary_bytes_per_sec:<12} {percent:<3}% {eta_precise}";
const SPINNER_STYLE: &str = "{msg:<30} {spinner} {binary_bytes:<10} {binary_bytes_per_sec:<12} {elapsed_precise}";

/// Receives byte counts while a download is streaming.
pub trait Progress {
    /// `total` is the declared content length, `None` when the server sent none.
    fn start(&mut self, label: &str, total: Option<u64>);
    fn advance(&mut self, bytes: u64);
    fn finish(&mut self);
}

/// Renders nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&mut self, _label: &str, _total: Option<u64>) {}
    fn advance(&mut self, _bytes: u64) {}
    fn finish(&mut self) {}
}

/// An indicatif bar drawn on stderr.
#[derive(Debug, Default)]
pub struct TerminalProgress {
    bar: Option<ProgressBar>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Progress for TerminalProgress {
    fn start(&mut self, label: &str, total: Option<u64>) {
        let bar = match total {
            Some(len) => ProgressBar::new(len).with_style(style(BAR_STYLE)),
            None => ProgressBar::new_spinner().with_style(style(SPINNER_STYLE)),
        };
        bar.set_message(label.to_string());
        self.bar = Some(bar);
    }

    fn advance(&mut self, bytes: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(bytes);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}

fn style(template: &str) -> ProgressStyle {
    // Templates are constants; fall back to the stock style rather than fail a download.
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}
