use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Three stacked bars for a fan-out run: tickers processed, successes & failures.
///
/// Without a tui every bar is hidden, so callers can tick them unconditionally.
#[derive(Clone, Debug)]
pub struct Progress {
    multi: Option<MultiProgress>,
    total: ProgressBar,
    success: ProgressBar,
    fails: ProgressBar,
}

impl Progress {
    pub fn new(len: usize, title: &str, tui: bool) -> anyhow::Result<Self> {
        if !tui {
            return Ok(Self::hidden());
        }

        println!(
            "{bar}\n{title:^40}\n{bar}",
            bar = "=".repeat(40),
        );

        // overall multi progress bar
        let multi = MultiProgress::new();

        // total number of tickers to collect
        let total = multi.add(
            ProgressBar::new(len as u64).with_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.magenta}\n \
                        {msg:>9.white} |{bar:57.white/grey}| {pos:<2} / {human_len} \
                        ({percent_precise}%) [Time: {elapsed}, Rate: {per_sec}, ETA: {eta}]",
                    )?
                    .progress_chars("## "),
            ),
        );
        total.set_message("total");
        total.enable_steady_tick(Duration::from_millis(100));

        // total successful collections
        let success = multi.insert_after(
            &total,
            ProgressBar::new(len as u64).with_style(
                ProgressStyle::default_bar()
                    .template(" {msg:>9.green} |{bar:57.green}| {pos:<2.green}")?
                    .progress_chars("## "),
            ),
        );
        success.set_message("successes");

        // total failed collections
        let fails = multi.insert_after(
            &success,
            ProgressBar::new(len as u64).with_style(
                ProgressStyle::default_bar()
                    .template(" {msg:>9.red} |{bar:57.red}| {pos:<2.red}")?
                    .progress_chars("## "),
            ),
        );
        fails.set_message("failures");

        Ok(Self {
            multi: Some(multi),
            total,
            success,
            fails,
        })
    }

    pub fn hidden() -> Self {
        Self {
            multi: None,
            total: ProgressBar::hidden(),
            success: ProgressBar::hidden(),
            fails: ProgressBar::hidden(),
        }
    }

    pub fn success(&self) {
        self.total.inc(1);
        self.success.inc(1);
    }

    pub fn fail(&self) {
        self.total.inc(1);
        self.fails.inc(1);
    }

    /// A one-line spinner under the bars, e.g. for the write of a chunk.
    pub fn spinner(&self, msg: String) -> ProgressBar {
        match &self.multi {
            Some(m) => m.add(
                ProgressBar::new_spinner().with_message(msg).with_style(
                    ProgressStyle::default_spinner()
                        .template("\t   > {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                ),
            ),
            None => ProgressBar::hidden(),
        }
    }

    pub fn finish(&self) {
        self.total.finish();
        self.success.finish();
        self.fails.finish();
    }
}
