use confmc::engine::progress::{Progress, ProgressCallback};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

#[derive(Debug)]
pub enum UiEvent {
    Progress(Progress),
    Log(String),
}

/// The bar of the sample currently being refined.
struct SampleView {
    bar: ProgressBar,
    label: String,
    steps_done: u64,
    status: Option<String>,
}

impl SampleView {
    fn summary_line(&self) -> String {
        match &self.status {
            Some(status) => format!("✓ {}: {} MC steps, {}", self.label, self.steps_done, status),
            None => format!("✓ {}: {} MC steps", self.label, self.steps_done),
        }
    }
}

/// Draws one bar per refined sample and prints log lines above it.
pub struct UiManager {
    mp: Arc<MultiProgress>,
    current: Option<SampleView>,
    samples_finished: usize,
    events: mpsc::Receiver<UiEvent>,
    shutdown: watch::Receiver<bool>,
    _anchor_bar: ProgressBar,
}

impl UiManager {
    pub fn new() -> (Self, mpsc::Sender<UiEvent>, watch::Sender<bool>) {
        let (event_sender, events) = mpsc::channel(1024);
        let (shutdown_sender, shutdown) = watch::channel(false);
        let mp = Arc::new(MultiProgress::new());
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(12));
        let _anchor_bar = mp.add(ProgressBar::hidden());
        let manager = Self {
            mp,
            current: None,
            samples_finished: 0,
            events,
            shutdown,
            _anchor_bar,
        };
        (manager, event_sender, shutdown_sender)
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(event) = self.events.recv() => self.handle_event(event),
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        if let Some(view) = self.current.take() {
            view.bar.finish_and_clear();
        }
        self._anchor_bar.finish_and_clear();
        debug!(samples = self.samples_finished, "Progress display closed.");
    }

    fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Log(line) => self.print(line),
            UiEvent::Progress(progress) => self.handle_progress(progress),
        }
    }

    fn handle_progress(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => self.begin_sample(name),
            Progress::PhaseFinish => self.end_sample(),
            Progress::TaskStart { total } => {
                if let Some(view) = self.current.as_mut() {
                    view.bar.disable_steady_tick();
                    view.bar.set_style(Self::steps_style());
                    view.bar.set_length(total);
                    view.bar.set_position(0);
                    view.steps_done = 0;
                }
            }
            Progress::TaskIncrement { amount } => {
                if let Some(view) = self.current.as_mut() {
                    view.bar.inc(amount);
                    view.steps_done += amount;
                }
            }
            Progress::TaskFinish => {
                if let Some(view) = self.current.as_ref() {
                    view.bar.finish();
                }
            }
            Progress::StatusUpdate { text } => {
                if let Some(view) = self.current.as_mut() {
                    view.bar.set_message(format!("{} ({})", view.label, text));
                    view.status = Some(text);
                }
            }
            Progress::Message(text) => self.print(format!("  {}", text)),
        }
    }

    fn begin_sample(&mut self, label: String) {
        if let Some(stale) = self.current.take() {
            stale.bar.finish_and_clear();
        }
        let bar = self.mp.add(ProgressBar::new_spinner());
        bar.set_style(Self::writing_style());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar.set_message(label.clone());
        self.current = Some(SampleView {
            bar,
            label,
            steps_done: 0,
            status: None,
        });
    }

    fn end_sample(&mut self) {
        let Some(view) = self.current.take() else {
            return;
        };
        view.bar.finish_and_clear();
        self.samples_finished += 1;
        self.print(view.summary_line());
    }

    fn print(&self, line: String) {
        if self.mp.println(&line).is_err() {
            eprintln!("{}", line);
        }
    }

    fn writing_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
    }

    fn steps_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<30} [{bar:40.cyan/blue}] {pos}/{len} MC steps ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
            })
            .progress_chars("━╸ ")
    }
}

/// Forwards engine progress events to the UI task without blocking the
/// refinement loop.
#[derive(Clone)]
pub struct ProgressForwarder {
    sender: mpsc::Sender<UiEvent>,
}

impl ProgressForwarder {
    pub fn new(sender: mpsc::Sender<UiEvent>) -> Self {
        Self { sender }
    }

    pub fn callback(&self) -> ProgressCallback<'static> {
        let sender = self.sender.clone();
        Box::new(move |progress: Progress| {
            if let Err(e) = sender.try_send(UiEvent::Progress(progress)) {
                warn!("Dropped a progress update: {}", e);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden_manager() -> (UiManager, mpsc::Sender<UiEvent>) {
        let (manager, sender, _shutdown) = UiManager::new();
        manager.mp.set_draw_target(ProgressDrawTarget::hidden());
        (manager, sender)
    }

    fn send(manager: &mut UiManager, progress: Progress) {
        manager.handle_event(UiEvent::Progress(progress));
    }

    fn start(manager: &mut UiManager, label: &str, steps: u64) {
        send(manager, Progress::PhaseStart { name: label.into() });
        send(manager, Progress::TaskStart { total: steps });
    }

    #[test]
    fn sample_start_opens_a_bar_labelled_with_the_sample() {
        let (mut manager, _) = hidden_manager();
        assert!(manager.current.is_none());

        send(&mut manager, Progress::PhaseStart { name: "Sample 0007".into() });

        let view = manager.current.as_ref().unwrap();
        assert_eq!(view.label, "Sample 0007");
        assert_eq!(view.bar.message(), "Sample 0007");
    }

    #[test]
    fn step_events_drive_the_bar() {
        let (mut manager, _) = hidden_manager();
        start(&mut manager, "Sample 0001", 5000);
        for _ in 0..3 {
            send(&mut manager, Progress::TaskIncrement { amount: 1 });
        }

        let view = manager.current.as_ref().unwrap();
        assert_eq!(view.bar.length(), Some(5000));
        assert_eq!(view.bar.position(), 3);
        assert_eq!(view.steps_done, 3);

        send(&mut manager, Progress::TaskFinish);
        assert!(manager.current.as_ref().unwrap().bar.is_finished());
    }

    #[test]
    fn a_new_sample_replaces_an_unfinished_one() {
        let (mut manager, _) = hidden_manager();
        start(&mut manager, "Sample 0001", 10);
        start(&mut manager, "Sample 0002", 10);

        assert_eq!(manager.current.as_ref().unwrap().label, "Sample 0002");
        assert_eq!(manager.samples_finished, 0);
    }

    #[test]
    fn status_updates_decorate_the_bar_and_the_summary() {
        let (mut manager, _) = hidden_manager();
        start(&mut manager, "Sample 0003", 4);
        send(&mut manager, Progress::TaskIncrement { amount: 4 });
        send(&mut manager, Progress::StatusUpdate { text: "2 inconsistent".into() });

        let view = manager.current.as_ref().unwrap();
        assert_eq!(view.bar.message(), "Sample 0003 (2 inconsistent)");
        assert_eq!(view.summary_line(), "✓ Sample 0003: 4 MC steps, 2 inconsistent");
    }

    #[test]
    fn sample_finish_closes_the_view_and_counts_it() {
        let (mut manager, _) = hidden_manager();
        start(&mut manager, "Sample 0004", 2);
        send(&mut manager, Progress::TaskIncrement { amount: 2 });
        assert_eq!(
            manager.current.as_ref().unwrap().summary_line(),
            "✓ Sample 0004: 2 MC steps"
        );

        send(&mut manager, Progress::PhaseFinish);
        assert!(manager.current.is_none());
        assert_eq!(manager.samples_finished, 1);

        send(&mut manager, Progress::PhaseFinish);
        assert_eq!(manager.samples_finished, 1);
    }

    #[test]
    fn events_without_a_sample_are_ignored() {
        let (mut manager, _) = hidden_manager();
        send(&mut manager, Progress::TaskStart { total: 3 });
        send(&mut manager, Progress::TaskIncrement { amount: 1 });
        send(&mut manager, Progress::StatusUpdate { text: "1 inconsistent".into() });
        send(&mut manager, Progress::Message("Sample 0005 skipped: charges deviate by 1".into()));
        manager.handle_event(UiEvent::Log("WARN sample=12 step=4".into()));
        assert!(manager.current.is_none());
    }

    #[tokio::test]
    async fn forwarder_delivers_events_to_the_channel() {
        let (sender, mut receiver) = mpsc::channel(1);
        let callback = ProgressForwarder::new(sender).callback();

        callback(Progress::PhaseStart { name: "Sample 0003".into() });

        match receiver.recv().await.unwrap() {
            UiEvent::Progress(Progress::PhaseStart { name }) => assert_eq!(name, "Sample 0003"),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn run_exits_on_shutdown_signal() {
        let (manager, sender, shutdown) = UiManager::new();
        manager.mp.set_draw_target(ProgressDrawTarget::hidden());
        let handle = tokio::spawn(manager.run());
        sender.send(UiEvent::Log("before shutdown".into())).await.unwrap();
        shutdown.send(true).unwrap();
        handle.await.unwrap();
    }
}
