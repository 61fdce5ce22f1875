use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

enum Level {
    Info,
    Warn,
    Error,
}

struct LogLine {
    level: Level,
    msg: String,
}

/// Logger that never blocks the tick loop: lines go through a bounded
/// channel to a background task and are dropped when the channel is full.
pub struct BufferedLogger {
    sender: mpsc::Sender<LogLine>,
    dropped: Arc<AtomicU64>,
}

impl BufferedLogger {
    fn push(&self, level: Level, msg: &str) {
        let line = LogLine {
            level,
            msg: msg.to_string(),
        };
        if self.sender.try_send(line).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Lines lost because the channel was full or the drain task had ended.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl DomainLogger for BufferedLogger {
    fn info(&self, msg: &str) {
        self.push(Level::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(Level::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(Level::Error, msg);
    }
}

/// Spawns the drain task on the current tokio runtime and returns the
/// logger. `capacity` is the channel size.
pub fn init_buffered_logger(target: DynLogger, capacity: usize) -> Arc<BufferedLogger> {
    let (sender, mut receiver) = mpsc::channel::<LogLine>(capacity.max(1));

    tokio::spawn(async move {
        while let Some(line) = receiver.recv().await {
            match line.level {
                Level::Info => target.info(&line.msg),
                Level::Warn => target.warn(&line.msg),
                Level::Error => target.error(&line.msg),
            }
        }
    });

    Arc::new(BufferedLogger {
        sender,
        dropped: Arc::new(AtomicU64::new(0)),
    })
}
