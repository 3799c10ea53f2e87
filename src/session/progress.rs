use crate::session::types::UploadEvent;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Integer upload percentage: `round(100 * sent / total)`, clamped to [0, 100].
pub fn percent(bytes_sent: u64, bytes_total: u64) -> u8 {
    if bytes_total == 0 {
        return 0;
    }
    let pct = (100.0 * bytes_sent as f64 / bytes_total as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Progress reporting endpoint handed to the transport.
///
/// Raw byte counts go in, deduplicated non-decreasing percent events come out
/// on the session's event channel. Updates with an unknown total are dropped.
#[derive(Clone)]
pub struct ProgressSink {
    inner: Arc<SinkInner>,
}

struct SinkInner {
    tx: mpsc::UnboundedSender<UploadEvent>,
    last_percent: Mutex<Option<u8>>,
}

impl ProgressSink {
    pub fn new(tx: mpsc::UnboundedSender<UploadEvent>) -> Self {
        Self {
            inner: Arc::new(SinkInner {
                tx,
                last_percent: Mutex::new(None),
            }),
        }
    }

    /// Report a cumulative byte count. Emits a `Progress` event only when the
    /// derived percent advances past the previously emitted one.
    pub fn report(&self, bytes_sent: u64, bytes_total: Option<u64>) {
        let Some(total) = bytes_total else {
            return;
        };
        if total == 0 {
            return;
        }

        let pct = percent(bytes_sent, total);
        let mut last = self.inner.last_percent.lock();
        if last.map_or(true, |prev| pct > prev) {
            *last = Some(pct);
            // Receiver gone means the caller dropped the handle; nothing to do.
            let _ = self.inner.tx.send(UploadEvent::Progress(pct));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_percents(rx: &mut mpsc::UnboundedReceiver<UploadEvent>) -> Vec<u8> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                UploadEvent::Progress(p) => out.push(p),
                UploadEvent::Settled(_) => panic!("sink never settles"),
            }
        }
        out
    }

    #[test]
    fn test_percent_rounds() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(50, 100), 50);
        assert_eq!(percent(100, 100), 100);
    }

    #[test]
    fn test_percent_clamps_overshoot() {
        // Transport reported more bytes than the announced total
        assert_eq!(percent(150, 100), 100);
    }

    #[test]
    fn test_percent_zero_total() {
        assert_eq!(percent(0, 0), 0);
    }

    #[test]
    fn test_sink_emits_non_decreasing_sequence() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = ProgressSink::new(tx);

        sink.report(10, Some(100));
        sink.report(50, Some(100));
        // Transport byte counters can jitter backwards; the sink must not
        sink.report(40, Some(100));
        sink.report(100, Some(100));

        assert_eq!(collect_percents(&mut rx), vec![10, 50, 100]);
    }

    #[test]
    fn test_sink_suppresses_duplicate_percent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = ProgressSink::new(tx);

        sink.report(500_000, Some(1_000_000));
        sink.report(500_001, Some(1_000_000));

        assert_eq!(collect_percents(&mut rx), vec![50]);
    }

    #[test]
    fn test_sink_silent_while_total_unknown() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = ProgressSink::new(tx);

        sink.report(1024, None);
        sink.report(2048, None);
        assert!(collect_percents(&mut rx).is_empty());

        sink.report(2048, Some(4096));
        assert_eq!(collect_percents(&mut rx), vec![50]);
    }

    #[test]
    fn test_sink_survives_dropped_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = ProgressSink::new(tx);
        drop(rx);

        sink.report(10, Some(100));
    }
}
