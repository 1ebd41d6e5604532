//! Capture loop: packet source → decode → feature extraction → sink.
//!
//! Packets are handled strictly in arrival order. A packet that cannot be
//! decoded or persisted is logged, counted and skipped; only a failure of
//! the source itself ends the session early.

use crate::collectors::{decode_frame, open_source, CapturedPacket, PacketSource, SourceEvent};
use crate::config::{OutputMode, SnifferConfig};
use crate::error::{CaptureError, PacketError};
use crate::features::{FeatureExtractor, FieldValue};
use crate::storage::{FeatureSink, LogSink, RecordSink};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

/// Cooperative stop request, checked between packets.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What happened to one packet.
#[derive(Debug)]
pub enum PacketOutcome {
    Forwarded,
    Skipped(PacketError),
}

/// Counters for one capture session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    /// Packets pulled from the source
    pub observed: u64,
    /// Feature records accepted by the sink
    pub forwarded: u64,
    /// Frames that could not be decoded
    pub skipped_malformed: u64,
    /// Records the sink refused (I/O trouble, likely to repeat)
    pub skipped_sink: u64,
    /// Session ended on a stop request
    pub stopped: bool,
}

impl SessionReport {
    fn record(&mut self, outcome: PacketOutcome) {
        match outcome {
            PacketOutcome::Forwarded => self.forwarded += 1,
            PacketOutcome::Skipped(e @ PacketError::Sink(_)) => {
                self.skipped_sink += 1;
                error!(kind = e.kind(), packet = self.observed, error = %e, "feature record not persisted");
            }
            PacketOutcome::Skipped(e) => {
                self.skipped_malformed += 1;
                warn!(kind = e.kind(), packet = self.observed, error = %e, "packet skipped");
            }
        }
    }
}

/// Inter-arrival time between consecutive packets of one session.
#[derive(Debug, Default)]
struct ArrivalClock {
    prev: Option<DateTime<Utc>>,
}

impl ArrivalClock {
    /// Seconds since the previous packet; 0 for the first.
    fn tick(&mut self, now: DateTime<Utc>) -> f64 {
        let elapsed = self.prev.map(|prev| {
            let d = now - prev;
            d.num_nanoseconds()
                .map(|ns| ns as f64 / 1e9)
                .unwrap_or_else(|| d.num_milliseconds() as f64 / 1e3)
        });
        self.prev = Some(now);
        elapsed.unwrap_or(0.0)
    }
}

fn limit_reached(count: u64, packet_limit: usize) -> bool {
    packet_limit > 0 && count >= packet_limit as u64
}

enum Feed {
    Packet(CapturedPacket),
    Fatal(CaptureError),
}

pub struct PacketSniffer<K: RecordSink> {
    extractor: FeatureExtractor,
    sink: K,
    stop: StopHandle,
}

impl<K: RecordSink> PacketSniffer<K> {
    pub fn new(sink: K) -> Self {
        Self::with_stop(sink, StopHandle::new())
    }

    pub fn with_stop(sink: K, stop: StopHandle) -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            sink,
            stop,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Decode, extract and forward a single packet.
    pub fn process(&mut self, packet: &CapturedPacket, inter_arrival: f64) -> PacketOutcome {
        match self.forward(packet, inter_arrival) {
            Ok(()) => PacketOutcome::Forwarded,
            Err(e) => PacketOutcome::Skipped(e),
        }
    }

    fn forward(&mut self, packet: &CapturedPacket, inter_arrival: f64) -> Result<(), PacketError> {
        let mut raw = decode_frame(packet)?;
        raw.inter_arrival_time = Some(FieldValue::Float(inter_arrival));
        let features = self.extractor.extract(&raw);
        self.sink.accept(&features)?;
        Ok(())
    }

    /// Pull up to `packet_limit` packets (0 = no limit) from `source` on the
    /// calling thread.
    pub fn run<P: PacketSource + ?Sized>(
        &mut self,
        source: &mut P,
        packet_limit: usize,
    ) -> Result<SessionReport, CaptureError> {
        let span = info_span!("capture_session", session = %Uuid::new_v4());
        let _guard = span.enter();
        info!(packet_limit, "capture session started");

        let mut clock = ArrivalClock::default();
        let mut report = SessionReport::default();
        loop {
            if self.stop.is_stopped() {
                report.stopped = true;
                break;
            }
            if limit_reached(report.observed, packet_limit) {
                break;
            }
            let event = source.next_event().map_err(|e| {
                error!(observed = report.observed, error = %e, "packet source failed");
                e
            })?;
            match event {
                SourceEvent::Packet(packet) => {
                    report.observed += 1;
                    let inter_arrival = clock.tick(packet.timestamp);
                    let outcome = self.process(&packet, inter_arrival);
                    report.record(outcome);
                }
                SourceEvent::Idle => continue,
                SourceEvent::Exhausted => {
                    info!("packet source exhausted");
                    break;
                }
            }
        }

        info!(
            observed = report.observed,
            forwarded = report.forwarded,
            skipped_malformed = report.skipped_malformed,
            skipped_sink = report.skipped_sink,
            stopped = report.stopped,
            "capture session finished"
        );
        Ok(report)
    }

    /// Like [`run`](Self::run), but the source is read on a dedicated thread
    /// feeding a bounded queue; decoding and persistence stay on the calling
    /// thread, in FIFO order.
    pub fn run_threaded<P: PacketSource + Send>(
        &mut self,
        source: P,
        packet_limit: usize,
        queue_capacity: usize,
    ) -> Result<SessionReport, CaptureError> {
        let span = info_span!("capture_session", session = %Uuid::new_v4());
        let _guard = span.enter();
        info!(packet_limit, queue_capacity, "capture session started (threaded)");

        let (tx, mut rx) = mpsc::channel::<Feed>(queue_capacity.max(1));
        let producer_stop = self.stop.clone();

        let (mut report, fatal) = std::thread::scope(|scope| {
            let producer = scope.spawn(move || pump(source, tx, producer_stop, packet_limit));

            let mut clock = ArrivalClock::default();
            let mut report = SessionReport::default();
            let mut fatal = None;
            while let Some(feed) = rx.blocking_recv() {
                if self.stop.is_stopped() {
                    report.stopped = true;
                    break;
                }
                match feed {
                    Feed::Packet(packet) => {
                        report.observed += 1;
                        let inter_arrival = clock.tick(packet.timestamp);
                        let outcome = self.process(&packet, inter_arrival);
                        report.record(outcome);
                    }
                    Feed::Fatal(e) => {
                        error!(observed = report.observed, error = %e, "packet source failed");
                        fatal = Some(e);
                        break;
                    }
                }
            }
            // Unblocks the producer if we left early.
            drop(rx);
            match producer.join() {
                Ok(stopped) => {
                    report.stopped |= stopped;
                    (report, fatal)
                }
                Err(_) => (report, Some(CaptureError::Worker)),
            }
        });

        if let Some(e) = fatal {
            return Err(e);
        }
        report.stopped |= self.stop.is_stopped();
        info!(
            observed = report.observed,
            forwarded = report.forwarded,
            skipped_malformed = report.skipped_malformed,
            skipped_sink = report.skipped_sink,
            stopped = report.stopped,
            "capture session finished"
        );
        Ok(report)
    }
}

/// Capture-thread side of [`PacketSniffer::run_threaded`]. Returns whether
/// it ended on a stop request.
fn pump<P: PacketSource>(mut source: P, tx: mpsc::Sender<Feed>, stop: StopHandle, packet_limit: usize) -> bool {
    let mut sent: u64 = 0;
    loop {
        if stop.is_stopped() {
            return true;
        }
        if limit_reached(sent, packet_limit) {
            return false;
        }
        match source.next_event() {
            Ok(SourceEvent::Packet(packet)) => {
                if tx.blocking_send(Feed::Packet(packet)).is_err() {
                    return false;
                }
                sent += 1;
            }
            Ok(SourceEvent::Idle) => continue,
            Ok(SourceEvent::Exhausted) => {
                info!("packet source exhausted");
                return false;
            }
            Err(e) => {
                let _ = tx.blocking_send(Feed::Fatal(e));
                return false;
            }
        }
    }
}

/// Build the configured sink and source and run one session to completion.
pub fn run_configured(config: &SnifferConfig, stop: StopHandle) -> Result<SessionReport, CaptureError> {
    let sink: Box<dyn RecordSink> = match config.output.mode {
        OutputMode::Csv => {
            let sink = FeatureSink::with_columns(&config.output.path, config.output.columns.iter().cloned())?;
            info!(path = %sink.path().display(), header_present = sink.header_written(), "csv sink ready");
            Box::new(sink)
        }
        OutputMode::Log => Box::new(LogSink::stdout()),
    };
    let mut sniffer = PacketSniffer::with_stop(sink, stop);
    let source = open_source(config)?;

    if config.capture.queue_capacity > 0 {
        sniffer.run_threaded(source, config.packet_limit, config.capture.queue_capacity)
    } else {
        let mut source = source;
        sniffer.run(&mut source, config.packet_limit)
    }
}
