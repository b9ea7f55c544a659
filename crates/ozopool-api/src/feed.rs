// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Polling telemetry feed. One subscription owns one worker thread that
//! re-fetches the device detail on an interval and hands updates over a
//! channel. Dropping the subscription stops the worker; nothing keeps
//! polling for a screen nobody is looking at.

use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ozopool_app::{DeviceId, Session};

use crate::{Client, DeviceDetail};

// Upper bound on how long a drop waits for the worker to notice.
const STOP_POLL_SLICE: Duration = Duration::from_millis(50);

pub struct TelemetrySubscription {
    updates: Receiver<Result<DeviceDetail>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

pub fn subscribe(
    client: Client,
    session: Session,
    device_id: DeviceId,
    interval: Duration,
) -> TelemetrySubscription {
    let stop = Arc::new(AtomicBool::new(false));
    let (tx, rx) = channel();

    let worker_stop = Arc::clone(&stop);
    let worker = thread::spawn(move || {
        poll_loop(&client, &session, &device_id, interval, &worker_stop, &tx);
    });

    TelemetrySubscription {
        updates: rx,
        stop,
        worker: Some(worker),
    }
}

fn poll_loop(
    client: &Client,
    session: &Session,
    device_id: &DeviceId,
    interval: Duration,
    stop: &AtomicBool,
    tx: &Sender<Result<DeviceDetail>>,
) {
    loop {
        if stop.load(Ordering::Relaxed) {
            return;
        }
        let update = client.device_detail(session, device_id);
        if tx.send(update).is_err() {
            // Receiver gone; the subscription was dropped mid-fetch.
            return;
        }

        let mut waited = Duration::ZERO;
        while waited < interval {
            if stop.load(Ordering::Relaxed) {
                return;
            }
            let slice = STOP_POLL_SLICE.min(interval - waited);
            thread::sleep(slice);
            waited += slice;
        }
    }
}

impl TelemetrySubscription {
    /// Most recent update, if the worker produced any since the last
    /// call. Intermediate updates are skipped; only the newest matters.
    pub fn latest(&self) -> Option<Result<DeviceDetail>> {
        let mut newest = None;
        loop {
            match self.updates.try_recv() {
                Ok(update) => newest = Some(update),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return newest,
            }
        }
    }

    /// Blocks until the next update arrives. Test and demo helper; the
    /// interactive loop uses `latest`.
    pub fn recv(&self) -> Option<Result<DeviceDetail>> {
        self.updates.recv().ok()
    }

    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for TelemetrySubscription {
    fn drop(&mut self) {
        self.shutdown();
    }
}
