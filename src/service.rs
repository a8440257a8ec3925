//! # Meter Service
//!
//! Async actor around [`TripSession`]. Commands, ticks and geocode results
//! are handled one at a time inside a single task, so the session never
//! sees concurrent writers.

use std::sync::Arc;
use std::time::Duration;

use common::{LocationSample, Place};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::geocode::{GeocodeRequest, GeocodeTicket, Geocoder};
use crate::session::{MeterSnapshot, TripSession, TripSummary};

const COMMAND_BUFFER: usize = 64;

#[derive(Debug)]
pub enum Command {
    Start { departure: Option<Place>, reply: oneshot::Sender<Uuid> },
    Sample(LocationSample),
    Stop { reply: oneshot::Sender<Result<TripSummary>> },
    Reset,
}

type Geocoded = (GeocodeTicket, anyhow::Result<Place>);

/// Cloneable client for a running [`MeterService`].
#[derive(Debug, Clone)]
pub struct MeterHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<MeterSnapshot>,
}

impl MeterHandle {
    /// Starts a trip, resetting any trip in progress.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceStopped`] when the service task has ended.
    pub async fn start(&self, departure: Option<Place>) -> Result<Uuid> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Start { departure, reply }).await?;
        response.await.map_err(|_closed| Error::ServiceStopped)
    }

    /// Queues a location fix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceStopped`] when the service task has ended.
    pub async fn sample(&self, sample: LocationSample) -> Result<()> {
        self.send(Command::Sample(sample)).await
    }

    /// Stops the trip and returns its summary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveTrip`] when no trip is running and
    /// [`Error::ServiceStopped`] when the service task has ended.
    pub async fn stop(&self) -> Result<TripSummary> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Stop { reply }).await?;
        response.await.map_err(|_closed| Error::ServiceStopped)?
    }

    /// Cancels the trip without a summary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceStopped`] when the service task has ended.
    pub async fn reset(&self) -> Result<()> {
        self.send(Command::Reset).await
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> MeterSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MeterSnapshot> {
        self.snapshots.clone()
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).await.map_err(|_closed| Error::ServiceStopped)
    }
}

pub struct MeterService {
    session: TripSession,
    geocoder: Arc<dyn Geocoder>,
    tick_interval: Duration,
    commands: mpsc::Receiver<Command>,
    geocoded_tx: mpsc::UnboundedSender<Geocoded>,
    geocoded: mpsc::UnboundedReceiver<Geocoded>,
    snapshots: watch::Sender<MeterSnapshot>,
}

impl MeterService {
    /// Spawns the service on the current runtime. The task ends once every
    /// handle has been dropped.
    #[must_use]
    pub fn spawn(session: TripSession, geocoder: Arc<dyn Geocoder>, tick_interval: Duration) -> MeterHandle {
        let (commands_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (geocoded_tx, geocoded) = mpsc::unbounded_channel();
        let (snapshots, snapshots_rx) = watch::channel(session.snapshot());

        let service = Self { session, geocoder, tick_interval, commands, geocoded_tx, geocoded, snapshots };
        tokio::spawn(service.run());

        MeterHandle { commands: commands_tx, snapshots: snapshots_rx }
    }

    async fn run(mut self) {
        let mut ticker = time::interval(self.tick_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(tick_s = self.tick_interval.as_secs_f64(), "meter service started");

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    self.handle(command);
                }
                Some((ticket, result)) = self.geocoded.recv() => {
                    if self.session.on_geocode(ticket, result) {
                        self.publish();
                    }
                }
                _ = ticker.tick() => {
                    if self.session.tick().is_some() {
                        self.publish();
                    }
                }
            }
        }

        info!("meter service stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Start { departure, reply } => {
                let id = self.session.start(departure.as_ref());
                if reply.send(id).is_err() {
                    debug!(trip_id = %id, "start caller went away");
                }
            }
            Command::Sample(sample) => {
                if self.session.on_sample(&sample).is_some()
                    && let Some(request) = self.session.geocode_request()
                {
                    self.geocode(request);
                }
            }
            Command::Stop { reply } => {
                let result = self.session.stop();
                if reply.send(result).is_err() {
                    debug!("stop caller went away");
                }
            }
            Command::Reset => {
                self.session.reset();
                info!("trip reset");
            }
        }
        self.publish();
    }

    fn geocode(&self, request: GeocodeRequest) {
        let geocoder = Arc::clone(&self.geocoder);
        let results = self.geocoded_tx.clone();

        tokio::spawn(async move {
            let result = geocoder.reverse_geocode(request.latitude, request.longitude).await;
            if results.send((request.ticket, result)).is_err() {
                debug!("geocode result dropped, service stopped");
            }
        });
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.session.snapshot());
    }
}
