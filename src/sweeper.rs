use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, error, info};
use rocket::{
    fairing::{Fairing, Info, Kind},
    tokio::{
        self,
        task::JoinHandle,
        time::{Duration, MissedTickBehavior},
    },
    Orbit, Rocket,
};

use crate::{config::Config, model::otp::OtpManager};

/// A task run repeatedly at a fixed period until stopped.
pub struct PeriodicTask {
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn `tick` to run once every `period`, starting one period from now.
    pub fn spawn<F>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                tick();
            }
        });
        Self { handle }
    }

    /// Stop the task, waiting for it to wind down.
    pub async fn stop(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}

/// A fairing that periodically drops expired OTPs once the server is up.
///
/// Expired records are already rejected on use; this only bounds how long
/// unclaimed ones linger in memory.
#[derive(Default)]
pub struct OtpSweeper {
    task: Mutex<Option<PeriodicTask>>,
}

#[rocket::async_trait]
impl Fairing for OtpSweeper {
    fn info(&self) -> Info {
        Info {
            name: "OTP sweeper",
            kind: Kind::Liftoff | Kind::Shutdown,
        }
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        let Some(period) = rocket.state::<Config>().and_then(Config::otp_sweep_interval) else {
            info!("OTP sweep disabled");
            return;
        };
        let Some(otp) = rocket.state::<Arc<OtpManager>>().cloned() else {
            error!("OTP sweeper started without an OTP manager");
            return;
        };

        let task = PeriodicTask::spawn(period, move || {
            let purged = otp.purge_expired();
            if purged > 0 {
                debug!("Swept {purged} expired OTPs");
            }
        });
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        info!("OTP sweep running every {}s", period.as_secs());
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            task.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[rocket::async_test]
    async fn ticks_until_stopped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let task = PeriodicTask::spawn(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        task.stop().await;
        let stopped_at = ticks.load(Ordering::SeqCst);
        assert!(stopped_at >= 2, "only {stopped_at} ticks");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stopped_at, ticks.load(Ordering::SeqCst));
    }

    #[rocket::async_test]
    async fn first_tick_waits_a_period() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let task = PeriodicTask::spawn(Duration::from_secs(60), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(0, ticks.load(Ordering::SeqCst));
        task.stop().await;
    }
}
