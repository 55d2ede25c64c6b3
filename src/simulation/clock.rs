use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior, interval};

/// Paces the main loop to a framerate that may change between frames.
pub struct FrameClock {
    framerate: u32,
    ticker: Interval,
}

impl FrameClock {
    /// Must be called from within a tokio runtime.
    pub fn new(framerate: u32) -> Self {
        let framerate = framerate.max(1);
        Self {
            framerate,
            ticker: Self::ticker(framerate),
        }
    }

    fn ticker(framerate: u32) -> Interval {
        let mut ticker = interval(Self::period(framerate));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    pub fn period(framerate: u32) -> Duration {
        Duration::from_secs_f64(1.0 / framerate.max(1) as f64)
    }

    pub fn framerate(&self) -> u32 {
        self.framerate
    }

    pub fn set_framerate(&mut self, framerate: u32) {
        let framerate = framerate.max(1);
        if framerate != self.framerate {
            self.framerate = framerate;
            self.ticker = Self::ticker(framerate);
        }
    }

    pub async fn tick(&mut self) {
        self.ticker.tick().await;
    }
}
