//! Controllable wall clock for integration testing.
//!
//! The current instant lives behind a shared handle so test code can move
//! time while the session owns the clock.

use chrono::{DateTime, Duration, Local, TimeZone};
use std::sync::{Arc, Mutex};

use bidfeed::engine::Clock;

#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Local>>>,
}

impl ManualClock {
    /// A clock pinned at the given local time of day.
    pub fn at(hour: u32, min: u32, sec: u32) -> Self {
        let start = Local
            .with_ymd_and_hms(2026, 10, 17, hour, min, sec)
            .single()
            .expect("unambiguous local time");
        Self { now: Arc::new(Mutex::new(start)) }
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now = *now + Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }
}
