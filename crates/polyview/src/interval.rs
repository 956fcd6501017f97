/// Fires at most once per `period` seconds of frame time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    period: f64,
    next: Option<f64>,
}

impl Interval {
    pub fn new(period: f64) -> Self {
        Self { period, next: None }
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    /// Returns true when the interval has elapsed. The first call only
    /// starts the clock.
    pub fn tick(&mut self, now: f64) -> bool {
        match self.next {
            None => {
                self.next = Some(now + self.period);
                false
            }
            Some(next) if now >= next => {
                self.next = Some(now + self.period);
                true
            }
            Some(_) => false,
        }
    }

    pub fn reset(&mut self) {
        self.next = None;
    }
}
