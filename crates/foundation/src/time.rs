/// Host clock reading in seconds. Only differences are meaningful.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64);

impl Time {
    pub fn after(self, seconds: f64) -> Time {
        Time(self.0 + seconds)
    }

    pub fn since(self, earlier: Time) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }

    pub fn is_at_or_after(self, deadline: Time) -> bool {
        self.0 >= deadline.0
    }
}
