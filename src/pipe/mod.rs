mod detect;
mod latency;
mod progress;

pub use detect::{Detection, Detector};
pub use latency::{Latency, latency};
pub use progress::{Progress, progress};
