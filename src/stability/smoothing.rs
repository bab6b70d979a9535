use std::collections::VecDeque;

use crate::types::PoseMeasurement;

/// Rolling window of one dimension's recent values.
#[derive(Debug, Clone)]
struct Window {
    values: VecDeque<f64>,
    capacity: usize,
}

impl Window {
    fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Median; the mean of the two middle values for an even count.
    fn median(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = self.values.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// Per-dimension median over the last `window_size` measurements.
///
/// A dimension missing from a frame is not pushed and comes out missing for
/// that frame, so smoothing never invents a measurement. A window of 1 passes
/// values through unchanged.
#[derive(Debug, Clone)]
pub struct SmoothingFilter {
    pitch: Window,
    yaw: Window,
    roll: Window,
    distance: Window,
    shoulder_tilt: Window,
}

impl SmoothingFilter {
    pub fn new(window_size: usize) -> Self {
        let size = window_size.max(1);
        Self {
            pitch: Window::new(size),
            yaw: Window::new(size),
            roll: Window::new(size),
            distance: Window::new(size),
            shoulder_tilt: Window::new(size),
        }
    }

    pub fn window_size(&self) -> usize {
        self.pitch.capacity
    }

    pub fn smooth(&mut self, m: &PoseMeasurement) -> PoseMeasurement {
        fn step(window: &mut Window, value: Option<f64>) -> Option<f64> {
            let value = value?;
            window.push(value);
            window.median()
        }

        PoseMeasurement {
            pitch: step(&mut self.pitch, m.pitch),
            yaw: step(&mut self.yaw, m.yaw),
            roll: step(&mut self.roll, m.roll),
            distance: step(&mut self.distance, m.distance),
            shoulder_tilt: step(&mut self.shoulder_tilt, m.shoulder_tilt),
        }
    }

    pub fn reset(&mut self) {
        self.pitch.clear();
        self.yaw.clear();
        self.roll.clear();
        self.distance.clear();
        self.shoulder_tilt.clear();
    }
}
