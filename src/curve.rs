//! Height remap curves
//!
//! A `HeightCurve` is an editable list of Hermite keyframes. Generation never
//! reads it directly: it takes a `CurveSnapshot`, an immutable shared copy of
//! the keys, so a curve being edited elsewhere can't change under a
//! synthesis that is already running.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A single control point with incoming/outgoing slopes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    /// Flat keyframe (both tangents zero).
    pub fn new(time: f32, value: f32) -> Self {
        Self { time, value, in_tangent: 0.0, out_tangent: 0.0 }
    }

    pub fn with_tangents(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self { time, value, in_tangent, out_tangent }
    }
}

/// Editable remap curve. Keys are kept sorted by time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct HeightCurve {
    keys: Vec<Keyframe>,
}

impl From<Vec<Keyframe>> for HeightCurve {
    fn from(keys: Vec<Keyframe>) -> Self {
        Self::new(keys)
    }
}

impl From<HeightCurve> for Vec<Keyframe> {
    fn from(curve: HeightCurve) -> Self {
        curve.keys
    }
}

impl HeightCurve {
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// Straight line from `(t0, v0)` to `(t1, v1)`.
    pub fn linear(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        if t0 == t1 {
            return Self::new(vec![Keyframe::new(t0, v0)]);
        }
        let slope = (v1 - v0) / (t1 - t0);
        Self::new(vec![
            Keyframe::with_tangents(t0, v0, 0.0, slope),
            Keyframe::with_tangents(t1, v1, slope, 0.0),
        ])
    }

    /// `f(t) = t` on `[0, 1]`.
    pub fn identity() -> Self {
        Self::linear(0.0, 0.0, 1.0, 1.0)
    }

    pub fn constant(value: f32) -> Self {
        Self::new(vec![Keyframe::new(0.0, value), Keyframe::new(1.0, value)])
    }

    /// S-curve with flat tangents at both ends.
    pub fn ease_in_out(t0: f32, v0: f32, t1: f32, v1: f32) -> Self {
        Self::new(vec![Keyframe::new(t0, v0), Keyframe::new(t1, v1)])
    }

    /// Insert a key, keeping time order. Returns its index.
    pub fn add_key(&mut self, key: Keyframe) -> usize {
        let idx = self.keys.partition_point(|k| k.time <= key.time);
        self.keys.insert(idx, key);
        idx
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        evaluate_keys(&self.keys, t)
    }

    /// Freeze the current keys into a shareable, immutable copy.
    pub fn snapshot(&self) -> CurveSnapshot {
        CurveSnapshot {
            keys: Arc::from(self.keys.as_slice()),
        }
    }
}

/// Frozen copy of a curve's keys. Cheap to clone and safe to evaluate from
/// any number of threads.
#[derive(Clone, Debug)]
pub struct CurveSnapshot {
    keys: Arc<[Keyframe]>,
}

impl CurveSnapshot {
    pub fn evaluate(&self, t: f32) -> f32 {
        evaluate_keys(&self.keys, t)
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }
}

/// Cubic Hermite evaluation, clamped to the end keys outside their range.
fn evaluate_keys(keys: &[Keyframe], t: f32) -> f32 {
    let (first, last) = match (keys.first(), keys.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return 0.0,
    };
    if t <= first.time {
        return first.value;
    }
    if t >= last.time {
        return last.value;
    }

    // first.time < t < last.time, so 1 <= idx < keys.len()
    let idx = keys.partition_point(|k| k.time <= t);
    let k0 = &keys[idx - 1];
    let k1 = &keys[idx];

    let dt = k1.time - k0.time;
    if dt <= 0.0 {
        return k1.value;
    }
    let s = (t - k0.time) / dt;
    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    h00 * k0.value + h10 * k0.out_tangent * dt + h01 * k1.value + h11 * k1.in_tangent * dt
}
