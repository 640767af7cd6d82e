use std::ops::{Add, AddAssign, Index, IndexMut, Neg, Sub, SubAssign};

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

/// Storage key of the call-count counter. Not a [`Metric`]: call counts are
/// tracked on their own because every column layout treats them specially.
pub const CALLS_KEY: &str = "ct";

/// A measured quantity the collector may emit for each edge.
///
/// Declaration order is the canonical column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "wt")]
    WallTime,
    #[serde(rename = "ut")]
    UserTime,
    #[serde(rename = "st")]
    SystemTime,
    #[serde(rename = "cpu")]
    CpuTime,
    #[serde(rename = "mu")]
    Memory,
    #[serde(rename = "pmu")]
    PeakMemory,
    #[serde(rename = "samples")]
    Samples,
}

impl Metric {
    pub const COUNT: usize = 7;

    /// Every known metric, in canonical order.
    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::WallTime,
        Metric::UserTime,
        Metric::SystemTime,
        Metric::CpuTime,
        Metric::Memory,
        Metric::PeakMemory,
        Metric::Samples,
    ];

    /// Key used in stored run data (`"wt"`, `"pmu"`, ...).
    pub fn key(self) -> &'static str {
        match self {
            Metric::WallTime => "wt",
            Metric::UserTime => "ut",
            Metric::SystemTime => "st",
            Metric::CpuTime => "cpu",
            Metric::Memory => "mu",
            Metric::PeakMemory => "pmu",
            Metric::Samples => "samples",
        }
    }

    pub fn from_key(key: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.key() == key)
    }

    /// Short label used to build percentage column names (`IWall%`).
    pub fn label(self) -> &'static str {
        match self {
            Metric::WallTime => "Wall",
            Metric::UserTime => "User",
            Metric::SystemTime => "Sys",
            Metric::CpuTime => "Cpu",
            Metric::Memory => "MUse",
            Metric::PeakMemory => "PMUse",
            Metric::Samples => "Samples",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::WallTime | Metric::UserTime | Metric::SystemTime | Metric::CpuTime => {
                "microsecs"
            }
            Metric::Memory | Metric::PeakMemory => "bytes",
            Metric::Samples => "samples",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Metric::WallTime => "walltime",
            Metric::UserTime => "user cpu time",
            Metric::SystemTime => "system cpu time",
            Metric::CpuTime => "cpu time",
            Metric::Memory => "memory usage",
            Metric::PeakMemory => "peak memory usage",
            Metric::Samples => "cpu time",
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// The subset of metrics present in one run, plus whether call counts are.
///
/// Resolved once per run and then used for every row and column, so two
/// rows of the same report always have the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricSet {
    mask: u8,
    calls: bool,
}

impl MetricSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every metric and call counts.
    pub fn all() -> Self {
        Metric::ALL
            .into_iter()
            .fold(Self::empty().with_calls(), MetricSet::with)
    }

    #[must_use]
    pub fn with(mut self, metric: Metric) -> Self {
        self.mask |= 1 << metric.index();
        self
    }

    #[must_use]
    pub fn with_calls(mut self) -> Self {
        self.calls = true;
        self
    }

    pub fn contains(&self, metric: Metric) -> bool {
        self.mask & (1 << metric.index()) != 0
    }

    /// Whether the run carries call counts (`ct`).
    pub fn has_calls(&self) -> bool {
        self.calls
    }

    /// Present metrics in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Metric> + '_ {
        Metric::ALL.into_iter().filter(|m| self.contains(*m))
    }

    pub fn len(&self) -> usize {
        self.mask.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }
}

impl Serialize for MetricSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let metrics: Vec<Metric> = self.iter().collect();
        let mut state = serializer.serialize_struct("MetricSet", 2)?;
        state.serialize_field("calls", &self.calls)?;
        state.serialize_field("metrics", &metrics)?;
        state.end()
    }
}

/// One value per known metric. Metrics absent from a run read as zero.
///
/// Writing a metric marks it as carried; sums keep every metric either side
/// carried. Only carried metrics are serialized, so a wall-time-only run
/// never shows memory columns in JSON output.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricValues {
    values: [f64; Metric::COUNT],
    carried: u8,
}

impl MetricValues {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Multiply every value by `factor`.
    #[must_use]
    pub fn scaled(mut self, factor: f64) -> Self {
        for v in &mut self.values {
            *v *= factor;
        }
        self
    }

    /// Drop every metric outside `metrics`.
    #[must_use]
    pub fn restricted(mut self, metrics: &MetricSet) -> Self {
        for metric in Metric::ALL {
            if !metrics.contains(metric) {
                self.values[metric.index()] = 0.0;
            }
        }
        self.carried &= metrics.mask;
        self
    }

    pub fn carries(&self, metric: Metric) -> bool {
        self.carried & (1 << metric.index()) != 0
    }

    /// Carried metrics and their values, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL
            .into_iter()
            .filter(|m| self.carries(*m))
            .map(|m| (m, self.values[m.index()]))
    }
}

impl PartialEq for MetricValues {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Index<Metric> for MetricValues {
    type Output = f64;

    fn index(&self, metric: Metric) -> &f64 {
        &self.values[metric.index()]
    }
}

impl IndexMut<Metric> for MetricValues {
    fn index_mut(&mut self, metric: Metric) -> &mut f64 {
        self.carried |= 1 << metric.index();
        &mut self.values[metric.index()]
    }
}

impl AddAssign for MetricValues {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.values.iter_mut().zip(rhs.values) {
            *a += b;
        }
        self.carried |= rhs.carried;
    }
}

impl SubAssign for MetricValues {
    fn sub_assign(&mut self, rhs: Self) {
        for (a, b) in self.values.iter_mut().zip(rhs.values) {
            *a -= b;
        }
        self.carried |= rhs.carried;
    }
}

impl Add for MetricValues {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl Sub for MetricValues {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self {
        self -= rhs;
        self
    }
}

impl Neg for MetricValues {
    type Output = Self;

    fn neg(self) -> Self {
        self.scaled(-1.0)
    }
}

impl Serialize for MetricValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.carried.count_ones() as usize))?;
        for (metric, value) in self.iter() {
            map.serialize_entry(metric.key(), &value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(Metric::from_key(metric.key()), Some(metric));
        }
        assert_eq!(Metric::from_key("ct"), None);
        assert_eq!(Metric::from_key("excl_wt"), None);
    }

    #[test]
    fn set_iterates_in_canonical_order() {
        let set = MetricSet::empty()
            .with(Metric::PeakMemory)
            .with(Metric::WallTime)
            .with(Metric::Memory);
        let order: Vec<_> = set.iter().collect();
        assert_eq!(order, [Metric::WallTime, Metric::Memory, Metric::PeakMemory]);
        assert_eq!(set.len(), 3);
        assert!(!set.has_calls());
        assert!(MetricSet::all().has_calls());
        assert_eq!(MetricSet::all().len(), Metric::COUNT);
    }

    #[test]
    fn values_arithmetic() {
        let mut a = MetricValues::zero();
        a[Metric::WallTime] = 100.0;
        a[Metric::Memory] = 8.0;
        let mut b = MetricValues::zero();
        b[Metric::WallTime] = 60.0;

        let delta = b - a;
        assert_eq!(delta[Metric::WallTime], -40.0);
        assert_eq!(delta[Metric::Memory], -8.0);
        assert_eq!((-delta)[Metric::WallTime], 40.0);
        assert_eq!(a.scaled(0.5)[Metric::Memory], 4.0);
        assert!(delta.carries(Metric::Memory));
        assert!(!delta.carries(Metric::CpuTime));
    }

    #[test]
    fn values_serialize_carried_metrics_only() {
        let mut values = MetricValues::zero();
        values[Metric::WallTime] = 120.0;
        values[Metric::Samples] = 0.0;
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"{"wt":120.0,"samples":0.0}"#);

        let wall_only = MetricSet::empty().with(Metric::WallTime);
        let json = serde_json::to_string(&values.restricted(&wall_only)).unwrap();
        assert_eq!(json, r#"{"wt":120.0}"#);
    }

    #[test]
    fn set_serializes_metric_keys() {
        let set = MetricSet::empty().with_calls().with(Metric::CpuTime);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"calls":true,"metrics":["cpu"]}"#);
    }
}
