#[cfg(feature = "python")]
use numpy::PyArray1;
#[cfg(feature = "python")]
use pyo3::prelude::*;
#[cfg(feature = "python")]
use pyo3::types::PyDict;

use crate::reward::GoalMetrics;
use crate::sim::Pose;
use crate::EpisodePhase;

/// Scalars contributed by one physics substep: the pose and the speed proxy.
pub const SNAPSHOT_LEN: usize = Pose::LEN + 1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Snapshot {
    pub pose: Pose,
    pub speed: f64,
}

impl Snapshot {
    pub fn to_array(&self) -> [f64; SNAPSHOT_LEN] {
        let mut values = [0.0; SNAPSHOT_LEN];
        values[..Pose::LEN].copy_from_slice(&self.pose.to_array());
        values[Pose::LEN] = self.speed;
        values
    }
}

/// Flat observation: one [`Snapshot`] block per substep, concatenated.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    values: Vec<f64>,
}

impl Observation {
    pub fn from_snapshots(snapshots: &[Snapshot]) -> Self {
        let mut values = Vec::with_capacity(snapshots.len() * SNAPSHOT_LEN);
        for snapshot in snapshots {
            values.extend_from_slice(&snapshot.to_array());
        }
        Observation { values }
    }

    /// The same snapshot `times` over, as produced before any motion.
    pub fn repeated(snapshot: Snapshot, times: usize) -> Self {
        Observation {
            values: snapshot.to_array().repeat(times),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    /// Per-substep blocks of [`SNAPSHOT_LEN`] scalars.
    pub fn blocks(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(SNAPSHOT_LEN)
    }

    #[cfg(feature = "python")]
    pub fn to_numpy<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_slice(py, &self.values)
    }
}

/// Episode bookkeeping exposed for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Information {
    pub metrics: GoalMetrics,
    pub init_metrics: GoalMetrics,
    pub speed: f64,
    pub proximity: bool,
    pub phase: EpisodePhase,
}

impl Information {
    #[cfg(feature = "python")]
    pub fn to_py_dict(&self, py: Python) -> PyResult<Py<PyDict>> {
        let dict = PyDict::new(py);

        dict.set_item("dist", self.metrics.dist)?;
        dict.set_item("vdist", self.metrics.vdist)?;
        dict.set_item("hdist", self.metrics.hdist)?;
        dict.set_item("init_dist", self.init_metrics.dist)?;
        dict.set_item("init_vdist", self.init_metrics.vdist)?;
        dict.set_item("init_hdist", self.init_metrics.hdist)?;
        dict.set_item("speed", self.speed)?;
        dict.set_item("proximity", self.proximity)?;
        dict.set_item("phase", self.phase.as_str())?;

        Ok(dict.unbind())
    }
}
