use nalgebra::Vector3;
use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;

use crate::error::{Result, TaskError};
use crate::sim::pose::{vector3_from_slice, Pose};
use crate::sim::PhysicsSim;
use crate::ACTION_SIZE;

/// Adapter for a simulator implemented in Python.
///
/// The object must expose `pose` and `v` (sequences or numpy arrays),
/// `next_timestep(rotor_speeds)` returning a truthy `done`, and `reset()`.
pub struct PyPhysicsSim {
    inner: Py<PyAny>,
}

impl PyPhysicsSim {
    pub fn new(inner: Py<PyAny>) -> Self {
        PyPhysicsSim { inner }
    }

    fn read_attr(&self, name: &str) -> Result<Vec<f64>> {
        Python::with_gil(|py| {
            let value = self.inner.bind(py).getattr(name)?;
            read_vector(&value)
        })
        .map_err(|e| TaskError::simulator(format!("reading {name}: {e}")))
    }
}

fn read_vector(value: &Bound<'_, PyAny>) -> PyResult<Vec<f64>> {
    if let Ok(array) = value.extract::<PyReadonlyArray1<'_, f64>>() {
        return Ok(array.as_array().iter().copied().collect());
    }
    value.extract::<Vec<f64>>()
}

impl PhysicsSim for PyPhysicsSim {
    fn pose(&self) -> Result<Pose> {
        let values = self.read_attr("pose")?;
        Pose::from_slice(&values).ok_or_else(|| {
            TaskError::simulator(format!(
                "pose must have {} values, got {}",
                Pose::LEN,
                values.len()
            ))
        })
    }

    fn velocities(&self) -> Result<Vector3<f64>> {
        let values = self.read_attr("v")?;
        vector3_from_slice(&values).ok_or_else(|| {
            TaskError::simulator(format!("velocity must have 3 values, got {}", values.len()))
        })
    }

    fn next_timestep(&mut self, rotor_speeds: &[f64; ACTION_SIZE]) -> Result<bool> {
        Python::with_gil(|py| {
            let commands = PyArray1::from_slice(py, rotor_speeds);
            self.inner
                .bind(py)
                .call_method1("next_timestep", (commands,))?
                .is_truthy()
        })
        .map_err(|e| TaskError::simulator(format!("next_timestep: {e}")))
    }

    fn reset(&mut self) -> Result<()> {
        Python::with_gil(|py| self.inner.bind(py).call_method0("reset").map(|_| ()))
            .map_err(|e| TaskError::simulator(format!("reset: {e}")))
    }
}
