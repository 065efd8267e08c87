use numpy::PyArray1;
use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::sim::{PhysicsSim, PyPhysicsSim};
use crate::{rotor_command, Task, TaskConfig, TaskError, ACTION_SIZE};

type DynSim = Box<dyn PhysicsSim + Send + Sync>;

impl From<TaskError> for PyErr {
    fn from(err: TaskError) -> PyErr {
        match err {
            TaskError::Io(_) => PyIOError::new_err(err.to_string()),
            TaskError::Simulator(_) => PyRuntimeError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

#[pyclass(name = "Task")]
struct TaskWrapper {
    task: Task<DynSim>,
}

#[pymethods]
impl TaskWrapper {
    /// `sim_factory(init_pose, init_velocities, init_angle_velocities, runtime)`
    /// must return the simulator object the task drives.
    #[new]
    #[pyo3(signature = (
        sim_factory,
        init_pose=None,
        init_velocities=None,
        init_angle_velocities=None,
        runtime=5.0,
        target_pos=None,
        enforce_action_bounds=false
    ))]
    fn new(
        sim_factory: &Bound<'_, PyAny>,
        init_pose: Option<[f64; 6]>,
        init_velocities: Option<[f64; 3]>,
        init_angle_velocities: Option<[f64; 3]>,
        runtime: f64,
        target_pos: Option<[f64; 3]>,
        enforce_action_bounds: bool,
    ) -> PyResult<Self> {
        let defaults = TaskConfig::default();
        let config = TaskConfig {
            init_pose: init_pose.unwrap_or(defaults.init_pose),
            init_velocities: init_velocities.unwrap_or(defaults.init_velocities),
            init_angle_velocities: init_angle_velocities.unwrap_or(defaults.init_angle_velocities),
            runtime,
            target_pos: target_pos.unwrap_or(defaults.target_pos),
            enforce_action_bounds,
        };

        let task = Task::new(&config, |initial| {
            let sim = sim_factory
                .call1((
                    initial.pose.to_array().to_vec(),
                    initial.velocities.as_slice().to_vec(),
                    initial.angle_velocities.as_slice().to_vec(),
                    initial.runtime,
                ))
                .map_err(|e| TaskError::simulator(format!("sim_factory: {e}")))?;
            Ok(Box::new(PyPhysicsSim::new(sim.unbind())) as DynSim)
        })?;

        Ok(TaskWrapper { task })
    }

    #[classmethod]
    fn from_yaml_config(
        _cls: &Bound<'_, pyo3::types::PyType>,
        config_path: String,
    ) -> PyResult<Self> {
        let config = crate::QuadcopterTaskConfig::from_yaml_file(config_path)?;
        let task = Task::new(&config.task, |initial| {
            let sim = crate::sim::ScriptedSim::new(initial, &config.simulator)?;
            Ok(Box::new(sim) as DynSim)
        })?;
        Ok(TaskWrapper { task })
    }

    fn reset<'py>(&mut self, py: Python<'py>) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let observation = self.task.reset()?;
        Ok(observation.to_numpy(py))
    }

    /// Returns `(observation, reward, done)`.
    fn step<'py>(
        &mut self,
        py: Python<'py>,
        action: Vec<f64>,
    ) -> PyResult<(Bound<'py, PyArray1<f64>>, f64, bool)> {
        let transition = self.task.step(&rotor_command(&action)?)?;
        Ok((
            transition.observation.to_numpy(py),
            transition.reward,
            transition.done,
        ))
    }

    fn get_reward(&mut self) -> PyResult<f64> {
        Ok(self.task.get_reward()?)
    }

    fn new_target(&mut self, target_pos: [f64; 3]) {
        self.task.new_target(target_pos);
    }

    fn clip<'py>(&self, py: Python<'py>, action: Vec<f64>) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let clipped = self.task.clip(&rotor_command(&action)?);
        Ok(PyArray1::from_slice(py, &clipped))
    }

    fn get_information(&self) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| self.task.get_information().to_py_dict(py))
    }

    #[getter]
    fn state_size(&self) -> usize {
        self.task.state_size()
    }

    #[getter]
    fn action_size(&self) -> usize {
        ACTION_SIZE
    }

    #[getter]
    fn action_low(&self) -> f64 {
        self.task.action_low()
    }

    #[getter]
    fn action_high(&self) -> f64 {
        self.task.action_high()
    }

    #[getter]
    fn action_repeat(&self) -> usize {
        self.task.action_repeat()
    }

    #[getter]
    fn target_pos(&self) -> [f64; 3] {
        self.task.target_pos().into()
    }

    #[getter]
    fn speed(&self) -> f64 {
        self.task.speed()
    }

    #[getter]
    fn proximity(&self) -> bool {
        self.task.proximity()
    }
}

// Python module definition
#[pymodule]
#[pyo3(name = "_lib")]
fn quadcopter_task(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<TaskWrapper>()?;
    Ok(())
}
