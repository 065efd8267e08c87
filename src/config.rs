use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::sim::{InitialConditions, Pose};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TaskConfig {
    /// `[x, y, z, euler_x, euler_y, euler_z]` at the start of every episode.
    pub init_pose: [f64; 6],
    pub init_velocities: [f64; 3],
    pub init_angle_velocities: [f64; 3],
    /// Episode time limit in seconds, enforced by the simulator.
    pub runtime: f64,
    pub target_pos: [f64; 3],
    /// Hand the clipped rotor commands to the simulator instead of the raw ones.
    pub enforce_action_bounds: bool,
}

impl Default for TaskConfig {
    fn default() -> Self {
        TaskConfig {
            init_pose: [25.0, 25.0, 120.0, 0.0, 0.0, 0.0],
            init_velocities: [0.0; 3],
            init_angle_velocities: [0.0; 3],
            runtime: 5.0,
            target_pos: [0.0, 0.0, 10.0],
            enforce_action_bounds: false,
        }
    }
}

impl TaskConfig {
    pub fn initial_conditions(&self) -> InitialConditions {
        InitialConditions {
            pose: Pose::from_array(self.init_pose),
            velocities: Vector3::from(self.init_velocities),
            angle_velocities: Vector3::from(self.init_angle_velocities),
            runtime: self.runtime,
        }
    }
}

/// Settings for the bundled [`ScriptedSim`](crate::sim::ScriptedSim).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SimulatorConfig {
    pub dt: f64,
    /// Up to six expressions for `x, y, z, phi, theta, psi`.
    pub trajectory: Vec<String>,
    pub lower_bounds: Option<[f64; 3]>,
    pub upper_bounds: Option<[f64; 3]>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            dt: 1.0 / 50.0,
            trajectory: Vec::new(),
            lower_bounds: None,
            upper_bounds: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct QuadcopterTaskConfig {
    #[serde(default)]
    pub task: TaskConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

impl QuadcopterTaskConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: QuadcopterTaskConfig = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml_string = serde_yaml::to_string(self)?;
        fs::write(path, yaml_string)?;
        Ok(())
    }
}
