mod config;
mod error;
mod observation;
#[cfg(feature = "python")]
mod python;
pub mod reward;
pub mod sim;

use std::path::Path;

use nalgebra::Vector3;
use tracing::{debug, info, trace, warn};

pub use config::{QuadcopterTaskConfig, SimulatorConfig, TaskConfig};
pub use error::{Result, TaskError};
pub use observation::{Information, Observation, Snapshot, SNAPSHOT_LEN};
use reward::{GoalMetrics, PROXIMITY_THRESHOLD};
use sim::{InitialConditions, PhysicsSim, Pose, ScriptedSim};

/// Physics substeps per call to [`Task::step`].
pub const ACTION_REPEAT: usize = 3;
/// Number of rotors.
pub const ACTION_SIZE: usize = 4;
pub const ACTION_LOW: f64 = 0.0;
pub const ACTION_HIGH: f64 = 900.0;
/// Length of every observation.
pub const STATE_SIZE: usize = ACTION_REPEAT * SNAPSHOT_LEN;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpisodePhase {
    /// Constructed, `reset` not called yet.
    AwaitingReset,
    Active,
    /// The simulator reported the end of the episode.
    Terminated,
}

impl EpisodePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodePhase::AwaitingReset => "awaiting_reset",
            EpisodePhase::Active => "active",
            EpisodePhase::Terminated => "terminated",
        }
    }
}

/// Outcome of one [`Task::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub observation: Observation,
    /// Sum of the per-substep shaped rewards.
    pub reward: f64,
    /// `done` as reported by the final substep.
    pub done: bool,
}

/// Landing task: turns a quadcopter simulator into a reset/step environment
/// with a shaped reward for descending onto the target altitude.
pub struct Task<S: PhysicsSim> {
    sim: S,
    init_pose: Pose,
    target_pos: Vector3<f64>,
    action_repeat: usize,
    enforce_action_bounds: bool,
    rotor_speeds: [f64; ACTION_SIZE],
    metrics: GoalMetrics,
    last_metrics: GoalMetrics,
    init_metrics: GoalMetrics,
    speed: f64,
    proximity: bool,
    phase: EpisodePhase,
}

impl<S: PhysicsSim> Task<S> {
    /// Builds the simulator from the configured initial conditions and
    /// captures the initial goal metrics.
    pub fn new<F>(config: &TaskConfig, build_sim: F) -> Result<Self>
    where
        F: FnOnce(&InitialConditions) -> Result<S>,
    {
        let initial = config.initial_conditions();
        let sim = build_sim(&initial)?;
        let target_pos = Vector3::from(config.target_pos);
        let init_metrics = GoalMetrics::measure(&initial.pose.position, &target_pos);
        if init_metrics.vdist == 0.0 {
            warn!(
                altitude = initial.pose.altitude(),
                "target altitude equals initial altitude, rewards will not be finite"
            );
        }

        Ok(Task {
            sim,
            init_pose: initial.pose,
            target_pos,
            action_repeat: ACTION_REPEAT,
            enforce_action_bounds: config.enforce_action_bounds,
            rotor_speeds: [0.0; ACTION_SIZE],
            metrics: init_metrics,
            last_metrics: init_metrics,
            init_metrics,
            speed: 0.0,
            proximity: false,
            phase: EpisodePhase::AwaitingReset,
        })
    }

    /// Start a new episode.
    ///
    /// The normalisation distances come from the configured initial pose, not
    /// from the simulator. The proximity latch is left as it is.
    pub fn reset(&mut self) -> Result<Observation> {
        self.sim.reset()?;

        self.init_metrics = GoalMetrics::measure(&self.init_pose.position, &self.target_pos);
        self.metrics = self.init_metrics;
        self.last_metrics = self.init_metrics;
        self.speed = 0.0;
        self.phase = EpisodePhase::Active;

        if self.init_metrics.vdist == 0.0 {
            warn!("target altitude equals initial altitude, rewards will not be finite");
        }
        info!(
            init_dist = self.init_metrics.dist,
            init_vdist = self.init_metrics.vdist,
            init_hdist = self.init_metrics.hdist,
            "episode reset"
        );

        let snapshot = Snapshot {
            pose: self.sim.pose()?,
            speed: self.speed,
        };
        Ok(Observation::repeated(snapshot, self.action_repeat))
    }

    /// Run `action_repeat` physics substeps under the given rotor commands.
    ///
    /// The clipped commands are stored; the simulator gets the raw ones unless
    /// `enforce_action_bounds` is set.
    pub fn step(&mut self, rotor_speeds: &[f64; ACTION_SIZE]) -> Result<Transition> {
        if self.phase == EpisodePhase::Terminated {
            warn!("stepping a terminated episode, call reset first");
        }

        self.rotor_speeds = self.clip(rotor_speeds);
        let command = if self.enforce_action_bounds {
            self.rotor_speeds
        } else {
            *rotor_speeds
        };

        let mut reward = 0.0;
        let mut done = false;
        let mut snapshots = Vec::with_capacity(self.action_repeat);
        for _ in 0..self.action_repeat {
            done = self.sim.next_timestep(&command)?;
            reward += self.get_reward()?;
            snapshots.push(Snapshot {
                pose: self.sim.pose()?,
                speed: self.speed,
            });
        }

        if done {
            debug!(vdist = self.metrics.vdist, "episode terminated");
            self.phase = EpisodePhase::Terminated;
        } else {
            self.phase = EpisodePhase::Active;
        }

        Ok(Transition {
            observation: Observation::from_snapshots(&snapshots),
            reward,
            done,
        })
    }

    /// Shaped reward for the simulator's current pose.
    ///
    /// Refreshes the goal metrics, the speed proxy and the proximity latch.
    pub fn get_reward(&mut self) -> Result<f64> {
        let pose = self.sim.pose()?;
        self.metrics = GoalMetrics::measure(&pose.position, &self.target_pos);
        self.speed = (self.last_metrics.vdist - self.metrics.vdist).abs();

        if !self.proximity && self.metrics.vdist < PROXIMITY_THRESHOLD {
            debug!(vdist = self.metrics.vdist, "proximity reached");
            self.proximity = true;
        }

        let reward = reward::shaped_reward(
            self.metrics.vdist,
            self.init_metrics.vdist,
            self.speed,
            self.action_repeat,
        );
        trace!(vdist = self.metrics.vdist, speed = self.speed, reward, "reward");

        self.last_metrics = self.metrics;
        Ok(reward)
    }

    /// Move the goal. The normalisation distances stay until the next reset.
    pub fn new_target(&mut self, target_pos: impl Into<Vector3<f64>>) {
        self.target_pos = target_pos.into();
        info!(
            x = self.target_pos.x,
            y = self.target_pos.y,
            z = self.target_pos.z,
            "destination updated"
        );
    }

    pub fn clip(&self, rotor_speeds: &[f64; ACTION_SIZE]) -> [f64; ACTION_SIZE] {
        rotor_speeds.map(|speed| speed.clamp(ACTION_LOW, ACTION_HIGH))
    }

    pub fn get_information(&self) -> Information {
        Information {
            metrics: self.metrics,
            init_metrics: self.init_metrics,
            speed: self.speed,
            proximity: self.proximity,
            phase: self.phase,
        }
    }

    pub fn state_size(&self) -> usize {
        self.action_repeat * SNAPSHOT_LEN
    }

    pub fn action_size(&self) -> usize {
        ACTION_SIZE
    }

    pub fn action_low(&self) -> f64 {
        ACTION_LOW
    }

    pub fn action_high(&self) -> f64 {
        ACTION_HIGH
    }

    pub fn action_repeat(&self) -> usize {
        self.action_repeat
    }

    pub fn target_pos(&self) -> Vector3<f64> {
        self.target_pos
    }

    pub fn init_pose(&self) -> Pose {
        self.init_pose
    }

    /// Last commands passed to [`step`](Self::step), after clipping.
    pub fn rotor_speeds(&self) -> [f64; ACTION_SIZE] {
        self.rotor_speeds
    }

    pub fn metrics(&self) -> GoalMetrics {
        self.metrics
    }

    pub fn last_metrics(&self) -> GoalMetrics {
        self.last_metrics
    }

    pub fn init_metrics(&self) -> GoalMetrics {
        self.init_metrics
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Latched once the altitude gap drops below [`PROXIMITY_THRESHOLD`].
    /// Nothing reads it back.
    pub fn proximity(&self) -> bool {
        self.proximity
    }

    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    pub fn sim(&self) -> &S {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut S {
        &mut self.sim
    }
}

impl Task<ScriptedSim> {
    /// Create a task driven by a [`ScriptedSim`] from a YAML configuration file
    pub fn from_yaml_config<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config = QuadcopterTaskConfig::from_yaml_file(config_path)?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &QuadcopterTaskConfig) -> Result<Self> {
        Task::new(&config.task, |initial| {
            ScriptedSim::new(initial, &config.simulator)
        })
    }
}

/// Converts a loosely sized command list into a rotor command array.
pub fn rotor_command(values: &[f64]) -> Result<[f64; ACTION_SIZE]> {
    values
        .try_into()
        .map_err(|_| TaskError::invalid_action(ACTION_SIZE, values.len()))
}
