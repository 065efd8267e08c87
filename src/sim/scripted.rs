use meval::{Context, Expr};
use nalgebra::Vector3;

use crate::config::SimulatorConfig;
use crate::error::{Result, TaskError};
use crate::sim::pose::Pose;
use crate::sim::{InitialConditions, PhysicsSim};
use crate::ACTION_SIZE;

const POSE_VARIABLES: [&str; Pose::LEN] = ["x", "y", "z", "phi", "theta", "psi"];

/// Kinematic stand-in for a physics engine.
///
/// Each timestep the pose components are evaluated from trajectory
/// expressions in `t` (elapsed time), the previous pose (`x`, `y`, `z`,
/// `phi`, `theta`, `psi`) and `u` (mean rotor command). Components without an
/// expression hold their value. With no trajectory at all the pose advances
/// along the initial linear and angular velocities.
#[derive(Clone, Debug)]
pub struct ScriptedSim {
    initial: InitialConditions,
    dt: f64,
    trajectory: Option<Vec<Expr>>,
    lower_bounds: Option<Vector3<f64>>,
    upper_bounds: Option<Vector3<f64>>,
    pose: Pose,
    velocity: Vector3<f64>,
    angular_velocity: Vector3<f64>,
    steps: u64,
    time: f64,
}

impl ScriptedSim {
    pub fn new(initial: &InitialConditions, config: &SimulatorConfig) -> Result<Self> {
        if !(config.dt > 0.0) {
            return Err(TaskError::invalid_config(format!(
                "timestep must be positive, got {}",
                config.dt
            )));
        }
        if !(initial.runtime > 0.0) {
            return Err(TaskError::invalid_config(format!(
                "runtime must be positive, got {}",
                initial.runtime
            )));
        }

        let trajectory = if config.trajectory.is_empty() {
            None
        } else {
            Some(parse_trajectory(&config.trajectory)?)
        };

        let lower_bounds = config.lower_bounds.map(Vector3::from);
        let upper_bounds = config.upper_bounds.map(Vector3::from);
        if let (Some(lower), Some(upper)) = (lower_bounds, upper_bounds) {
            if lower.iter().zip(upper.iter()).any(|(lo, hi)| lo > hi) {
                return Err(TaskError::invalid_config(
                    "lower bounds must not exceed upper bounds",
                ));
            }
        }

        Ok(ScriptedSim {
            initial: *initial,
            dt: config.dt,
            trajectory,
            lower_bounds,
            upper_bounds,
            pose: initial.pose,
            velocity: initial.velocities,
            angular_velocity: initial.angle_velocities,
            steps: 0,
            time: 0.0,
        })
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Timesteps taken since construction or the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn angular_velocity(&self) -> Vector3<f64> {
        self.angular_velocity
    }

    fn evaluate(&self, exprs: &[Expr], rotor_speeds: &[f64; ACTION_SIZE]) -> Result<Pose> {
        let mut ctx = Context::new();
        ctx.var("t", self.time)
            .var("u", rotor_speeds.iter().sum::<f64>() / ACTION_SIZE as f64);
        for (name, value) in POSE_VARIABLES.iter().zip(self.pose.to_array()) {
            ctx.var(*name, value);
        }

        let mut next = [0.0; Pose::LEN];
        for ((slot, expr), name) in next.iter_mut().zip(exprs).zip(POSE_VARIABLES) {
            *slot = expr.eval_with_context(&ctx).map_err(|e| {
                TaskError::simulator(format!("failed to evaluate {name} at t={}: {e}", self.time))
            })?;
        }
        Ok(Pose::from_array(next))
    }

    /// Clamp the position into the bounds; returns whether it had left them.
    fn enforce_bounds(&mut self) -> bool {
        let mut out_of_bounds = false;
        if let Some(lower) = self.lower_bounds {
            for (value, lo) in self.pose.position.iter_mut().zip(lower.iter()) {
                if *value < *lo {
                    *value = *lo;
                    out_of_bounds = true;
                }
            }
        }
        if let Some(upper) = self.upper_bounds {
            for (value, hi) in self.pose.position.iter_mut().zip(upper.iter()) {
                if *value > *hi {
                    *value = *hi;
                    out_of_bounds = true;
                }
            }
        }
        out_of_bounds
    }
}

fn parse_trajectory(components: &[String]) -> Result<Vec<Expr>> {
    if components.len() > Pose::LEN {
        return Err(TaskError::invalid_config(format!(
            "trajectory has {} components, at most {} allowed",
            components.len(),
            Pose::LEN
        )));
    }

    POSE_VARIABLES
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let source = components
                .get(i)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .unwrap_or(*name);
            source.parse::<Expr>().map_err(|e| {
                TaskError::invalid_config(format!("bad trajectory for {name} ({source}): {e}"))
            })
        })
        .collect()
}

impl PhysicsSim for ScriptedSim {
    fn pose(&self) -> Result<Pose> {
        Ok(self.pose)
    }

    fn velocities(&self) -> Result<Vector3<f64>> {
        Ok(self.velocity)
    }

    fn next_timestep(&mut self, rotor_speeds: &[f64; ACTION_SIZE]) -> Result<bool> {
        // derived from the step count so repeated additions of dt don't drift
        self.steps += 1;
        self.time = self.steps as f64 * self.dt;
        let prev = self.pose;

        let out_of_bounds = match &self.trajectory {
            Some(exprs) => {
                self.pose = self.evaluate(exprs, rotor_speeds)?;
                let out_of_bounds = self.enforce_bounds();
                self.velocity = (self.pose.position - prev.position) / self.dt;
                self.angular_velocity = (self.pose.angles - prev.angles) / self.dt;
                out_of_bounds
            }
            None => {
                self.pose.position += self.velocity * self.dt;
                self.pose.angles += self.angular_velocity * self.dt;
                self.enforce_bounds()
            }
        };

        let time_up = self.time >= self.initial.runtime - self.dt * 1e-9;
        Ok(time_up || out_of_bounds)
    }

    fn reset(&mut self) -> Result<()> {
        self.pose = self.initial.pose;
        self.velocity = self.initial.velocities;
        self.angular_velocity = self.initial.angle_velocities;
        self.steps = 0;
        self.time = 0.0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskConfig;
    use approx::assert_relative_eq;

    fn initial(runtime: f64) -> InitialConditions {
        InitialConditions {
            runtime,
            ..TaskConfig::default().initial_conditions()
        }
    }

    fn scripted(trajectory: &[&str], dt: f64) -> ScriptedSim {
        let config = SimulatorConfig {
            dt,
            trajectory: trajectory.iter().map(|s| s.to_string()).collect(),
            ..SimulatorConfig::default()
        };
        ScriptedSim::new(&initial(5.0), &config).unwrap()
    }

    #[test]
    fn constant_velocity_without_trajectory() {
        let mut start = initial(5.0);
        start.velocities = Vector3::new(0.0, 0.0, -10.0);
        let config = SimulatorConfig {
            dt: 0.1,
            ..SimulatorConfig::default()
        };
        let mut sim = ScriptedSim::new(&start, &config).unwrap();

        assert!(!sim.next_timestep(&[0.0; 4]).unwrap());
        let pose = sim.pose().unwrap();
        assert_relative_eq!(pose.altitude(), 119.0, epsilon = 1e-9);
        assert_relative_eq!(pose.position.x, 25.0);
        assert_eq!(sim.velocities().unwrap(), Vector3::new(0.0, 0.0, -10.0));
    }

    #[test]
    fn trajectory_drives_pose_and_velocity() {
        let mut sim = scripted(&["x", "y", "120 - 10 * t"], 0.1);

        sim.next_timestep(&[0.0; 4]).unwrap();
        let pose = sim.pose().unwrap();
        assert_relative_eq!(pose.altitude(), 119.0, epsilon = 1e-9);
        assert_relative_eq!(sim.velocities().unwrap().z, -10.0, epsilon = 1e-6);
        assert_relative_eq!(sim.time(), 0.1);
    }

    #[test]
    fn missing_components_hold_their_value() {
        let mut sim = scripted(&["x + 1"], 0.1);

        sim.next_timestep(&[0.0; 4]).unwrap();
        sim.next_timestep(&[0.0; 4]).unwrap();
        let pose = sim.pose().unwrap();
        assert_relative_eq!(pose.position.x, 27.0);
        assert_relative_eq!(pose.position.y, 25.0);
        assert_relative_eq!(pose.altitude(), 120.0);
        assert_eq!(pose.angles, Vector3::zeros());
    }

    #[test]
    fn rotor_command_is_visible_as_u() {
        let mut sim = scripted(&["x", "y", "z - u / 100"], 0.02);

        sim.next_timestep(&[100.0, 200.0, 300.0, 400.0]).unwrap();
        assert_relative_eq!(sim.pose().unwrap().altitude(), 117.5);
    }

    #[test]
    fn done_once_runtime_is_reached() {
        let config = SimulatorConfig {
            dt: 0.1,
            ..SimulatorConfig::default()
        };
        let mut sim = ScriptedSim::new(&initial(0.25), &config).unwrap();

        assert!(!sim.next_timestep(&[0.0; 4]).unwrap());
        assert!(!sim.next_timestep(&[0.0; 4]).unwrap());
        assert!(sim.next_timestep(&[0.0; 4]).unwrap());
    }

    fn timesteps_until_done(runtime: f64, dt: f64) -> u64 {
        let config = SimulatorConfig {
            dt,
            ..SimulatorConfig::default()
        };
        let mut sim = ScriptedSim::new(&initial(runtime), &config).unwrap();
        while !sim.next_timestep(&[0.0; 4]).unwrap() {
            assert!(sim.steps() < 10_000);
        }
        sim.steps()
    }

    #[test]
    fn runtime_cutoff_is_exact() {
        assert_eq!(timesteps_until_done(5.0, 1.0 / 50.0), 250);
        assert_eq!(timesteps_until_done(1.0, 0.1), 10);
        assert_eq!(timesteps_until_done(0.25, 0.1), 3);
        assert_eq!(timesteps_until_done(3.0, 0.01), 300);
    }

    #[test]
    fn velocity_reflects_clamped_motion() {
        let config = SimulatorConfig {
            dt: 0.1,
            trajectory: vec!["x".into(), "y".into(), "z - 150".into()],
            lower_bounds: Some([-150.0, -150.0, 0.0]),
            ..SimulatorConfig::default()
        };
        let mut sim = ScriptedSim::new(&initial(5.0), &config).unwrap();

        assert!(sim.next_timestep(&[0.0; 4]).unwrap());
        assert_eq!(sim.pose().unwrap().altitude(), 0.0);
        assert_relative_eq!(sim.velocities().unwrap().z, -1200.0, epsilon = 1e-6);
    }

    #[test]
    fn leaving_bounds_clamps_and_ends_episode() {
        let config = SimulatorConfig {
            dt: 0.02,
            trajectory: vec!["x".into(), "y".into(), "z - 50".into()],
            lower_bounds: Some([-150.0, -150.0, 0.0]),
            upper_bounds: Some([150.0, 150.0, 300.0]),
        };
        let mut sim = ScriptedSim::new(&initial(5.0), &config).unwrap();

        assert!(!sim.next_timestep(&[0.0; 4]).unwrap());
        assert!(!sim.next_timestep(&[0.0; 4]).unwrap());
        assert!(sim.next_timestep(&[0.0; 4]).unwrap());
        assert_eq!(sim.pose().unwrap().altitude(), 0.0);
    }

    #[test]
    fn reset_restores_initial_conditions() {
        let mut sim = scripted(&["x", "y", "z - 5"], 0.1);
        sim.next_timestep(&[0.0; 4]).unwrap();
        sim.next_timestep(&[0.0; 4]).unwrap();

        sim.reset().unwrap();
        assert_eq!(sim.pose().unwrap(), initial(5.0).pose);
        assert_eq!(sim.velocities().unwrap(), Vector3::zeros());
        assert_eq!(sim.angular_velocity(), Vector3::zeros());
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.steps(), 0);
    }

    #[test]
    fn rejects_bad_configuration() {
        let bad_dt = SimulatorConfig {
            dt: 0.0,
            ..SimulatorConfig::default()
        };
        assert!(matches!(
            ScriptedSim::new(&initial(5.0), &bad_dt),
            Err(TaskError::InvalidConfig(_))
        ));

        assert!(matches!(
            ScriptedSim::new(&initial(-1.0), &SimulatorConfig::default()),
            Err(TaskError::InvalidConfig(_))
        ));

        let bad_expr = SimulatorConfig {
            trajectory: vec!["(1 + ".into()],
            ..SimulatorConfig::default()
        };
        assert!(matches!(
            ScriptedSim::new(&initial(5.0), &bad_expr),
            Err(TaskError::InvalidConfig(_))
        ));

        let inverted = SimulatorConfig {
            lower_bounds: Some([0.0, 0.0, 10.0]),
            upper_bounds: Some([0.0, 0.0, 5.0]),
            ..SimulatorConfig::default()
        };
        assert!(ScriptedSim::new(&initial(5.0), &inverted).is_err());

        let too_long = SimulatorConfig {
            trajectory: vec!["0".into(); 7],
            ..SimulatorConfig::default()
        };
        assert!(ScriptedSim::new(&initial(5.0), &too_long).is_err());
    }

    #[test]
    fn unknown_variable_fails_at_evaluation() {
        let mut sim = scripted(&["x", "y", "z - w"], 0.1);
        assert!(matches!(
            sim.next_timestep(&[0.0; 4]),
            Err(TaskError::Simulator(_))
        ));
    }
}
