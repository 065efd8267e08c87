use nalgebra::Vector3;
use quadcopter_task::sim::{InitialConditions, PhysicsSim, Pose};
use quadcopter_task::{Result, Task, TaskConfig};

/// Simulator that replays a fixed list of poses, one per timestep, and
/// records every command it is given.
pub struct ReplaySim {
    initial: Pose,
    poses: Vec<Pose>,
    cursor: usize,
    pose: Pose,
    done_after: Option<usize>,
    pub commands: Vec<[f64; 4]>,
    pub resets: usize,
}

impl ReplaySim {
    pub fn new(initial: &InitialConditions, altitudes: &[f64]) -> Self {
        let poses = altitudes
            .iter()
            .map(|z| {
                let mut pose = initial.pose;
                pose.position.z = *z;
                pose
            })
            .collect();
        ReplaySim {
            initial: initial.pose,
            poses,
            cursor: 0,
            pose: initial.pose,
            done_after: None,
            commands: Vec::new(),
            resets: 0,
        }
    }

    pub fn done_after(mut self, timesteps: usize) -> Self {
        self.done_after = Some(timesteps);
        self
    }
}

impl PhysicsSim for ReplaySim {
    fn pose(&self) -> Result<Pose> {
        Ok(self.pose)
    }

    fn velocities(&self) -> Result<Vector3<f64>> {
        Ok(Vector3::zeros())
    }

    fn next_timestep(&mut self, rotor_speeds: &[f64; 4]) -> Result<bool> {
        if let Some(next) = self.poses.get(self.cursor) {
            self.pose = *next;
        }
        self.cursor += 1;
        self.commands.push(*rotor_speeds);
        Ok(self.done_after.is_some_and(|limit| self.cursor >= limit))
    }

    fn reset(&mut self) -> Result<()> {
        self.cursor = 0;
        self.pose = self.initial;
        self.resets += 1;
        Ok(())
    }
}

/// Task over a [`ReplaySim`] that visits `altitudes` in order.
pub fn replay_task(config: &TaskConfig, altitudes: &[f64]) -> Task<ReplaySim> {
    Task::new(config, |initial| Ok(ReplaySim::new(initial, altitudes))).unwrap()
}
