pub mod pose;
pub mod scripted;
#[cfg(feature = "python")]
pub mod py_sim;

pub use crate::sim::pose::Pose;
pub use crate::sim::scripted::ScriptedSim;
#[cfg(feature = "python")]
pub use crate::sim::py_sim::PyPhysicsSim;

use nalgebra::Vector3;

use crate::error::Result;
use crate::ACTION_SIZE;

/// Initial conditions a simulator is constructed from and resets to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InitialConditions {
    pub pose: Pose,
    pub velocities: Vector3<f64>,
    pub angle_velocities: Vector3<f64>,
    /// Episode time limit in seconds.
    pub runtime: f64,
}

/// Physics collaborator driven by a [`Task`](crate::Task).
///
/// The simulator owns the continuous state and is the only thing that turns
/// rotor commands into motion. Calls are fallible because implementations may
/// sit behind an FFI boundary.
pub trait PhysicsSim {
    /// Current `[x, y, z, euler_x, euler_y, euler_z]` state.
    fn pose(&self) -> Result<Pose>;

    /// Current linear velocity.
    fn velocities(&self) -> Result<Vector3<f64>>;

    /// Advance one fixed timestep. Returns `true` once the episode is over.
    fn next_timestep(&mut self, rotor_speeds: &[f64; ACTION_SIZE]) -> Result<bool>;

    /// Restore the configured initial conditions.
    fn reset(&mut self) -> Result<()>;
}

impl<S: PhysicsSim + ?Sized> PhysicsSim for Box<S> {
    fn pose(&self) -> Result<Pose> {
        (**self).pose()
    }

    fn velocities(&self) -> Result<Vector3<f64>> {
        (**self).velocities()
    }

    fn next_timestep(&mut self, rotor_speeds: &[f64; ACTION_SIZE]) -> Result<bool> {
        (**self).next_timestep(rotor_speeds)
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }
}
