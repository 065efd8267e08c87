use nalgebra::Vector3;

/// Kinematic state of the craft: position plus Euler angles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub angles: Vector3<f64>,
}

impl Pose {
    pub const LEN: usize = 6;

    pub fn new(position: Vector3<f64>, angles: Vector3<f64>) -> Self {
        Pose { position, angles }
    }

    /// Build from `[x, y, z, euler_x, euler_y, euler_z]`.
    pub fn from_array(values: [f64; Pose::LEN]) -> Self {
        Pose {
            position: Vector3::new(values[0], values[1], values[2]),
            angles: Vector3::new(values[3], values[4], values[5]),
        }
    }

    /// Returns `None` unless `values` holds exactly six scalars.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let values: [f64; Pose::LEN] = values.try_into().ok()?;
        Some(Self::from_array(values))
    }

    pub fn to_array(&self) -> [f64; Pose::LEN] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.angles.x,
            self.angles.y,
            self.angles.z,
        ]
    }

    pub fn altitude(&self) -> f64 {
        self.position.z
    }
}

pub fn vector3_from_slice(values: &[f64]) -> Option<Vector3<f64>> {
    let values: [f64; 3] = values.try_into().ok()?;
    Some(Vector3::from(values))
}
