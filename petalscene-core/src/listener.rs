use crate::math::{Pose, Vec3};

/// The "ears" of the scene.
///
/// Only the position takes part in audibility. The orientation is kept for backends that
/// spatialise relative to the listener's facing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Listener {
    pose: Pose,
}

impl Listener {
    pub fn new(pose: Pose) -> Self {
        Self { pose }
    }

    /// A listener at `position` facing -Z.
    pub fn at(position: Vec3) -> Self {
        Self {
            pose: Pose::from_position(position),
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }
}
