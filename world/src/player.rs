//! Point-mass player controller.
//!
//! Horizontal velocity is kept in the player's local frame: `velocity.x` along
//! right, `velocity.z` along back (negative z moves forward).

use bevy::prelude::*;

use crate::collision::CollisionList;
use crate::config::{PlayerTuning, ProbeMode};
use crate::ray::{HitMode, Ray};

/// Held movement keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveIntent {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveIntent {
    pub fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    /// Eye position.
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Ground probe hit something on the last tick.
    pub grounded: bool,
    pub can_jump: bool,
    pub intent: MoveIntent,
}

impl PlayerState {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            grounded: false,
            can_jump: false,
            intent: MoveIntent::default(),
        }
    }

    /// Horizontal forward direction. In Bevy: +X right, +Y up, -Z forward.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// Camera orientation.
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Set the look angles. Pitch is kept just short of straight up/down.
    pub fn set_look(&mut self, yaw: f32, pitch: f32) {
        let limit = std::f32::consts::FRAC_PI_2 - 0.001;
        self.yaw = yaw;
        self.pitch = pitch.clamp(-limit, limit);
    }

    /// Jump if allowed. Returns whether the jump happened.
    pub fn try_jump(&mut self, tuning: &PlayerTuning) -> bool {
        if !self.can_jump {
            return false;
        }
        self.velocity.y = tuning.jump_impulse;
        self.can_jump = false;
        true
    }

    /// Advance one frame.
    ///
    /// `terrain_below` answers the terrain height under a world position and
    /// is only consulted when `tuning.follow_terrain` is set.
    pub fn step(
        &mut self,
        delta: f32,
        tuning: &PlayerTuning,
        collisions: &CollisionList,
        terrain_below: impl Fn(Vec3) -> Option<f32>,
    ) {
        let delta = delta.clamp(0.0, tuning.max_delta);

        // --- Damping and gravity ---
        self.velocity.x -= self.velocity.x * tuning.damping * delta;
        self.velocity.z -= self.velocity.z * tuning.damping * delta;
        self.velocity.y -= tuning.gravity * tuning.mass * delta;

        // --- Intent ---
        let mut direction = Vec2::new(
            self.intent.right as i32 as f32 - self.intent.left as i32 as f32,
            self.intent.forward as i32 as f32 - self.intent.backward as i32 as f32,
        );
        if direction != Vec2::ZERO {
            direction = direction.normalize();
        }
        if self.intent.forward || self.intent.backward {
            self.velocity.z -= direction.y * tuning.acceleration * delta;
        }
        if self.intent.left || self.intent.right {
            self.velocity.x -= direction.x * tuning.acceleration * delta;
        }

        // --- Ground probe ---
        let probe = Ray::new(
            self.position + Vec3::Y * tuning.probe_offset,
            Vec3::NEG_Y,
            0.0,
            tuning.probe_distance,
        );
        self.grounded = match tuning.probe_mode {
            ProbeMode::Nearest => !collisions.cast(&probe, HitMode::Nearest).is_empty(),
            ProbeMode::Any => collisions.any_hit(&probe).is_some(),
        };
        if self.grounded {
            self.velocity.y = self.velocity.y.max(0.0);
            self.can_jump = true;
            if tuning.stop_on_contact && self.intent.forward {
                self.velocity.z = 0.0;
                self.intent.forward = false;
            }
        }

        // --- Integrate ---
        let step = tuning.move_scale * delta;
        self.position += self.right() * (-self.velocity.x * step);
        self.position += self.forward() * (-self.velocity.z * step);
        self.position.y += self.velocity.y * delta;

        // --- Floor ---
        let mut floor = tuning.ground_height;
        if tuning.follow_terrain {
            if let Some(height) = terrain_below(self.position) {
                floor = floor.max(height + tuning.ground_height);
            }
        }
        if self.position.y < floor {
            self.velocity.y = 0.0;
            self.position.y = floor;
            self.can_jump = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{Collider, ColliderId, CollisionSet};
    use crate::chunk::GridCoord;
    use crate::config::PropShape;
    use crate::props::Prop;
    use std::sync::Arc;

    fn no_terrain(_: Vec3) -> Option<f32> {
        None
    }

    fn box_under(top: f32) -> CollisionList {
        let mut list = CollisionList::new(CollisionSet::Props);
        list.push(Collider {
            owner: GridCoord::new(0, 0),
            id: ColliderId::Prop {
                chunk: GridCoord::new(0, 0),
                index: 0,
            },
            shape: Arc::new(Prop {
                archetype: 0,
                shape: PropShape::Box { size: 20.0 },
                chunk: GridCoord::new(0, 0),
                local: Vec3::new(0.0, top - 10.0, 0.0),
                chunk_origin: Vec3::ZERO,
            }),
        });
        list
    }

    #[test]
    fn test_falls_onto_floor() {
        let tuning = PlayerTuning::default();
        let mut player = PlayerState::new(Vec3::new(0.0, 12.0, 0.0));
        player.velocity.y = -100.0;
        player.step(0.05, &tuning, &CollisionList::default(), no_terrain);
        assert_eq!(player.position.y, tuning.ground_height);
        assert!(player.velocity.y >= 0.0);
        assert!(player.can_jump);
        assert!(!player.grounded);
    }

    #[test]
    fn test_follow_terrain_raises_floor() {
        let tuning = PlayerTuning {
            follow_terrain: true,
            ..default()
        };
        let mut player = PlayerState::new(Vec3::new(0.0, 50.0, 0.0));
        player.velocity.y = -100.0;
        player.step(0.1, &tuning, &CollisionList::default(), |_| Some(45.0));
        assert_eq!(player.position.y, 55.0);
        assert_eq!(player.velocity.y, 0.0);

        // Terrain below the fixed floor never lowers it.
        let mut player = PlayerState::new(Vec3::new(0.0, 11.0, 0.0));
        player.step(0.1, &tuning, &CollisionList::default(), |_| Some(-80.0));
        assert_eq!(player.position.y, tuning.ground_height);
    }

    #[test]
    fn test_jump_gating() {
        let tuning = PlayerTuning::default();
        let mut player = PlayerState::new(Vec3::new(0.0, 100.0, 0.0));
        player.velocity.y = -5.0;
        assert!(!player.try_jump(&tuning));
        assert_eq!(player.velocity.y, -5.0);

        player.can_jump = true;
        assert!(player.try_jump(&tuning));
        assert_eq!(player.velocity.y, tuning.jump_impulse);
        assert!(!player.can_jump);
        assert!(!player.try_jump(&tuning));
        assert_eq!(player.velocity.y, tuning.jump_impulse);
    }

    #[test]
    fn test_standing_on_prop_stops_falling() {
        let tuning = PlayerTuning::default();
        // Eye 25 above the box top puts the probe origin 15 above it.
        let collisions = box_under(100.0);
        let mut player = PlayerState::new(Vec3::new(0.0, 118.0, 0.0));
        player.velocity.y = -3.0;
        player.step(0.01, &tuning, &collisions, no_terrain);
        assert!(player.grounded);
        assert!(player.can_jump);
        assert_eq!(player.velocity.y, 0.0);
        assert_eq!(player.position.y, 118.0);

        let mut any = player.clone();
        let tuning_any = PlayerTuning {
            probe_mode: ProbeMode::Any,
            ..default()
        };
        any.step(0.01, &tuning_any, &collisions, no_terrain);
        assert!(any.grounded);
    }

    #[test]
    fn test_stop_on_contact() {
        let tuning = PlayerTuning {
            stop_on_contact: true,
            ..default()
        };
        let collisions = box_under(100.0);
        let mut player = PlayerState::new(Vec3::new(0.0, 118.0, 0.0));
        player.intent.forward = true;
        player.step(0.01, &tuning, &collisions, no_terrain);
        assert!(player.grounded);
        assert!(!player.intent.forward);
        assert_eq!(player.velocity.z, 0.0);

        // Backing away keeps its velocity.
        let mut backing = PlayerState::new(Vec3::new(0.0, 118.0, 0.0));
        backing.intent.backward = true;
        backing.step(0.01, &tuning, &collisions, no_terrain);
        assert!(backing.grounded);
        assert!(backing.intent.backward);
        assert!(backing.velocity.z > 0.0);
    }

    #[test]
    fn test_forward_intent_moves_along_yaw() {
        let tuning = PlayerTuning::default();
        let mut player = PlayerState::new(Vec3::new(0.0, 10.0, 0.0));
        player.intent.forward = true;
        player.step(0.016, &tuning, &CollisionList::default(), no_terrain);
        assert!(player.position.z < 0.0);
        assert!(player.position.x.abs() < 1e-4);

        let mut turned = PlayerState::new(Vec3::new(0.0, 10.0, 0.0));
        turned.set_look(std::f32::consts::FRAC_PI_2, 0.0);
        turned.intent.right = true;
        turned.step(0.016, &tuning, &CollisionList::default(), no_terrain);
        // Facing -X, so right is -Z.
        assert!(turned.position.z < 0.0);
        assert!(turned.position.x.abs() < 1e-3);
    }

    #[test]
    fn test_delta_is_clamped() {
        let tuning = PlayerTuning::default();
        let mut a = PlayerState::new(Vec3::new(0.0, 500.0, 0.0));
        let mut b = a.clone();
        a.step(0.1, &tuning, &CollisionList::default(), no_terrain);
        b.step(5.0, &tuning, &CollisionList::default(), no_terrain);
        assert_eq!(a, b);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut player = PlayerState::new(Vec3::ZERO);
        player.set_look(1.0, 10.0);
        assert!(player.pitch < std::f32::consts::FRAC_PI_2);
        player.set_look(1.0, -10.0);
        assert!(player.pitch > -std::f32::consts::FRAC_PI_2);
    }
}
