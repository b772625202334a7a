use winit::keyboard::KeyCode;

use crate::error::Error;
use crate::input::HeldKeys;
use crate::matrix::Matrix4;
use crate::scene::{PartSink, Shape};
use crate::transform_stack::TransformStack;

const TORSO: [f32; 4] = [1.0, 1.0, 0.0, 1.0];
const NECK: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
const HEAD: [f32; 4] = [0.8, 0.0, 0.3, 1.0];
const UPPER_LIMB: [f32; 4] = [0.3, 0.0, 0.8, 1.0];
const LOWER_LIMB: [f32; 4] = [0.8, 0.4, 0.2, 1.0];
const FINGER: [f32; 4] = [0.1, 0.9, 0.7, 1.0];

/// Flat figure made of scaled rectangles: torso, neck, head, two arms with
/// three fingers each, and two legs.
///
/// The right arm and leg are built with `side = 1.0` and the left ones with
/// `side = -1.0`, which mirrors every offset and angle in x. The shoulders
/// swing with F and G.
#[derive(Clone, Debug)]
pub struct PaperMan {
    /// Shoulder angle in degrees, mirrored for the left arm.
    pub shoulder: f32,
    /// Shoulder swing speed in degrees per second.
    pub shoulder_speed: f32,
    pub raise: KeyCode,
    pub lower: KeyCode,
}

impl Default for PaperMan {
    fn default() -> Self {
        Self {
            shoulder: 0.0,
            shoulder_speed: 60.0,
            raise: KeyCode::KeyF,
            lower: KeyCode::KeyG,
        }
    }
}

impl PaperMan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_keys<K: HeldKeys + ?Sized>(&mut self, elapsed: f32, keys: &K) {
        let direction = keys.axis(self.raise, self.lower);
        self.shoulder = (self.shoulder + direction * self.shoulder_speed * elapsed) % 360.0;
    }

    /// Draws the figure relative to `parent`. Leaves `stack` as it found it.
    pub fn draw<S: PartSink + ?Sized>(
        &self,
        stack: &mut TransformStack,
        parent: &Matrix4,
        sink: &mut S,
    ) -> Result<(), Error> {
        stack.scoped(parent, |stack| {
            let mut torso = stack.peek()?;
            torso.scale(4.0, 6.0, 1.0);
            sink.draw_part(Shape::Rectangle, &torso, TORSO)?;

            let mut neck = stack.peek()?;
            neck.translate(0.0, 7.0, 0.0);
            stack.scoped(&neck, |stack| {
                let mut neck = stack.peek()?;
                neck.scale(0.6, 1.0, 1.0);
                sink.draw_part(Shape::Rectangle, &neck, NECK)?;

                let mut head = stack.peek()?;
                head.translate(0.0, 3.0, 0.0).scale(2.0, 2.0, 1.0);
                sink.draw_part(Shape::Rectangle, &head, HEAD)
            })?;

            for side in [1.0, -1.0] {
                self.draw_arm(stack, side, sink)?;
            }
            for side in [1.0, -1.0] {
                self.draw_leg(stack, side, sink)?;
            }
            Ok(())
        })
    }

    fn draw_arm<S: PartSink + ?Sized>(
        &self,
        stack: &mut TransformStack,
        side: f32,
        sink: &mut S,
    ) -> Result<(), Error> {
        let mut upper = stack.peek()?;
        upper
            .translate(4.0 * side, 5.5, 0.0)
            .rotate(self.shoulder * side, 0.0, 0.0, 1.0)
            .translate(2.0 * side, 0.0, 0.0);

        stack.scoped(&upper, |stack| {
            let mut part = stack.peek()?;
            part.scale(2.0, 0.5, 1.0);
            sink.draw_part(Shape::Rectangle, &part, UPPER_LIMB)?;

            let mut forearm = stack.peek()?;
            forearm
                .translate(2.0 * side, 0.0, 0.0)
                .rotate(-60.0 * side, 0.0, 0.0, 1.0)
                .translate(2.0 * side, 0.0, 0.0);

            stack.scoped(&forearm, |stack| {
                let mut part = stack.peek()?;
                part.scale(2.0, 0.5, 1.0);
                sink.draw_part(Shape::Rectangle, &part, LOWER_LIMB)?;

                for angle in [-30.0, 0.0, 30.0] {
                    let mut finger = stack.peek()?;
                    finger
                        .translate(2.0 * side, 0.0, 0.0)
                        .rotate(angle * side, 0.0, 0.0, 1.0)
                        .translate(side, 0.0, 0.0)
                        .scale(1.0, 0.15, 0.15);
                    sink.draw_part(Shape::Rectangle, &finger, FINGER)?;
                }
                Ok(())
            })
        })
    }

    fn draw_leg<S: PartSink + ?Sized>(
        &self,
        stack: &mut TransformStack,
        side: f32,
        sink: &mut S,
    ) -> Result<(), Error> {
        let mut thigh = stack.peek()?;
        thigh
            .translate(2.5 * side, -6.0, 0.0)
            .rotate(-90.0 + 5.0 * side, 0.0, 0.0, 1.0)
            .translate(3.0, 0.0, 0.0);

        stack.scoped(&thigh, |stack| {
            let mut part = stack.peek()?;
            part.scale(3.0, 1.0, 1.0);
            sink.draw_part(Shape::Rectangle, &part, UPPER_LIMB)?;

            let mut shin = stack.peek()?;
            shin.translate(6.0, 0.0, 0.0).scale(3.0, 0.8, 1.0);
            sink.draw_part(Shape::Rectangle, &shin, LOWER_LIMB)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blend::DrawQueue;

    fn draw(man: &PaperMan) -> (TransformStack, DrawQueue) {
        let mut stack = TransformStack::new();
        let mut queue = DrawQueue::new();
        man.draw(&mut stack, &Matrix4::identity(), &mut queue)
            .unwrap();
        (stack, queue)
    }

    #[test]
    fn draws_every_part_with_balanced_stack() {
        let (stack, queue) = draw(&PaperMan::new());

        // torso, neck, head, 2 x (upper arm, forearm, 3 fingers), 2 x (thigh, shin)
        assert_eq!(queue.len(), 3 + 2 * 5 + 2 * 2);
        assert!(stack.is_empty());
        assert_eq!(stack.high_water(), 3);
    }

    #[test]
    fn arms_are_mirrored() {
        let mut man = PaperMan::new();
        man.shoulder = 25.0;
        let (_, queue) = draw(&man);
        let items = queue.items();

        // Right arm parts start at index 3, left arm parts at index 8.
        for i in 0..5 {
            let right = items[3 + i].model.translation();
            let left = items[8 + i].model.translation();
            assert!((right.x + left.x).abs() < 1e-4, "part {}", i);
            assert!((right.y - left.y).abs() < 1e-4, "part {}", i);
        }
    }

    #[test]
    fn shoulder_rotation_does_not_leak_into_siblings() {
        let (_, still) = draw(&PaperMan::new());

        let mut man = PaperMan::new();
        man.shoulder = 45.0;
        let (_, raised) = draw(&man);

        // Torso, neck and head are unaffected.
        for i in 0..3 {
            assert_eq!(still.items()[i].model, raised.items()[i].model);
        }
        // Legs are unaffected.
        for i in 13..17 {
            assert_eq!(still.items()[i].model, raised.items()[i].model);
        }
        // The arms moved.
        assert_ne!(still.items()[3].model, raised.items()[3].model);
    }

    #[test]
    fn parent_transform_moves_whole_figure() {
        let mut stack = TransformStack::new();
        let mut queue = DrawQueue::new();
        let mut parent = Matrix4::identity();
        parent.translate(-10.0, 3.0, -10.0);
        PaperMan::new()
            .draw(&mut stack, &parent, &mut queue)
            .unwrap();

        let (_, origin) = draw(&PaperMan::new());
        for (moved, base) in queue.items().iter().zip(origin.items()) {
            let delta = moved.model.translation() - base.model.translation();
            assert!(delta.abs_diff_eq(glam::Vec3::new(-10.0, 3.0, -10.0), 1e-4));
        }
    }

    #[test]
    fn shoulder_follows_keys() {
        let mut man = PaperMan::new();
        man.handle_keys(0.5, &[KeyCode::KeyF]);
        assert!((man.shoulder - 30.0).abs() < 1e-4);
        man.handle_keys(0.25, &[KeyCode::KeyG]);
        assert!((man.shoulder - 15.0).abs() < 1e-4);
    }
}
