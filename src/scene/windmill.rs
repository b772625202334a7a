use crate::animation::AnimatedAngle;
use crate::error::Error;
use crate::matrix::Matrix4;
use crate::scene::{PartSink, Shape};
use crate::transform_stack::TransformStack;

/// Tower with a hub and evenly spaced blades turning about the hub's z axis.
#[derive(Clone, Debug)]
pub struct Windmill {
    pub blades: u32,
    pub height: f32,
    pub blade_length: f32,
    pub rotor: AnimatedAngle,
    pub color: [f32; 4],
    pub blade_color: [f32; 4],
}

impl Default for Windmill {
    fn default() -> Self {
        Self {
            blades: 4,
            height: 6.0,
            blade_length: 3.0,
            rotor: AnimatedAngle::new(0.0, 45.0),
            color: [0.6, 0.6, 0.6, 1.0],
            blade_color: [0.9, 0.9, 0.9, 1.0],
        }
    }
}

impl Windmill {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blades(mut self, blades: u32) -> Self {
        self.blades = blades;
        self
    }

    /// Rotor speed in degrees per second.
    pub fn speed(mut self, degrees_per_second: f32) -> Self {
        self.rotor.speed = degrees_per_second;
        self
    }

    pub fn update(&mut self, elapsed: f32) {
        self.rotor.advance(elapsed);
    }

    pub fn draw<S: PartSink + ?Sized>(
        &self,
        stack: &mut TransformStack,
        parent: &Matrix4,
        sink: &mut S,
    ) -> Result<(), Error> {
        stack.scoped(parent, |stack| {
            let mut tower = stack.peek()?;
            tower
                .translate(0.0, self.height / 2.0, 0.0)
                .scale(0.4, self.height / 2.0, 0.4);
            sink.draw_part(Shape::Cube, &tower, self.color)?;

            let mut hub = stack.peek()?;
            hub.translate(0.0, self.height, 0.5)
                .rotate(self.rotor.degrees, 0.0, 0.0, 1.0);

            stack.scoped(&hub, |stack| {
                let mut cap = stack.peek()?;
                cap.scale(0.3, 0.3, 0.3);
                sink.draw_part(Shape::Sphere, &cap, self.color)?;

                let spacing = 360.0 / self.blades.max(1) as f32;
                for i in 0..self.blades {
                    let mut blade = stack.peek()?;
                    blade
                        .rotate(i as f32 * spacing, 0.0, 0.0, 1.0)
                        .translate(self.blade_length / 2.0, 0.0, 0.0)
                        .scale(self.blade_length / 2.0, 0.2, 0.05);
                    sink.draw_part(Shape::Cube, &blade, self.blade_color)?;
                }
                Ok(())
            })
        })
    }
}
