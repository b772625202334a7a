use crate::animation::AnimatedAngle;
use crate::error::Error;
use crate::matrix::Matrix4;
use crate::scene::{PartSink, Shape};
use crate::transform_stack::TransformStack;

/// Sun, an earth orbiting it while spinning, and a moon orbiting the earth.
///
/// The earth's orbit frame is pushed so the moon inherits the orbit but not
/// the earth's spin.
#[derive(Clone, Debug)]
pub struct Planets {
    pub earth_orbit: AnimatedAngle,
    pub earth_spin: AnimatedAngle,
    pub moon_orbit: AnimatedAngle,
    pub earth_distance: f32,
    pub moon_distance: f32,
}

impl Default for Planets {
    fn default() -> Self {
        Self {
            earth_orbit: AnimatedAngle::new(0.0, 20.0),
            earth_spin: AnimatedAngle::new(0.0, 120.0),
            moon_orbit: AnimatedAngle::new(0.0, 60.0),
            earth_distance: 8.0,
            moon_distance: 2.0,
        }
    }
}

impl Planets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, elapsed: f32) {
        self.earth_orbit.advance(elapsed);
        self.earth_spin.advance(elapsed);
        self.moon_orbit.advance(elapsed);
    }

    pub fn draw<S: PartSink + ?Sized>(
        &self,
        stack: &mut TransformStack,
        parent: &Matrix4,
        sink: &mut S,
    ) -> Result<(), Error> {
        stack.scoped(parent, |stack| {
            let mut sun = stack.peek()?;
            sun.scale(2.0, 2.0, 2.0);
            sink.draw_part(Shape::Sphere, &sun, [1.0, 0.8, 0.0, 1.0])?;

            let mut orbit = stack.peek()?;
            orbit
                .rotate(self.earth_orbit.degrees, 0.0, 1.0, 0.0)
                .translate(self.earth_distance, 0.0, 0.0);

            stack.scoped(&orbit, |stack| {
                let mut earth = stack.peek()?;
                earth.rotate(self.earth_spin.degrees, 0.0, 1.0, 0.0);
                sink.draw_part(Shape::Sphere, &earth, [0.1, 0.3, 0.9, 1.0])?;

                let mut moon = stack.peek()?;
                moon.rotate(self.moon_orbit.degrees, 0.0, 1.0, 0.0)
                    .translate(0.0, 0.0, self.moon_distance)
                    .scale(0.3, 0.3, 0.3);
                sink.draw_part(Shape::Sphere, &moon, [0.7, 0.7, 0.7, 1.0])
            })
        })
    }
}
