use crate::behavior::Behavior;
use crate::color;
use image::Rgb;
use rand::RngCore;
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::str::FromStr;
use tracing::trace;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// What happens when an agent's centre crosses the arena edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Boundary {
    /// Reflect off the walls like a particle.
    BounceBack,
    /// Torus: leave on one side, re-enter on the opposite one.
    #[default]
    Infinite,
}

impl FromStr for Boundary {
    type Err = anyhow::Error;

    fn from_str(name: &str) -> anyhow::Result<Self> {
        match name.to_lowercase().as_str() {
            "bounce-back" | "bounce_back" | "bounce" => Ok(Boundary::BounceBack),
            "infinite" | "torus" | "wrap" => Ok(Boundary::Infinite),
            _ => bail!("Unknown boundary condition: {}", name),
        }
    }
}

/// Arena the agent lives in: `[pad, pad + width] x [pad, pad + height]` in window pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
    pub pad: f64,
}

impl Arena {
    pub fn new(width: u32, height: u32, pad: u32) -> Self {
        Self {
            width: width as f64,
            height: height as f64,
            pad: pad as f64,
        }
    }

    pub fn x_bounds(&self) -> (f64, f64) {
        (self.pad, self.pad + self.width)
    }

    pub fn y_bounds(&self) -> (f64, f64) {
        (self.pad, self.pad + self.height)
    }
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub id: u32,
    pub radius: f64,
    /// Upper-left corner of the agent's bounding square.
    pub position: Point,
    /// Heading in radians, 0 faces right, counter-clockwise positive.
    pub orientation: f64,
    pub orig_color: Rgb<u8>,
    pub color: Rgb<u8>,
    pub selected_color: Rgb<u8>,
    arena: Arena,
    pub boundary: Boundary,

    pub velocity: f64,
    pub v_max: f64,
    pub vx: f64,
    pub vy: f64,

    pub dt: f64,
    pub dv: f64,
    pub dtheta: f64,

    pub is_moved_with_cursor: bool,
    pub show_stats: bool,
    pub change_color_with_orientation: bool,

    behavior: Box<dyn Behavior>,
}

impl Agent {
    pub fn new(
        id: u32,
        radius: f64,
        position: Point,
        orientation: f64,
        arena: Arena,
        color: Rgb<u8>,
        behavior: Box<dyn Behavior>,
    ) -> Self {
        Self {
            id,
            radius,
            position,
            orientation,
            orig_color: color,
            color,
            selected_color: color::LIGHT_BLUE,
            arena,
            boundary: Boundary::Infinite,
            velocity: 1.0,
            v_max: 1.0,
            vx: 0.0,
            vy: 0.0,
            dt: 0.05,
            dv: 0.0,
            dtheta: 0.0,
            is_moved_with_cursor: false,
            show_stats: false,
            change_color_with_orientation: false,
            behavior,
        }
    }

    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn center(&self) -> Point {
        Point::new(self.position.x + self.radius, self.position.y + self.radius)
    }

    /// Colour used for drawing right now.
    pub fn display_color(&self) -> Rgb<u8> {
        if self.is_moved_with_cursor {
            self.selected_color
        } else {
            self.color
        }
    }

    pub fn change_color(&mut self) {
        self.color = color::calculate_color(self.orientation, self.velocity);
    }

    /// Refreshes visual state after position or heading changed.
    pub fn draw_update(&mut self) {
        if self.change_color_with_orientation {
            self.change_color();
        }
    }

    pub fn contains_point(&self, p: Point) -> bool {
        let size = 2.0 * self.radius;
        p.x >= self.position.x
            && p.x < self.position.x + size
            && p.y >= self.position.y
            && p.y < self.position.y + size
    }

    /// Drags the agent under the cursor and turns it while a rotate button is held.
    pub fn move_with_cursor(&mut self, cursor: Point, rotate_left: bool, rotate_right: bool) {
        if self.contains_point(cursor) {
            self.position.x = cursor.x - self.radius;
            self.position.y = cursor.y - self.radius;
            if rotate_left {
                self.orientation += 0.1;
            }
            if rotate_right {
                self.orientation -= 0.1;
            }
            self.prove_orientation();
            self.is_moved_with_cursor = true;
            self.draw_update();
        } else {
            self.is_moved_with_cursor = false;
        }
    }

    /// Bodies touch or overlap. Identity is the caller's concern.
    pub fn overlaps(&self, other: &Agent) -> bool {
        self.center().distance(&other.center()) <= self.radius + other.radius
    }

    pub fn reflect_from_walls(&mut self, boundary: Boundary) {
        let x = self.position.x + self.radius;
        let y = self.position.y + self.radius;
        let (x0, x1) = self.arena.x_bounds();
        let (y0, y1) = self.arena.y_bounds();

        match boundary {
            Boundary::BounceBack => {
                if x < x0 {
                    self.position.x = x0 - self.radius;
                    if (FRAC_PI_2..PI).contains(&self.orientation) {
                        self.orientation -= FRAC_PI_2;
                    } else if (PI..=3.0 * FRAC_PI_2).contains(&self.orientation) {
                        self.orientation += FRAC_PI_2;
                    }
                    self.prove_orientation();
                }

                if x > x1 {
                    self.position.x = x1 - self.radius - 1.0;
                    if (3.0 * FRAC_PI_2..TAU).contains(&self.orientation) {
                        self.orientation -= FRAC_PI_2;
                    } else if (0.0..=FRAC_PI_2).contains(&self.orientation) {
                        self.orientation += FRAC_PI_2;
                    }
                    self.prove_orientation();
                }

                if y < y0 {
                    self.position.y = y0 - self.radius;
                    if (FRAC_PI_2..=PI).contains(&self.orientation) {
                        self.orientation += FRAC_PI_2;
                    } else if (0.0..FRAC_PI_2).contains(&self.orientation) {
                        self.orientation -= FRAC_PI_2;
                    }
                    self.prove_orientation();
                }

                if y > y1 {
                    self.position.y = y1 - self.radius - 1.0;
                    if (3.0 * FRAC_PI_2..=TAU).contains(&self.orientation) {
                        self.orientation += FRAC_PI_2;
                    } else if (PI..3.0 * FRAC_PI_2).contains(&self.orientation) {
                        self.orientation -= FRAC_PI_2;
                    }
                    self.prove_orientation();
                }
            }
            Boundary::Infinite => {
                if x < x0 {
                    self.position.x = x1 - self.radius;
                } else if x > x1 {
                    self.position.x = x0 + self.radius;
                }

                if y < y0 {
                    self.position.y = y1 - self.radius;
                } else if y > y1 {
                    self.position.y = y0 + self.radius;
                }
            }
        }
    }

    /// Keeps the heading within [0, 2pi].
    pub fn prove_orientation(&mut self) {
        if self.orientation < 0.0 {
            self.orientation += TAU;
        }
        if self.orientation > TAU {
            self.orientation -= TAU;
        }
    }

    pub fn prove_velocity(&mut self) {
        if self.velocity.abs() > self.v_max {
            self.velocity = self.v_max;
        }
    }

    /// One timestep: steer, integrate, apply the boundary condition.
    pub fn update(&mut self, rng: &mut dyn RngCore) {
        // frozen while dragged
        if !self.is_moved_with_cursor {
            let steering = self.behavior.steer(self.velocity, self.orientation, rng);
            self.dv = steering.dv;
            self.dtheta = steering.dtheta;

            self.orientation += self.dt * self.dtheta;
            self.prove_orientation();
            self.velocity += self.dt * self.dv;
            self.prove_velocity();

            self.vx = self.velocity * self.orientation.cos();
            self.vy = self.velocity * self.orientation.sin();
            self.position.x += self.vx;
            // screen y grows downward
            self.position.y -= self.vy;

            self.reflect_from_walls(self.boundary);
            trace!(
                "Agent {} at ({:.1}, {:.1}) heading {:.2}",
                self.id, self.position.x, self.position.y, self.orientation
            );
        }

        self.draw_update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::Ballistic;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn agent_at(x: f64, y: f64, orientation: f64) -> Agent {
        Agent::new(
            0,
            10.0,
            Point::new(x, y),
            orientation,
            Arena::new(500, 500, 30),
            color::BLUE,
            Box::new(Ballistic),
        )
    }

    #[test]
    fn orientation_wraps_once() {
        let mut a = agent_at(100.0, 100.0, -0.5);
        a.prove_orientation();
        assert!((a.orientation - (TAU - 0.5)).abs() < 1e-12);

        a.orientation = TAU + 0.25;
        a.prove_orientation();
        assert!((a.orientation - 0.25).abs() < 1e-12);
    }

    #[test]
    fn velocity_is_capped() {
        let mut a = agent_at(100.0, 100.0, 0.0);
        a.velocity = 1.5;
        a.prove_velocity();
        assert_eq!(a.velocity, a.v_max);
    }

    #[test]
    fn moves_along_heading_with_screen_y_down() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut a = agent_at(100.0, 100.0, FRAC_PI_2);
        a.update(&mut rng);
        assert!((a.position.x - 100.0).abs() < 1e-9);
        assert!((a.position.y - 99.0).abs() < 1e-9);
        assert!((a.vy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn dragged_agent_stays_put() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut a = agent_at(100.0, 100.0, 0.0);
        a.is_moved_with_cursor = true;
        a.update(&mut rng);
        assert_eq!(a.position, Point::new(100.0, 100.0));
    }

    #[test]
    fn torus_wraps_to_opposite_side() {
        // centre at x = 29, left of the wall at 30
        let mut a = agent_at(19.0, 100.0, PI);
        a.reflect_from_walls(Boundary::Infinite);
        assert_eq!(a.position.x, 530.0 - 10.0);

        let mut a = agent_at(521.0, 100.0, 0.0);
        a.reflect_from_walls(Boundary::Infinite);
        assert_eq!(a.position.x, 30.0 + 10.0);

        let mut a = agent_at(100.0, 521.0, 0.0);
        a.reflect_from_walls(Boundary::Infinite);
        assert_eq!(a.position.y, 40.0);
    }

    #[test]
    fn bounce_off_left_wall_turns_away() {
        let mut a = agent_at(19.0, 100.0, 3.0 * PI / 4.0);
        a.reflect_from_walls(Boundary::BounceBack);
        assert_eq!(a.position.x, 20.0);
        assert!((a.orientation - PI / 4.0).abs() < 1e-12);
    }

    #[test]
    fn bounce_off_right_wall_turns_away() {
        let mut a = agent_at(521.0, 100.0, PI / 4.0);
        a.reflect_from_walls(Boundary::BounceBack);
        assert_eq!(a.position.x, 530.0 - 10.0 - 1.0);
        assert!((a.orientation - 3.0 * PI / 4.0).abs() < 1e-12);
    }

    #[test]
    fn bounce_off_top_and_bottom() {
        let mut a = agent_at(100.0, 19.0, PI / 4.0);
        a.reflect_from_walls(Boundary::BounceBack);
        assert_eq!(a.position.y, 20.0);
        assert!((a.orientation - (TAU - PI / 4.0)).abs() < 1e-12);

        let mut a = agent_at(100.0, 521.0, 5.0 * PI / 4.0);
        a.reflect_from_walls(Boundary::BounceBack);
        assert_eq!(a.position.y, 519.0);
        assert!((a.orientation - 3.0 * PI / 4.0).abs() < 1e-12);
    }

    #[test]
    fn cursor_grabs_and_rotates() {
        let mut a = agent_at(100.0, 100.0, 1.0);
        a.move_with_cursor(Point::new(105.0, 112.0), true, false);
        assert!(a.is_moved_with_cursor);
        assert_eq!(a.position, Point::new(95.0, 102.0));
        assert!((a.orientation - 1.1).abs() < 1e-12);
        assert_eq!(a.display_color(), color::LIGHT_BLUE);

        a.move_with_cursor(Point::new(400.0, 400.0), false, true);
        assert!(!a.is_moved_with_cursor);
        assert!((a.orientation - 1.1).abs() < 1e-12);
    }

    #[test]
    fn overlap_is_geometric_only() {
        let a = agent_at(100.0, 100.0, 0.0);
        let mut b = agent_at(115.0, 100.0, 0.0);
        assert_eq!(a.id, b.id);
        assert!(a.overlaps(&b));
        b.position.x = 120.0;
        assert!(a.overlaps(&b));
        b.position.x = 121.0;
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn boundary_names_and_aliases() {
        for name in ["bounce-back", "bounce_back", "Bounce", "BOUNCE-BACK"] {
            assert_eq!(name.parse::<Boundary>().unwrap(), Boundary::BounceBack);
        }
        for name in ["infinite", "torus", "Wrap"] {
            assert_eq!(name.parse::<Boundary>().unwrap(), Boundary::Infinite);
        }
        let err = "walls".parse::<Boundary>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown boundary condition: walls");
    }
}
