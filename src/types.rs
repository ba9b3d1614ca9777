use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length_sq(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f64 {
        self.length_sq().sqrt()
    }

    /// Unit vector in the same direction, or `Vec2::ZERO` for a zero vector.
    pub fn normalize(self) -> Vec2 {
        let len = self.length();
        if len > 0.0 {
            Vec2::new(self.x / len, self.y / len)
        } else {
            Vec2::ZERO
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Vec2> for f64 {
    type Output = Vec2;

    fn mul(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self * rhs.x, self * rhs.y)
    }
}

impl Div<f64> for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

pub type BodyId = u64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TracePoint {
    pub x: i64,
    pub y: i64,
}

impl TracePoint {
    pub fn from_position(pos: Vec2) -> Self {
        Self {
            x: pos.x.round() as i64,
            y: pos.y.round() as i64,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const RED: Rgba = Rgba::new(255, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::RED
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColorDelta {
    pub r: Option<u8>,
    pub g: Option<u8>,
    pub b: Option<u8>,
    pub a: Option<u8>,
}

impl ColorDelta {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: Some(r),
            g: Some(g),
            b: Some(b),
            a: None,
        }
    }

    pub fn apply(&self, color: Rgba) -> Rgba {
        Rgba {
            r: self.r.unwrap_or(color.r),
            g: self.g.unwrap_or(color.g),
            b: self.b.unwrap_or(color.b),
            a: self.a.unwrap_or(color.a),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub name: String,
    pub pos: Vec2,
    pub screen_pos: Vec2,
    pub vel: Vec2,
    pub mass: f64,
    pub radius: f64,
    pub color: Rgba,
    pub trace_len: usize,
    pub selected: bool,
    pub focused: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimStats {
    pub body_count: usize,
    pub pending_removals: usize,
    pub total_mass: f64,
    pub kinetic_energy: f64,
    pub ticks: u64,
    pub merges: u64,
    pub running: bool,
}
