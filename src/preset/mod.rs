use std::{fmt, str::FromStr};

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    body::{Body, BodyTemplate},
    config,
    types::{Rgba, Vec2},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyRecord {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub mass: f64,
    pub velocity: Vec2,
    pub color: Rgba,
}

impl BodyRecord {
    pub fn to_template(&self) -> BodyTemplate {
        BodyTemplate::new(Vec2::new(self.x, self.y), self.mass, self.radius)
            .named(self.name.clone())
            .with_velocity(self.velocity)
            .with_color(self.color)
    }
}

impl From<&Body> for BodyRecord {
    fn from(body: &Body) -> Self {
        Self {
            name: body.name.clone(),
            x: body.pos.x,
            y: body.pos.y,
            radius: body.radius(),
            mass: body.mass(),
            velocity: body.vel,
            color: body.color,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanetPresets {
    pub presets: Vec<BodyRecord>,
}

impl PlanetPresets {
    pub fn add(&mut self, record: BodyRecord) {
        match self.presets.iter_mut().find(|p| p.name == record.name) {
            Some(existing) => *existing = record,
            None => self.presets.push(record),
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<BodyRecord> {
        (index < self.presets.len()).then(|| self.presets.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&BodyRecord> {
        self.presets.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationPreset {
    pub name: String,
    pub bodies: Vec<BodyRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationPresets {
    pub presets: Vec<SimulationPreset>,
}

impl SimulationPresets {
    pub fn save(&mut self, name: impl Into<String>, bodies: Vec<BodyRecord>) {
        self.presets.push(SimulationPreset {
            name: name.into(),
            bodies,
        });
    }

    pub fn remove(&mut self, index: usize) -> Option<SimulationPreset> {
        (index < self.presets.len()).then(|| self.presets.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&SimulationPreset> {
        self.presets.get(index)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scenario {
    Binary,
    Solar,
    Scatter,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Binary, Scenario::Solar, Scenario::Scatter];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Binary => "binary",
            Scenario::Solar => "solar",
            Scenario::Scatter => "scatter",
        }
    }

    pub fn records(self, g: f64, seed: u64) -> Vec<BodyRecord> {
        match self {
            Scenario::Binary => binary(g),
            Scenario::Solar => solar(g),
            Scenario::Scatter => scatter(seed),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<&str> = Scenario::ALL.iter().map(|s| s.name()).collect();
                format!("unknown scenario '{}', expected one of: {}", s, known.join(", "))
            })
    }
}

pub fn random_color(rng: &mut impl Rng) -> Rgba {
    Rgba::opaque(
        rng.gen_range(0..=255),
        rng.gen_range(0..=255),
        rng.gen_range(0..=255),
    )
}

fn record(name: &str, pos: Vec2, vel: Vec2, mass: f64, radius: f64, color: Rgba) -> BodyRecord {
    BodyRecord {
        name: name.to_string(),
        x: pos.x,
        y: pos.y,
        radius,
        mass,
        velocity: vel,
        color,
    }
}

fn orbital_speed(g: f64, m: f64, r: f64) -> f64 {
    let v_sq = g * m / r;
    if v_sq.is_finite() && v_sq > 0.0 {
        v_sq.sqrt()
    } else {
        0.0
    }
}

fn binary(g: f64) -> Vec<BodyRecord> {
    let mass = 200.0;
    let half_sep = 100.0;
    // each star orbits the barycentre at half the separation
    let v = orbital_speed(g, mass, 4.0 * half_sep);
    vec![
        record(
            "Alpha",
            Vec2::new(-half_sep, 0.0),
            Vec2::new(0.0, -v),
            mass,
            20.0,
            Rgba::opaque(255, 200, 80),
        ),
        record(
            "Beta",
            Vec2::new(half_sep, 0.0),
            Vec2::new(0.0, v),
            mass,
            20.0,
            Rgba::opaque(120, 160, 255),
        ),
    ]
}

fn solar(g: f64) -> Vec<BodyRecord> {
    let sun_mass = 1000.0;
    let mut bodies = vec![record(
        "Sun",
        Vec2::ZERO,
        Vec2::ZERO,
        sun_mass,
        30.0,
        Rgba::opaque(255, 220, 0),
    )];
    let planets = [
        ("Inner", 150.0, 5.0, 8.0, Rgba::opaque(200, 120, 90)),
        ("Middle", 250.0, 10.0, 10.0, Rgba::opaque(70, 140, 255)),
        ("Outer", 350.0, 3.0, 6.0, Rgba::opaque(160, 255, 160)),
    ];
    for (name, r, mass, radius, color) in planets {
        let v = orbital_speed(g, sun_mass, r);
        bodies.push(record(name, Vec2::new(r, 0.0), Vec2::new(0.0, v), mass, radius, color));
    }
    bodies
}

fn scatter(seed: u64) -> Vec<BodyRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let half_w = config::VIEW_WIDTH / 2.0 - 50.0;
    let half_h = config::VIEW_HEIGHT / 2.0 - 50.0;
    (1..=24)
        .map(|n| {
            let mass = rng.gen_range(1.0..20.0);
            let pos = Vec2::new(rng.gen_range(-half_w..half_w), rng.gen_range(-half_h..half_h));
            let vel = Vec2::new(rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0));
            let color = random_color(&mut rng);
            record(&format!("Planet {}", n), pos, vel, mass, 3.0 + mass * 0.4, color)
        })
        .collect()
}
