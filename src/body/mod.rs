use crate::{
    config,
    error::{require_positive, BodyField, SimError, SimResult},
    types::{BodyId, ColorDelta, Rgba, TracePoint, Vec2},
};

#[derive(Clone, Debug, PartialEq)]
pub struct BodyTemplate {
    pub name: Option<String>,
    pub pos: Vec2,
    pub vel: Vec2,
    pub mass: f64,
    pub radius: f64,
    pub color: Rgba,
}

impl BodyTemplate {
    pub fn new(pos: Vec2, mass: f64, radius: f64) -> Self {
        Self {
            name: None,
            pos,
            vel: Vec2::ZERO,
            mass,
            radius,
            color: Rgba::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    pub fn validate(&self) -> SimResult<()> {
        require_positive(BodyField::Mass, self.mass)?;
        require_positive(BodyField::Radius, self.radius)?;
        if !self.pos.is_finite() {
            return Err(SimError::InvalidEdit {
                field: BodyField::Position,
                value: f64::NAN,
            });
        }
        if !self.vel.is_finite() {
            return Err(SimError::InvalidEdit {
                field: BodyField::Velocity,
                value: f64::NAN,
            });
        }
        Ok(())
    }
}

impl Default for BodyTemplate {
    fn default() -> Self {
        Self::new(Vec2::ZERO, config::DEFAULT_MASS, config::DEFAULT_RADIUS)
    }
}

#[derive(Clone, Debug)]
pub struct Body {
    pub id: BodyId,
    pub name: String,
    pub pos: Vec2,
    pub vel: Vec2,
    mass: f64,
    radius: f64,
    pub color: Rgba,
    traces: Vec<TracePoint>,
    tick_counter: u32,
    trace_every: u32,
    draw_every: u32,
    pub trace_width: f32,
    pub focused: bool,
}

impl Body {
    pub fn new(id: BodyId, name: String, template: &BodyTemplate) -> Self {
        Self {
            id,
            name,
            pos: template.pos,
            vel: template.vel,
            mass: template.mass,
            radius: template.radius,
            color: template.color,
            traces: Vec::new(),
            tick_counter: 0,
            trace_every: config::DEFAULT_TRACE_EVERY,
            draw_every: config::DEFAULT_DRAW_EVERY,
            trace_width: config::DEFAULT_TRACE_WIDTH,
            focused: false,
        }
    }

    pub fn with_sampling(mut self, trace_every: u32, draw_every: u32) -> Self {
        self.trace_every = trace_every.max(1);
        self.draw_every = draw_every.max(1);
        self
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn traces(&self) -> &[TracePoint] {
        &self.traces
    }

    pub fn trace_every(&self) -> u32 {
        self.trace_every
    }

    pub fn draw_every(&self) -> u32 {
        self.draw_every
    }

    /// One explicit Euler step. A trace sample of the post-advance position
    /// is recorded once every `trace_every` calls.
    pub fn advance(&mut self, dt: f64, acc: Vec2) {
        self.vel += acc * dt;
        self.pos += self.vel * dt;
        self.record_trace();
    }

    fn record_trace(&mut self) {
        self.tick_counter += 1;
        if self.tick_counter >= self.trace_every {
            self.traces.push(TracePoint::from_position(self.pos));
            self.tick_counter = 0;
        }
    }

    pub fn reset_traces(&mut self) {
        self.traces.clear();
    }

    pub fn apply_color_delta(&mut self, delta: ColorDelta) {
        self.color = delta.apply(self.color);
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.pos = Vec2::new(x, y);
    }

    pub fn set_mass(&mut self, mass: f64) -> SimResult<()> {
        self.mass = require_positive(BodyField::Mass, mass)?;
        Ok(())
    }

    pub fn set_radius(&mut self, radius: f64) -> SimResult<()> {
        self.radius = require_positive(BodyField::Radius, radius)?;
        Ok(())
    }

    pub fn set_trace_every(&mut self, every: u32) -> SimResult<()> {
        if every == 0 {
            return Err(SimError::InvalidEdit {
                field: BodyField::TraceEvery,
                value: 0.0,
            });
        }
        self.trace_every = every;
        Ok(())
    }

    pub fn set_draw_every(&mut self, every: u32) -> SimResult<()> {
        if every == 0 {
            return Err(SimError::InvalidEdit {
                field: BodyField::DrawEvery,
                value: 0.0,
            });
        }
        self.draw_every = every;
        Ok(())
    }

    pub fn overlaps(&self, other: &Body) -> bool {
        circles_overlap(self.pos, self.radius, other.pos, other.radius)
    }

    pub fn absorb(&mut self, loser: &Body, radius_cap: f64) {
        self.mass += loser.mass / 2.0;
        self.radius = (self.radius + loser.radius / 4.0).min(radius_cap.max(self.radius));
        self.vel += loser.vel / self.mass;
    }

    pub fn trace_segments(&self) -> impl Iterator<Item = (TracePoint, TracePoint)> + '_ {
        let step = self.draw_every as usize;
        self.traces
            .windows(2)
            .enumerate()
            .filter(move |(idx, _)| idx % step == 0)
            .map(|(_, pair)| (pair[0], pair[1]))
    }
}

pub fn circles_overlap(a: Vec2, ra: f64, b: Vec2, rb: f64) -> bool {
    (b - a).length() <= ra + rb
}
