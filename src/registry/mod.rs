use crate::{
    body::{circles_overlap, Body, BodyTemplate},
    camera::Camera,
    config::{self, SimConfig},
    error::{require_positive, BodyField, SimError, SimResult},
    integrator::{Integrator, Merge},
    preset::BodyRecord,
    types::{BodyId, BodySnapshot, ColorDelta, SimStats, Vec2},
};

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Spawned { id: BodyId },
    Merged(Merge),
    Removed { id: BodyId },
}

pub struct Registry {
    config: SimConfig,
    bodies: Vec<Body>,
    pending_removals: Vec<BodyId>,
    camera: Camera,
    selected: Option<BodyId>,
    focused: Option<BodyId>,
    gravitational_constant: f64,
    running: bool,
    integrator: Integrator,
    events: Vec<Event>,
    next_id: BodyId,
    spawn_counter: u64,
    ticks: u64,
    merges: u64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl Registry {
    pub fn new(config: SimConfig) -> Self {
        Self {
            camera: Camera::new(config.default_camera_offset()),
            gravitational_constant: config.gravitational_constant,
            running: config.running,
            integrator: Integrator::new(config.min_separation, config.radius_cap),
            bodies: Vec::new(),
            pending_removals: Vec::new(),
            selected: None,
            focused: None,
            events: Vec::new(),
            next_id: 1,
            spawn_counter: 0,
            ticks: 0,
            merges: 0,
            config,
        }
    }

    /// Advances one tick if running, then applies every pending removal.
    /// Structural commands keep working while paused. A non-finite or
    /// negative `dt` skips the tick.
    pub fn step(&mut self, dt: f64) {
        if self.running && !(dt.is_finite() && dt >= 0.0) {
            log::warn!("skipping tick with invalid step length {}", dt);
        } else if self.running {
            let outcome = self.integrator.step(
                &mut self.bodies,
                &self.pending_removals,
                dt,
                self.gravitational_constant,
            );
            for merge in outcome.merges {
                self.schedule_removal(merge.absorbed);
                self.merges += 1;
                self.events.push(Event::Merged(merge));
            }
            self.ticks += 1;
        }
        self.apply_removals();
        self.follow_focus();
    }

    pub fn step_at_rate(&mut self, rate: f64) {
        self.step(config::dt_for_rate(rate));
    }

    pub fn spawn(&mut self, template: BodyTemplate) -> SimResult<BodyId> {
        template.validate()?;
        if let Some(blocking) = self
            .bodies
            .iter()
            .find(|b| circles_overlap(b.pos, b.radius(), template.pos, template.radius))
        {
            log::debug!(
                "spawn at ({:.1}, {:.1}) blocked by body {}",
                template.pos.x,
                template.pos.y,
                blocking.id
            );
            return Err(SimError::CollisionOnSpawn {
                blocking: blocking.id,
            });
        }

        let id = self.next_id;
        self.next_id += 1;
        self.spawn_counter += 1;
        let name = template
            .name
            .clone()
            .unwrap_or_else(|| format!("Planet {}", self.spawn_counter));
        let body = Body::new(id, name, &template)
            .with_sampling(self.config.trace_every, self.config.draw_every);
        log::debug!(
            "spawned body {} '{}' mass {:.2} radius {:.2}",
            id,
            body.name,
            body.mass(),
            body.radius()
        );
        self.bodies.push(body);
        self.events.push(Event::Spawned { id });

        if self.selected.is_none() {
            self.selected = Some(id);
        }
        Ok(id)
    }

    /// Queues `id` for deletion at the end of the current tick. Marking twice
    /// is harmless.
    pub fn mark_for_removal(&mut self, id: BodyId) -> SimResult<()> {
        self.index_of(id).ok_or(SimError::UnknownId(id))?;
        self.schedule_removal(id);
        Ok(())
    }

    fn schedule_removal(&mut self, id: BodyId) {
        if !self.pending_removals.contains(&id) {
            self.pending_removals.push(id);
        }
    }

    /// Deletes every pending body. Call between ticks only.
    pub fn apply_removals(&mut self) {
        if self.pending_removals.is_empty() {
            return;
        }
        let removed = std::mem::take(&mut self.pending_removals);
        self.bodies.retain(|b| !removed.contains(&b.id));
        if self.selected.is_some_and(|id| removed.contains(&id)) {
            self.selected = None;
        }
        if self.focused.is_some_and(|id| removed.contains(&id)) {
            self.focused = None;
        }
        for id in removed {
            log::debug!("removed body {}", id);
            self.events.push(Event::Removed { id });
        }
    }

    pub fn select(&mut self, id: BodyId) -> SimResult<()> {
        self.index_of(id).ok_or(SimError::UnknownId(id))?;
        self.selected = Some(id);
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn remove_selected(&mut self) -> Option<BodyId> {
        let id = self.selected.take()?;
        self.schedule_removal(id);
        Some(id)
    }

    pub fn focus(&mut self, id: BodyId) -> SimResult<()> {
        let idx = self.index_of(id).ok_or(SimError::UnknownId(id))?;
        for body in &mut self.bodies {
            body.focused = body.id == id;
        }
        self.focused = Some(id);
        self.camera.center_on(self.bodies[idx].pos);
        Ok(())
    }

    pub fn clear_focus(&mut self) {
        for body in &mut self.bodies {
            body.focused = false;
        }
        self.focused = None;
    }

    fn follow_focus(&mut self) {
        let Some(id) = self.focused else {
            return;
        };
        if let Some(body) = self.bodies.iter().find(|b| b.id == id) {
            self.camera.center_on(body.pos);
        }
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.camera.pan(dx, dy);
    }

    pub fn return_to_origin(&mut self) {
        let undone = self.camera.return_to_origin();
        log::trace!("camera returned to origin by ({:.1}, {:.1})", -undone.x, -undone.y);
    }

    pub fn reset(&mut self) {
        log::info!("resetting simulation ({} bodies)", self.bodies.len());
        self.bodies.clear();
        self.pending_removals.clear();
        self.selected = None;
        self.focused = None;
        self.camera.return_to_origin();
        self.events.clear();
        self.spawn_counter = 0;
        self.ticks = 0;
        self.merges = 0;
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn toggle_running(&mut self) -> bool {
        self.running = !self.running;
        self.running
    }

    pub fn set_gravitational_constant(&mut self, g: f64) {
        if g.is_finite() {
            self.gravitational_constant = g;
        } else {
            log::warn!("ignoring non-finite gravitational constant {}", g);
        }
    }

    pub fn pick(&self, screen: Vec2) -> Option<BodyId> {
        let world = self.camera.screen_to_world(screen);
        self.bodies
            .iter()
            .find(|b| {
                (world.x - b.pos.x).abs() <= b.radius() && (world.y - b.pos.y).abs() <= b.radius()
            })
            .map(|b| b.id)
    }

    fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.iter().position(|b| b.id == id)
    }

    fn body_mut(&mut self, id: BodyId) -> SimResult<&mut Body> {
        self.bodies
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(SimError::UnknownId(id))
    }

    pub fn set_name(&mut self, id: BodyId, name: impl Into<String>) -> SimResult<()> {
        self.body_mut(id)?.name = name.into();
        Ok(())
    }

    pub fn set_mass(&mut self, id: BodyId, mass: f64) -> SimResult<()> {
        self.body_mut(id)?.set_mass(mass)
    }

    pub fn set_radius(&mut self, id: BodyId, radius: f64) -> SimResult<()> {
        self.body_mut(id)?.set_radius(radius)
    }

    pub fn set_position(&mut self, id: BodyId, x: f64, y: f64) -> SimResult<()> {
        let pos = Vec2::new(x, y);
        if !pos.is_finite() {
            return Err(SimError::InvalidEdit {
                field: BodyField::Position,
                value: if x.is_finite() { y } else { x },
            });
        }
        self.body_mut(id)?.set_position(x, y);
        Ok(())
    }

    pub fn set_velocity(&mut self, id: BodyId, vel: Vec2) -> SimResult<()> {
        if !vel.is_finite() {
            return Err(SimError::InvalidEdit {
                field: BodyField::Velocity,
                value: if vel.x.is_finite() { vel.y } else { vel.x },
            });
        }
        self.body_mut(id)?.vel = vel;
        Ok(())
    }

    pub fn apply_color_delta(&mut self, id: BodyId, delta: ColorDelta) -> SimResult<()> {
        self.body_mut(id)?.apply_color_delta(delta);
        Ok(())
    }

    pub fn set_trace_every(&mut self, id: BodyId, every: u32) -> SimResult<()> {
        self.body_mut(id)?.set_trace_every(every)
    }

    pub fn set_draw_every(&mut self, id: BodyId, every: u32) -> SimResult<()> {
        self.body_mut(id)?.set_draw_every(every)
    }

    pub fn set_trace_width(&mut self, id: BodyId, width: f32) -> SimResult<()> {
        let width = require_positive(BodyField::TraceWidth, width as f64)? as f32;
        self.body_mut(id)?.trace_width = width;
        Ok(())
    }

    pub fn clear_traces(&mut self, id: BodyId) -> SimResult<()> {
        self.body_mut(id)?.reset_traces();
        Ok(())
    }

    pub fn clear_all_traces(&mut self) {
        for body in &mut self.bodies {
            body.reset_traces();
        }
    }

    pub fn load_scenario(&mut self, records: &[BodyRecord]) -> usize {
        let mut loaded = 0;
        for record in records {
            match self.spawn(record.to_template()) {
                Ok(_) => loaded += 1,
                Err(err) => log::warn!("skipping '{}': {}", record.name, err),
            }
        }
        self.running = false;
        log::info!("loaded {} of {} bodies", loaded, records.len());
        loaded
    }

    pub fn to_records(&self) -> Vec<BodyRecord> {
        self.bodies.iter().map(BodyRecord::from).collect()
    }

    pub fn snapshot(&self, out: &mut Vec<BodySnapshot>) {
        out.clear();
        out.extend(self.bodies.iter().map(|body| BodySnapshot {
            id: body.id,
            name: body.name.clone(),
            pos: body.pos,
            screen_pos: self.camera.world_to_screen(body.pos),
            vel: body.vel,
            mass: body.mass(),
            radius: body.radius(),
            color: body.color,
            trace_len: body.traces().len(),
            selected: self.selected == Some(body.id),
            focused: self.focused == Some(body.id),
        }));
    }

    pub fn stats(&self) -> SimStats {
        let mut stats = SimStats {
            body_count: self.bodies.len(),
            pending_removals: self.pending_removals.len(),
            ticks: self.ticks,
            merges: self.merges,
            running: self.running,
            ..SimStats::default()
        };
        for body in &self.bodies {
            stats.total_mass += body.mass();
            stats.kinetic_energy += 0.5 * body.mass() * body.vel.length_sq();
        }
        stats
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn pending_removals(&self) -> &[BodyId] {
        &self.pending_removals
    }

    pub fn selected(&self) -> Option<BodyId> {
        self.selected
    }

    pub fn focused(&self) -> Option<BodyId> {
        self.focused
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn gravitational_constant(&self) -> f64 {
        self.gravitational_constant
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
