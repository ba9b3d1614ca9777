use crate::{
    body::Body,
    config,
    types::{BodyId, Vec2},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Merge {
    pub survivor: BodyId,
    pub absorbed: BodyId,
    pub survivor_mass: f64,
    pub survivor_radius: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepOutcome {
    pub merges: Vec<Merge>,
    pub degenerate_pairs: usize,
}

impl StepOutcome {
    pub fn absorbed(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.merges.iter().map(|m| m.absorbed)
    }
}

#[derive(Clone, Copy, Debug)]
struct Frozen {
    index: usize,
    pos: Vec2,
    mass: f64,
    radius: f64,
}

#[derive(Debug)]
pub struct Integrator {
    min_separation: f64,
    radius_cap: f64,
    frozen: Vec<Frozen>,
    forces: Vec<Vec2>,
    overlaps: Vec<(usize, usize)>,
    absorbed: Vec<bool>,
}

impl Default for Integrator {
    fn default() -> Self {
        Self::new(config::MIN_SEPARATION, config::RADIUS_CAP)
    }
}

impl Integrator {
    pub fn new(min_separation: f64, radius_cap: f64) -> Self {
        Self {
            min_separation: positive_or(min_separation, config::MIN_SEPARATION),
            radius_cap: positive_or(radius_cap, config::RADIUS_CAP),
            frozen: Vec::new(),
            forces: Vec::new(),
            overlaps: Vec::new(),
            absorbed: Vec::new(),
        }
    }

    /// Advances `bodies` by one tick of length `dt` under gravitational
    /// constant `g`. Bodies whose id is in `excluded` take no part at all.
    pub fn step(
        &mut self,
        bodies: &mut [Body],
        excluded: &[BodyId],
        dt: f64,
        g: f64,
    ) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        self.freeze(bodies, excluded);
        outcome.degenerate_pairs = self.accumulate_forces(bodies, g);
        self.resolve_merges(bodies, &mut outcome);
        self.commit(bodies, dt);
        outcome
    }

    fn freeze(&mut self, bodies: &[Body], excluded: &[BodyId]) {
        self.frozen.clear();
        self.frozen.extend(
            bodies
                .iter()
                .enumerate()
                .filter(|(_, b)| !excluded.contains(&b.id))
                .map(|(index, b)| Frozen {
                    index,
                    pos: b.pos,
                    mass: b.mass(),
                    radius: b.radius(),
                }),
        );
        self.forces.clear();
        self.forces.resize(self.frozen.len(), Vec2::ZERO);
        self.absorbed.clear();
        self.absorbed.resize(self.frozen.len(), false);
        self.overlaps.clear();
    }

    fn accumulate_forces(&mut self, bodies: &[Body], g: f64) -> usize {
        let n = self.frozen.len();
        if n < 2 {
            return 0;
        }

        let mut degenerate = 0;
        for a in 0..n {
            let p = self.frozen[a];
            let mut force = Vec2::ZERO;
            for b in 0..n {
                if a == b {
                    continue;
                }
                let q = self.frozen[b];
                let delta = q.pos - p.pos;
                let dist = delta.length();
                if a < b && dist <= p.radius + q.radius {
                    self.overlaps.push((a, b));
                }

                let dir = delta.normalize();
                if dir == Vec2::ZERO {
                    if a < b {
                        degenerate += 1;
                        log::trace!(
                            "bodies {} and {} coincide, skipping their attraction",
                            bodies[p.index].id,
                            bodies[q.index].id
                        );
                    }
                    continue;
                }
                let dist = dist.max(self.min_separation);
                force += dir * (g * (p.mass * q.mass) / (dist * dist));
            }
            self.forces[a] = force;
        }
        degenerate
    }

    fn resolve_merges(&mut self, bodies: &mut [Body], outcome: &mut StepOutcome) {
        for &(a, b) in &self.overlaps {
            if self.absorbed[a] || self.absorbed[b] {
                continue;
            }
            let (ia, ib) = (self.frozen[a].index, self.frozen[b].index);
            // `a` precedes `b` in collection order, so it wins ties.
            let (winner, loser, loser_slot) = if bodies[ia].mass() >= bodies[ib].mass() {
                (ia, ib, b)
            } else {
                (ib, ia, a)
            };

            let (survivor, absorbed) = pair_mut(bodies, winner, loser);
            survivor.absorb(absorbed, self.radius_cap);
            self.absorbed[loser_slot] = true;

            log::debug!(
                "body {} absorbed body {} (mass {:.2}, radius {:.2})",
                survivor.id,
                absorbed.id,
                survivor.mass(),
                survivor.radius()
            );
            outcome.merges.push(Merge {
                survivor: survivor.id,
                absorbed: absorbed.id,
                survivor_mass: survivor.mass(),
                survivor_radius: survivor.radius(),
            });
        }
    }

    fn commit(&self, bodies: &mut [Body], dt: f64) {
        for (slot, frozen) in self.frozen.iter().enumerate() {
            if self.absorbed[slot] {
                continue;
            }
            let acc = self.forces[slot] / frozen.mass;
            bodies[frozen.index].advance(dt, acc);
        }
    }
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    debug_assert_ne!(i, j, "pair_mut needs distinct indices");
    if i < j {
        let (left, right) = bodies.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = bodies.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyTemplate;

    fn body(id: BodyId, x: f64, y: f64, mass: f64, radius: f64) -> Body {
        Body::new(
            id,
            format!("b{}", id),
            &BodyTemplate::new(Vec2::new(x, y), mass, radius),
        )
    }

    mod forces {
        use super::*;

        #[test]
        fn single_body_feels_no_force() {
            let mut bodies = vec![body(1, 0.0, 0.0, 10.0, 1.0)];
            bodies[0].vel = Vec2::new(3.0, -1.0);
            let mut integrator = Integrator::default();
            let outcome = integrator.step(&mut bodies, &[], 0.5, 10_000.0);
            assert!(outcome.merges.is_empty());
            assert_eq!(bodies[0].vel, Vec2::new(3.0, -1.0));
            assert_eq!(bodies[0].pos, Vec2::new(1.5, -0.5));
        }

        #[test]
        fn inverse_square_attraction() {
            let mut bodies = vec![body(1, 0.0, 0.0, 2.0, 1.0), body(2, 10.0, 0.0, 3.0, 1.0)];
            let mut integrator = Integrator::default();
            integrator.step(&mut bodies, &[], 1.0, 1.0);
            // F = 1 * 2 * 3 / 100
            assert!((bodies[0].vel.x - 0.06 / 2.0).abs() < 1e-12);
            assert!((bodies[1].vel.x + 0.06 / 3.0).abs() < 1e-12);
            assert_eq!(bodies[0].vel.y, 0.0);
        }

        #[test]
        fn momentum_is_conserved_without_merges() {
            let mut bodies = vec![
                body(1, 0.0, 0.0, 2.0, 1.0),
                body(2, 10.0, 5.0, 3.0, 1.0),
                body(3, -7.0, 4.0, 5.0, 1.0),
            ];
            let mut integrator = Integrator::default();
            for _ in 0..10 {
                integrator.step(&mut bodies, &[], 0.01, 50.0);
            }
            let momentum = bodies
                .iter()
                .fold(Vec2::ZERO, |acc, b| acc + b.vel * b.mass());
            assert!(momentum.length() < 1e-9);
        }

        #[test]
        fn result_does_not_depend_on_collection_order() {
            let make = || {
                vec![
                    body(1, 0.0, 0.0, 2.0, 1.0),
                    body(2, 10.0, 5.0, 3.0, 1.0),
                    body(3, -7.0, 4.0, 5.0, 1.0),
                ]
            };
            let mut forward = make();
            let mut reversed = make();
            reversed.reverse();

            let mut integrator = Integrator::default();
            integrator.step(&mut forward, &[], 0.1, 100.0);
            integrator.step(&mut reversed, &[], 0.1, 100.0);

            for b in &forward {
                let other = reversed.iter().find(|o| o.id == b.id).unwrap();
                assert_eq!(b.pos, other.pos);
                assert_eq!(b.vel, other.vel);
            }
        }

        #[test]
        fn coincident_bodies_stay_finite() {
            let mut bodies = vec![body(1, 5.0, 5.0, 1.0, 0.5), body(2, 5.0, 5.0, 1.0, 0.5)];
            let mut integrator = Integrator::default();
            let outcome = integrator.step(&mut bodies, &[], 0.1, 10_000.0);
            assert_eq!(outcome.degenerate_pairs, 1);
            assert!(bodies.iter().all(|b| b.pos.is_finite() && b.vel.is_finite()));
        }

        #[test]
        fn near_coincident_force_is_clamped() {
            let mut bodies = vec![body(1, 0.0, 0.0, 1.0, 0.1), body(2, 1e-9, 0.0, 1.0, 0.1)];
            let mut integrator = Integrator::new(1.0, 1000.0);
            integrator.step(&mut bodies, &[], 1.0, 1.0);
            // distance clamped to 1.0, so |F| = 1
            assert!(bodies[0].vel.is_finite());
            assert!((bodies[0].vel.x - 1.0).abs() < 1e-12);
        }

        #[test]
        fn excluded_body_neither_exerts_nor_receives() {
            let mut bodies = vec![body(1, 0.0, 0.0, 2.0, 1.0), body(2, 10.0, 0.0, 3.0, 1.0)];
            let mut integrator = Integrator::default();
            integrator.step(&mut bodies, &[2], 1.0, 1.0);
            assert_eq!(bodies[0].vel, Vec2::ZERO);
            assert_eq!(bodies[1].vel, Vec2::ZERO);
            assert_eq!(bodies[1].pos, Vec2::new(10.0, 0.0));
            assert!(bodies[1].traces().is_empty());
        }
    }

    mod merges {
        use super::*;

        #[test]
        fn heavier_body_absorbs_lighter() {
            let mut bodies = vec![body(1, 0.0, 0.0, 10.0, 8.0), body(2, 5.0, 0.0, 4.0, 4.0)];
            let mut integrator = Integrator::default();
            let outcome = integrator.step(&mut bodies, &[], 0.0, 1.0);
            assert_eq!(outcome.merges.len(), 1);
            let merge = outcome.merges[0];
            assert_eq!(merge.survivor, 1);
            assert_eq!(merge.absorbed, 2);
            assert_eq!(bodies[0].mass(), 12.0);
            assert_eq!(bodies[0].radius(), 9.0);
        }

        #[test]
        fn lighter_outer_body_loses() {
            let mut bodies = vec![body(1, 0.0, 0.0, 4.0, 4.0), body(2, 5.0, 0.0, 10.0, 8.0)];
            let mut integrator = Integrator::default();
            let outcome = integrator.step(&mut bodies, &[], 0.0, 1.0);
            assert_eq!(outcome.absorbed().collect::<Vec<_>>(), vec![1]);
            assert_eq!(bodies[1].mass(), 12.0);
        }

        #[test]
        fn equal_masses_favour_earlier_body() {
            let mut bodies = vec![body(7, 0.0, 0.0, 5.0, 2.0), body(3, 1.0, 0.0, 5.0, 2.0)];
            let mut integrator = Integrator::default();
            let outcome = integrator.step(&mut bodies, &[], 0.0, 1.0);
            assert_eq!(outcome.merges[0].survivor, 7);

            let mut swapped = vec![body(3, 1.0, 0.0, 5.0, 2.0), body(7, 0.0, 0.0, 5.0, 2.0)];
            let outcome = integrator.step(&mut swapped, &[], 0.0, 1.0);
            assert_eq!(outcome.merges[0].survivor, 3);
        }

        #[test]
        fn absorbed_body_is_not_advanced() {
            let mut bodies = vec![body(1, 0.0, 0.0, 10.0, 8.0), body(2, 5.0, 0.0, 4.0, 4.0)];
            bodies[1].vel = Vec2::new(1.0, 0.0);
            let mut integrator = Integrator::default();
            integrator.step(&mut bodies, &[], 1.0, 0.0);
            assert_eq!(bodies[1].pos, Vec2::new(5.0, 0.0));
        }

        #[test]
        fn each_body_merges_at_most_once_as_loser() {
            // three mutually overlapping bodies: the heaviest takes both others
            let mut bodies = vec![
                body(1, 0.0, 0.0, 10.0, 4.0),
                body(2, 1.0, 0.0, 2.0, 4.0),
                body(3, 0.0, 1.0, 2.0, 4.0),
            ];
            let mut integrator = Integrator::default();
            let outcome = integrator.step(&mut bodies, &[], 0.0, 1.0);
            assert_eq!(outcome.merges.len(), 2);
            assert!(outcome.merges.iter().all(|m| m.survivor == 1));
            assert_eq!(bodies[0].mass(), 12.0);
            assert_eq!(bodies[0].radius(), 6.0);
        }

        #[test]
        fn overlapping_pair_still_attracts_this_tick() {
            let mut bodies = vec![body(1, 0.0, 0.0, 10.0, 8.0), body(2, 5.0, 0.0, 4.0, 4.0)];
            let mut integrator = Integrator::default();
            integrator.step(&mut bodies, &[], 1.0, 1.0);
            // force 40/25 over frozen mass 10, plus zero velocity bump from a resting loser
            assert!((bodies[0].vel.x - 0.16).abs() < 1e-12);
        }
    }

    mod new {
        use super::*;

        #[test]
        fn invalid_parameters_fall_back_to_defaults() {
            for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
                let integrator = Integrator::new(bad, bad);
                assert_eq!(integrator.min_separation, config::MIN_SEPARATION);
                assert_eq!(integrator.radius_cap, config::RADIUS_CAP);
            }
        }

        #[test]
        fn radius_still_grows_with_invalid_cap() {
            let mut bodies = vec![body(1, 0.0, 0.0, 10.0, 8.0), body(2, 5.0, 0.0, 4.0, 4.0)];
            let mut integrator = Integrator::new(1.0, f64::NAN);
            integrator.step(&mut bodies, &[], 0.0, 1.0);
            assert_eq!(bodies[0].radius(), 9.0);
        }
    }

    mod pair_mut {
        use super::*;

        #[test]
        fn returns_requested_order() {
            let mut bodies = vec![body(1, 0.0, 0.0, 1.0, 1.0), body(2, 0.0, 0.0, 1.0, 1.0)];
            let (a, b) = pair_mut(&mut bodies, 1, 0);
            assert_eq!((a.id, b.id), (2, 1));
            let (a, b) = pair_mut(&mut bodies, 0, 1);
            assert_eq!((a.id, b.id), (1, 2));
        }
    }
}
