use serde::{Deserialize, Serialize};

use crate::types::Vec2;

pub const DEFAULT_TPS: u32 = 120;
pub const DEFAULT_G: f64 = 10_000.0;

pub const VIEW_WIDTH: f64 = 1280.0;
pub const VIEW_HEIGHT: f64 = 720.0;

pub const RADIUS_CAP: f64 = 1000.0;
pub const MIN_SEPARATION: f64 = 1.0e-3;

pub const DEFAULT_TRACE_EVERY: u32 = 5;
pub const DEFAULT_DRAW_EVERY: u32 = 1;
pub const DEFAULT_TRACE_WIDTH: f32 = 1.5;

pub const DEFAULT_RADIUS: f64 = 10.0;
pub const DEFAULT_MASS: f64 = 5.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub gravitational_constant: f64,
    pub tps: u32,
    pub view_width: f64,
    pub view_height: f64,
    pub radius_cap: f64,
    pub min_separation: f64,
    pub trace_every: u32,
    pub draw_every: u32,
    pub running: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravitational_constant: DEFAULT_G,
            tps: DEFAULT_TPS,
            view_width: VIEW_WIDTH,
            view_height: VIEW_HEIGHT,
            radius_cap: RADIUS_CAP,
            min_separation: MIN_SEPARATION,
            trace_every: DEFAULT_TRACE_EVERY,
            draw_every: DEFAULT_DRAW_EVERY,
            running: true,
        }
    }
}

impl SimConfig {
    pub fn default_camera_offset(&self) -> Vec2 {
        Vec2::new(self.view_width / 2.0, self.view_height / 2.0)
    }

    pub fn dt(&self) -> f64 {
        dt_for_rate(self.tps as f64)
    }
}

pub fn dt_for_rate(rate: f64) -> f64 {
    if rate.is_finite() && rate > 0.0 {
        1.0 / rate
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod sim_config {
        use super::*;

        #[test]
        fn default_offset_is_view_centre() {
            let config = SimConfig::default();
            assert_eq!(config.default_camera_offset(), Vec2::new(640.0, 360.0));
        }

        #[test]
        fn missing_fields_fall_back_to_defaults() {
            let config: SimConfig =
                serde_json::from_str(r#"{ "gravitational_constant": 1.5 }"#).unwrap();
            assert_eq!(config.gravitational_constant, 1.5);
            assert_eq!(config.tps, DEFAULT_TPS);
            assert_eq!(config.trace_every, DEFAULT_TRACE_EVERY);
            assert!(config.running);
        }
    }

    mod dt_for_rate {
        use super::*;

        #[test]
        fn inverts_rate() {
            assert_eq!(dt_for_rate(120.0), 1.0 / 120.0);
        }

        #[test]
        fn zero_rate_gives_zero_step() {
            assert_eq!(dt_for_rate(0.0), 0.0);
            assert_eq!(dt_for_rate(f64::NAN), 0.0);
        }
    }
}
