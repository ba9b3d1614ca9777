use std::fmt;

use crate::types::BodyId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyField {
    Mass,
    Radius,
    TraceEvery,
    DrawEvery,
    TraceWidth,
    Position,
    Velocity,
}

impl fmt::Display for BodyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BodyField::Mass => "mass",
            BodyField::Radius => "radius",
            BodyField::TraceEvery => "trace interval",
            BodyField::DrawEvery => "draw interval",
            BodyField::TraceWidth => "trace width",
            BodyField::Position => "position",
            BodyField::Velocity => "velocity",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    CollisionOnSpawn { blocking: BodyId },
    InvalidEdit { field: BodyField, value: f64 },
    UnknownId(BodyId),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::CollisionOnSpawn { blocking } => {
                write!(f, "spawn rejected: overlaps body {}", blocking)
            }
            SimError::InvalidEdit { field, value } => {
                write!(f, "invalid {}: {} (must be positive and finite)", field, value)
            }
            SimError::UnknownId(id) => write!(f, "no body with id {}", id),
        }
    }
}

impl std::error::Error for SimError {}

pub type SimResult<T> = Result<T, SimError>;

pub(crate) fn require_positive(field: BodyField, value: f64) -> SimResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SimError::InvalidEdit { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_positive_rejects_zero_negative_and_nan() {
        assert!(require_positive(BodyField::Mass, 1.0).is_ok());
        assert_eq!(
            require_positive(BodyField::Mass, 0.0),
            Err(SimError::InvalidEdit {
                field: BodyField::Mass,
                value: 0.0
            })
        );
        assert!(require_positive(BodyField::Radius, -3.0).is_err());
        assert!(require_positive(BodyField::Radius, f64::NAN).is_err());
        assert!(require_positive(BodyField::Radius, f64::INFINITY).is_err());
    }

    #[test]
    fn messages_name_the_problem() {
        assert_eq!(
            SimError::UnknownId(7).to_string(),
            "no body with id 7"
        );
        assert_eq!(
            SimError::CollisionOnSpawn { blocking: 2 }.to_string(),
            "spawn rejected: overlaps body 2"
        );
        let msg = SimError::InvalidEdit {
            field: BodyField::Radius,
            value: -1.0,
        }
        .to_string();
        assert!(msg.starts_with("invalid radius: -1"));
    }
}
