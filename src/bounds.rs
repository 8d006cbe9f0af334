use crate::{
    error::{MetaballError, Result},
    field::Ball,
    types::Value,
};

/// Extra space left between the balls and the faces of the bounding cube.
pub const BOUNDS_MARGIN: Value = 1.;

/// An axis-aligned cube spanning `[min, max]` on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingCube {
    pub min: Value,
    pub max: Value,
}

impl BoundingCube {
    /// Returns the smallest cube enclosing every ball, padded by `radius` and
    /// [`BOUNDS_MARGIN`].
    ///
    /// The same extent is used on all three axes so lattice cells stay cubic:
    ///
    /// ```text
    /// min = min over balls and axes of (p - radius) - margin
    /// max = max over balls and axes of (p + radius) + margin
    /// ```
    ///
    /// Returns [`MetaballError::EmptyField`] when there are no balls and
    /// [`MetaballError::InvalidRadius`] for a negative or non-finite radius.
    pub fn enclosing(balls: &[Ball], radius: Value) -> Result<Self> {
        if balls.is_empty() {
            return Err(MetaballError::EmptyField);
        }
        if !radius.is_finite() || radius < 0. {
            return Err(MetaballError::InvalidRadius(radius));
        }

        let (lo, hi) = balls.iter().fold(
            (Value::INFINITY, Value::NEG_INFINITY),
            |(lo, hi), ball| {
                let p = &ball.position;
                (lo.min(p.x).min(p.y).min(p.z), hi.max(p.x).max(p.y).max(p.z))
            },
        );

        Ok(Self {
            min: lo - radius - BOUNDS_MARGIN,
            max: hi + radius + BOUNDS_MARGIN,
        })
    }

    /// Edge length of the cube.
    pub fn extent(&self) -> Value {
        self.max - self.min
    }
}
