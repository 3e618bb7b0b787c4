use crate::error::DrawingError;
use crate::model::Point;
use serde::{Deserialize, Serialize};

/// Where the custom polygon is in its drawing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawPhase {
    Empty,
    /// 1 or 2 points: still an open polyline.
    Drawing,
    /// At least 3 points, not yet finalized.
    Drawable,
    Finalized,
}

/// Vertices of a user-drawn polygon plus its finalized flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomShape {
    pub points: Vec<Point>,
    #[serde(default)]
    pub finalized: bool,
}

impl CustomShape {
    pub fn phase(&self) -> DrawPhase {
        if self.finalized {
            return DrawPhase::Finalized;
        }
        match self.points.len() {
            0 => DrawPhase::Empty,
            1 | 2 => DrawPhase::Drawing,
            _ => DrawPhase::Drawable,
        }
    }

    /// True while clicks should add vertices instead of holes.
    pub fn is_drawing(&self) -> bool {
        !self.finalized
    }

    pub fn is_closed(&self) -> bool {
        self.points.len() >= 3
    }

    pub fn add_point(&mut self, point: Point) -> Result<usize, DrawingError> {
        if self.finalized {
            return Err(DrawingError::Finalized);
        }
        self.points.push(point);
        Ok(self.points.len() - 1)
    }

    pub fn remove_point(&mut self, index: usize) -> Result<Point, DrawingError> {
        if self.finalized {
            return Err(DrawingError::Finalized);
        }
        if index >= self.points.len() {
            return Err(DrawingError::PointOutOfRange {
                index,
                len: self.points.len(),
            });
        }
        Ok(self.points.remove(index))
    }

    pub fn finalize(&mut self) -> Result<(), DrawingError> {
        if self.finalized {
            return Ok(());
        }
        if self.points.len() < 3 {
            return Err(DrawingError::NotEnoughPoints {
                count: self.points.len(),
            });
        }
        self.finalized = true;
        Ok(())
    }

    /// Reopen a finalized shape; points are kept.
    pub fn edit(&mut self) -> Result<(), DrawingError> {
        if !self.finalized {
            return Err(DrawingError::NotFinalized);
        }
        self.finalized = false;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.finalized = false;
    }
}
