use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::pet::Bounds;

const UNSET: i32 = -1;

/// A real measurement that lands on the sentinel (a monitor left of or above
/// the primary) moves one pixel further out.
fn measured(v: i32) -> i32 {
    if v == UNSET {
        v - 1
    } else {
        v
    }
}

/// Inset from the work area used when calibration is skipped.
pub const SKIP_INSET: i32 = 50;

/// User-measured screen edges. Each value is the pet's centre when it was
/// parked against that edge; `-1` means not measured yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EdgeCalibration {
    pub top_edge_y: i32,
    pub bottom_edge_y: i32,
    pub left_edge_x: i32,
    pub right_edge_x: i32,
}

impl Default for EdgeCalibration {
    fn default() -> Self {
        Self {
            top_edge_y: UNSET,
            bottom_edge_y: UNSET,
            left_edge_x: UNSET,
            right_edge_x: UNSET,
        }
    }
}

impl EdgeCalibration {
    pub fn is_calibrated(&self) -> bool {
        self.top_edge_y != UNSET
            && self.bottom_edge_y != UNSET
            && self.left_edge_x != UNSET
            && self.right_edge_x != UNSET
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn from_work_area(area: Bounds) -> Self {
        Self {
            top_edge_y: measured(area.top as i32 + SKIP_INSET),
            bottom_edge_y: measured(area.bottom as i32 - SKIP_INSET),
            left_edge_x: measured(area.left as i32 + SKIP_INSET),
            right_edge_x: measured(area.right as i32 - SKIP_INSET),
        }
    }

    /// Window bounds for a pet of `size`. Values are centres, so widen by
    /// half the pet on every side.
    pub fn bounds(&self, size: Vec2) -> Bounds {
        let half = size * 0.5;
        Bounds {
            left: self.left_edge_x as f32 - half.x,
            top: self.top_edge_y as f32 - half.y,
            right: self.right_edge_x as f32 + half.x,
            bottom: self.bottom_edge_y as f32 + half.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStep {
    Top,
    Right,
    Bottom,
    Left,
    Done,
}

impl CalibrationStep {
    /// Still frame that shows the pose the pet takes against this edge.
    pub fn preview(self) -> Option<&'static str> {
        match self {
            Self::Top => Some("autoTriggered/move/horizontal/top/rightToLeft/swing/loop/001.png"),
            Self::Right => Some("autoTriggered/move/vertical/bottomToTop/climb.right/loop/001.png"),
            Self::Bottom => Some("autoTriggered/move/horizontal/rightToLeft/walk/loop/001.png"),
            Self::Left => Some("autoTriggered/move/vertical/bottomToTop/climb.left/loop/001.png"),
            Self::Done => None,
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Self::Top => "Drag the pet to the TOP edge of your screen, then press Enter.",
            Self::Right => "Drag the pet to the RIGHT edge of your screen, then press Enter.",
            Self::Bottom => "Drag the pet to the BOTTOM edge of your screen, then press Enter.",
            Self::Left => "Drag the pet to the LEFT edge of your screen, then press Enter.",
            Self::Done => "Calibration complete.",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Top => Self::Right,
            Self::Right => Self::Bottom,
            Self::Bottom => Self::Left,
            Self::Left | Self::Done => Self::Done,
        }
    }
}

/// Walks the user through parking the pet against each screen edge.
pub struct CalibrationWizard {
    step: CalibrationStep,
    result: EdgeCalibration,
}

impl Default for CalibrationWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationWizard {
    pub fn new() -> Self {
        Self {
            step: CalibrationStep::Top,
            result: EdgeCalibration::default(),
        }
    }

    pub fn step(&self) -> CalibrationStep {
        self.step
    }

    /// Record the pet's centre for the current edge and move on. Returns the
    /// finished calibration after the last edge.
    pub fn confirm(&mut self, centre: Vec2) -> Option<EdgeCalibration> {
        let (x, y) = (
            measured(centre.x.round() as i32),
            measured(centre.y.round() as i32),
        );
        match self.step {
            CalibrationStep::Top => self.result.top_edge_y = y,
            CalibrationStep::Right => self.result.right_edge_x = x,
            CalibrationStep::Bottom => self.result.bottom_edge_y = y,
            CalibrationStep::Left => self.result.left_edge_x = x,
            CalibrationStep::Done => return Some(self.result),
        }
        self.step = self.step.next();
        log::info!("Calibration: now {:?}", self.step);
        (self.step == CalibrationStep::Done).then_some(self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Bounds {
        Bounds::from_origin_size(Vec2::ZERO, Vec2::new(1920.0, 1040.0))
    }

    #[test]
    fn fresh_calibration_is_incomplete() {
        let mut c = EdgeCalibration::default();
        assert!(!c.is_calibrated());
        c.top_edge_y = 10;
        c.bottom_edge_y = 900;
        c.left_edge_x = 10;
        assert!(!c.is_calibrated());
        c.right_edge_x = 1800;
        assert!(c.is_calibrated());
        c.reset();
        assert_eq!(c, EdgeCalibration::default());
    }

    #[test]
    fn skip_insets_the_work_area() {
        let c = EdgeCalibration::from_work_area(screen());
        assert!(c.is_calibrated());
        assert_eq!(
            (c.top_edge_y, c.bottom_edge_y, c.left_edge_x, c.right_edge_x),
            (50, 990, 50, 1870)
        );
    }

    #[test]
    fn bounds_widen_by_half_the_pet() {
        let c = EdgeCalibration {
            top_edge_y: 150,
            bottom_edge_y: 890,
            left_edge_x: 150,
            right_edge_x: 1770,
        };
        let b = c.bounds(Vec2::splat(300.0));
        assert_eq!(b, Bounds::from_origin_size(Vec2::ZERO, Vec2::new(1920.0, 1040.0)));
    }

    #[test]
    fn wizard_visits_every_edge_in_order() {
        let mut w = CalibrationWizard::new();
        assert_eq!(w.step(), CalibrationStep::Top);
        assert!(w.step().preview().unwrap().contains("/top/"));

        assert!(w.confirm(Vec2::new(960.0, 151.4)).is_none());
        assert_eq!(w.step(), CalibrationStep::Right);
        assert!(w.step().preview().unwrap().contains("climb.right"));
        assert!(w.confirm(Vec2::new(1770.0, 500.0)).is_none());
        assert!(w.confirm(Vec2::new(960.0, 890.0)).is_none());
        assert_eq!(w.step(), CalibrationStep::Left);

        let done = w.confirm(Vec2::new(149.6, 500.0)).unwrap();
        assert_eq!(w.step(), CalibrationStep::Done);
        assert_eq!(w.step().preview(), None);
        assert_eq!(
            done,
            EdgeCalibration {
                top_edge_y: 151,
                bottom_edge_y: 890,
                left_edge_x: 150,
                right_edge_x: 1770,
            }
        );
    }

    #[test]
    fn measurement_on_the_sentinel_still_counts() {
        let mut w = CalibrationWizard::new();
        w.confirm(Vec2::new(-960.0, -1.0));
        w.confirm(Vec2::new(-1.2, 500.0));
        w.confirm(Vec2::new(-960.0, 890.0));
        let done = w.confirm(Vec2::new(-1770.0, 500.0)).unwrap();
        assert_eq!(done.top_edge_y, -2);
        assert_eq!(done.right_edge_x, -2);
        assert!(done.is_calibrated());

        let left_monitor = Bounds::from_origin_size(Vec2::new(-1920.0, -51.0), Vec2::new(1920.0, 1080.0));
        assert!(EdgeCalibration::from_work_area(left_monitor).is_calibrated());
    }

    #[test]
    fn serialises_with_camel_case_keys() {
        let json = serde_json::to_string(&EdgeCalibration::default()).unwrap();
        assert_eq!(
            json,
            r#"{"topEdgeY":-1,"bottomEdgeY":-1,"leftEdgeX":-1,"rightEdgeX":-1}"#
        );
    }
}
