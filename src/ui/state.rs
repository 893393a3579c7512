/// Every slider-bound field in one place; the panel gets a mutable reference
/// each frame and nothing else mutates these.
pub struct ViewerState {
    pub cam_radius: f32,
    pub cam_polar: f32,
    pub cam_azimuth: f32,

    // Displayed but not wired into mesh regeneration.
    pub segment_length: f32,
    pub segment_thickness: f32,

    pub end_pos: [f32; 3],

    pub vsync_enabled: bool,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            cam_radius: 2.0,
            cam_polar: 1.5,
            cam_azimuth: 0.0,

            segment_length: 1.0,
            segment_thickness: 1.0,

            end_pos: [0.0; 3],

            vsync_enabled: true,
        }
    }
}

/// Reports the end-effector position once per change, compared with exact
/// float equality. No epsilon: the values come straight from the sliders, so
/// an unchanged slider reproduces the identical bits.
#[derive(Default)]
pub struct EndPosTracker {
    last: [f32; 3],
}

impl EndPosTracker {
    pub fn update(&mut self, pos: [f32; 3]) -> Option<[f32; 3]> {
        if pos != self.last {
            self.last = pos;
            Some(pos)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_positions_are_not_reported() {
        let mut tracker = EndPosTracker::default();
        assert_eq!(tracker.update([0.0, 0.0, 0.0]), None);
        assert_eq!(tracker.update([0.0, 0.0, 0.0]), None);
    }

    #[test]
    fn single_component_change_reports_once() {
        let mut tracker = EndPosTracker::default();
        assert_eq!(tracker.update([0.0, 0.25, 0.0]), Some([0.0, 0.25, 0.0]));
        assert_eq!(tracker.update([0.0, 0.25, 0.0]), None);
    }

    #[test]
    fn each_distinct_value_reports_exactly_once() {
        let mut tracker = EndPosTracker::default();
        let steps = [[0.1, 0.0, 0.0], [0.1, 0.0, 0.0], [0.1, 0.2, 0.0], [0.1, 0.2, -0.3]];
        let reports: Vec<_> = steps.iter().filter_map(|&p| tracker.update(p)).collect();
        assert_eq!(reports, vec![[0.1, 0.0, 0.0], [0.1, 0.2, 0.0], [0.1, 0.2, -0.3]]);
    }

    #[test]
    fn comparison_is_exact() {
        let mut tracker = EndPosTracker::default();
        tracker.update([0.1, 0.0, 0.0]);
        // nearly-equal is still a change
        assert!(tracker.update([0.1 + f32::EPSILON, 0.0, 0.0]).is_some());
    }
}
