//! First-order reference model the controller tracks.

use crate::matrix::Mat;
use crate::state::reference::ReferencePoint;

/// Reference-model state `y_m` and its derivative `ẏ_m`, integrated toward
/// the reference point with the gain pair captured at construction. Live
/// gain edits reach the control law only; the model keeps its startup pair.
pub struct RefModel {
    pub y_m: Mat,
    pub dot_y_m: Mat,
    alpha1: f64,
    alpha2: f64,
}

impl RefModel {
    pub fn new(alpha1: f64, alpha2: f64) -> Self {
        Self {
            y_m: Mat::zeros(2, 1),
            dot_y_m: Mat::zeros(2, 1),
            alpha1,
            alpha2,
        }
    }
}

/// One forward-Euler step: `ẏ_m = α ⊙ (ref − y_m)`, then
/// `y_m += ẏ_m · dt`.
pub fn integrate_model(model: &mut RefModel, reference: &ReferencePoint, dt_s: f64) {
    let xref = reference.ref_xy[(0, 0)];
    let yref = reference.ref_xy[(1, 0)];

    let dot_x = model.alpha1 * (xref - model.y_m[(0, 0)]);
    let dot_y = model.alpha2 * (yref - model.y_m[(1, 0)]);

    model.dot_y_m[(0, 0)] = dot_x;
    model.dot_y_m[(1, 0)] = dot_y;

    model.y_m[(0, 0)] += dot_x * dt_s;
    model.y_m[(1, 0)] += dot_y * dt_s;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::reference::update_reference;

    #[test]
    fn converges_to_a_constant_reference() {
        let mut model = RefModel::new(2.0, 2.0);
        let mut reference = ReferencePoint::new();
        update_reference(&mut reference, 0.0); // (5/pi, 0), held fixed

        for _ in 0..1000 {
            integrate_model(&mut model, &reference, 0.01);
        }
        assert!((model.y_m[(0, 0)] - reference.ref_xy[(0, 0)]).abs() < 1e-6);
        assert!(model.y_m[(1, 0)].abs() < 1e-6);
    }
}
