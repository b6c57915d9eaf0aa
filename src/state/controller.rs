//! Control-law and feedback-linearization transforms.

use log::debug;

use crate::matrix::Mat;
use crate::state::gains::Gains;
use crate::state::ref_model::RefModel;
use crate::state::robot::{ROBOT_DIAMETER_M, RobotState};

/// Controller record: command `v_control` produced by the control law and
/// actuator input `u_control` produced by the linearization stage.
pub struct Controller {
    pub v_control: Mat,
    pub u_control: Mat,
}

impl Controller {
    pub fn new() -> Self {
        Self {
            v_control: Mat::zeros(2, 1),
            u_control: Mat::zeros(2, 1),
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

/// Control law `v = ẏ_m + α ⊙ (y_m − y)`, reading the live gain pair.
pub fn update_command(ctrl: &mut Controller, robot: &RobotState, model: &RefModel, gains: &Gains) {
    let e_x = model.y_m[(0, 0)] - robot.y[(0, 0)];
    let e_y = model.y_m[(1, 0)] - robot.y[(1, 0)];

    ctrl.v_control[(0, 0)] = model.dot_y_m[(0, 0)] + gains.alpha1 * e_x;
    ctrl.v_control[(1, 0)] = model.dot_y_m[(1, 0)] + gains.alpha2 * e_y;
}

/// Decoupling matrix of the front-point output:
/// `L(θ) = [[cosθ, −r·sinθ], [sinθ, r·cosθ]]`.
pub fn linearization_matrix(theta: f64, radius: f64) -> Mat {
    Mat::from_rows(&[
        &[theta.cos(), -radius * theta.sin()],
        &[theta.sin(), radius * theta.cos()],
    ])
}

/// `u = L(θ)⁻¹ · v`, or zeros when `L` is singular.
fn actuator_input(v: &Mat, theta: f64, radius: f64) -> Mat {
    let l = linearization_matrix(theta, radius);
    match l.inverse().and_then(|inv| inv.mul(v)) {
        Some(u) => u,
        None => {
            // Singular decoupling matrix: command zero rather than abort.
            debug!("singular linearization matrix, substituting zero command");
            Mat::zeros(2, 1)
        }
    }
}

/// Linearization stage transform: maps the current command `v` through the
/// inverse decoupling matrix into the actuator input `u`.
pub fn apply_linearization(ctrl: &mut Controller, robot: &RobotState) {
    let theta = robot.x[(2, 0)];
    ctrl.u_control = actuator_input(&ctrl.v_control, theta, ROBOT_DIAMETER_M / 2.0);
}
