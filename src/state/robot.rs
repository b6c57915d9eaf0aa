//! Robot kinematic record and its integration/output transforms.

use crate::matrix::Mat;

/// Wheel-to-wheel diameter of the simulated robot, metres.
pub const ROBOT_DIAMETER_M: f64 = 0.6;

/// Unicycle plant state: pose `x = [Xc, Yc, theta]`, actuator input
/// `u = [v, omega]`, front-point output `y = [Xf, Yf]`.
pub struct RobotState {
    pub x: Mat,
    pub u: Mat,
    pub y: Mat,
}

impl RobotState {
    pub fn new() -> Self {
        Self {
            x: Mat::zeros(3, 1),
            u: Mat::zeros(2, 1),
            y: Mat::zeros(2, 1),
        }
    }
}

impl Default for RobotState {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward-Euler step of the unicycle model:
/// `Ẋc = v·cosθ`, `Ẏc = v·sinθ`, `θ̇ = ω`.
pub fn integrate_pose(state: &mut RobotState, dt_s: f64) {
    let v = state.u[(0, 0)];
    let omega = state.u[(1, 0)];
    let theta = state.x[(2, 0)];

    state.x[(0, 0)] += v * theta.cos() * dt_s;
    state.x[(1, 0)] += v * theta.sin() * dt_s;
    state.x[(2, 0)] += omega * dt_s;
}

/// Recomputes the front-point output `y` from the current pose.
pub fn update_output(state: &mut RobotState) {
    let xc = state.x[(0, 0)];
    let yc = state.x[(1, 0)];
    let theta = state.x[(2, 0)];
    let radius = ROBOT_DIAMETER_M / 2.0;

    state.y[(0, 0)] = xc + radius * theta.cos();
    state.y[(1, 0)] = yc + radius * theta.sin();
}
