//! # Planar geometry
//!
//! Poses and twists on the plane, with the exact exponential and logarithm maps between them.
//!
//! All headings are normalised into `(-pi, pi]`. Frames follow the right hand rule, +X forwards,
//! +Y left and positive rotation anticlockwise when viewed from above.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};
use util::maths::wrap_angle;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Below this rotation the series expansions of the exponential and logarithm maps are used.
const SMALL_ANGLE_EPS: f64 = 1e-9;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A position and heading on the field.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position of the robot's rotation centre.
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// Heading, the angle of the robot's +X axis to the field's +X axis.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// A motion along a constant curvature arc, expressed in the frame of the pose it starts from.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Twist {
    /// Units: meters
    pub dx_m: f64,

    /// Units: meters
    pub dy_m: f64,

    /// Units: radians
    pub dtheta_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Pose {
    fn default() -> Self {
        Self {
            position_m: Vector2::zeros(),
            heading_rad: 0.0,
        }
    }
}

impl Pose {
    /// Create a new pose, normalising the heading.
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_rad: wrap_angle(heading_rad),
        }
    }

    /// Create a pose from an `[x, y, heading]` array.
    pub fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Convert into an `[x, y, heading]` array.
    pub fn to_array(&self) -> [f64; 3] {
        [self.position_m[0], self.position_m[1], self.heading_rad]
    }

    pub fn x_m(&self) -> f64 {
        self.position_m[0]
    }

    pub fn y_m(&self) -> f64 {
        self.position_m[1]
    }

    /// Unit vector along the pose's heading.
    pub fn forward(&self) -> Vector2<f64> {
        Vector2::new(self.heading_rad.cos(), self.heading_rad.sin())
    }

    /// True if every component of the pose is finite.
    pub fn is_finite(&self) -> bool {
        self.position_m.iter().all(|v| v.is_finite()) && self.heading_rad.is_finite()
    }

    /// Apply `other`, expressed in this pose's frame, on top of this pose.
    pub fn transform_by(&self, other: &Pose) -> Pose {
        Pose::new_from_vec(
            self.position_m + Rotation2::new(self.heading_rad) * other.position_m,
            self.heading_rad + other.heading_rad,
        )
    }

    /// Express this pose in the frame of `other`.
    ///
    /// `other.transform_by(&self.relative_to(other))` gives back this pose.
    pub fn relative_to(&self, other: &Pose) -> Pose {
        Pose::new_from_vec(
            Rotation2::new(-other.heading_rad) * (self.position_m - other.position_m),
            self.heading_rad - other.heading_rad,
        )
    }

    /// Follow the twist from this pose, returning where it ends.
    pub fn exp(&self, twist: &Twist) -> Pose {
        let theta = twist.dtheta_rad;
        let (sin_theta, cos_theta) = theta.sin_cos();

        let (s, c) = if theta.abs() < SMALL_ANGLE_EPS {
            (1.0 - theta * theta / 6.0, 0.5 * theta)
        }
        else {
            (sin_theta / theta, (1.0 - cos_theta) / theta)
        };

        let delta = Pose::new_from_vec(
            Vector2::new(
                twist.dx_m * s - twist.dy_m * c,
                twist.dx_m * c + twist.dy_m * s,
            ),
            theta,
        );

        self.transform_by(&delta)
    }

    /// Find the constant curvature twist which takes this pose to `end`.
    pub fn log(&self, end: &Pose) -> Twist {
        let transform = end.relative_to(self);
        let dtheta = transform.heading_rad;
        let half_dtheta = 0.5 * dtheta;
        let cos_minus_one = dtheta.cos() - 1.0;

        let half_theta_by_tan_half_theta = if cos_minus_one.abs() < SMALL_ANGLE_EPS {
            1.0 - dtheta * dtheta / 12.0
        }
        else {
            -(half_dtheta * dtheta.sin()) / cos_minus_one
        };

        let tx = transform.position_m[0];
        let ty = transform.position_m[1];

        Twist {
            dx_m: tx * half_theta_by_tan_half_theta + ty * half_dtheta,
            dy_m: ty * half_theta_by_tan_half_theta - tx * half_dtheta,
            dtheta_rad: dtheta,
        }
    }

    /// Interpolate along the arc from this pose to `end`, `t` is clamped to `[0, 1]`.
    pub fn interpolate(&self, end: &Pose, t: f64) -> Pose {
        if t <= 0.0 {
            *self
        }
        else if t >= 1.0 {
            *end
        }
        else {
            self.exp(&self.log(end).scaled(t))
        }
    }

    /// Straight line distance between the positions of two poses.
    ///
    /// Units: meters
    pub fn distance_to(&self, other: &Pose) -> f64 {
        (other.position_m - self.position_m).norm()
    }

    /// Bearing from this pose's position to the point.
    ///
    /// Units: radians
    pub fn bearing_to(&self, point_m: &Vector2<f64>) -> f64 {
        let d = point_m - self.position_m;
        d[1].atan2(d[0])
    }

    fn new_from_vec(position_m: Vector2<f64>, heading_rad: f64) -> Self {
        Self {
            position_m,
            heading_rad: wrap_angle(heading_rad),
        }
    }
}

impl Twist {
    pub fn new(dx_m: f64, dy_m: f64, dtheta_rad: f64) -> Self {
        Self {
            dx_m,
            dy_m,
            dtheta_rad,
        }
    }

    /// Scale every element of the twist.
    pub fn scaled(&self, k: f64) -> Twist {
        Twist::new(self.dx_m * k, self.dy_m * k, self.dtheta_rad * k)
    }

    /// Scale each element of the twist by the matching gain.
    pub fn scaled_elementwise(&self, k: &[f64; 3]) -> Twist {
        Twist::new(self.dx_m * k[0], self.dy_m * k[1], self.dtheta_rad * k[2])
    }

    pub fn is_finite(&self) -> bool {
        self.dx_m.is_finite() && self.dy_m.is_finite() && self.dtheta_rad.is_finite()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn assert_pose_eq(a: &Pose, b: &Pose) {
        assert_abs_diff_eq!(a.position_m[0], b.position_m[0], epsilon = 1e-9);
        assert_abs_diff_eq!(a.position_m[1], b.position_m[1], epsilon = 1e-9);
        assert_abs_diff_eq!(
            wrap_angle(a.heading_rad - b.heading_rad),
            0.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_exp_quarter_circle() {
        // Quarter of a unit circle to the left
        let end = Pose::default().exp(&Twist::new(FRAC_PI_2, 0.0, FRAC_PI_2));

        assert_pose_eq(&end, &Pose::new(1.0, 1.0, FRAC_PI_2));
    }

    #[test]
    fn test_log_inverts_exp() {
        let start = Pose::new(1.0, -2.0, 0.3);
        let twists = [
            Twist::new(0.5, 0.1, 0.0),
            Twist::new(0.5, -0.2, 1e-12),
            Twist::new(-1.0, 0.4, 2.0),
        ];

        for twist in twists.iter() {
            let end = start.exp(twist);
            let log = start.log(&end);

            assert_abs_diff_eq!(log.dx_m, twist.dx_m, epsilon = 1e-9);
            assert_abs_diff_eq!(log.dy_m, twist.dy_m, epsilon = 1e-9);
            assert_abs_diff_eq!(log.dtheta_rad, twist.dtheta_rad, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_relative_to_and_back() {
        let a = Pose::new(3.0, 1.0, 2.5);
        let b = Pose::new(-1.0, 4.0, -2.9);

        assert_pose_eq(&b.transform_by(&a.relative_to(&b)), &a);
        assert_pose_eq(
            &Pose::new(2.0, 0.0, PI).relative_to(&Pose::new(1.0, 0.0, FRAC_PI_2)),
            &Pose::new(0.0, -1.0, FRAC_PI_2),
        );
    }

    #[test]
    fn test_interpolate() {
        let a = Pose::new(0.0, 0.0, 0.0);
        let b = Pose::new(2.0, 0.0, 0.0);

        assert_pose_eq(&a.interpolate(&b, 0.5), &Pose::new(1.0, 0.0, 0.0));
        assert_pose_eq(&a.interpolate(&b, -1.0), &a);
        assert_pose_eq(&a.interpolate(&b, 3.0), &b);
    }

    #[test]
    fn test_heading_normalised() {
        assert_abs_diff_eq!(Pose::new(0.0, 0.0, 3.0 * PI).heading_rad, PI, epsilon = 1e-12);
        assert_abs_diff_eq!(
            Pose::new(0.0, 0.0, PI).transform_by(&Pose::new(0.0, 0.0, FRAC_PI_2)).heading_rad,
            -FRAC_PI_2,
            epsilon = 1e-12
        );
    }
}
