//! # Feedback controllers
//!
//! A discrete PID controller with optional continuous input, a trapezoidal motion profile, and a
//! profiled PID controller which drives the PID setpoint along the profile towards a goal.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use util::maths::input_modulus;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Discrete PID controller.
#[derive(Debug, Clone, Serialize)]
pub struct Pid {
    kp: f64,
    ki: f64,
    kd: f64,

    /// Units: seconds
    period_s: f64,

    /// Input range treated as wrapping around, `(min, max)`.
    continuous_range: Option<(f64, f64)>,

    tolerance: f64,

    setpoint: f64,
    error: f64,
    prev_error: f64,
    total_error: f64,
    have_measurement: bool,
}

/// Position and velocity along a profile.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct ProfileState {
    pub position: f64,
    pub velocity: f64,
}

/// Limits for a trapezoidal profile.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ProfileConstraints {
    pub max_velocity: f64,
    pub max_acceleration: f64,
}

/// A trapezoidal velocity profile.
#[derive(Debug, Copy, Clone, Serialize)]
pub struct TrapezoidProfile {
    constraints: ProfileConstraints,
}

/// PID controller whose setpoint follows a trapezoidal profile towards the goal.
#[derive(Debug, Clone, Serialize)]
pub struct ProfiledPid {
    pid: Pid,
    profile: TrapezoidProfile,
    goal: ProfileState,
    setpoint: ProfileState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pid {
    pub fn new(kp: f64, ki: f64, kd: f64, period_s: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            period_s,
            continuous_range: None,
            tolerance: 0.05,
            setpoint: 0.0,
            error: 0.0,
            prev_error: 0.0,
            total_error: 0.0,
            have_measurement: false,
        }
    }

    /// Treat the input as wrapping between `min` and `max`, for example an angle.
    pub fn enable_continuous_input(&mut self, min: f64, max: f64) {
        self.continuous_range = Some((min, max));
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Last error, wrapped if the input is continuous.
    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn period_s(&self) -> f64 {
        self.period_s
    }

    /// True if the last error was within tolerance.
    pub fn at_setpoint(&self) -> bool {
        self.have_measurement && self.error.abs() < self.tolerance
    }

    /// Compute the output for the measurement against the current setpoint.
    pub fn calculate(&mut self, measurement: f64) -> f64 {
        self.prev_error = self.error;
        self.error = self.wrapped_error(self.setpoint - measurement);
        self.have_measurement = true;

        let error_rate = (self.error - self.prev_error) / self.period_s;

        if self.ki != 0.0 {
            self.total_error += self.error * self.period_s;
        }

        self.kp * self.error + self.ki * self.total_error + self.kd * error_rate
    }

    /// Set a new setpoint and compute the output in one step.
    pub fn calculate_to(&mut self, measurement: f64, setpoint: f64) -> f64 {
        self.setpoint = setpoint;
        self.calculate(measurement)
    }

    /// Clear the accumulated state, leaving gains and setpoint unchanged.
    pub fn reset(&mut self) {
        self.error = 0.0;
        self.prev_error = 0.0;
        self.total_error = 0.0;
        self.have_measurement = false;
    }

    fn wrapped_error(&self, error: f64) -> f64 {
        match self.continuous_range {
            Some((min, max)) => {
                let bound = 0.5 * (max - min);
                input_modulus(error, -bound, bound)
            }
            None => error,
        }
    }
}

impl TrapezoidProfile {
    pub fn new(constraints: ProfileConstraints) -> Self {
        Self { constraints }
    }

    /// The state `t` seconds along the profile from `current` to `goal`.
    pub fn calculate(&self, t: f64, current: ProfileState, goal: ProfileState) -> ProfileState {
        let max_v = self.constraints.max_velocity;
        let max_a = self.constraints.max_acceleration;

        // Solve the profile as if moving in the positive direction
        let direction = if current.position > goal.position {
            -1.0
        }
        else {
            1.0
        };
        let mut current = directed(current, direction);
        let goal = directed(goal, direction);

        if current.velocity > max_v {
            current.velocity = max_v;
        }

        // Portions of the acceleration and deceleration ramps already behind or beyond us
        let cutoff_begin = current.velocity / max_a;
        let cutoff_dist_begin = cutoff_begin * cutoff_begin * max_a / 2.0;

        let cutoff_end = goal.velocity / max_a;
        let cutoff_dist_end = cutoff_end * cutoff_end * max_a / 2.0;

        let full_trapezoid_dist =
            cutoff_dist_begin + (goal.position - current.position) + cutoff_dist_end;
        let mut accel_time = max_v / max_a;

        let mut full_speed_dist = full_trapezoid_dist - accel_time * accel_time * max_a;

        // Triangular profile if max velocity is never reached
        if full_speed_dist < 0.0 {
            accel_time = (full_trapezoid_dist / max_a).sqrt();
            full_speed_dist = 0.0;
        }

        let end_accel = accel_time - cutoff_begin;
        let end_full_speed = end_accel + full_speed_dist / max_v;
        let end_decel = end_full_speed + accel_time - cutoff_end;

        let mut result = current;

        if t < end_accel {
            result.velocity += t * max_a;
            result.position += (current.velocity + t * max_a / 2.0) * t;
        }
        else if t < end_full_speed {
            result.velocity = max_v;
            result.position += (current.velocity + end_accel * max_a / 2.0) * end_accel
                + max_v * (t - end_accel);
        }
        else if t <= end_decel {
            let time_left = end_decel - t;
            result.velocity = goal.velocity + time_left * max_a;
            result.position = goal.position - (goal.velocity + time_left * max_a / 2.0) * time_left;
        }
        else {
            result = goal;
        }

        directed(result, direction)
    }
}

impl ProfiledPid {
    pub fn new(kp: f64, ki: f64, kd: f64, constraints: ProfileConstraints, period_s: f64) -> Self {
        Self {
            pid: Pid::new(kp, ki, kd, period_s),
            profile: TrapezoidProfile::new(constraints),
            goal: ProfileState::default(),
            setpoint: ProfileState::default(),
        }
    }

    pub fn enable_continuous_input(&mut self, min: f64, max: f64) {
        self.pid.enable_continuous_input(min, max);
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.pid.set_tolerance(tolerance);
    }

    pub fn goal(&self) -> ProfileState {
        self.goal
    }

    pub fn setpoint(&self) -> ProfileState {
        self.setpoint
    }

    /// True once the profile has reached the goal and the error is within tolerance.
    pub fn at_goal(&self) -> bool {
        self.pid.at_setpoint() && self.goal == self.setpoint
    }

    /// Advance the profile one period towards `goal` and compute the output.
    pub fn calculate(&mut self, measurement: f64, goal: f64) -> f64 {
        self.goal = ProfileState {
            position: goal,
            velocity: 0.0,
        };

        if let Some((min, max)) = self.pid.continuous_range {
            // Bring the goal and setpoint within half a range of the measurement so the profile
            // takes the short way round
            let bound = 0.5 * (max - min);
            self.goal.position = input_modulus(goal - measurement, -bound, bound) + measurement;
            self.setpoint.position =
                input_modulus(self.setpoint.position - measurement, -bound, bound) + measurement;
        }

        self.setpoint = self
            .profile
            .calculate(self.pid.period_s(), self.setpoint, self.goal);

        self.pid.calculate_to(measurement, self.setpoint.position)
    }

    /// Reset the profile to start from the measurement at rest.
    pub fn reset(&mut self, measurement: f64) {
        self.pid.reset();
        self.setpoint = ProfileState {
            position: measurement,
            velocity: 0.0,
        };
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn directed(state: ProfileState, direction: f64) -> ProfileState {
    ProfileState {
        position: state.position * direction,
        velocity: state.velocity * direction,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn aim_controller() -> ProfiledPid {
        let mut pid = ProfiledPid::new(
            10.0,
            0.0,
            0.5,
            ProfileConstraints {
                max_velocity: 2160f64.to_radians(),
                max_acceleration: 4320f64.to_radians(),
            },
            0.02,
        );
        pid.enable_continuous_input(-PI, PI);
        pid.set_tolerance(1.5f64.to_radians());
        pid
    }

    #[test]
    fn test_pid_continuous_error() {
        let mut pid = Pid::new(1.0, 0.0, 0.0, 0.02);
        pid.enable_continuous_input(-PI, PI);

        let out = pid.calculate_to(179f64.to_radians(), (-179f64).to_radians());

        assert_abs_diff_eq!(out, 2f64.to_radians(), epsilon = 1e-9);
    }

    #[test]
    fn test_profile_reaches_goal() {
        let profile = TrapezoidProfile::new(ProfileConstraints {
            max_velocity: 1.0,
            max_acceleration: 2.0,
        });

        let goal = ProfileState {
            position: 3.0,
            velocity: 0.0,
        };
        let mut state = ProfileState::default();

        for _ in 0..400 {
            state = profile.calculate(0.01, state, goal);
            assert!(state.velocity <= 1.0 + 1e-9);
        }

        assert_eq!(state, goal);
    }

    #[test]
    fn test_profile_negative_direction() {
        let profile = TrapezoidProfile::new(ProfileConstraints {
            max_velocity: 1.0,
            max_acceleration: 2.0,
        });

        let next = profile.calculate(
            0.1,
            ProfileState::default(),
            ProfileState {
                position: -3.0,
                velocity: 0.0,
            },
        );

        assert_abs_diff_eq!(next.velocity, -0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(next.position, -0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_aim_across_wrap_is_small() {
        let mut pid = aim_controller();
        let measurement = 179f64.to_radians();
        pid.reset(measurement);

        let out = pid.calculate(measurement, (-179f64).to_radians());

        // Turns the short way, anticlockwise, and gently
        assert!(out > 0.0);
        assert!(out < 2.0, "output was {}", out);
    }

    #[test]
    fn test_aim_at_goal() {
        let mut pid = aim_controller();
        pid.reset(0.3);

        // Hold the measurement at the goal
        for _ in 0..10 {
            pid.calculate(0.3, 0.3);
        }

        assert!(pid.at_goal());
    }
}
