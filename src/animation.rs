//! Time-driven and input-driven animation state for the fan.
//!
//! Three kinds of motion feed the rig:
//!
//! - **Yaw** is not stored. [`YawOscillator::yaw`] is a pure function of the
//!   absolute frame time, so it never drifts however frames are spaced.
//! - **Blade spin** accumulates in [`FanState::advance`] while the fan runs.
//! - **Cage pitch** and the texture/lighting switches change only through
//!   [`FanCommand`]s, which input handlers enqueue on a [`CommandQueue`] and
//!   the frame driver drains before each traversal.
//!
//! Traversals read a [`Pose`], a copy taken once per frame.

use std::collections::VecDeque;
use std::f64::consts::TAU;

/// Blade speed in revolutions per minute.
pub const BLADE_RPM: f64 = 180.0;
/// Yaw amplitude in degrees either side of centre.
pub const YAW_MAX_DEGREES: f64 = 30.0;
/// Yaw oscillation frequency in hertz.
pub const YAW_SPEED_HZ: f64 = 0.8;
/// Cage pitch change per key press, in degrees.
pub const PITCH_STEP_DEGREES: f32 = 3.0;

/// Side-to-side sweep of the fan head.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YawOscillator {
    /// Peak deflection in radians.
    pub max: f64,
    /// Full sweeps per second.
    pub speed_hz: f64,
}

impl Default for YawOscillator {
    fn default() -> Self {
        Self {
            max: YAW_MAX_DEGREES.to_radians(),
            speed_hz: YAW_SPEED_HZ,
        }
    }
}

impl YawOscillator {
    pub fn new(max: f64, speed_hz: f64) -> Self {
        Self { max, speed_hz }
    }

    /// `max · sin(2π · speed · t)` for absolute time `t` in seconds.
    pub fn yaw(&self, time: f64) -> f64 {
        self.max * (TAU * self.speed_hz * time).sin()
    }

    /// Seconds per full sweep.
    pub fn period(&self) -> f64 {
        1.0 / self.speed_hz
    }
}

/// A discrete change requested by the user.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FanCommand {
    ToggleRunning,
    /// Tilt the cage by this many radians; positive tips it up.
    AdjustCagePitch(f32),
    ToggleTexture,
    ToggleLighting,
}

/// Process-lifetime animation state.
#[derive(Clone, Debug, PartialEq)]
pub struct FanState {
    pub running: bool,
    /// Radians. Never clamped: repeated presses can tip the cage past vertical.
    pub cage_pitch: f32,
    /// Radians, kept in `[0, 2π)`.
    pub blade_angle: f64,
    pub tex_enabled: bool,
    pub lighting_enabled: bool,
    blade_rpm: f64,
}

impl Default for FanState {
    fn default() -> Self {
        Self::new(BLADE_RPM)
    }
}

impl FanState {
    /// Running, level, textured and lit.
    pub fn new(blade_rpm: f64) -> Self {
        Self {
            running: true,
            cage_pitch: 0.0,
            blade_angle: 0.0,
            tex_enabled: true,
            lighting_enabled: true,
            blade_rpm,
        }
    }

    pub fn blade_rpm(&self) -> f64 {
        self.blade_rpm
    }

    /// Blade angular speed in radians per second.
    pub fn blade_speed(&self) -> f64 {
        self.blade_rpm / 60.0 * TAU
    }

    /// Spins the blades forward by `dt` seconds if the fan is running.
    ///
    /// Negative deltas are treated as zero.
    pub fn advance(&mut self, dt: f64) {
        if !self.running {
            return;
        }
        let dt = dt.max(0.0);
        self.blade_angle = (self.blade_angle + dt * self.blade_speed()).rem_euclid(TAU);
    }

    pub fn toggle_running(&mut self) {
        self.running = !self.running;
    }

    pub fn adjust_cage_pitch(&mut self, delta: f32) {
        self.cage_pitch += delta;
    }

    pub fn toggle_texture(&mut self) {
        self.tex_enabled = !self.tex_enabled;
    }

    pub fn toggle_lighting(&mut self) {
        self.lighting_enabled = !self.lighting_enabled;
    }

    pub fn apply(&mut self, command: FanCommand) {
        match command {
            FanCommand::ToggleRunning => self.toggle_running(),
            FanCommand::AdjustCagePitch(delta) => self.adjust_cage_pitch(delta),
            FanCommand::ToggleTexture => self.toggle_texture(),
            FanCommand::ToggleLighting => self.toggle_lighting(),
        }
    }
}

/// Pending commands, applied in arrival order at the start of a frame.
#[derive(Clone, Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<FanCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: FanCommand) {
        self.pending.push_back(command);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Applies every pending command to `state`, oldest first.
    ///
    /// Returns how many were applied.
    pub fn drain_into(&mut self, state: &mut FanState) -> usize {
        let count = self.pending.len();
        for command in self.pending.drain(..) {
            log::debug!("applying {command:?}");
            state.apply(command);
        }
        count
    }
}

/// The animated parameters a single traversal reads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub yaw: f32,
    pub cage_pitch: f32,
    pub blade_angle: f32,
    pub tex_enabled: bool,
}

impl Pose {
    /// The rest pose: no yaw, level cage, blades at zero, texturing on.
    pub const REST: Pose = Pose {
        yaw: 0.0,
        cage_pitch: 0.0,
        blade_angle: 0.0,
        tex_enabled: true,
    };

    /// Freezes `state` and the yaw at `time` for one frame.
    pub fn sample(state: &FanState, oscillator: &YawOscillator, time: f64) -> Self {
        Self {
            yaw: oscillator.yaw(time) as f32,
            cage_pitch: state.cage_pitch,
            blade_angle: state.blade_angle as f32,
            tex_enabled: state.tex_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn angle_distance(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(TAU);
        d.min(TAU - d)
    }

    #[test]
    fn yaw_is_zero_at_origin() {
        assert_eq!(YawOscillator::default().yaw(0.0), 0.0);
    }

    #[test]
    fn yaw_peaks_at_quarter_period() {
        let osc = YawOscillator::default();
        let peak = osc.yaw(osc.period() / 4.0);
        assert!((peak - osc.max).abs() < 1e-12);
        assert!((osc.max - 30f64.to_radians()).abs() < 1e-15);
    }

    #[test]
    fn zero_dt_leaves_blades_still() {
        let mut state = FanState::default();
        state.advance(0.0);
        assert_eq!(state.blade_angle, 0.0);
    }

    #[test]
    fn negative_dt_is_ignored() {
        let mut state = FanState::default();
        state.advance(0.01);
        let before = state.blade_angle;
        state.advance(-0.5);
        assert_eq!(state.blade_angle, before);
    }

    #[test]
    fn one_second_at_180_rpm_is_three_turns() {
        let mut state = FanState::default();
        for _ in 0..100 {
            state.advance(0.01);
        }
        assert!(angle_distance(state.blade_angle, 0.0) < 1e-9);
    }

    #[test]
    fn commands_apply_in_order() {
        let mut state = FanState::default();
        let mut queue = CommandQueue::new();
        let step = PITCH_STEP_DEGREES.to_radians();
        queue.push(FanCommand::AdjustCagePitch(step));
        queue.push(FanCommand::ToggleRunning);
        queue.push(FanCommand::AdjustCagePitch(step));
        queue.push(FanCommand::ToggleTexture);
        queue.push(FanCommand::ToggleLighting);
        queue.push(FanCommand::ToggleRunning);

        assert_eq!(queue.drain_into(&mut state), 6);
        assert!(queue.is_empty());
        assert!(state.running);
        assert!(!state.tex_enabled);
        assert!(!state.lighting_enabled);
        assert!((state.cage_pitch - 2.0 * step).abs() < 1e-6);
    }

    #[test]
    fn pose_freezes_state() {
        let mut state = FanState::default();
        state.adjust_cage_pitch(0.25);
        state.advance(0.02);
        let osc = YawOscillator::default();
        let pose = Pose::sample(&state, &osc, 0.3);

        state.adjust_cage_pitch(1.0);
        state.advance(0.02);

        assert_eq!(pose.cage_pitch, 0.25);
        assert_eq!(pose.yaw, osc.yaw(0.3) as f32);
        assert_ne!(pose.blade_angle, state.blade_angle as f32);
    }

    proptest! {
        #[test]
        fn yaw_is_bounded(t in -1.0e4f64..1.0e4) {
            let osc = YawOscillator::default();
            let yaw = osc.yaw(t);
            prop_assert!(yaw.abs() <= osc.max + 1e-12);
        }

        #[test]
        fn yaw_is_periodic(t in 0.0f64..100.0, k in 1u32..20) {
            let osc = YawOscillator::default();
            let shifted = osc.yaw(t + k as f64 * osc.period());
            prop_assert!((shifted - osc.yaw(t)).abs() < 1e-9);
        }

        #[test]
        fn blade_angle_accumulates_linearly(
            dt in 0.0f64..0.033,
            frames in 0usize..400,
            pitch in -10.0f32..10.0,
        ) {
            let mut state = FanState::default();
            state.adjust_cage_pitch(pitch);
            for _ in 0..frames {
                state.advance(dt);
            }
            let expected = (frames as f64 * dt * (BLADE_RPM / 60.0) * TAU).rem_euclid(TAU);
            prop_assert!(angle_distance(state.blade_angle, expected) < 1e-9);
            prop_assert!((0.0..TAU).contains(&state.blade_angle));
        }

        #[test]
        fn stopped_blades_never_move(
            warmup in 0usize..20,
            dts in prop::collection::vec(0.0f64..0.033, 0..200),
        ) {
            let mut state = FanState::default();
            for _ in 0..warmup {
                state.advance(0.016);
            }
            state.toggle_running();
            let frozen = state.blade_angle;
            for dt in dts {
                state.advance(dt);
            }
            prop_assert_eq!(state.blade_angle, frozen);
        }

        // Unclamped: enough presses tip the cage past vertical.
        #[test]
        fn cage_pitch_is_not_clamped(presses in 0u32..200, up in any::<bool>()) {
            let step = PITCH_STEP_DEGREES.to_radians() * if up { 1.0 } else { -1.0 };
            let mut state = FanState::default();
            for _ in 0..presses {
                state.apply(FanCommand::AdjustCagePitch(step));
            }
            let expected = presses as f32 * step;
            prop_assert!((state.cage_pitch - expected).abs() < 1e-3);
            if presses > 30 {
                prop_assert!(state.cage_pitch.abs() > std::f32::consts::FRAC_PI_2);
            }
        }
    }
}
