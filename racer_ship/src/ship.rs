//! Player ship control loop.
//!
//! Input handlers flip edge-triggered flags; [`ShipControl::tick`] reads them
//! every frame and turns them into requests against the host physics body.
//! Handlers and ticks are delivered by a single consumer and never overlap.
//!
//! Failed gates are silent no-ops. A press that does not meet its
//! precondition leaves the state untouched and nothing is retried.

use racer_shared::{
    config::{DriveBrakeArbitration, RefillPolicy, ShipTuning},
    host::{ActorClass, ActorHandle, ObjectChannels, PhysicsBody, ShipContext},
    math::interp_to,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::input::{Action, InputEvent};

/// Mutable per-ship state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipState {
    pub is_driving: bool,
    pub is_braking: bool,
    pub is_boosting: bool,
    /// Gate for every press handler; releases always go through.
    pub can_act: bool,
    /// In `[0, max_fuel]` at the end of every tick.
    pub boost_fuel: f32,
    pub refill_timer: f32,
    pub ammo_count: u32,
    /// Smoothed turn axis.
    pub current_turn_rate: f32,
}

impl ShipState {
    fn new(tuning: &ShipTuning) -> Self {
        Self {
            is_driving: false,
            is_braking: false,
            is_boosting: false,
            can_act: false,
            boost_fuel: tuning.max_fuel,
            refill_timer: 0.0,
            ammo_count: tuning.start_ammo,
            current_turn_rate: 0.0,
        }
    }
}

/// One player ship.
#[derive(Debug, Clone)]
pub struct ShipControl {
    state: ShipState,
    tuning: ShipTuning,
}

impl ShipControl {
    pub fn new(tuning: ShipTuning) -> Self {
        Self {
            state: ShipState::new(&tuning),
            tuning,
        }
    }

    /// Starts with `fuel` in the tank instead of a full one.
    pub fn with_fuel(mut self, fuel: f32) -> Self {
        self.state.boost_fuel = fuel.clamp(0.0, self.tuning.max_fuel);
        self
    }

    pub fn state(&self) -> &ShipState {
        &self.state
    }

    pub fn tuning(&self) -> &ShipTuning {
        &self.tuning
    }

    pub fn can_act(&self) -> bool {
        self.state.can_act
    }

    /// Freezes or releases control. Held flags are left as they are.
    pub fn set_can_act(&mut self, can_act: bool) {
        if self.state.can_act != can_act {
            debug!(can_act, "ship control gate changed");
        }
        self.state.can_act = can_act;
    }

    /// Advances one frame.
    pub fn tick(&mut self, _dt: f32, ctx: &mut ShipContext<'_>) {
        let transform = ctx.body.transform();
        let mass = ctx.body.mass();
        let forward = transform.forward().flattened();
        let tuning = &self.tuning;
        let state = &mut self.state;

        if state.is_driving {
            let suppressed =
                state.is_braking && tuning.drive_brake == DriveBrakeArbitration::BrakeWins;
            if !suppressed {
                ctx.body.add_movement_input(forward, tuning.drive_speed);
            }
            ctx.body.set_angular_damping(tuning.angular_damping);
            ctx.body.set_linear_damping(tuning.linear_damping);
        }

        if state.is_braking {
            ctx.body.add_movement_input(forward, -tuning.drive_speed / 2.0);
        }

        if state.is_boosting {
            state.boost_fuel -= tuning.boost_drain_per_tick;
            ctx.body.add_force(forward * (tuning.boost_power * mass));
            if state.boost_fuel < 0.0 {
                state.is_boosting = false;
                debug!("boost fuel exhausted");
            }
        }

        // Not an else: the tick that exhausts the tank already starts refilling.
        if !state.is_boosting {
            state.refill_timer += tuning.refill_timer_step;
            if state.refill_timer >= tuning.refill_threshold {
                if state.boost_fuel < tuning.max_fuel {
                    state.boost_fuel += tuning.refill_fuel_step;
                }
                if tuning.refill_policy == RefillPolicy::Metered {
                    state.refill_timer = 0.0;
                }
            }
        }
        state.boost_fuel = state.boost_fuel.clamp(0.0, tuning.max_fuel);
        trace!(fuel = state.boost_fuel, "boost fuel");

        let up = transform.up();
        let probe_end = transform.location + up * -tuning.hover_probe_length;
        if ctx
            .world
            .line_trace(transform.location, probe_end, ObjectChannels::WORLD_STATIC)
        {
            ctx.body.add_force(up * (tuning.hover_force * mass));
        }
    }

    /// Routes an input event to its handler.
    pub fn dispatch(&mut self, event: InputEvent, dt: f32, ctx: &mut ShipContext<'_>) {
        match event {
            InputEvent::Pressed(Action::Drive) => self.start_driving(),
            InputEvent::Released(Action::Drive) => self.stop_driving(),
            InputEvent::Pressed(Action::Brake) => self.start_braking(),
            InputEvent::Released(Action::Brake) => self.stop_braking(),
            InputEvent::Pressed(Action::Boost) => self.start_boosting(),
            InputEvent::Released(Action::Boost) => self.stop_boosting(),
            InputEvent::Pressed(Action::Fire) => {
                self.fire(ctx);
            }
            InputEvent::Released(Action::Fire) => {}
            InputEvent::Axis(value) => self.move_right(value, dt, ctx.body),
        }
    }

    pub fn start_driving(&mut self) {
        if self.state.can_act {
            self.state.is_driving = true;
        }
    }

    pub fn stop_driving(&mut self) {
        self.state.is_driving = false;
    }

    pub fn start_braking(&mut self) {
        if self.state.can_act {
            self.state.is_braking = true;
        }
    }

    pub fn stop_braking(&mut self) {
        self.state.is_braking = false;
    }

    pub fn start_boosting(&mut self) {
        if self.state.can_act && self.state.boost_fuel > 0.0 {
            self.state.is_boosting = true;
        }
    }

    pub fn stop_boosting(&mut self) {
        self.state.refill_timer = 0.0;
        self.state.is_boosting = false;
    }

    /// Turn axis sample. `dt` is the current frame's delta.
    pub fn move_right(&mut self, value: f32, dt: f32, body: &mut dyn PhysicsBody) {
        if !self.state.can_act {
            return;
        }
        self.state.current_turn_rate = interp_to(
            self.state.current_turn_rate,
            value,
            dt,
            self.tuning.turn_interp_speed,
        );
        body.add_relative_yaw(self.tuning.turn_step_degrees * self.state.current_turn_rate);
    }

    /// Fires one round ahead of the ship. Returns the spawned projectile, if any.
    ///
    /// The round is spent before the spawn request, so a refused spawn still
    /// costs ammo.
    pub fn fire(&mut self, ctx: &mut ShipContext<'_>) -> Option<ActorHandle> {
        if !self.state.can_act || self.state.ammo_count == 0 {
            return None;
        }
        self.state.ammo_count -= 1;

        let transform = ctx.body.transform();
        let location = transform.location + transform.forward() * self.tuning.muzzle_offset;
        let handle = ctx
            .spawner
            .spawn(ActorClass::Projectile, location, transform.rotation);
        debug!(ammo = self.state.ammo_count, spawned = handle.is_some(), "fired");
        handle
    }
}

#[cfg(test)]
mod tests {
    use racer_shared::{
        ecs::EntityId,
        host::{ActorFactory, NullFactory, NullWorld, Transform, WorldQuery},
        math::{Rotator, Vec3},
    };

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum BodyCall {
        Force(Vec3),
        Movement(Vec3, f32),
        AngularDamping(f32),
        LinearDamping(f32),
        Yaw(f32),
    }

    struct RecordingBody {
        transform: Transform,
        mass: f32,
        calls: Vec<BodyCall>,
    }

    impl RecordingBody {
        fn new() -> Self {
            Self {
                transform: Transform::new(Vec3::new(0.0, 0.0, 50.0), Rotator::ZERO),
                mass: 2.0,
                calls: Vec::new(),
            }
        }

        fn forces(&self) -> Vec<Vec3> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    BodyCall::Force(f) => Some(*f),
                    _ => None,
                })
                .collect()
        }

        fn movements(&self) -> Vec<(Vec3, f32)> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    BodyCall::Movement(d, s) => Some((*d, *s)),
                    _ => None,
                })
                .collect()
        }
    }

    impl PhysicsBody for RecordingBody {
        fn add_force(&mut self, force: Vec3) {
            self.calls.push(BodyCall::Force(force));
        }
        fn add_movement_input(&mut self, direction: Vec3, scale: f32) {
            self.calls.push(BodyCall::Movement(direction, scale));
        }
        fn set_angular_damping(&mut self, damping: f32) {
            self.calls.push(BodyCall::AngularDamping(damping));
        }
        fn set_linear_damping(&mut self, damping: f32) {
            self.calls.push(BodyCall::LinearDamping(damping));
        }
        fn add_relative_yaw(&mut self, degrees: f32) {
            self.transform.rotation.add_yaw(degrees);
            self.calls.push(BodyCall::Yaw(degrees));
        }
        fn mass(&self) -> f32 {
            self.mass
        }
        fn transform(&self) -> Transform {
            self.transform
        }
    }

    struct Ground;

    impl WorldQuery for Ground {
        fn line_trace(&self, start: Vec3, end: Vec3, channels: ObjectChannels) -> bool {
            channels.contains(ObjectChannels::WORLD_STATIC) && start.z >= 0.0 && end.z <= 0.0
        }
    }

    #[derive(Default)]
    struct RecordingFactory {
        spawned: Vec<(ActorClass, Vec3, Rotator)>,
    }

    impl ActorFactory for RecordingFactory {
        fn spawn(&mut self, class: ActorClass, location: Vec3, rotation: Rotator) -> Option<ActorHandle> {
            self.spawned.push((class, location, rotation));
            Some(ActorHandle(EntityId(self.spawned.len() as u64)))
        }
    }

    struct Rig {
        body: RecordingBody,
        spawner: RecordingFactory,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                body: RecordingBody::new(),
                spawner: RecordingFactory::default(),
            }
        }

        fn tick(&mut self, ship: &mut ShipControl) {
            let mut ctx = ShipContext {
                body: &mut self.body,
                world: &NullWorld,
                spawner: &mut self.spawner,
            };
            ship.tick(1.0 / 60.0, &mut ctx);
        }

        fn tick_over_ground(&mut self, ship: &mut ShipControl) {
            let mut ctx = ShipContext {
                body: &mut self.body,
                world: &Ground,
                spawner: &mut self.spawner,
            };
            ship.tick(1.0 / 60.0, &mut ctx);
        }

        fn fire(&mut self, ship: &mut ShipControl) -> Option<ActorHandle> {
            let mut ctx = ShipContext {
                body: &mut self.body,
                world: &NullWorld,
                spawner: &mut self.spawner,
            };
            ship.fire(&mut ctx)
        }
    }

    fn active_ship() -> ShipControl {
        let mut ship = ShipControl::new(ShipTuning::default());
        ship.set_can_act(true);
        ship
    }

    #[test]
    fn new_ship_starts_idle_and_frozen() {
        let ship = ShipControl::new(ShipTuning::default());
        let s = ship.state();
        assert!(!s.is_driving && !s.is_braking && !s.is_boosting && !s.can_act);
        assert_eq!(s.boost_fuel, 5.0);
        assert_eq!(s.ammo_count, 10);
    }

    #[test]
    fn presses_are_ignored_while_frozen() {
        let mut ship = ShipControl::new(ShipTuning::default());
        ship.start_driving();
        ship.start_braking();
        ship.start_boosting();
        assert!(!ship.state().is_driving);
        assert!(!ship.state().is_braking);
        assert!(!ship.state().is_boosting);
    }

    #[test]
    fn releases_work_while_frozen() {
        let mut ship = active_ship();
        ship.start_driving();
        ship.set_can_act(false);
        ship.stop_driving();
        assert!(!ship.state().is_driving);
    }

    #[test]
    fn driving_requests_flat_forward_movement_and_reasserts_damping() {
        let mut ship = active_ship();
        let mut rig = Rig::new();
        rig.body.transform.rotation = Rotator::new(20.0, 0.0, 0.0);
        ship.start_driving();
        rig.tick(&mut ship);
        rig.tick(&mut ship);

        let moves = rig.body.movements();
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[0].0.z, 0.0);
        assert_eq!(moves[0].1, 1.0);
        let damping = rig
            .body
            .calls
            .iter()
            .filter(|c| matches!(c, BodyCall::AngularDamping(d) if *d == 5.0))
            .count();
        assert_eq!(damping, 2);
        assert!(rig.body.calls.contains(&BodyCall::LinearDamping(3.0)));
    }

    #[test]
    fn drive_and_brake_are_additive_by_default() {
        let mut ship = active_ship();
        let mut rig = Rig::new();
        ship.start_driving();
        ship.start_braking();
        rig.tick(&mut ship);
        let scales: Vec<f32> = rig.body.movements().iter().map(|m| m.1).collect();
        assert_eq!(scales, vec![1.0, -0.5]);
    }

    #[test]
    fn brake_wins_suppresses_drive_impulse() {
        let tuning = ShipTuning {
            drive_brake: DriveBrakeArbitration::BrakeWins,
            ..ShipTuning::default()
        };
        let mut ship = ShipControl::new(tuning);
        ship.set_can_act(true);
        let mut rig = Rig::new();
        ship.start_driving();
        ship.start_braking();
        rig.tick(&mut ship);
        let scales: Vec<f32> = rig.body.movements().iter().map(|m| m.1).collect();
        assert_eq!(scales, vec![-0.5]);
        assert!(rig.body.calls.contains(&BodyCall::AngularDamping(5.0)));
    }

    #[test]
    fn boost_drains_and_pushes_with_mass() {
        let mut ship = active_ship();
        let mut rig = Rig::new();
        ship.start_boosting();
        rig.tick(&mut ship);
        assert!((ship.state().boost_fuel - 4.95).abs() < 1e-5);
        let forces = rig.body.forces();
        assert_eq!(forces.len(), 1);
        assert!((forces[0].x - 2000.0 * 2.0).abs() < 1e-2);
    }

    #[test]
    fn boost_self_terminates_on_exhaustion() {
        let mut ship = active_ship();
        let mut rig = Rig::new();
        ship.start_boosting();
        let mut stopped_at = None;
        let mut last = ship.state().boost_fuel;
        for tick in 1..=120 {
            rig.tick(&mut ship);
            let fuel = ship.state().boost_fuel;
            assert!((0.0..=5.0).contains(&fuel));
            if ship.state().is_boosting {
                assert!(fuel < last);
            } else if stopped_at.is_none() {
                stopped_at = Some(tick);
            }
            last = fuel;
        }
        let stopped_at = stopped_at.unwrap();
        assert!((100..=101).contains(&stopped_at), "stopped at {stopped_at}");
    }

    #[test]
    fn boost_needs_fuel_to_start() {
        let mut ship = active_ship().with_fuel(0.0);
        ship.start_boosting();
        assert!(!ship.state().is_boosting);
    }

    #[test]
    fn releasing_boost_resets_refill_timer() {
        let mut ship = active_ship();
        let mut rig = Rig::new();
        for _ in 0..30 {
            rig.tick(&mut ship);
        }
        assert!(ship.state().refill_timer > 0.25);
        ship.stop_boosting();
        assert_eq!(ship.state().refill_timer, 0.0);
    }

    #[test]
    fn continuous_refill_keeps_topping_up_after_threshold() {
        let mut ship = active_ship().with_fuel(1.0);
        let mut rig = Rig::new();
        // 100 ticks of 0.01 reach the threshold; f32 steps may need one more.
        for _ in 0..101 {
            rig.tick(&mut ship);
        }
        let after_threshold = ship.state().boost_fuel;
        assert!(after_threshold > 1.0);
        for _ in 0..50 {
            rig.tick(&mut ship);
        }
        assert!((ship.state().boost_fuel - (after_threshold + 0.5)).abs() < 1e-3);
    }

    #[test]
    fn metered_refill_adds_once_per_threshold() {
        let tuning = ShipTuning {
            refill_policy: RefillPolicy::Metered,
            ..ShipTuning::default()
        };
        let mut ship = ShipControl::new(tuning).with_fuel(1.0);
        ship.set_can_act(true);
        let mut rig = Rig::new();
        for _ in 0..250 {
            rig.tick(&mut ship);
        }
        // Two threshold crossings in 250 ticks.
        assert!((ship.state().boost_fuel - 1.02).abs() < 1e-4);
    }

    #[test]
    fn refill_never_exceeds_max() {
        let mut ship = active_ship().with_fuel(4.999);
        let mut rig = Rig::new();
        for _ in 0..300 {
            rig.tick(&mut ship);
        }
        assert_eq!(ship.state().boost_fuel, 5.0);
    }

    #[test]
    fn hover_force_only_near_ground() {
        let mut ship = active_ship();
        let mut rig = Rig::new();
        rig.tick_over_ground(&mut ship);
        assert_eq!(rig.body.forces(), vec![Vec3::new(0.0, 0.0, 1600.0)]);

        rig.body.calls.clear();
        rig.body.transform.location.z = 150.0;
        rig.tick_over_ground(&mut ship);
        assert!(rig.body.forces().is_empty());
    }

    #[test]
    fn turn_rate_converges_monotonically() {
        let mut ship = active_ship();
        let mut body = RecordingBody::new();
        let mut last = 0.0;
        for _ in 0..600 {
            ship.move_right(1.0, 1.0 / 60.0, &mut body);
            let rate = ship.state().current_turn_rate;
            assert!(rate >= last && rate <= 1.0);
            last = rate;
        }
        assert!(last > 0.99);
        match body.calls.last() {
            Some(BodyCall::Yaw(deg)) => assert!((deg - 3.0 * last).abs() < 1e-4),
            other => panic!("expected yaw, got {other:?}"),
        }
    }

    #[test]
    fn turn_is_ignored_while_frozen() {
        let mut ship = ShipControl::new(ShipTuning::default());
        let mut body = RecordingBody::new();
        ship.move_right(1.0, 0.1, &mut body);
        assert_eq!(ship.state().current_turn_rate, 0.0);
        assert!(body.calls.is_empty());
    }

    #[test]
    fn fire_spends_ammo_and_spawns_ahead() {
        let tuning = ShipTuning {
            start_ammo: 3,
            ..ShipTuning::default()
        };
        let mut ship = ShipControl::new(tuning);
        ship.set_can_act(true);
        let mut rig = Rig::new();
        rig.body.transform.rotation = Rotator::new(0.0, 90.0, 0.0);

        let handles: Vec<_> = (0..4).map(|_| rig.fire(&mut ship)).collect();
        assert_eq!(handles.iter().filter(|h| h.is_some()).count(), 3);
        assert!(handles[3].is_none());
        assert_eq!(ship.state().ammo_count, 0);
        assert_eq!(rig.spawner.spawned.len(), 3);

        let (class, location, rotation) = rig.spawner.spawned[0];
        assert_eq!(class, ActorClass::Projectile);
        assert!((location.y - 400.0).abs() < 1e-3);
        assert!(location.x.abs() < 1e-3);
        assert_eq!(rotation.yaw, 90.0);
    }

    #[test]
    fn refused_spawn_still_spends_the_round() {
        let mut ship = active_ship();
        let mut body = RecordingBody::new();
        let mut ctx = ShipContext {
            body: &mut body,
            world: &NullWorld,
            spawner: &mut NullFactory,
        };
        assert!(ship.fire(&mut ctx).is_none());
        assert_eq!(ship.state().ammo_count, ship.tuning().start_ammo - 1);
    }

    #[test]
    fn fire_is_ignored_while_frozen() {
        let mut ship = ShipControl::new(ShipTuning::default());
        let mut rig = Rig::new();
        assert!(rig.fire(&mut ship).is_none());
        assert_eq!(ship.state().ammo_count, 10);
    }

    #[test]
    fn dispatch_routes_events() {
        let mut ship = active_ship();
        let mut rig = Rig::new();
        let mut ctx = ShipContext {
            body: &mut rig.body,
            world: &NullWorld,
            spawner: &mut rig.spawner,
        };
        ship.dispatch(InputEvent::Pressed(Action::Drive), 0.1, &mut ctx);
        ship.dispatch(InputEvent::Pressed(Action::Boost), 0.1, &mut ctx);
        ship.dispatch(InputEvent::Pressed(Action::Fire), 0.1, &mut ctx);
        ship.dispatch(InputEvent::Released(Action::Fire), 0.1, &mut ctx);
        ship.dispatch(InputEvent::Axis(1.0), 0.1, &mut ctx);
        assert!(ship.state().is_driving && ship.state().is_boosting);
        assert_eq!(ship.state().ammo_count, 9);
        assert!((ship.state().current_turn_rate - 0.1).abs() < 1e-6);

        ship.dispatch(InputEvent::Released(Action::Boost), 0.1, &mut ctx);
        ship.dispatch(InputEvent::Released(Action::Drive), 0.1, &mut ctx);
        assert!(!ship.state().is_driving && !ship.state().is_boosting);
    }
}
