//! Headless game host.
//!
//! Owns everything the ship only borrows: its physics body, the ground, the
//! actor world and the input queue. Each [`GameHost::step`] runs one fixed
//! simulation frame:
//! - drain console lines
//! - advance the start countdown and apply the control gate
//! - dispatch queued input events in arrival order, then the held turn axis
//! - tick the ship, then enemies
//! - integrate bodies and advance projectiles
//!
//! Nothing inside a step runs concurrently, so input handlers and ship
//! ticks never interleave.

use std::{path::Path, time::Duration};

use anyhow::Context;
use racer_shared::{
    config::GameConfig,
    console::{Console, CvarFlags, CvarValue},
    event::EventQueue,
    host::{ActorClass, ActorFactory, ActorHandle, AiController, PhysicsBody, ShipContext, Transform},
    math::{Rotator, Vec3},
    save::SaveGame,
};
use racer_ship::{
    enemy::{EnemyMode, EnemyShip, Pursuit},
    Countdown, CountdownEvent, InputEvent, InputState, ShipControl,
};
use tokio::{sync::mpsc, time::Instant};
use tracing::{debug, info, warn};

use crate::sim::{
    ActorWorld, FlatGround, MovementParams, SimBody, ENEMY_MASS, PLAYER_MASS,
};

/// Pending navigation request from an enemy's AI controller.
#[derive(Debug, Default)]
struct NavAgent {
    goal: Option<(ActorHandle, f32)>,
}

impl NavAgent {
    /// Steers `body` toward the goal, if `locate` can still find it. Returns
    /// true on the frame the body comes within the acceptance radius, which
    /// also clears the goal.
    fn follow(&mut self, body: &mut SimBody, locate: impl Fn(ActorHandle) -> Option<Vec3>) -> bool {
        let Some((target, acceptance)) = self.goal else {
            return false;
        };
        let Some(target_location) = locate(target) else {
            return false;
        };
        let to_target = (target_location - body.transform().location).flattened();
        if to_target.len() <= acceptance {
            self.goal = None;
            return true;
        }
        body.add_movement_input(to_target.normalize_or_zero(), 1.0);
        false
    }
}

impl AiController for NavAgent {
    fn move_to_actor(&mut self, target: ActorHandle, acceptance_radius: f32) {
        self.goal = Some((target, acceptance_radius));
    }
}

/// One spawned enemy.
pub struct EnemyActor {
    pub handle: ActorHandle,
    pub ship: EnemyShip,
    pub body: SimBody,
    nav: NavAgent,
}

/// Headless game host.
pub struct GameHost {
    pub cfg: GameConfig,
    pub console: Console,

    ship: ShipControl,
    player: ActorHandle,
    player_body: SimBody,
    ground: FlatGround,
    actors: ActorWorld,
    enemies: Vec<EnemyActor>,
    countdown: Countdown,

    events: EventQueue<InputEvent>,
    input: InputState,
    tick: u32,
    quit_requested: bool,

    /// Channel for console commands from stdin.
    console_rx: Option<mpsc::Receiver<String>>,
}

impl GameHost {
    /// Builds a session: player at the configured start, enemies at their spawns.
    pub fn new(cfg: GameConfig) -> Self {
        let mut console = Console::new();
        Self::register_cvars(&mut console, &cfg);

        let mut actors = ActorWorld::default();
        let player = actors.reserve();
        let player_body = SimBody::new(
            Transform::new(cfg.player_start, Rotator::ZERO),
            PLAYER_MASS,
            MovementParams::default(),
        );

        let enemy_movement = MovementParams {
            max_speed: cfg.enemy.max_speed,
            acceleration: cfg.enemy.max_acceleration,
        };
        let mut enemies = Vec::with_capacity(cfg.enemy_spawns.len());
        for spawn in &cfg.enemy_spawns {
            // Enemies start facing the player's start, level with the ground.
            let facing = Rotator::from_direction((cfg.player_start - *spawn).flattened());
            let Some(handle) = actors.spawn(ActorClass::EnemyShip, *spawn, facing) else {
                warn!(location = ?spawn, "enemy spawn refused");
                continue;
            };
            enemies.push(EnemyActor {
                handle,
                ship: EnemyShip::new(cfg.enemy.clone()),
                body: SimBody::new(Transform::new(*spawn, facing), ENEMY_MASS, enemy_movement),
                nav: NavAgent::default(),
            });
        }

        let ship = ShipControl::new(cfg.ship.clone());
        let countdown = Countdown::new(cfg.countdown_seconds);
        let ground = FlatGround {
            height: cfg.ground_height,
        };

        info!(
            player = %cfg.player_name,
            enemies = enemies.len(),
            countdown = cfg.countdown_seconds,
            "session created"
        );

        Self {
            cfg,
            console,
            ship,
            player,
            player_body,
            ground,
            actors,
            enemies,
            countdown,
            events: EventQueue::default(),
            input: InputState::default(),
            tick: 0,
            quit_requested: false,
            console_rx: None,
        }
    }

    fn register_cvars(console: &mut Console, cfg: &GameConfig) {
        console.register_cvar(
            "sv_tickrate",
            CvarValue::Int(i64::from(cfg.tick_hz)),
            "Simulation tick rate",
            CvarFlags::READ_ONLY,
        );
        console.register_cvar(
            "sv_paused",
            CvarValue::Bool(false),
            "Freeze ship control",
            CvarFlags::NOTIFY,
        );
    }

    /// Sets the console input receiver.
    pub fn set_console_input(&mut self, rx: mpsc::Receiver<String>) {
        self.console_rx = Some(rx);
    }

    /// Queues an input event for the next step.
    pub fn push_input(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    pub fn ship(&self) -> &ShipControl {
        &self.ship
    }

    pub fn player(&self) -> ActorHandle {
        self.player
    }

    pub fn player_body(&self) -> &SimBody {
        &self.player_body
    }

    pub fn actors(&self) -> &ActorWorld {
        &self.actors
    }

    pub fn enemies(&self) -> &[EnemyActor] {
        &self.enemies
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Runs the host for a number of ticks, paced at the configured rate.
    pub async fn run_for_ticks(&mut self, ticks: u32) -> anyhow::Result<()> {
        let dt = Duration::from_secs_f32(self.cfg.tick_dt());
        let mut next = Instant::now();

        for _ in 0..ticks {
            next += dt;
            self.step(dt.as_secs_f32())?;
            if self.quit_requested {
                break;
            }
            tokio::time::sleep_until(next).await;
        }
        Ok(())
    }

    /// Executes one fixed simulation step.
    pub fn step(&mut self, dt: f32) -> anyhow::Result<()> {
        self.process_console_commands();

        if let Some(CountdownEvent::Finished) = self.countdown.tick(dt) {
            info!(tick = self.tick, "race started");
        }
        let can_act = self.countdown.is_finished() && !self.console.cvar_bool("sv_paused");
        self.ship.set_can_act(can_act);

        self.dispatch_input(dt);
        {
            let mut ctx = ShipContext {
                body: &mut self.player_body,
                world: &self.ground,
                spawner: &mut self.actors,
            };
            self.ship.tick(dt, &mut ctx);
        }
        self.simulate_enemies(dt);

        self.player_body.integrate(dt, self.ground.height);
        self.actors.advance_projectiles(dt);
        self.tick += 1;
        Ok(())
    }

    fn dispatch_input(&mut self, dt: f32) {
        let mut ctx = ShipContext {
            body: &mut self.player_body,
            world: &self.ground,
            spawner: &mut self.actors,
        };
        for event in self.events.drain() {
            match event {
                InputEvent::Axis(_) => self.input.apply(event),
                _ => self.ship.dispatch(event, dt, &mut ctx),
            }
        }
        // Axis bindings fire every frame, held value or not.
        self.ship.move_right(self.input.turn, dt, ctx.body);
    }

    fn simulate_enemies(&mut self, dt: f32) {
        let player = self.player;
        let player_location = self.player_body.transform().location;
        let locate = |target: ActorHandle| (target == player).then_some(player_location);

        for enemy in &mut self.enemies {
            let own = enemy.body.transform().location;
            enemy
                .ship
                .sense_player(own, player, player_location, &mut enemy.nav);

            let target_location = match enemy.ship.mode() {
                EnemyMode::Chasing { target } => locate(target),
                EnemyMode::Idle => None,
            };
            let arrived = match enemy.ship.tick(&mut enemy.body, target_location) {
                Pursuit::Arrived => true,
                Pursuit::Holding | Pursuit::Steering => {
                    let done = enemy.nav.follow(&mut enemy.body, locate);
                    if done {
                        enemy.ship.on_move_completed();
                    }
                    done
                }
            };
            if arrived {
                enemy.body.halt();
            }

            enemy.body.integrate(dt, self.ground.height);
            self.actors
                .sync_transform(enemy.handle.0, enemy.body.transform());
        }
    }

    fn process_console_commands(&mut self) {
        let lines: Vec<String> = match self.console_rx.as_mut() {
            Some(rx) => std::iter::from_fn(|| rx.try_recv().ok()).collect(),
            None => Vec::new(),
        };
        for line in lines {
            match self.exec_console(&line) {
                Ok(output) => {
                    for out in output {
                        info!("{}", out);
                    }
                }
                Err(e) => warn!(command = %line, "console command failed: {:#}", e),
            }
        }
    }

    /// Executes a console command and returns its output lines.
    pub fn exec_console(&mut self, line: &str) -> anyhow::Result<Vec<String>> {
        let line = line.trim();
        if let Some(event) = InputEvent::parse(line) {
            debug!(?event, "queued input");
            self.push_input(event);
            return Ok(Vec::new());
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => Ok(Vec::new()),
            ["status"] => Ok(self.status_lines()),
            ["status", "json"] => {
                let json = serde_json::to_string(self.ship.state()).context("serialize ship state")?;
                Ok(vec![json])
            }
            ["save", path] => {
                self.save_game(Path::new(path))?;
                Ok(vec![format!("Saved to {}", path)])
            }
            ["load", path] => {
                self.load_game(Path::new(path))?;
                Ok(vec![format!("Loaded {}", path)])
            }
            ["save" | "load"] => Ok(vec![format!("Usage: {} <path>", tokens[0])]),
            ["quit" | "exit"] => {
                info!("host shutting down");
                self.quit_requested = true;
                Ok(vec!["Bye".to_string()])
            }
            _ => self.console.exec(line),
        }
    }

    pub fn status_lines(&self) -> Vec<String> {
        let s = self.ship.state();
        let t = self.player_body.transform();
        let mut out = vec![
            format!("Tick: {}", self.tick),
            format!("Countdown: {}", self.countdown.display_text()),
            format!(
                "Ship: can_act={} driving={} braking={} boosting={}",
                s.can_act, s.is_driving, s.is_braking, s.is_boosting
            ),
            format!(
                "Fuel: {:.2} refill_timer={:.2} ammo={} turn={:.3}",
                s.boost_fuel, s.refill_timer, s.ammo_count, s.current_turn_rate
            ),
            format!(
                "Location: ({:.1}, {:.1}, {:.1}) yaw={:.1}",
                t.location.x, t.location.y, t.location.z, t.rotation.yaw
            ),
            format!(
                "Projectiles: {} inputs_received={}",
                self.actors.count(ActorClass::Projectile),
                self.events.total_pushed()
            ),
        ];
        for enemy in &self.enemies {
            let loc = enemy.body.transform().location;
            out.push(format!(
                "  enemy {:?}: {:?} {:?} at ({:.1}, {:.1}, {:.1})",
                enemy.handle.0,
                enemy.ship.scheme(),
                enemy.ship.mode(),
                loc.x,
                loc.y,
                loc.z
            ));
        }
        out
    }

    /// Writes the player's name and transform to `path`.
    pub fn save_game(&self, path: &Path) -> anyhow::Result<()> {
        let save = SaveGame::new(&self.cfg.player_name, 0, self.player_body.transform().into());
        save.save_to(path)?;
        info!(path = %path.display(), "game saved");
        Ok(())
    }

    /// Moves the player to the transform stored in `path`.
    pub fn load_game(&mut self, path: &Path) -> anyhow::Result<()> {
        let save = SaveGame::load_from(path).context("load game")?;
        self.player_body
            .set_transform(Transform::new(save.stats.location, save.stats.rotation));
        info!(path = %path.display(), player = %save.player_name, "game loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use racer_shared::config::EnemyTuning;
    use racer_ship::Action;

    use super::*;

    fn host_without_countdown() -> GameHost {
        GameHost::new(GameConfig {
            countdown_seconds: 0,
            ..GameConfig::default()
        })
    }

    #[test]
    fn countdown_holds_control_until_finished() -> anyhow::Result<()> {
        let mut host = GameHost::new(GameConfig::default());
        let dt = host.cfg.tick_dt();
        host.push_input(InputEvent::Pressed(Action::Drive));
        host.step(dt)?;
        assert!(!host.ship().state().is_driving);

        for _ in 0..(3 * host.cfg.tick_hz + 1) {
            host.step(dt)?;
        }
        assert!(host.countdown().is_finished());
        host.push_input(InputEvent::Pressed(Action::Drive));
        host.step(dt)?;
        assert!(host.ship().state().is_driving);
        Ok(())
    }

    #[test]
    fn paused_cvar_freezes_control() -> anyhow::Result<()> {
        let mut host = host_without_countdown();
        host.exec_console("sv_paused true")?;
        host.exec_console("+drive")?;
        host.step(host.cfg.tick_dt())?;
        assert!(!host.ship().can_act());
        assert!(!host.ship().state().is_driving);
        Ok(())
    }

    #[test]
    fn console_fire_spawns_projectile() -> anyhow::Result<()> {
        let mut host = host_without_countdown();
        host.exec_console("fire")?;
        host.step(host.cfg.tick_dt())?;
        assert_eq!(host.actors().count(ActorClass::Projectile), 1);
        assert_eq!(host.ship().state().ammo_count, host.ship().tuning().start_ammo - 1);
        Ok(())
    }

    #[test]
    fn driving_moves_player_forward() -> anyhow::Result<()> {
        let mut host = host_without_countdown();
        host.push_input(InputEvent::Pressed(Action::Drive));
        for _ in 0..60 {
            host.step(host.cfg.tick_dt())?;
        }
        assert!(host.player_body().transform().location.x > 10.0);
        assert_eq!(host.player_body().angular_damping(), 5.0);
        assert_eq!(host.player_body().linear_damping(), 3.0);
        Ok(())
    }

    #[test]
    fn held_turn_axis_yaws_every_frame() -> anyhow::Result<()> {
        let mut host = host_without_countdown();
        host.exec_console("turn 1")?;
        for _ in 0..30 {
            host.step(host.cfg.tick_dt())?;
        }
        assert!(host.player_body().transform().rotation.yaw > 0.0);
        assert!(host.ship().state().current_turn_rate > 0.0);
        Ok(())
    }

    #[test]
    fn ai_enemy_chases_player_in_range() -> anyhow::Result<()> {
        let mut host = GameHost::new(GameConfig {
            countdown_seconds: 0,
            enemy_spawns: vec![Vec3::new(500.0, 0.0, 0.0)],
            ..GameConfig::default()
        });
        let start = host.enemies()[0].body.transform();
        assert!((start.rotation.yaw.abs() - 180.0).abs() < 1e-3, "spawned facing the player");
        let start = start.location;
        for _ in 0..10 {
            host.step(host.cfg.tick_dt())?;
        }
        let enemy = &host.enemies()[0];
        assert_eq!(enemy.ship.mode(), EnemyMode::Chasing { target: host.player() });
        assert!(enemy.body.transform().location.x < start.x);
        assert_eq!(host.actors().transform(enemy.handle.0), Some(enemy.body.transform()));
        Ok(())
    }

    #[test]
    fn chasing_enemy_settles_and_ignores_departed_player() -> anyhow::Result<()> {
        for floating in [false, true] {
            let mut host = GameHost::new(GameConfig {
                countdown_seconds: 0,
                enemy: EnemyTuning {
                    floating,
                    ..EnemyTuning::default()
                },
                enemy_spawns: vec![Vec3::new(500.0, 0.0, 0.0)],
                ..GameConfig::default()
            });
            let dt = host.cfg.tick_dt();
            for _ in 0..300 {
                host.step(dt)?;
            }

            let enemy = &host.enemies()[0];
            let rest = enemy.body.transform().location;
            let gap = (host.player_body().transform().location - rest).flattened().len();
            assert!(gap <= 100.0, "floating={floating}: stopped {gap} from the player");
            assert_eq!(enemy.body.velocity().flattened(), Vec3::ZERO);
            assert_eq!(enemy.ship.mode(), EnemyMode::Idle);
            assert!(enemy.nav.goal.is_none());

            host.player_body
                .set_transform(Transform::new(Vec3::new(-8000.0, 0.0, 50.0), Rotator::ZERO));
            for _ in 0..120 {
                host.step(dt)?;
            }
            let enemy = &host.enemies()[0];
            let drift = (enemy.body.transform().location - rest).flattened().len();
            assert!(drift < 1e-3, "floating={floating}: moved {drift} after the player left");
            assert_eq!(enemy.ship.mode(), EnemyMode::Idle);
            assert_eq!(host.actors().transform(enemy.handle.0), Some(enemy.body.transform()));
        }
        Ok(())
    }

    #[test]
    fn unknown_console_line_goes_to_cvar_console() -> anyhow::Result<()> {
        let mut host = host_without_countdown();
        let out = host.exec_console("sv_tickrate")?;
        assert_eq!(out, vec!["sv_tickrate = 60"]);
        assert_eq!(host.exec_console("save")?, vec!["Usage: save <path>"]);
        let json = host.exec_console("status json")?;
        assert!(json[0].contains("\"boost_fuel\":5.0"));
        host.exec_console("quit")?;
        assert!(host.quit_requested());
        Ok(())
    }
}
