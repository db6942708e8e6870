//! Zip Dash entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent};

    use zip_dash::consts::TICK_MS;
    use zip_dash::input::MovementKeys;
    use zip_dash::levels::{self, LevelConfig};
    use zip_dash::sim::collision::WorldShape;
    use zip_dash::sim::resize::resize;
    use zip_dash::sim::{
        EndReason, GameEvent, GameMode, PhysicsWorld, Runner, Session, SessionConfig, TickInput,
    };
    use zip_dash::{Progress, Settings};

    /// Game instance holding all state
    struct Game {
        session: Session,
        runner: Runner,
        input: TickInput,
        keys: MovementKeys,
        ctx: CanvasRenderingContext2d,
        settings: Settings,
        progress: Progress,
        last_time: f64,
        cooldown: f32,
        shake_until: f64,
        flash_until: f64,
        result: Option<(u64, EndReason, Option<u8>)>,
        /// Character or difficulty changed since the session started
        settings_changed: bool,
    }

    impl Game {
        fn new(
            ctx: CanvasRenderingContext2d,
            config: SessionConfig,
            settings: Settings,
            progress: Progress,
        ) -> Result<Self, JsValue> {
            let session = Session::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
            Ok(Self {
                session,
                runner: Runner::new(),
                input: TickInput::default(),
                keys: MovementKeys::new(),
                ctx,
                settings,
                progress,
                last_time: 0.0,
                cooldown: 0.0,
                shake_until: 0.0,
                flash_until: 0.0,
                result: None,
                settings_changed: false,
            })
        }

        /// Start a fresh session on `level` in `mode`
        fn start(&mut self, level: LevelConfig, mode: GameMode, seed: u64) {
            let config = SessionConfig::new(level, self.session.width, self.session.height)
                .with_mode(mode)
                .with_settings(&self.settings)
                .with_unlocks(&self.progress)
                .with_seed(seed);
            match Session::new(config) {
                Ok(session) => {
                    self.session.teardown();
                    self.session = session;
                    self.runner = Runner::new();
                    self.input = TickInput::default();
                    self.cooldown = 0.0;
                    self.result = None;
                    self.settings_changed = false;
                }
                Err(e) => log::error!("Cannot start level: {}", e),
            }
        }

        /// Replay the same level; a changed character or difficulty needs a
        /// fresh session
        fn restart(&mut self) {
            if self.settings_changed {
                let level = self.session.config.level.clone();
                let mode = self.session.config.mode;
                self.start(level, mode, js_sys::Date::now() as u64);
                return;
            }
            self.session.reset();
            self.runner = Runner::new();
            self.input = TickInput::default();
            self.result = None;
        }

        /// Run simulation ticks for the time since the last call
        fn update(&mut self, now: f64) {
            let frame = if self.last_time > 0.0 {
                now - self.last_time
            } else {
                TICK_MS
            };
            self.last_time = now;

            // Held keys keep steering at full speed
            self.keys.apply(&mut self.input);

            let events = self
                .runner
                .advance(&mut self.session, frame, now, &mut self.input);
            for event in events {
                self.handle_event(event, now);
            }
        }

        fn handle_event(&mut self, event: GameEvent, now: f64) {
            match event {
                GameEvent::DashCooldown { fraction } => self.cooldown = fraction,
                GameEvent::PlayerHit {
                    flash, feedback_ms, ..
                } => {
                    self.shake_until = now + feedback_ms;
                    if flash {
                        self.flash_until = now + zip_dash::consts::HIT_FLASH_MS;
                    }
                }
                GameEvent::LevelComplete { score, stars } => {
                    log::info!("Level complete with {} ({} stars)", score, stars);
                    self.result = Some((score, EndReason::Completion, Some(stars)));
                }
                GameEvent::GameOver { score, reason } => {
                    self.record(score);
                    if self.result.is_none() {
                        self.result = Some((score, reason, None));
                    }
                }
                _ => {}
            }
        }

        fn record(&mut self, score: u64) {
            match self.session.config.mode {
                GameMode::Challenge => {
                    self.progress.record_level(
                        &self.session.config.level,
                        score,
                        levels::level_count(),
                    );
                }
                GameMode::Endless => {
                    self.progress.record_endless(score);
                }
            }
            if let Err(e) = self.progress.save() {
                log::warn!("Failed to save progress: {}", e);
            }
        }

        fn key_down(&mut self, key: &str) {
            if self.keys.set(key, true) {
                self.input.movement = Some(self.keys.direction());
                return;
            }
            match key {
                " " => self.input.dash = true,
                "Escape" | "p" | "P" => self.input.toggle_pause = true,
                "r" | "R" if self.session.is_game_over() => self.restart(),
                "c" | "C" if self.session.is_game_over() => {
                    self.settings.variant = self.progress.next_variant(self.settings.variant);
                    self.save_settings();
                }
                "v" | "V" if self.session.is_game_over() => {
                    self.settings.difficulty = self.settings.difficulty.next();
                    self.save_settings();
                }
                "e" | "E" if self.session.is_game_over() => {
                    if let Some(level) = levels::level(1) {
                        self.start(level, GameMode::Endless, js_sys::Date::now() as u64);
                    }
                }
                _ => {
                    // Number keys pick an unlocked challenge level (0 is level 10)
                    let Some(digit) = key.chars().next().and_then(|c| c.to_digit(10)) else {
                        return;
                    };
                    let id = if digit == 0 { 10 } else { digit };
                    if !self.session.is_game_over() || !self.progress.is_unlocked(id) {
                        return;
                    }
                    if let Some(level) = levels::level(id) {
                        self.start(level, GameMode::Challenge, js_sys::Date::now() as u64);
                    }
                }
            }
        }

        fn save_settings(&mut self) {
            self.settings_changed = true;
            log::info!(
                "Settings: difficulty={} variant={:?}",
                self.settings.difficulty.as_str(),
                self.settings.variant
            );
            if let Err(e) = self.settings.save() {
                log::warn!("Failed to save settings: {}", e);
            }
        }

        fn key_up(&mut self, key: &str) {
            if self.keys.set(key, false) {
                self.input.movement = Some(self.keys.direction());
            }
        }

        /// Render the current frame
        fn render(&self, now: f64) -> Result<(), JsValue> {
            let ctx = &self.ctx;
            let (w, h) = (self.session.width as f64, self.session.height as f64);

            ctx.save();
            if now < self.shake_until {
                let dx = (js_sys::Math::random() - 0.5) * 10.0;
                let dy = (js_sys::Math::random() - 0.5) * 10.0;
                ctx.translate(dx, dy)?;
            }

            ctx.set_fill_style_str("#10131c");
            ctx.fill_rect(-10.0, -10.0, w + 20.0, h + 20.0);

            let world = &self.session.world;

            ctx.set_fill_style_str("#6ad1ff");
            for &particle in &self.session.particles {
                if let Some(body) = world.body(particle) {
                    ctx.set_global_alpha(0.4);
                    for shape in body.world_shapes() {
                        draw_shape(ctx, &shape)?;
                    }
                }
            }
            ctx.set_global_alpha(1.0);

            ctx.set_fill_style_str("#ff5c7a");
            for obstacle in &self.session.obstacles {
                if let Some(body) = world.body(obstacle.body) {
                    for shape in body.world_shapes() {
                        draw_shape(ctx, &shape)?;
                    }
                }
            }

            if let Some(body) = self.session.player.and_then(|p| world.body(p)) {
                let color = if now < self.flash_until {
                    "#ffffff"
                } else if body.category() == zip_dash::sim::CATEGORY_GHOST {
                    "#b9f3ff"
                } else {
                    "#ffd166"
                };
                ctx.set_fill_style_str(color);
                for shape in body.world_shapes() {
                    draw_shape(ctx, &shape)?;
                }
            }
            ctx.restore();

            self.render_hud(w, h)
        }

        fn render_hud(&self, w: f64, h: f64) -> Result<(), JsValue> {
            let ctx = &self.ctx;
            ctx.set_fill_style_str("#ffffff");
            ctx.set_font("20px monospace");
            ctx.set_text_align("left");
            ctx.fill_text(&format!("Score {}", self.session.score), 16.0, 32.0)?;
            if self.session.config.mode == GameMode::Challenge {
                let level = &self.session.config.level;
                ctx.fill_text(
                    &format!("{} / {}", level.name, level.target_score),
                    16.0,
                    58.0,
                )?;
            } else {
                ctx.fill_text(
                    &format!("Best {}", self.progress.endless_high_score),
                    16.0,
                    58.0,
                )?;
            }

            // Dash cooldown bar, full when ready
            let bar = 120.0;
            ctx.set_fill_style_str("#333a4d");
            ctx.fill_rect(w - bar - 16.0, 20.0, bar, 10.0);
            ctx.set_fill_style_str("#6ad1ff");
            ctx.fill_rect(
                w - bar - 16.0,
                20.0,
                bar * (1.0 - self.cooldown as f64),
                10.0,
            );

            ctx.set_text_align("center");
            if self.session.is_paused() {
                ctx.set_font("36px monospace");
                ctx.fill_text("PAUSED", w / 2.0, h / 2.0)?;
            }
            if let Some((score, reason, stars)) = self.result {
                ctx.set_font("36px monospace");
                let title = match reason {
                    EndReason::Collision => "GAME OVER",
                    EndReason::Completion => "LEVEL COMPLETE",
                };
                ctx.fill_text(title, w / 2.0, h / 2.0 - 30.0)?;
                ctx.set_font("20px monospace");
                let line = match stars {
                    Some(stars) => format!("Score {}  {}", score, "*".repeat(stars as usize)),
                    None => format!("Score {}", score),
                };
                ctx.fill_text(&line, w / 2.0, h / 2.0 + 10.0)?;
                ctx.fill_text("R retry · E endless · 1-9/0 level", w / 2.0, h / 2.0 + 40.0)?;
                let profile = format!(
                    "C {:?} · V {} · {} stars",
                    self.progress.playable_variant(self.settings.variant),
                    self.settings.difficulty.as_str(),
                    self.progress.total_stars()
                );
                ctx.fill_text(&profile, w / 2.0, h / 2.0 + 70.0)?;
            }
            Ok(())
        }
    }

    fn draw_shape(ctx: &CanvasRenderingContext2d, shape: &WorldShape) -> Result<(), JsValue> {
        ctx.begin_path();
        match shape {
            WorldShape::Circle { center, radius } => {
                ctx.arc(
                    center.x as f64,
                    center.y as f64,
                    *radius as f64,
                    0.0,
                    std::f64::consts::TAU,
                )?;
            }
            WorldShape::Polygon { vertices } => {
                let Some(first) = vertices.first() else {
                    return Ok(());
                };
                ctx.move_to(first.x as f64, first.y as f64);
                for v in &vertices[1..] {
                    ctx.line_to(v.x as f64, v.y as f64);
                }
                ctx.close_path();
            }
        }
        ctx.fill();
        Ok(())
    }

    fn window_size(window: &web_sys::Window) -> (f32, f32) {
        let w = window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(800.0);
        let h = window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(600.0);
        (w as f32, h as f32)
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Zip Dash starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("canvas element not found")?
            .dyn_into()?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("2d context unavailable")?
            .dyn_into()?;

        let (width, height) = window_size(&window);
        canvas.set_width(width as u32);
        canvas.set_height(height as u32);

        let settings = Settings::load();
        let progress = Progress::load();
        let level = levels::level(1).ok_or("level table is empty")?;
        let config = SessionConfig::new(level, width, height)
            .with_settings(&settings)
            .with_unlocks(&progress)
            .with_seed(js_sys::Date::now() as u64);
        log::info!(
            "Settings: difficulty={} variant={:?}",
            settings.difficulty.as_str(),
            settings.variant
        );

        let game = Rc::new(RefCell::new(Game::new(ctx, config, settings, progress)?));

        setup_input_handlers(&window, game.clone())?;
        setup_resize_handler(&window, canvas, game.clone())?;
        start_interval(&window, game)?;

        log::info!("Zip Dash running!");
        Ok(())
    }

    fn setup_input_handlers(
        window: &web_sys::Window,
        game: Rc<RefCell<Game>>,
    ) -> Result<(), JsValue> {
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                let key = event.key();
                if key.starts_with("Arrow") || key == " " {
                    event.prevent_default();
                }
                game.borrow_mut().key_down(&key);
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().key_up(&event.key());
            });
            window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_resize_handler(
        window: &web_sys::Window,
        canvas: HtmlCanvasElement,
        game: Rc<RefCell<Game>>,
    ) -> Result<(), JsValue> {
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let (width, height) = window_size(&window);
            canvas.set_width(width as u32);
            canvas.set_height(height as u32);
            resize(&mut game.borrow_mut().session, width, height);
        });
        window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn start_interval(window: &web_sys::Window, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let performance = window.performance().ok_or("performance unavailable")?;
        let closure = Closure::<dyn FnMut()>::new(move || {
            let now = performance.now();
            let mut g = game.borrow_mut();
            g.update(now);
            if let Err(e) = g.render(now) {
                log::warn!("Render error: {:?}", e);
            }
        });
        window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            TICK_MS as i32,
        )?;
        closure.forget();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = wasm_game::run() {
        log::error!("Startup failed: {:?}", e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Zip Dash (native) starting...");
    log::info!("Native mode runs a headless session - build for wasm32 to play");

    if let Err(e) = headless_run() {
        log::error!("Headless run failed: {}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play one endless session with a player that dashes whenever it can and
/// report how far it got
#[cfg(not(target_arch = "wasm32"))]
fn headless_run() -> Result<(), zip_dash::ConfigError> {
    use zip_dash::consts::TICK_MS;
    use zip_dash::sim::{GameEvent, Session, SessionConfig, TickInput, tick};
    use zip_dash::{Progress, Settings, levels};

    let settings = Settings::load();
    let Some(level) = levels::level(1) else {
        return Ok(());
    };
    let mut progress = Progress::load();
    let config = SessionConfig::new(level, 800.0, 600.0)
        .with_settings(&settings)
        .with_unlocks(&progress)
        .with_seed(7);
    let mut session = Session::new(config)?;

    let dash = TickInput {
        dash: true,
        ..Default::default()
    };
    for i in 0..20_000u32 {
        let now = i as f64 * TICK_MS;
        for event in tick(&mut session, &dash, now) {
            if let GameEvent::GameOver { score, reason } = event {
                let best = progress.record_endless(score);
                println!(
                    "Game over after {} ticks: score {} ({:?}), new best: {}",
                    i, score, reason, best
                );
                session.teardown();
                return Ok(());
            }
        }
    }
    println!("Survived with score {}", session.score);
    session.teardown();
    Ok(())
}
