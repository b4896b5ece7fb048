//! Lane Runner entry point
//!
//! Handles platform-specific initialization and runs the refresh loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{CustomEvent, HtmlCanvasElement};

    use lane_runner::platform::web::CanvasSurface;
    use lane_runner::renderer::canvas_size_for_viewport;
    use lane_runner::sim::GamePhase;
    use lane_runner::voice::{ClassificationEvent, ModelSource};
    use lane_runner::{Engine, Settings, SpriteCatalog};

    /// Where sprite images are served from
    const SPRITE_BASE_URL: &str = "/car_sprites";

    /// Game instance holding all state
    struct Game {
        engine: Engine,
        surface: CanvasSurface,
    }

    impl Game {
        /// One display refresh
        fn refresh(&mut self) {
            self.surface.sync_sprite_sizes(self.engine.catalog_mut());
            if let Err(e) = self.engine.on_refresh(&mut self.surface) {
                // Already logged by the engine; the next refresh starts clean
                log::debug!("Dropped frame: {}", e);
            }
        }

        fn fit_to_viewport(&self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
            let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
            self.surface
                .set_size(canvas_size_for_viewport(Vec2::new(w as f32, h as f32)));
        }
    }

    fn set_hidden(id: &str, hidden: bool) {
        let document = web_sys::window().and_then(|w| w.document());
        if let Some(el) = document.and_then(|d| d.get_element_by_id(id)) {
            let _ = el.set_attribute("class", if hidden { "hidden" } else { "" });
        }
    }

    /// Refresh the buttons and toast for the current phase
    fn update_ui(engine: &Engine) {
        let ready = engine.model_status().is_ready();
        let phase = engine.phase();
        set_hidden("model-buttons", phase != GamePhase::Idle);
        set_hidden("start-btn", !(ready && phase == GamePhase::Idle));
        set_hidden("game-over", phase != GamePhase::GameOver);
    }

    fn detail_field(detail: &JsValue, key: &str) -> Option<JsValue> {
        js_sys::Reflect::get(detail, &JsValue::from_str(key))
            .ok()
            .filter(|v| !v.is_undefined() && !v.is_null())
    }

    fn detail_array<T>(detail: &JsValue, key: &str, f: impl Fn(JsValue) -> Option<T>) -> Vec<T> {
        detail_field(detail, key)
            .map(|v| js_sys::Array::from(&v).iter().filter_map(f).collect())
            .unwrap_or_default()
    }

    /// Parse a `voicePrediction` event.
    ///
    /// The detail is either `{ className, scores }` or the recognizer's raw
    /// `{ labels, scores }`; the raw form is reduced to its top label here
    /// and dropped when that label is under `threshold`.
    fn classification_from_event(
        event: &CustomEvent,
        threshold: f32,
    ) -> Option<ClassificationEvent> {
        let detail = event.detail();
        let label = detail_field(&detail, "className").and_then(|v| v.as_string());
        let scores = detail_array(&detail, "scores", |s| s.as_f64().map(|s| s as f32));
        if label.is_some() {
            return Some(ClassificationEvent { label, scores });
        }
        let labels = detail_array(&detail, "labels", |l| l.as_string());
        if labels.is_empty() {
            return Some(ClassificationEvent { label, scores });
        }
        ClassificationEvent::from_scores(&labels, scores, threshold)
    }

    /// File names listed in a `modelLoading` event detail
    fn bundle_entries(detail: &JsValue) -> Vec<String> {
        detail_array(detail, "files", |f| f.as_string())
    }

    fn request_animation_frame(f: &Closure<dyn FnMut()>) {
        if let Some(window) = web_sys::window() {
            let _ = window.request_animation_frame(f.as_ref().unchecked_ref());
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Lane Runner starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let settings = Settings::load();
        let catalog = SpriteCatalog::default();
        let mut surface = CanvasSurface::new(canvas).expect("Failed to get 2d context");
        surface
            .load_images(&catalog, SPRITE_BASE_URL)
            .expect("Failed to create images");

        let mut engine = Engine::new(settings, catalog).expect("Invalid settings");
        engine.on_game_over(|score| {
            log::info!("Game over with score {}", score.floor());
            let document = web_sys::window().and_then(|w| w.document());
            if let Some(el) = document.and_then(|d| d.get_element_by_id("final-score")) {
                el.set_text_content(Some(&(score.floor() as i64).to_string()));
            }
        });

        let game = Rc::new(RefCell::new(Game { engine, surface }));
        game.borrow().fit_to_viewport();
        update_ui(&game.borrow().engine);

        setup_voice_events(game.clone());
        setup_buttons(game.clone());
        setup_resize(game.clone());

        // Refresh loop
        let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(Closure::new(move || {
            {
                let mut game = game.borrow_mut();
                let before = game.engine.phase();
                game.refresh();
                if game.engine.phase() != before {
                    update_ui(&game.engine);
                }
            }
            if let Some(cb) = f.borrow().as_ref() {
                request_animation_frame(cb);
            }
        }));
        if let Some(cb) = g.borrow().as_ref() {
            request_animation_frame(cb);
        }

        log::info!("Lane Runner running!");
    }

    fn setup_voice_events(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        // Classification results from the recognizer
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                let Some(event) = event.dyn_ref::<CustomEvent>() else {
                    return;
                };
                let mut g = game.borrow_mut();
                let threshold = g.engine.settings().probability_threshold;
                let Some(classification) = classification_from_event(event, threshold) else {
                    log::trace!("Prediction under the probability threshold");
                    return;
                };
                g.engine.handle_voice(&classification, js_sys::Date::now());
            });
            let _ = window.add_event_listener_with_callback(
                "voicePrediction",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Recognizer started loading; detail is `{ name, files }` for an upload
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                let detail = event
                    .dyn_ref::<CustomEvent>()
                    .map(|e| e.detail())
                    .filter(|d| !d.is_undefined() && !d.is_null());
                let mut g = game.borrow_mut();
                match detail {
                    Some(detail) => {
                        let name = detail_field(&detail, "name")
                            .and_then(|v| v.as_string())
                            .unwrap_or_else(|| "uploaded model".to_string());
                        let files = bundle_entries(&detail);
                        let entries = files.iter().map(String::as_str);
                        if let Err(e) = g.engine.load_bundle(&name, entries) {
                            log::warn!("Rejected model bundle {}: {}", name, e);
                        }
                    }
                    None => g.engine.model_loading(ModelSource::Default),
                }
                update_ui(&g.engine);
            });
            let _ = window
                .add_event_listener_with_callback("modelLoading", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Recognizer could not be created; detail is the reason
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                let reason = event
                    .dyn_ref::<CustomEvent>()
                    .and_then(|e| e.detail().as_string())
                    .unwrap_or_else(|| "unknown error".to_string());
                let mut g = game.borrow_mut();
                g.engine.model_failed(&reason);
                update_ui(&g.engine);
            });
            let _ = window
                .add_event_listener_with_callback("modelFailed", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Recognizer finished loading; detail is the uploaded file name, if any
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                let source = event
                    .dyn_ref::<CustomEvent>()
                    .and_then(|e| e.detail().as_string())
                    .map(|name| ModelSource::Uploaded { name })
                    .unwrap_or(ModelSource::Default);
                let mut g = game.borrow_mut();
                g.engine.model_ready(source);
                update_ui(&g.engine);
            });
            let _ = window
                .add_event_listener_with_callback("modelReady", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let document = web_sys::window().unwrap().document().unwrap();

        // Start button
        if let Some(btn) = document.get_element_by_id("start-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                if let Err(e) = g.engine.start() {
                    log::warn!("Cannot start: {}", e);
                }
                update_ui(&g.engine);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Restart button (game-over toast)
        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                if let Err(e) = g.engine.restart() {
                    log::warn!("Cannot restart: {}", e);
                }
                update_ui(&g.engine);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Switch model button (game-over toast)
        if let Some(btn) = document.get_element_by_id("switch-model-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                g.engine.switch_model();
                update_ui(&g.engine);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow().fit_to_viewport();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod native_game {
    use std::error::Error;
    use std::io::BufReader;

    use glam::Vec2;

    use lane_runner::platform::native::{RefreshPacer, spawn_line_voice};
    use lane_runner::renderer::{RecordingSurface, canvas_size_for_viewport};
    use lane_runner::sim::{GameEvent, GamePhase};
    use lane_runner::voice::{ModelSource, RouteOutcome};
    use lane_runner::{Engine, Settings, SpriteCatalog};

    /// Display refresh rate the headless loop runs at
    const REFRESH_HZ: u32 = 60;
    /// Viewport the headless canvas is sized for
    const VIEWPORT: Vec2 = Vec2::new(1280.0, 800.0);

    pub fn run() -> Result<(), Box<dyn Error>> {
        log::info!("Lane Runner (native) starting...");

        let settings = Settings::load();
        let mut engine = Engine::new(settings, SpriteCatalog::default())?;
        let mut surface = RecordingSurface::new(canvas_size_for_viewport(VIEWPORT));

        let voice = engine.connect_voice();
        spawn_line_voice(BufReader::new(std::io::stdin()), voice);

        engine.on_game_over(|score| log::info!("Game over with score {}", score.floor()));
        engine.model_loading(ModelSource::Default);
        engine.model_ready(ModelSource::Default);
        engine.start()?;

        println!("Type `left` or `right` and press Enter to change lanes.");

        let mut pacer = RefreshPacer::new(REFRESH_HZ);
        while engine.phase() == GamePhase::Running {
            pacer.wait();

            for outcome in engine.pump_voice(pacer.now_ms()) {
                if let RouteOutcome::Accepted { lane, .. } = outcome {
                    println!("-> lane {}", lane);
                }
            }

            // Failures are logged by the engine; keep refreshing
            if let Ok(report) = engine.on_refresh(&mut surface) {
                for event in report.events {
                    if let GameEvent::ObstacleSpawned { lane, sprite, .. } = event {
                        println!("{} incoming in lane {}", sprite, lane);
                    }
                }
            }
            surface.take_commands();
        }

        println!("Game over! Score: {}", engine.state().session.score.floor() as i64);
        engine.unmount();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(e) = native_game::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
