use anyhow::{Context, Result};
use audio_switch::{logging, platform::alert, Config};

const ALERT_TITLE: &str = "Audio Switch Error";

fn main() {
    logging::init();

    if let Err(e) = run() {
        alert::show_error(ALERT_TITLE, &format!("Failed to initialize tray: {e:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = Config::load().context("Failed to load config")?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting audio-switch");

    menu_bar::run(config)
}

#[cfg(not(target_os = "macos"))]
mod menu_bar {
    use audio_switch::Config;

    pub fn run(_config: Config) -> anyhow::Result<()> {
        anyhow::bail!("the menu-bar tray is only available on macOS")
    }
}

#[cfg(target_os = "macos")]
mod menu_bar {
    use super::ALERT_TITLE;
    use anyhow::{Context, Result};
    use audio_switch::audio::{self, DeviceWatcher, DirectoryEvent, EventSink};
    use audio_switch::platform::alert;
    use audio_switch::ui::{HotkeyBindings, TrayManager};
    use audio_switch::{Action, AppState, Config, IconSet};
    use global_hotkey::GlobalHotKeyEvent;
    use std::sync::{Arc, Mutex};
    use tao::event::{Event, StartCause};
    use tao::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
    use tao::platform::macos::{ActivationPolicy, EventLoopExtMacOS};
    use tray_icon::menu::MenuEvent;

    /// Everything delivered to the main loop from other threads.
    #[derive(Debug)]
    enum UserEvent {
        Menu(MenuEvent),
        HotKey(GlobalHotKeyEvent),
        Directory(DirectoryEvent),
    }

    /// Forwards directory events into the main loop.
    struct LoopSink(Mutex<EventLoopProxy<UserEvent>>);

    impl LoopSink {
        fn send(&self, event: UserEvent) {
            if let Ok(proxy) = self.0.lock() {
                let _ = proxy.send_event(event);
            }
        }
    }

    impl EventSink for LoopSink {
        fn emit(&self, event: DirectoryEvent) {
            self.send(UserEvent::Directory(event));
        }
    }

    /// Tray, shortcuts and watcher, alive for the whole run.
    struct Runtime {
        tray: TrayManager,
        hotkeys: HotkeyBindings,
        _watcher: DeviceWatcher,
    }

    impl Runtime {
        fn start(app: &AppState, sink: Arc<LoopSink>) -> Result<Self> {
            let config = app.config();

            let icons = IconSet::load(config.icons_dir.as_deref()).context("Failed to load icons")?;
            let mut tray = TrayManager::new(icons);
            tray.create(&app.view(None), &config.labels, &config.shortcuts)
                .context("Failed to create tray icon")?;

            let hotkeys = HotkeyBindings::register(&config.shortcuts)
                .context("Failed to register global shortcuts")?;

            let watcher = DeviceWatcher::spawn(app.directory(), sink, config.poll_interval())
                .context("Failed to start device watcher")?;

            Ok(Self {
                tray,
                hotkeys,
                _watcher: watcher,
            })
        }

        fn dispatch(&self, app: &AppState, action: Action) {
            tracing::debug!(?action, "Dispatching action");
            app.dispatch(action);
        }

        fn render(&mut self, app: &AppState, event: &DirectoryEvent) {
            tracing::debug!(channel = event.channel(), "Refreshing tray");
            if let Err(e) = self.tray.apply(&app.view(Some(event))) {
                tracing::error!("Failed to update tray: {}", e);
            }
        }
    }

    pub fn run(config: Config) -> Result<()> {
        let directory = audio::system_directory().context("No audio device directory")?;

        let mut event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();
        event_loop.set_activation_policy(ActivationPolicy::Accessory);

        let sink = Arc::new(LoopSink(Mutex::new(event_loop.create_proxy())));

        let menu_sink = Arc::clone(&sink);
        MenuEvent::set_event_handler(Some(move |event| {
            menu_sink.send(UserEvent::Menu(event));
        }));
        let hotkey_sink = Arc::clone(&sink);
        GlobalHotKeyEvent::set_event_handler(Some(move |event| {
            hotkey_sink.send(UserEvent::HotKey(event));
        }));

        let app = AppState::new(directory, config, sink.clone());
        let mut runtime: Option<Runtime> = None;

        event_loop.run(move |event, _, control_flow| {
            *control_flow = ControlFlow::Wait;

            match event {
                Event::NewEvents(StartCause::Init) => match Runtime::start(&app, Arc::clone(&sink)) {
                    Ok(started) => {
                        tracing::info!("Tray ready");
                        runtime = Some(started);
                    }
                    Err(e) => {
                        alert::show_error(ALERT_TITLE, &format!("Failed to initialize tray: {e:#}"));
                        *control_flow = ControlFlow::ExitWithCode(1);
                    }
                },
                Event::UserEvent(UserEvent::Menu(event)) => {
                    if let Some(runtime) = &runtime {
                        if let Some(action) = runtime.tray.menu_action(&event) {
                            runtime.dispatch(&app, action);
                        }
                    }
                }
                Event::UserEvent(UserEvent::HotKey(event)) => {
                    if let Some(runtime) = &runtime {
                        if let Some(action) = runtime.hotkeys.action_for(&event) {
                            runtime.dispatch(&app, action);
                        }
                    }
                }
                Event::UserEvent(UserEvent::Directory(event)) => {
                    if let Some(runtime) = &mut runtime {
                        runtime.render(&app, &event);
                    }
                }
                Event::LoopDestroyed => {
                    if let Some(mut runtime) = runtime.take() {
                        runtime.tray.destroy();
                    }
                }
                _ => {}
            }
        })
    }
}
