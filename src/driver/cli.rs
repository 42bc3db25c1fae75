use std::io::{self, Write};
use std::sync::Arc;

use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::command::{Command, HELP_TEXT};
use crate::bridge::{InMemorySim, MediationKind, SimRuntime};
use crate::document::{DocumentHost, MemoryDocument};
use crate::error::FrontError;
use crate::logging::{LogLevel, Logger, TARGET_DRIVER, TARGET_METRICS, emit, json_kv, json_str};
use crate::metrics::SharedMetrics;
use crate::prefs::Preferences;
use crate::render::{
    Panel, PanelRegistry, RendererSettings, TextRenderer, mediation_panels, settings_panels,
};
use crate::screens::{
    MediationController, PickerSlot, QueuedNotifier, Route, ScreenContext, SettingsController,
};

pub type DriverResult<T> = std::result::Result<T, CliDriverError>;

#[derive(Debug, Error)]
pub enum CliDriverError {
    #[error("{0}")]
    Front(#[from] FrontError),
    #[error("open the {0} screen first")]
    WrongScreen(&'static str),
    #[error("`moon` needs the demo runtime")]
    NotDemo,
    #[error("selection is locked until `again`")]
    SelectionLocked,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl CliDriverError {
    /// Errors the user can fix by typing something else.
    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

const PANEL_HEADER: &str = "header";
const PANEL_HOME: &str = "home";

/// Line-oriented terminal driver: reads commands, forwards them to the
/// screen controllers and prints the panels that changed.
pub struct CliDriver {
    mediation: MediationController,
    settings: SettingsController,
    document: MemoryDocument,
    notifier: QueuedNotifier,
    registry: PanelRegistry,
    renderer: TextRenderer,
    route: Route,
    demo: Option<Arc<InMemorySim>>,
    logger: Option<Logger>,
    metrics: Option<SharedMetrics>,
    app_name: String,
}

impl CliDriver {
    /// The context's notifier is replaced by one the driver can drain. The
    /// stored custom CSS is applied to the document straight away.
    pub fn new(runtime: Arc<dyn SimRuntime>, prefs: Preferences, ctx: ScreenContext) -> Self {
        let notifier = QueuedNotifier::new();
        let ctx = ScreenContext {
            notifier: Arc::new(notifier.clone()),
            ..ctx
        };
        let mut document = MemoryDocument::new();
        document.set_title(&ctx.app_name);
        document.set_custom_css(&prefs.load().custom_css);
        Self {
            mediation: MediationController::new(runtime.clone(), ctx.clone()),
            settings: SettingsController::new(runtime, prefs, ctx.clone()),
            document,
            notifier,
            registry: PanelRegistry::new(),
            renderer: TextRenderer::with_default(),
            route: Route::Home,
            demo: None,
            logger: ctx.logger,
            metrics: ctx.metrics,
            app_name: ctx.app_name,
        }
    }

    /// Enable `moon` against an in-memory runtime.
    pub fn with_demo(mut self, sim: Arc<InMemorySim>) -> Self {
        self.demo = Some(sim);
        self
    }

    pub fn with_renderer_settings(mut self, settings: RendererSettings) -> Self {
        self.renderer = TextRenderer::new(settings);
        self
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn mediation(&self) -> &MediationController {
        &self.mediation
    }

    pub fn settings(&self) -> &SettingsController {
        &self.settings
    }

    pub fn document(&self) -> &MemoryDocument {
        &self.document
    }

    pub async fn run<R, W>(&mut self, input: R, output: &mut W) -> DriverResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        emit(
            self.logger.as_ref(),
            LogLevel::Info,
            TARGET_DRIVER,
            "driver_started",
            [json_kv("demo", self.demo.is_some())],
        );
        self.redraw(output)?;

        let mut lines = input.lines();
        loop {
            write!(output, "> ")?;
            output.flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            match Command::parse(&line) {
                Ok(None) => continue,
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    if let Err(err) = self.execute(command, output).await {
                        if !err.is_recoverable() {
                            return Err(err);
                        }
                        notice(output, &err.to_string())?;
                    }
                }
                Err(usage) => notice(output, &usage)?,
            }
            self.flush_alerts(output)?;
            self.redraw(output)?;
        }

        self.log_metrics();
        Ok(())
    }

    pub async fn execute<W: Write>(&mut self, command: Command, output: &mut W) -> DriverResult<()> {
        emit(
            self.logger.as_ref(),
            LogLevel::Debug,
            TARGET_DRIVER,
            "command",
            [json_str("command", format!("{command:?}"))],
        );

        match command {
            Command::Mediators(filter) => {
                self.open_mediation().await;
                self.mediation.set_query(PickerSlot::Mediator, &filter);
            }
            Command::Cats(filter) => {
                self.open_mediation().await;
                self.mediation.set_query(PickerSlot::Subjects, &filter);
            }
            Command::NextPage(slot) => {
                self.require(Route::Mediate)?;
                self.mediation.next_page(slot);
            }
            Command::PrevPage(slot) => {
                self.require(Route::Mediate)?;
                self.mediation.prev_page(slot);
            }
            Command::PickMediator(id) => {
                self.require(Route::Mediate)?;
                if !self.mediation.select_mediator(&id) {
                    return Err(CliDriverError::SelectionLocked);
                }
            }
            Command::Pick(first, second) => {
                self.require(Route::Mediate)?;
                if !self.mediation.select_subjects(vec![first, second]) {
                    return Err(CliDriverError::SelectionLocked);
                }
            }
            Command::Romantic => {
                self.require(Route::Mediate)?;
                self.mediation.toggle_allow_romantic();
            }
            Command::Mediate => self.attempt(MediationKind::Mediate).await?,
            Command::Sabotage => self.attempt(MediationKind::Sabotage).await?,
            Command::Again => {
                self.require(Route::Mediate)?;
                self.mediation.mediate_again().await;
            }
            Command::Settings => {
                self.settings.mount(&mut self.document).await?;
                self.route = Route::Settings;
            }
            Command::Toggle(key) => {
                self.require(Route::Settings)?;
                if self.settings.toggle(&key).is_none() {
                    notice(output, &format!("no game setting named `{key}`"))?;
                }
            }
            Command::SiteTheme(value) => {
                self.require(Route::Settings)?;
                self.settings.set_site_theme(value);
            }
            Command::Shading => {
                self.require(Route::Settings)?;
                self.settings.toggle_shading();
            }
            Command::ExportAsZip => {
                self.require(Route::Settings)?;
                self.settings.toggle_export_as_zip();
            }
            Command::CustomCss(css) => {
                self.require(Route::Settings)?;
                self.settings.set_custom_css(css);
            }
            Command::Theme(name, value) => {
                self.require(Route::Settings)?;
                self.settings.theme_mut().set_property(&name, value)?;
            }
            Command::Css => {
                self.require(Route::Settings)?;
                writeln!(output, "{}", self.settings.theme_css())?;
            }
            Command::Save => {
                self.require(Route::Settings)?;
                // A failed save has already alerted the user.
                if let Ok(route) = self.settings.save(&mut self.document).await {
                    self.navigate(route);
                }
            }
            Command::Moon => {
                let sim = self.demo.as_ref().ok_or(CliDriverError::NotDemo)?;
                let moon = sim.advance_moon();
                notice(output, &format!("Moon {moon} begins."))?;
                if self.route == Route::Mediate {
                    self.mediation.reset().await;
                }
            }
            Command::Home => self.navigate(Route::Home),
            Command::Help => writeln!(output, "{HELP_TEXT}")?,
            Command::Quit => {}
        }
        Ok(())
    }

    async fn open_mediation(&mut self) {
        if self.route != Route::Mediate {
            self.mediation.mount(&mut self.document).await;
            self.navigate(Route::Mediate);
        }
    }

    async fn attempt(&mut self, kind: MediationKind) -> DriverResult<()> {
        self.require(Route::Mediate)?;
        // A rejection has already been alerted and the screen reset.
        self.mediation.attempt(kind).await?;
        Ok(())
    }

    fn require(&self, route: Route) -> DriverResult<()> {
        if self.route == route {
            return Ok(());
        }
        Err(CliDriverError::WrongScreen(match route {
            Route::Home => "home",
            Route::Mediate => "mediation (`mediators`)",
            Route::Settings => "settings (`settings`)",
        }))
    }

    /// Settings blanks the custom CSS while open; leaving puts the stored
    /// stylesheet back.
    fn navigate(&mut self, route: Route) {
        if self.route == Route::Settings && route != Route::Settings {
            self.settings.restore_custom_css(&mut self.document);
        }
        self.route = route;
        if route == Route::Home {
            self.document.set_title(&self.app_name);
        }
    }

    fn panels(&self) -> Vec<Panel> {
        let crumbs = self
            .route
            .crumbs()
            .into_iter()
            .map(Route::label)
            .collect::<Vec<_>>()
            .join(" > ");
        let mut panels = vec![Panel::new(
            PANEL_HEADER,
            "",
            format!("{}\n{crumbs}", self.document.title()),
        )];
        match self.route {
            Route::Home => panels.push(Panel::new(
                PANEL_HOME,
                "Home",
                "Mediate between cats: `mediators`\nChange settings: `settings`\nAll commands: `help`",
            )),
            Route::Mediate => panels.extend(mediation_panels(&self.mediation.view())),
            Route::Settings => panels.extend(settings_panels(
                &self.settings.rows(),
                self.settings.site(),
                self.settings.theme(),
            )),
        }
        panels
    }

    fn redraw<W: Write>(&mut self, output: &mut W) -> DriverResult<()> {
        self.registry.sync(self.panels());
        let dirty = self.registry.take_dirty();
        self.renderer.render(output, &dirty)?;
        Ok(())
    }

    fn flush_alerts<W: Write>(&self, output: &mut W) -> DriverResult<()> {
        for message in self.notifier.drain() {
            queue!(
                output,
                SetForegroundColor(Color::Red),
                Print(format!("! {message}\n")),
                ResetColor
            )?;
        }
        output.flush()?;
        Ok(())
    }

    fn log_metrics(&self) {
        let (Some(logger), Some(metrics)) = (self.logger.as_ref(), self.metrics.as_ref()) else {
            return;
        };
        if let Ok(guard) = metrics.lock() {
            let _ = logger.log_event(guard.snapshot().to_log_event(TARGET_METRICS));
        }
    }
}

fn notice<W: Write>(output: &mut W, message: &str) -> io::Result<()> {
    queue!(
        output,
        SetForegroundColor(Color::Yellow),
        Print(format!("{message}\n")),
        ResetColor
    )?;
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use crate::metrics::FrontMetrics;
    use crate::prefs::{JsonFileStore, KEY_CUSTOM_CSS, MemoryStore, PreferenceStore};

    fn driver(sim: Arc<InMemorySim>) -> CliDriver {
        CliDriver::new(sim.clone(), Preferences::in_memory(), ScreenContext::default())
            .with_demo(sim)
    }

    async fn run_script(driver: &mut CliDriver, script: &str) -> String {
        let mut output = Vec::new();
        driver.run(script.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn mediation_round_trip_prints_narrative() {
        let sim = Arc::new(InMemorySim::demo());
        let mut driver = driver(sim.clone());
        let script = "mediators\npick-mediator 1\npick 3 4\nmediate\nquit\n";
        let output = run_script(&mut driver, script).await;

        assert!(output.contains("Jayfeather helped Lionblaze and Cinderheart"));
        assert!(output.contains("[again] Mediate Again"));
        assert_eq!(sim.call_count("mediate"), 1);
        assert_eq!(driver.route(), Route::Mediate);
    }

    #[tokio::test]
    async fn commands_on_the_wrong_screen_are_refused() {
        let sim = Arc::new(InMemorySim::demo());
        let mut driver = driver(sim.clone());
        let output = run_script(&mut driver, "pick 3 4\ntoggle affair\n").await;

        assert!(output.contains("open the mediation (`mediators`) screen first"));
        assert!(output.contains("open the settings (`settings`) screen first"));
        assert_eq!(sim.call_count("getPossibleMediators"), 0);
    }

    #[tokio::test]
    async fn ineligible_attempt_is_reported_without_a_call() {
        let sim = Arc::new(InMemorySim::demo());
        let mut driver = driver(sim.clone());
        let output = run_script(&mut driver, "mediators\npick-mediator 1\nmediate\n").await;

        assert!(output.contains("choose exactly two cats"));
        assert_eq!(sim.call_count("mediate"), 0);
    }

    #[tokio::test]
    async fn settings_save_returns_home() {
        let sim = Arc::new(InMemorySim::demo());
        let mut driver = driver(sim.clone());
        run_script(&mut driver, "settings\ntoggle first cousin mates\ncustom-css p {}\nsave\n").await;

        assert_eq!(driver.route(), Route::Home);
        assert_eq!(sim.settings_snapshot().get("first cousin mates"), Some(&true));
        assert_eq!(driver.document().custom_css(), "p {}");
        assert_eq!(driver.document().title(), "ClanGen Simulator");
    }

    #[tokio::test]
    async fn refused_save_is_alerted_and_stays_put() {
        let sim = Arc::new(InMemorySim::demo());
        sim.reject_settings_writes(true);
        let mut driver = driver(sim);
        let output = run_script(&mut driver, "settings\nsave\n").await;

        assert!(output.contains("! Settings could not be saved"));
        assert_eq!(driver.route(), Route::Settings);
    }

    #[tokio::test]
    async fn failed_preference_write_is_alerted_and_stays_put() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("missing/sub/prefs.json")).unwrap();
        let sim = Arc::new(InMemorySim::demo());
        let mut driver = CliDriver::new(sim, Preferences::new(store), ScreenContext::default());
        let script = "settings\ntoggle affair\ncustom-css p {}\nsave\n";
        let output = run_script(&mut driver, script).await;

        assert!(output.contains("! Settings could not be saved"));
        assert_eq!(driver.route(), Route::Settings);
        assert_eq!(driver.document().custom_css(), "");
    }

    #[tokio::test]
    async fn stored_custom_css_applies_outside_settings() {
        let mut store = MemoryStore::new();
        store.set_item(KEY_CUSTOM_CSS, "body { color: gold; }").unwrap();
        let sim = Arc::new(InMemorySim::demo());
        let mut driver = CliDriver::new(sim, Preferences::new(store), ScreenContext::default());
        assert_eq!(driver.document().custom_css(), "body { color: gold; }");

        run_script(&mut driver, "mediators\n").await;
        assert_eq!(driver.document().custom_css(), "body { color: gold; }");

        run_script(&mut driver, "settings\ncustom-css p {}\n").await;
        assert_eq!(driver.document().custom_css(), "");

        run_script(&mut driver, "home\nmediators\n").await;
        assert_eq!(driver.route(), Route::Mediate);
        assert_eq!(driver.document().custom_css(), "body { color: gold; }");
    }

    #[tokio::test]
    async fn renderer_settings_control_panel_titles() {
        let sim = Arc::new(InMemorySim::demo());
        let mut driver = driver(sim).with_renderer_settings(RendererSettings {
            width: 40,
            show_titles: false,
        });
        let output = run_script(&mut driver, "quit\n").await;

        assert!(!output.contains("[Home]"));
        assert!(output.contains("Change settings: `settings`"));
    }

    #[tokio::test]
    async fn moon_clears_the_ledger() {
        let sim = Arc::new(InMemorySim::demo());
        let mut driver = driver(sim.clone());
        run_script(
            &mut driver,
            "mediators\npick-mediator 1\npick 3 4\nmediate\nagain\nmoon\n",
        )
        .await;

        assert!(driver.mediation().mediated_pairs().is_empty());
        assert_eq!(driver.mediation().possible_mediators().len(), 2);
    }

    #[tokio::test]
    async fn quitting_logs_a_metrics_snapshot() {
        let sim = Arc::new(InMemorySim::demo());
        let sink = MemorySink::new();
        let ctx = ScreenContext::default()
            .with_logger(Some(Logger::new(sink.clone())))
            .with_metrics(FrontMetrics::shared());
        let mut driver = CliDriver::new(sim, Preferences::in_memory(), ctx);
        run_script(&mut driver, "mediators\nquit\n").await;

        assert_eq!(sink.messages().last().map(String::as_str), Some("front_metrics"));
    }
}
