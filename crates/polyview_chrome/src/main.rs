mod headless;

use std::sync::Arc;
use std::time::{Duration, Instant};

use headless::{HeadlessEditor, HeadlessPanel, HeadlessSurface};
use polyview::file_controls::{load_profile, PROFILE_FILE_NAME};
use polyview::roomlink::{live_url, LiveConnection, LiveTransport};
use polyview::storage::write_file;
use polyview::{
    AppContext, Args, BannerKind, Banners, DataPath, DataPathType, EhttpClient, RequestManager,
    SyncFlags, Viewer, ViewerAction, ViewerOptions,
};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Everything the viewer borrows each frame, plus the bits only a host can
/// do: files, the browser and reloading.
struct Host {
    args: Args,
    path: DataPath,
    requests: RequestManager,
    surface: HeadlessSurface,
    panel: HeadlessPanel,
    editor: HeadlessEditor,
    banners: Banners,
    flags: SyncFlags,
    viewer: Viewer,
    started: Instant,
    last_frame: Instant,
}

impl Host {
    fn new(args: Args, path: DataPath) -> Self {
        let requests = RequestManager::new(args.server.clone(), Arc::new(EhttpClient));
        let viewer = boot_viewer(&args);
        let now = Instant::now();

        Self {
            args,
            path,
            requests,
            surface: HeadlessSurface::default(),
            panel: HeadlessPanel::default(),
            editor: HeadlessEditor::default(),
            banners: Banners::new(),
            flags: SyncFlags::default(),
            viewer,
            started: now,
            last_frame: now,
        }
    }

    fn start(&mut self) {
        let mut ctx = AppContext {
            requests: &self.requests,
            surface: &mut self.surface,
            panel: &mut self.panel,
            editor: &mut self.editor,
            banners: &mut self.banners,
            flags: &mut self.flags,
        };
        self.viewer.start(&mut ctx);
    }

    fn frame(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        let time = now.duration_since(self.started).as_secs_f64();
        self.last_frame = now;

        let actions = {
            let mut ctx = AppContext {
                requests: &self.requests,
                surface: &mut self.surface,
                panel: &mut self.panel,
                editor: &mut self.editor,
                banners: &mut self.banners,
                flags: &mut self.flags,
            };
            self.viewer.update(&mut ctx, now, time, dt)
        };

        for action in actions {
            self.handle_action(action);
        }

        self.report_banners();
    }

    fn handle_action(&mut self, action: ViewerAction) {
        match action {
            ViewerAction::SaveFile { name, bytes } => {
                let dir = self.path.path(DataPathType::Downloads);
                match write_file(&dir, &name, &bytes) {
                    Ok(path) => info!("saved {}", path.display()),
                    Err(err) => {
                        self.banners.show_error(err.user_message());
                    }
                }
            }

            ViewerAction::OpenUrl(url) => {
                if let Err(err) = opener::open(&url) {
                    warn!("could not open {url}: {err}");
                    info!("open this in a browser: {url}");
                }
            }

            ViewerAction::PickProfileFile => {
                let file = self.path.path(DataPathType::Profiles).join(PROFILE_FILE_NAME);
                let loaded = load_profile(&file)
                    .map(|profile| self.viewer.import_profile(&self.requests, profile));

                match loaded {
                    Ok(()) => info!("importing profile from {}", file.display()),
                    Err(err) => {
                        error!("importing {}: {err}", file.display());
                        self.banners.show_error(err.user_message());
                    }
                }
            }

            ViewerAction::Reload => self.reload(),
        }
    }

    fn reload(&mut self) {
        info!(
            "reloading viewer ({} models, {} nodes)",
            self.surface.model_count(),
            self.editor.len()
        );
        self.surface = HeadlessSurface::default();
        self.panel = HeadlessPanel::default();
        self.editor = HeadlessEditor::default();
        self.banners = Banners::new();
        self.flags = SyncFlags::default();
        self.viewer = boot_viewer(&self.args);
        self.start();
    }

    /// Banners have nowhere to be drawn, so they go to the log.
    fn report_banners(&mut self) {
        if self.banners.is_empty() {
            return;
        }

        for banner in self.banners.iter() {
            match banner.kind {
                BannerKind::Error => error!("{}", banner.text),
                BannerKind::Info => info!("{}", banner.text),
            }
        }
        self.banners.clear();
    }
}

fn boot_viewer(args: &Args) -> Viewer {
    let live: Option<Box<dyn LiveTransport>> = if args.options.contains(ViewerOptions::LiveSession)
    {
        match live_url(&args.server).and_then(LiveConnection::new) {
            Ok(conn) => Some(Box::new(conn) as Box<dyn LiveTransport>),
            Err(err) => {
                error!("could not open live session: {err}");
                None
            }
        }
    } else {
        None
    };

    Viewer::new(live, args.options)
}

fn setup_logging(path: &DataPath, debug: bool) -> WorkerGuard {
    use tracing_appender::{
        non_blocking,
        rolling::{RollingFileAppender, Rotation},
    };
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        path.path(DataPathType::Log),
        format!("polyview-{}.log", env!("CARGO_PKG_VERSION")),
    );

    // guard must live for the lifetime of the program
    let (non_blocking_writer, guard) = non_blocking(file_appender);

    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stdout);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking_writer);

    let default_filter = if debug {
        "polyview=debug,polyview_chrome=debug,roomlink=debug"
    } else {
        "polyview=info,polyview_chrome=info,roomlink=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    guard
}

#[tokio::main]
async fn main() {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let (args, unrecognized_args) = Args::parse(&argv);

    let path = args
        .datapath
        .as_ref()
        .map(DataPath::new)
        .unwrap_or_default();
    let _guard = setup_logging(&path, args.options.contains(ViewerOptions::Debug));

    for arg in &unrecognized_args {
        warn!("unrecognized arg: {arg}");
    }

    let period = Duration::from_secs_f64(1.0 / f64::from(args.frame_rate));
    let mut host = Host::new(args, path);
    host.start();

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => host.frame(),
            _ = &mut shutdown => {
                info!("shutting down");
                break;
            }
        }
    }
}
