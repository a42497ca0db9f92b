//! Headless viewer: polls a computation server and writes each rendered
//! frame as SVG.

mod transport;

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use runtime::driver::Completion;
use scene::svg::to_svg;
use streaming::endpoints::Endpoints;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use views::config::ViewerConfig;
use views::controller::{GraphController, ScatterplotController, ViewDriver};
use views::filter::send_filter;
use views::graph::{FixedAdvance, GraphView};
use views::scatterplot::ScatterplotView;
use views::session::refresh_once;

use crate::transport::ReqwestTransport;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ViewKind {
    Scatterplot,
    Graph,
}

#[derive(Debug, Parser)]
#[command(name = "viewer_native", about = "Render live module views to SVG frames")]
struct Args {
    /// Server base URL; overrides the config file.
    #[arg(long, env = "VIEWER_SERVER_URL")]
    server_url: Option<String>,
    /// JSON viewer config.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = ViewKind::Scatterplot)]
    view: ViewKind,
    /// Module polled by the scatterplot view.
    #[arg(long)]
    module: Option<String>,
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Refreshes to run; 0 polls until interrupted.
    #[arg(long, default_value_t = 1)]
    frames: u64,
    #[arg(long, default_value = "frames")]
    out: PathBuf,
    /// Push the visible scatterplot range back as a filter after each frame.
    #[arg(long)]
    filter: bool,
}

enum Mounted {
    Scatterplot {
        view: Rc<RefCell<ScatterplotView>>,
        module_id: String,
    },
    Graph(Rc<RefCell<GraphView>>),
}

fn main() {
    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start runtime: {e}"))?;
    runtime.block_on(run(args, config))
}

fn load_config(args: &Args) -> Result<ViewerConfig, String> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("read {}: {e}", path.display()))?;
            ViewerConfig::from_json(&text).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => ViewerConfig::default(),
    };
    if let Some(url) = &args.server_url {
        config.server_url = url.clone();
    }
    if let Some(module) = &args.module {
        config.module_id = module.clone();
    }
    if let Some(ms) = args.interval_ms {
        config.poll_interval_ms = ms;
    }
    config.validate().map_err(|e| e.to_string())?;
    if config.server_url.is_empty() {
        return Err("no server URL; pass --server-url or set VIEWER_SERVER_URL".to_string());
    }
    Ok(config)
}

fn mount(kind: ViewKind, config: &ViewerConfig, driver: &mut ViewDriver) -> Mounted {
    match kind {
        ViewKind::Scatterplot => {
            let view = Rc::new(RefCell::new(ScatterplotView::new(config.scatterplot.clone())));
            driver.activate(Box::new(ScatterplotController::new(
                config.module_id.clone(),
                Rc::clone(&view),
            )));
            Mounted::Scatterplot {
                view,
                module_id: config.module_id.clone(),
            }
        }
        ViewKind::Graph => {
            let view = Rc::new(RefCell::new(GraphView::new(
                config.graph.clone(),
                Box::new(FixedAdvance::default()),
            )));
            driver.activate(Box::new(GraphController::new(Rc::clone(&view))));
            Mounted::Graph(view)
        }
    }
}

async fn run(args: Args, config: ViewerConfig) -> Result<(), String> {
    tokio::fs::create_dir_all(&args.out)
        .await
        .map_err(|e| format!("create {}: {e}", args.out.display()))?;

    let transport = ReqwestTransport::new(Endpoints::new(config.server_url.clone()));
    let mut driver = ViewDriver::new().with_discard_stale(config.discard_stale);
    let mounted = mount(args.view, &config, &mut driver);
    let driver = RefCell::new(driver);
    let interval = Duration::from_millis(config.poll_interval_ms);

    info!(server = %config.server_url, view = ?args.view, "polling");
    let mut frame = 0u64;
    loop {
        let completion = refresh_once(&driver, &transport).await;
        if completion == Completion::Applied {
            frame += 1;
            write_frame(&mounted, &args.out, frame).await?;
            if args.filter {
                push_filter(&mounted, &transport).await;
            }
        }
        if args.frames != 0 && frame >= args.frames {
            break;
        }
        tokio::time::sleep(interval).await;
    }

    info!(metrics = ?driver.borrow().metrics().snapshot(), "done");
    Ok(())
}

async fn write_frame(mounted: &Mounted, out: &Path, frame: u64) -> Result<(), String> {
    let files = match mounted {
        Mounted::Scatterplot { view, .. } => {
            let view = view.borrow();
            vec![
                (format!("scatterplot-{frame:04}.svg"), to_svg(view.scene())),
                (format!("history-{frame:04}.svg"), to_svg(view.history_scene())),
            ]
        }
        Mounted::Graph(view) => {
            let mut view = view.borrow_mut();
            if !view.settle_layout() {
                warn!(frame, "layout did not converge");
            }
            vec![(format!("graph-{frame:04}.svg"), to_svg(view.scene()))]
        }
    };
    for (name, svg) in files {
        let path = out.join(name);
        tokio::fs::write(&path, svg)
            .await
            .map_err(|e| format!("write {}: {e}", path.display()))?;
        info!(path = %path.display(), "frame written");
    }
    Ok(())
}

async fn push_filter(mounted: &Mounted, transport: &ReqwestTransport) {
    let Mounted::Scatterplot { view, module_id } = mounted else {
        return;
    };
    let Some(request) = view.borrow().filter_request(module_id) else {
        return;
    };
    send_filter(transport, &request, |_| {}).await;
}
