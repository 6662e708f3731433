use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rust_webframework::batteries::{session, LoggerExtension, MemoryStore, SessionExtension};
use rust_webframework::config::Config;
use rust_webframework::http::Response;
use rust_webframework::server::{self, ServerState};
use rust_webframework::{logger, Application, Extension, MethodTable, Route};

#[derive(Parser)]
#[command(version, about = "Development tools for the web framework")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the sample application with the development server
    Runserver {
        /// Overrides `server.port` from the configuration
        #[arg(long)]
        port: Option<u16>,
        /// Project directory holding `config.toml`
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Runserver { port, path } => runserver(port, &path),
    }
}

fn runserver(port: Option<u16>, project_dir: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = project_dir.join("config");
    let mut cfg = Config::load_from(&config_path.to_string_lossy())?;
    cfg.resolve_static_root(project_dir);
    if let Some(port) = port {
        cfg.server.port = port;
    }
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    let addr = cfg.get_socket_addr()?;
    let app = sample_app(&cfg)?;
    runtime.block_on(server::run(ServerState::new(app, cfg), addr))
}

fn sample_app(cfg: &Config) -> Result<Application, Box<dyn std::error::Error>> {
    let corn = Route::new(
        "/golden/corn/",
        MethodTable::new().on_get(|_, _| Ok(Response::plain("golden corn"))),
    )
    .named("corn");

    let food = Route::new(
        "/metal/_/food/_/",
        MethodTable::new().on_get(|request, args| {
            let visits = match session(request) {
                Some(session) => {
                    let visits = session
                        .get("visits")?
                        .and_then(|v| v.as_u64())
                        .unwrap_or(0)
                        + 1;
                    session.insert("visits", visits)?;
                    session.save()?;
                    visits
                }
                None => 0,
            };
            Ok(Response::plain(format!(
                "{} metal, {} food, visit {visits}",
                args[0], args[1]
            )))
        }),
    )
    .named("food");

    let extensions: Vec<Box<dyn Extension>> = vec![
        Box::new(LoggerExtension::new("sample")),
        Box::new(SessionExtension::new("sid", MemoryStore::new())),
    ];
    let app = Application::new(cfg.app.clone(), vec![corn.into(), food.into()], extensions)?;
    Ok(app)
}
