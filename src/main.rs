mod modules;

use modules::{cli, config, error};
use modules::database::{comments, credentials, posts, storage, users};
use modules::content::{markdown, templates};
use modules::web::{admin, auth, routes, state};

use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use log::info;
use state::AppState;

fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Failed to load config {}: {}", cli.config.display(), e);
        std::process::exit(1);
    });

    let result = match cli.command() {
        Commands::Serve => {
            // 配置文件不存在时保存默认配置
            if !cli.config.exists() {
                if let Err(e) = config.save(&cli.config) {
                    info!("Failed to save config file: {}", e);
                }
            }
            return actix_web::rt::System::new().block_on(run_server(config));
        }
        Commands::InitDb => cli::init_db(&config),
        Commands::Users => cli::list_users(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run_server(config: Config) -> std::io::Result<()> {
    info!("Starting Daily Blog...");
    info!("Database: {}", config.paths.database_path.display());

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let static_dir = config.paths.static_dir.clone();

    let state = match AppState::open(config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            eprintln!("Failed to initialise application: {}", e);
            std::process::exit(1);
        }
    };

    info!("Server starting on http://{}", bind_address);

    HttpServer::new(move || {
        let static_dir = static_dir.clone();
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(move |cfg| routes::configure_static(cfg, &static_dir))
            .configure(routes::configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
