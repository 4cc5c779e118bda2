use actix_web::{web, App, HttpServer};
use playtogether::config::db::{DbKind, DbProfile};
use playtogether::config::MatchConfig;
use playtogether::infra::state::build_state;
use playtogether::middleware::request_trace::RequestTrace;
use playtogether::routes;
use playtogether::telemetry;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment
    // (docker env_file, or `set -a; . ./.env; set +a` locally).
    let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = match std::env::var("BACKEND_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
    {
        Ok(port) => port,
        Err(_) => {
            error!("BACKEND_PORT must be a valid port number");
            std::process::exit(1);
        }
    };

    let settings = DbKind::from_env().and_then(|kind| Ok((kind, MatchConfig::from_env()?)));
    let (db_kind, config) = match settings {
        Ok(pair) => pair,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let app_state = match build_state()
        .with_db(DbProfile::Prod, db_kind)
        .with_config(config)
        .build()
        .await
    {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "failed to build application state");
            std::process::exit(1);
        }
    };

    let shutdown = CancellationToken::new();
    let sweeper = app_state.sweeper().spawn(shutdown.clone());

    info!(%host, port, db_kind = %db_kind, "starting PlayTogether backend");

    let data = web::Data::new(app_state);
    let served = HttpServer::new(move || {
        App::new()
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        error!(error = %e, "expiry sweeper task failed");
    }
    served
}
