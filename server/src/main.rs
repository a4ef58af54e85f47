use minesweeper_server::{
    cleanup::start_cleanup_task, cors::create_cors, rate_limit::RateLimiter, registry::Registry,
    routes,
};
use rocket::{
    Build, Rocket,
    fairing::{Fairing, Info, Kind},
};
use tracing::{info, warn};

struct CleanupFairing;

#[rocket::async_trait]
impl Fairing for CleanupFairing {
    fn info(&self) -> Info {
        Info {
            name: "Session Cleanup Task",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        match (rocket.state::<Registry>(), rocket.state::<RateLimiter>()) {
            (Some(registry), Some(rate_limiter)) => {
                info!("Starting cleanup task for expired sessions");
                let registry = registry.clone();
                let rate_limiter = rate_limiter.clone();
                tokio::spawn(async move {
                    start_cleanup_task(registry, rate_limiter).await;
                });
            }
            _ => warn!("Failed to get session registry for cleanup task"),
        }
        Ok(rocket)
    }
}

#[rocket::launch]
fn rocket() -> Rocket<Build> {
    tracing_subscriber::fmt::init();
    info!("Starting Minesweeper engine server");

    let rocket = routes::stage(rocket::build())
        .attach(create_cors())
        .attach(CleanupFairing);

    info!("Server configured with CORS, session cleanup, and routes");
    info!("Endpoints: POST /new_game, POST /step, GET /state, POST /play_agent, DELETE /game");

    rocket
}
