use embassy_executor::Spawner;
use log::{error, info};
use ota_agent::config::EnvSettings;
use ota_agent::infrastructure::launch;

const EXIT_OK: i32 = 0;
const EXIT_FAILURE: i32 = 1;

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let code = match EnvSettings::from_env() {
        Ok(settings) => run(&settings).await,
        Err(err) => {
            error!("agent: {}", err);
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}

async fn run(settings: &EnvSettings) -> i32 {
    match launch(settings).await {
        Ok(Some(session)) => {
            info!(
                "agent: update finished, outcome={:?} stored={} bytes",
                session.outcome, session.stored_size
            );
            EXIT_OK
        }
        Ok(None) => {
            info!("agent: no update performed");
            EXIT_OK
        }
        Err(err) => {
            error!("agent: {}", err);
            EXIT_FAILURE
        }
    }
}
