// src/bin/teacher.rs

use quizmaker::{config::Config, routes, startup};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment (.env is read if present)
    let config = Config::from_env()?;
    let port = startup::port_from_args(std::env::args().skip(1), config.teacher_port)?;

    // Must outlive the server so buffered log lines reach the file
    let _guard = startup::init_tracing(&config, "teacher");

    let store = startup::build_store(&config).await?;
    let state = startup::teacher_state(config, store)?;

    let app = routes::teacher_router(state);
    startup::serve(app, port).await?;
    Ok(())
}
