// src/bin/student.rs

use quizmaker::{config::Config, routes, startup};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let port = startup::port_from_args(std::env::args().skip(1), config.student_port)?;
    let _guard = startup::init_tracing(&config, "student");

    let store = startup::build_store(&config).await?;
    let app = routes::student_router(startup::student_state(store));

    startup::serve(app, port).await?;
    Ok(())
}
