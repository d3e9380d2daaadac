use tracing::{error, info, warn};
use tracing_ecs_device::init::{init_tracing_with_config, EcsConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EcsConfig {
        progname: Some("ecs-demo".to_string()),
        max_message_length: Some(200),
        ..EcsConfig::from_env()?
    };
    init_tracing_with_config(config)?;

    info!(http.request.method = "GET", url.path = "/health", "request served");
    warn!(duration_ms = 1250, event.action = "export", "slow export");

    let err = "forty-two".parse::<u32>().unwrap_err();
    error!(error = &err as &(dyn std::error::Error + 'static), user.id = 42, "could not parse quota");

    Ok(())
}
