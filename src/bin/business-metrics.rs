use business_metrics::BusinessMetrics;
use business_metrics::bootstrap::{init_business_metrics, init_collector};
use business_metrics::config::{
    Configuration, get_config_base_path, print_config, should_print_config_and_exit,
};
use business_metrics::logging::setup_logging;
use business_metrics::server::start_server;
use business_metrics::server::state::AppState;
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let configuration = Configuration::load(get_config_base_path(std::env::args())?)?;
    if should_print_config_and_exit(std::env::args()) {
        print_config(&configuration)?;
        return Ok(());
    }

    let _guard = setup_logging(&configuration.log)?;
    tracing::info!("Starting business metrics exporter");

    let mut registry = BusinessMetrics::new();
    init_business_metrics(&configuration, &mut registry);
    let collector = init_collector(&configuration, registry);

    let state = AppState {
        configuration: Arc::new(configuration),
        collector,
    };

    start_server(state).await?;
    tracing::info!("Bye!");

    Ok(())
}
