mod app;
mod canvas_view;
mod jobs;
mod preview;

use eframe::egui;
use partcfg_client::ClientConfig;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "partcfg=info".into()),
        )
        .init();

    let client_config = ClientConfig::from_env().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "ignoring client environment");
        ClientConfig::default()
    });
    tracing::info!(api = %client_config.base_url, "starting configurator");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 860.0])
            .with_title("Part configurator"),
        ..Default::default()
    };
    eframe::run_native(
        "partcfg",
        native_options,
        Box::new(|cc| {
            let jobs = jobs::Jobs::new(client_config)?;
            Ok(Box::new(app::ConfiguratorApp::new(cc, jobs)))
        }),
    )
}
