mod app;
mod commands;
mod config;
mod decode;
mod loader;
mod logging;
mod playback;
mod setup;
mod ui;
mod view;
mod waveform;

#[tokio::main]
async fn main() {
    if let Err(e) = app::run().await {
        tracing::error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
