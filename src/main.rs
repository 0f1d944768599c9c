mod activity;
mod app;
mod audio;
mod calibration;
mod config;
mod frames;
mod menu;
mod pet;
mod platform;

fn main() {
    env_logger::init();
    log::info!("PetViewer starting up");

    if let Err(e) = app::run() {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
