//! Main application entry point (native).

fn main() {
    env_logger::init();
    log::info!("Starting Groundplane");

    if let Err(e) = groundplane_app::App::new().run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
