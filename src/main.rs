use env_logger::Env;
use meshview::{ViewerApp, ViewerConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    ViewerApp::new(ViewerConfig::default())?.run()
}
