use std::path::PathBuf;

use clap::Parser;
use fanrig::{AppConfig, TextureSource};

#[derive(Parser, Debug)]
#[command(name = "fanrig")]
#[command(about = "An animated oscillating desk fan", long_about = None)]
#[command(version)]
struct Cli {
    /// Image to use as the surface texture (procedural grille if omitted)
    texture: Option<PathBuf>,

    /// Render every part untextured
    #[arg(long, conflicts_with = "texture")]
    no_texture: bool,
}

impl Cli {
    fn texture_source(&self) -> TextureSource {
        match (&self.texture, self.no_texture) {
            (_, true) => TextureSource::Disabled,
            (Some(path), false) => TextureSource::File(path.clone()),
            (None, false) => TextureSource::Procedural,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::new().title("Fanrig").texture(cli.texture_source());
    if let Err(err) = fanrig::run(config) {
        log::error!("{err}");
        std::process::exit(1);
    }
}
