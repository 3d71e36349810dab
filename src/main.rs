use std::path::Path;
use std::sync::Arc;
use structopt::StructOpt;
use gribingest::config::{Config, OutputMode};
use gribingest::pipeline::Pipeline;
use gribingest::sink::Sink;
use gribingest::sink::memory::MemorySink;

#[macro_use]
extern crate log;

#[derive(Debug, StructOpt)]
struct Cli {
    /// config file
    #[structopt(long = "config", short = "c", default_value = "config.yaml")]
    config_file: String,

    /// directory of GRIB2 files, overrides `sourceDir`
    #[structopt(long = "source-dir")]
    source_dir: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {

  std::env::var("RUST_LOG").map_err(|_| {
      std::env::set_var("RUST_LOG", "error,gribingest=info");
  }).unwrap_or_default();
  env_logger::init();

  let args = Cli::from_args();

  let mut config = Config::load(Path::new(&args.config_file))?;
  if let Some(source_dir) = args.source_dir {
    config.source_dir = source_dir;
  }
  config.validate()?;

  let sink: Option<Arc<dyn Sink>> = match config.output {
    OutputMode::Sink => {
      info!("No persistent backend configured, using the in-memory sink");
      Some(Arc::new(MemorySink::new()))
    },
    OutputMode::Json | OutputMode::JsonSections => None,
  };

  match Pipeline::new(config, sink).run().await {
    Ok(summary) => {
      println!("{}", summary);
      Ok(())
    },
    Err(e) => {
      error!("Error running ingestion : {:?}", e);
      Err(e.into())
    }
  }
}
