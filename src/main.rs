mod audio;
mod logging;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use simplelog::LevelFilter;

use audio::stepper::DEFAULT_TICKS;
use audio::{DeviceInfo, DeviceVolumeCoordinator, Host, HostTrait, VolumeStepper};
use ui::App;

/// Media-key volume control for aggregate and multi-output audio devices.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Audio host backend (simulated, coreaudio)
    #[arg(long, default_value_t = Host::default_name().to_string())]
    host: String,

    /// Device id to control instead of the default output
    #[arg(short, long)]
    device: Option<u32>,

    /// Number of volume steps between silence and full volume
    #[arg(short, long, default_value_t = DEFAULT_TICKS, value_parser = clap::value_parser!(u32).range(1..=100))]
    ticks: u32,

    /// Print the output devices and exit
    #[arg(short, long)]
    list: bool,

    #[arg(long, default_value_os_t = logging::default_log_file())]
    log_file: PathBuf,

    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

fn print_devices<H: HostTrait + 'static>(coordinator: &DeviceVolumeCoordinator<H>) {
    let default = coordinator.host().get_default_output_device().ok();
    for (id, name) in coordinator.devices() {
        let marker = if Some(id) == default { "*" } else { " " };
        match DeviceInfo::query(coordinator.host(), id, name.clone()) {
            Ok(info) if info.is_aggregate => {
                let members: Vec<String> = info.sub_devices.iter().map(|id| id.to_string()).collect();
                println!("{} {:>5}  {} [aggregate: {}]", marker, id, name, members.join(", "));
            }
            _ => println!("{} {:>5}  {}", marker, id, name),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_level, &args.log_file)?;
    info!("starting with {:?}", args);

    let host = Arc::new(Host::new(&args.host)?);
    let mut coordinator = DeviceVolumeCoordinator::new(host);

    if args.list {
        print_devices(&coordinator);
        return Ok(());
    }

    let initial = match args.device {
        Some(id) => Some(id),
        None => coordinator
            .host()
            .get_default_output_device()
            .map_err(|err| warn!("no default output device: {}", err))
            .ok(),
    };
    if let Some(id) = initial {
        coordinator.select_device(id);
    }

    let mut app = App::new(coordinator, VolumeStepper::new(args.ticks))?;
    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();
    result
}
