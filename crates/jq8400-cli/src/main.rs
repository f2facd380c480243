//! JQ8400 command-line tool
//!
//! Opens a serial port (or the built-in emulator) and runs one player command.
//!
//! Usage:
//!   jq8400 --port /dev/ttyUSB0 folder 3 6
//!   jq8400 --emulate --json info

mod parse_args;

use anyhow::{anyhow, bail, Context, Result};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use jq8400_core::prelude::*;
use jq8400_core::player::DEFAULT_SEEK_SECONDS;
use parse_args::{parse_args, AppArgs};

fn main() -> Result<()> {
    let args = parse_args().map_err(|e| anyhow!(e))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.verbosity.filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    debug!("jq8400 {}", jq8400_core::VERSION);

    let mut config = match &args.config {
        Some(path) => DriverConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => DriverConfig::default(),
    };
    if let Some(port) = &args.port {
        config.transport.port_name = port.clone();
    }
    if let Some(baud) = args.baud_rate {
        config.transport.baud_rate = baud;
    }

    if args.emulate {
        let transport = Transport::new(
            SimulatedModule::new(),
            SimulatedClock::new(),
            config.transport.clone(),
        );
        let mut player = Player::new(transport, config.player.clone());
        run(&mut player, &args)
    } else {
        let mut player = config.connect().with_context(|| {
            format!("Failed to open port '{}'", config.transport.port_name)
        })?;
        run(&mut player, &args)
    }
}

fn arg<T: std::str::FromStr>(args: &[String], i: usize, name: &str) -> Result<T> {
    let raw = args
        .get(i)
        .ok_or_else(|| anyhow!("missing <{}>", name))?;
    raw.parse()
        .map_err(|_| anyhow!("invalid <{}>: '{}'", name, raw))
}

fn opt_arg<T: std::str::FromStr>(args: &[String], i: usize, name: &str) -> Result<Option<T>> {
    match args.get(i) {
        Some(_) => arg(args, i, name).map(Some),
        None => Ok(None),
    }
}

fn report(json_out: bool, key: &str, value: serde_json::Value) {
    if json_out {
        let mut object = serde_json::Map::new();
        object.insert(key.to_string(), value);
        println!("{}", serde_json::Value::Object(object));
    } else {
        match value {
            serde_json::Value::String(s) => println!("{}", s),
            other => println!("{}", other),
        }
    }
}

fn run<L: SerialLink, C: Clock>(player: &mut Player<L, C>, app: &AppArgs) -> Result<()> {
    let args = &app.command;
    let json_out = app.json;

    match args[0].as_str() {
        "play" => player.play()?,
        "pause" => player.pause()?,
        "stop" => player.stop()?,
        "restart" => player.restart()?,
        "next" => player.next()?,
        "prev" => player.prev()?,
        "next-folder" => player.next_folder()?,
        "prev-folder" => player.prev_folder()?,
        "index" => player.play_file_by_index(arg(args, 1, "n")?)?,
        "seek" => player.seek_file_by_index(arg(args, 1, "n")?)?,
        "interject" => player.interject_file_by_index(arg(args, 1, "n")?)?,
        "folder" => {
            let folder = arg(args, 1, "folder")?;
            match opt_arg(args, 2, "file")? {
                Some(file) => player.play_file_in_folder(folder, file)?,
                None => player.play_in_folder(folder)?,
            }
        }
        "playlist" => {
            let files = args[1..]
                .iter()
                .map(|s| s.parse::<u8>().with_context(|| format!("invalid file '{}'", s)))
                .collect::<Result<Vec<_>>>()?;
            if files.is_empty() {
                bail!("playlist needs at least one file number");
            }
            player.play_sequence_by_file_number(&files)?;
        }
        "volume" => match opt_arg::<u8>(args, 1, "0-100")? {
            Some(volume) => player.set_volume(volume)?,
            None => report(json_out, "volume", json!(player.volume())),
        },
        "up" => player.volume_up()?,
        "down" => player.volume_down()?,
        "eq" => player.set_equalizer(arg(args, 1, "preset")?)?,
        "loop" => player.set_loop_mode(arg(args, 1, "mode")?)?,
        "ff" => player.fast_forward(opt_arg(args, 1, "secs")?.unwrap_or(DEFAULT_SEEK_SECONDS))?,
        "rw" => player.rewind(opt_arg(args, 1, "secs")?.unwrap_or(DEFAULT_SEEK_SECONDS))?,
        "ab" => player.ab_loop_play(arg(args, 1, "start")?, arg(args, 2, "end")?)?,
        "ab-clear" => player.ab_loop_clear()?,
        "source" => match opt_arg::<Source>(args, 1, "name")? {
            Some(source) => player.set_source(source)?,
            None => {
                let source = player.source()?;
                report(json_out, "source", json!(source));
            }
        },
        "sources" => {
            let sources = player.available_sources()?;
            report(json_out, "sources", json!(sources.to_string()));
        }
        "status" => {
            let status = player.status()?;
            report(json_out, "status", json!(status.to_string()));
        }
        "info" => {
            let status = player.status()?;
            let index = player.current_file_index()?;
            let count = player.count_files()?;
            let name = player.current_file_name()?;
            let position = player.current_file_position_secs()?;
            let length = player.current_file_length_secs()?;
            if json_out {
                println!(
                    "{}",
                    json!({
                        "status": status,
                        "index": index,
                        "files": count,
                        "name": name,
                        "position_secs": position,
                        "length_secs": length,
                    })
                );
            } else {
                println!("{} {}/{} {}", status, index, count, name);
                println!(
                    "{}:{:02} / {}:{:02}",
                    position / 60,
                    position % 60,
                    length / 60,
                    length % 60
                );
            }
        }
        "sleep" => player.sleep()?,
        "reset" => player.reset()?,
        other => bail!("unknown command '{}' (see --help)", other),
    }

    let (tx, rx, tx_frames, rx_frames) = player.transport_mut().counters();
    debug!(
        "sent {} frame(s) / {} byte(s), received {} frame(s) / {} byte(s)",
        tx_frames, tx, rx_frames, rx
    );
    Ok(())
}
