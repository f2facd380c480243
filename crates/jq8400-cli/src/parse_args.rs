const HELP: &str = "\
jq8400 - Control a JQ8400 UART MP3 module

USAGE:
  jq8400 [OPTIONS] <COMMAND> [ARGS...]

OPTIONS:
  -h, --help            Prints help information
  -p, --port <name>     Serial port (e.g. /dev/ttyUSB0, COM3)
  -b, --baud <rate>     Baud rate (default: 9600)
  -c, --config <file>   JSON driver configuration
  --emulate             Talk to a simulated module instead of a port
  --json                Print query results as JSON
  -v, --verbose         Show transactions
  -vv, --trace          Show every frame byte

COMMANDS:
  play | pause | stop | restart | next | prev | next-folder | prev-folder
  index <n>             Play file by FAT index
  seek <n>              Select file by FAT index without playing
  interject <n>         Play file by FAT index, then resume
  folder <f> [file]     Play /FF/NNN.* (or the first file in /FF/)
  playlist <n>...       Play /ZH/NN.* files in order
  volume [0-100]        Set volume (prints it without an argument)
  up | down             Volume one step
  eq <preset>           normal, pop, rock, jazz, classic
  loop <mode>           all, one, one-stop, all-random, folder,
                        folder-random, folder-stop, all-stop
  ff [secs] | rw [secs] Fast forward / rewind (default: 5)
  ab <start> <end>      Loop between two marks in seconds
  ab-clear              End the A-B loop
  source [name]         Select usb, sd or flash (prints it without an argument)
  sources               Attached sources
  status                Playback status
  info                  Status, file index, name, position and length
  sleep | reset
";

/// Verbosity level for log output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Warnings only
    #[default]
    Quiet = 0,
    /// Transactions and retries
    Verbose = 1,
    /// Every frame byte
    Trace = 2,
}

impl Verbosity {
    pub fn filter(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Verbose => "debug",
            Verbosity::Trace => "trace",
        }
    }
}

#[derive(Debug, Default)]
pub struct AppArgs {
    pub help: bool,
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub config: Option<String>,
    pub emulate: bool,
    pub json: bool,
    pub verbosity: Verbosity,
    /// Command name followed by its arguments
    pub command: Vec<String>,
}

pub fn parse_args() -> Result<AppArgs, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_from(&args)?;
    if args.help || args.command.is_empty() {
        print!("{}", HELP);
        std::process::exit(0);
    }
    Ok(args)
}

fn parse_from(args: &[String]) -> Result<AppArgs, String> {
    let mut parsed = AppArgs::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => parsed.help = true,
            "--port" | "-p" => {
                i += 1;
                parsed.port = Some(value(args, i, "--port")?.to_string());
            }
            "--baud" | "-b" => {
                i += 1;
                let raw = value(args, i, "--baud")?;
                parsed.baud_rate = Some(
                    raw.parse()
                        .map_err(|_| format!("invalid baud rate '{}'", raw))?,
                );
            }
            "--config" | "-c" => {
                i += 1;
                parsed.config = Some(value(args, i, "--config")?.to_string());
            }
            "--emulate" => parsed.emulate = true,
            "--json" => parsed.json = true,
            "--verbose" | "-v" => parsed.verbosity = parsed.verbosity.max(Verbosity::Verbose),
            "--trace" | "-vv" => parsed.verbosity = Verbosity::Trace,
            other if other.starts_with('-') && parsed.command.is_empty() => {
                return Err(format!("unknown option '{}'", other));
            }
            _ => {
                // Everything from the command on belongs to the command
                parsed.command = args[i..].to_vec();
                break;
            }
        }
        i += 1;
    }

    Ok(parsed)
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("{} needs a value", flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_options_then_command() {
        let args = parse_from(&strings(&["-p", "/dev/ttyUSB0", "-v", "folder", "3", "6"])).unwrap();
        assert_eq!(args.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(args.verbosity, Verbosity::Verbose);
        assert_eq!(args.command, strings(&["folder", "3", "6"]));
    }

    #[test]
    fn test_negative_looking_command_args() {
        let args = parse_from(&strings(&["--emulate", "volume", "-5"])).unwrap();
        assert!(args.emulate);
        assert_eq!(args.command, strings(&["volume", "-5"]));
    }

    #[test]
    fn test_help_flag() {
        let args = parse_from(&strings(&["--emulate", "-h"])).unwrap();
        assert!(args.help);
        assert!(args.emulate);
        assert!(args.command.is_empty());

        // After the command, -h belongs to the command
        let args = parse_from(&strings(&["volume", "-h"])).unwrap();
        assert!(!args.help);
        assert_eq!(args.command, strings(&["volume", "-h"]));
    }

    #[test]
    fn test_bad_options() {
        assert!(parse_from(&strings(&["--baud", "fast", "play"])).is_err());
        assert!(parse_from(&strings(&["--port"])).is_err());
        assert!(parse_from(&strings(&["--bogus", "play"])).is_err());
    }
}
