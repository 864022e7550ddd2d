//! Demonstrates a cooperative main loop that keeps local time in sync with a NTP server
//!
//! You can run the `timesync` demo in the terminal:
//!
//! ```
//! cargo run -p demo-timesync
//! ```
//!
//! That will run the demo with the default NTP server set to `pool.ntp.org`, UTC and
//! no daylight saving time. Options available:
//! - `-s`/`--server` - specify server (default: `pool.ntp.org`)
//! - `-p`/`--port` - specify port (default: `123`)
//! - `-z`/`--timezone` - difference to UTC in hours, e.g. `1` or `5.5` (default: `0`)
//! - `-d`/`--dst` - daylight saving time rule: `none`, `european` or `us` (default: `none`)
//! - `-i`/`--interval` - seconds between requests, `0..=60` (default: `10`)
//! - `-t`/`--timeout` - reply timeout in seconds, `0..=60` (default: `1`)
//! - `-c`/`--count` - stop after that many received times, `0` runs forever (default: `3`)
//!
//! So, command in the terminal with all options involved:
//!
//! ```
//! cargo run -p demo-timesync --features log -- -s time.google.com -z 1 -d european -i 5 -t 2 -c 0
//! ```
use ntptime::{utils::to_naive_date_time, Config, DstRule, StdClock, TimeSyncClient};
use ntptime_net_std::UdpTransport;

use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::{Parser, ValueEnum};

const POOL_NTP_ADDR: &str = "pool.ntp.org";
const LOOP_DELAY: Duration = Duration::from_millis(10);

#[derive(Copy, Clone, ValueEnum)]
enum Dst {
    None,
    European,
    Us,
}

impl From<Dst> for DstRule {
    fn from(value: Dst) -> Self {
        match value {
            Dst::None => DstRule::None,
            Dst::European => DstRule::European,
            Dst::Us => DstRule::Us,
        }
    }
}

#[derive(Parser)]
#[command(name = "timesync")]
#[command(version)]
struct Cli {
    /// NTP server hostname
    #[arg(short, long, default_value = POOL_NTP_ADDR)]
    server: String,

    /// NTP server port
    #[arg(short, long, default_value = "123")]
    port: u16,

    /// Timezone as a difference to UTC in hours
    #[arg(short = 'z', long, default_value = "0", allow_negative_numbers = true)]
    timezone: f32,

    /// Daylight saving time rule
    #[arg(short, long, value_enum, default_value = "none")]
    dst: Dst,

    /// Seconds between requests
    #[arg(short, long, default_value = "10")]
    interval: u32,

    /// Reply timeout in seconds
    #[arg(short, long, default_value = "1")]
    timeout: u32,

    /// Number of received times to print before exiting, 0 runs forever
    #[arg(short, long, default_value = "3")]
    count: u32,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    #[cfg(feature = "log")]
    if cfg!(debug_assertions) {
        simple_logger::init_with_level(log::Level::Trace).unwrap();
    } else {
        simple_logger::init_with_level(log::Level::Info).unwrap();
    }

    let mut config = Config::new(&cli.server)
        .with_server_port(cli.port)
        .with_local_port(0)
        .with_timezone(cli.timezone)
        .with_dst_rule(cli.dst.into());

    if let Err(err) = config.set_send_interval(cli.interval) {
        eprintln!("Invalid interval {}: {err}", cli.interval);
        return ExitCode::FAILURE;
    }
    if let Err(err) = config.set_reply_timeout(cli.timeout) {
        eprintln!("Invalid timeout {}: {err}", cli.timeout);
        return ExitCode::FAILURE;
    }

    let mut client =
        TimeSyncClient::new(config, UdpTransport::new(), StdClock::default());
    let mut received = 0;

    loop {
        if let Some(time) = client.poll() {
            received += 1;

            match to_naive_date_time(&time) {
                Some(local) => println!("Local time: {local} (epoch {})", time.epoch),
                None => println!("Received time is out of range: {time:?}"),
            }

            if cli.count != 0 && received >= cli.count {
                return ExitCode::SUCCESS;
            }
        }

        thread::sleep(LOOP_DELAY);
    }
}
