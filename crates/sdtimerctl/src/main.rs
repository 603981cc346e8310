use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sdtimer_core::config;
use sdtimer_core::duration::{self, TimeParts};
use sdtimer_core::ipc::{self, ClientMsg, DaemonMsg, TimerStateKind};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;

#[derive(Parser)]
#[command(name = "sdtimerctl", about = "Control the sdtimer daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show daemon status
    Status,
    /// Start (or restart) a countdown. With no duration flags the last
    /// started duration is reused.
    Start {
        #[arg(short = 'd', long)]
        days: Option<u64>,
        #[arg(short = 'H', long)]
        hours: Option<u64>,
        #[arg(short = 'm', long)]
        minutes: Option<u64>,
        #[arg(short = 's', long)]
        seconds: Option<u64>,
        #[arg(long)]
        millis: Option<u64>,
    },
    /// Pause the running countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Stop the countdown, keeping the duration for a later bare start
    Stop,
    /// Reset the countdown and forget the remembered duration
    Reset,
    /// Abort a pending OS shutdown during the grace period
    Cancel,
    /// Subscribe to the event stream and render the countdown
    Watch,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let socket_path = config::socket_path();
    let stream = UnixStream::connect(&socket_path).with_context(|| {
        format!(
            "connecting to sdtimerd at {}\nIs the daemon running?",
            socket_path.display()
        )
    })?;

    let mut writer = stream.try_clone().context("cloning stream")?;
    let reader = BufReader::new(stream);

    let msg: ClientMsg = match cli.command {
        Command::Status => ClientMsg::GetStatus,
        Command::Start {
            days,
            hours,
            minutes,
            seconds,
            millis,
        } => {
            // All flags omitted means "reuse the remembered duration";
            // an explicit zero (e.g. `-s 0`) is a valid instant countdown.
            let ms = if [days, hours, minutes, seconds, millis]
                .iter()
                .all(Option::is_none)
            {
                None
            } else {
                Some(duration::compose_ms(
                    days.unwrap_or(0),
                    hours.unwrap_or(0),
                    minutes.unwrap_or(0),
                    seconds.unwrap_or(0),
                    millis.unwrap_or(0),
                ) as i64)
            };
            ClientMsg::Start { ms }
        }
        Command::Pause => ClientMsg::Pause,
        Command::Resume => ClientMsg::Resume,
        Command::Stop => ClientMsg::Stop,
        Command::Reset => ClientMsg::Reset,
        Command::Cancel => ClientMsg::CancelShutdown,
        Command::Watch => ClientMsg::Subscribe,
    };
    let watching = matches!(msg, ClientMsg::Subscribe);

    let line = ipc::encode(&msg);
    writer.write_all(line.as_bytes()).context("sending command")?;

    if watching {
        watch(reader)
    } else {
        read_response(reader)
    }
}

fn read_response(reader: BufReader<UnixStream>) -> Result<()> {
    for line in reader.lines() {
        let line = line.context("reading response")?;
        if let Some(resp) = ipc::decode_daemon(&line) {
            match resp {
                DaemonMsg::Status {
                    state,
                    input_ms,
                    remaining_ms,
                    version,
                } => {
                    println!("sdtimerd v{}", version);
                    println!("  state:     {}", state_name(state));
                    match input_ms {
                        Some(ms) => println!("  duration:  {}", clock(ms)),
                        None => println!("  duration:  -"),
                    }
                    if let Some(ms) = remaining_ms {
                        println!("  remaining: {}", clock(ms));
                    }
                }
                DaemonMsg::Ack { ok, message } => {
                    if ok {
                        println!("{}", message);
                    } else {
                        eprintln!("error: {}", message);
                        std::process::exit(1);
                    }
                }
                _ => {}
            }
            break;
        }
    }

    Ok(())
}

/// Render the subscribed event stream until the daemon goes away.
fn watch(reader: BufReader<UnixStream>) -> Result<()> {
    for line in reader.lines() {
        let line = line.context("reading event")?;
        let Some(msg) = ipc::decode_daemon(&line) else {
            continue;
        };
        match msg {
            DaemonMsg::Tick { remaining } => {
                print!("\r{}    ", remaining.to_clock_string());
                std::io::stdout().flush().ok();
            }
            DaemonMsg::Started { duration } => {
                println!("started {}", duration.to_clock_string());
            }
            DaemonMsg::Paused { remaining, .. } => {
                println!("\npaused at {}", remaining.to_clock_string());
            }
            DaemonMsg::Resumed { remaining, .. } => {
                println!("resumed at {}", remaining.to_clock_string());
            }
            DaemonMsg::Stopped { duration } => {
                println!("\nstopped (duration {})", duration.to_clock_string());
            }
            DaemonMsg::Alarm { duration } => {
                println!("\nalarm: {} elapsed", duration.to_clock_string());
            }
            DaemonMsg::WasReset => {
                println!("\nreset");
            }
            DaemonMsg::ShutdownPending { grace_ms } => {
                println!(
                    "shutdown in {}s ('sdtimerctl cancel' to abort)",
                    grace_ms / 1000
                );
            }
            DaemonMsg::ShutdownCancelled => {
                println!("shutdown cancelled");
            }
            DaemonMsg::Ack { .. } | DaemonMsg::Status { .. } => {}
        }
    }
    Ok(())
}

fn state_name(state: TimerStateKind) -> &'static str {
    match state {
        TimerStateKind::Stopped => "stopped",
        TimerStateKind::Running => "running",
        TimerStateKind::Paused => "paused",
    }
}

fn clock(ms: u64) -> String {
    TimeParts::from_millis(ms).to_clock_string()
}
