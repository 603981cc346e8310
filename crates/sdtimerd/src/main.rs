mod media;
mod notify;
mod shutdown;
mod timer;

use anyhow::{Context, Result};
use media::MediaController;
use sdtimer_core::config::{self, Config};
use sdtimer_core::duration::{humanize, TimeParts};
use sdtimer_core::ipc::{self, ClientMsg, DaemonMsg};
use sdtimer_core::settings::Settings;
use std::sync::Arc;
use std::time::Duration;
use timer::{ShutdownTimer, TimerEvent};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// A decoded client request paired with the channel that writes back to
/// the client that sent it.
struct Command {
    msg: ClientMsg,
    reply: mpsc::UnboundedSender<String>,
}

/// State shared between the main loop and the grace-period task.
struct Shared {
    config: Config,
    settings: Settings,
    timer: ShutdownTimer,
    media: MediaController,
    /// Channels to clients subscribed to the transition-event stream.
    subscriber_txs: Vec<mpsc::UnboundedSender<String>>,
    /// Grace-period one-shot that will invoke the OS shutdown.
    pending_shutdown: Option<JoinHandle<()>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sdtimerd=info".parse().unwrap()),
        )
        .init();

    info!("sdtimerd starting");

    let config = Config::load().context("loading config")?;
    let settings = Settings::load();
    if let Some(ms) = settings.last_input_ms {
        info!(ms, "restored last input duration");
    }

    let shared = Arc::new(Mutex::new(Shared {
        timer: ShutdownTimer::new(config.general.tick_interval_ms),
        media: MediaController::new(config.media.control),
        config,
        settings,
        subscriber_txs: Vec::new(),
        pending_shutdown: None,
    }));

    // Commands from IPC client tasks travel through a channel into the
    // main loop, so a start always wakes the sleeping tick scheduler.
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();

    let socket_path = config::socket_path();
    // Remove stale socket
    let _ = std::fs::remove_file(&socket_path);
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let listener = UnixListener::bind(&socket_path)
        .with_context(|| format!("binding socket {}", socket_path.display()))?;
    info!(path = %socket_path.display(), "IPC socket listening");

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    tokio::spawn(handle_ipc_client(stream, cmd_tx.clone()));
                }
                Err(e) => {
                    warn!(error = %e, "IPC accept error");
                }
            }
        }
    });

    // Main loop: commands and the engine's tick deadline, nothing else.
    loop {
        let deadline = { shared.lock().await.timer.next_deadline() };
        let has_deadline = deadline.is_some();
        let sleep_fut = match deadline {
            Some(dl) => tokio::time::sleep_until(tokio::time::Instant::from_std(dl)),
            None => tokio::time::sleep_until(
                tokio::time::Instant::now() + Duration::from_secs(86_400),
            ),
        };

        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(cmd) => apply_command(&shared, cmd).await,
                    None => break,
                }
            }
            _ = sleep_fut, if has_deadline => {
                let mut sh = shared.lock().await;
                if let Some(event) = sh.timer.tick() {
                    dispatch_event(&shared, &mut sh, event, None).await;
                }
            }
        }
    }

    info!("sdtimerd shutting down");
    let _ = std::fs::remove_file(&socket_path);
    Ok(())
}

async fn apply_command(shared: &Arc<Mutex<Shared>>, cmd: Command) {
    let mut sh = shared.lock().await;
    let Command { msg, reply } = cmd;

    match msg {
        ClientMsg::Subscribe => {
            sh.subscriber_txs.push(reply.clone());
            send_ack(&reply, true, "subscribed");
        }
        ClientMsg::Start { ms } => {
            // Fall back to the persisted duration when neither the client
            // nor the engine remembers one.
            let ms = match ms {
                Some(ms) => Some(ms),
                None if sh.timer.input().is_none() => {
                    sh.settings.last_input_ms.map(|v| v as i64)
                }
                None => None,
            };
            let event = sh.timer.start(ms);
            if let TimerEvent::Start(Ok(duration)) = &event {
                sh.settings.last_input_ms = Some(duration.total_ms);
                if let Err(e) = sh.settings.save() {
                    warn!(error = %e, "persisting settings failed");
                }
            }
            dispatch_event(shared, &mut sh, event, Some(&reply)).await;
        }
        ClientMsg::Pause => {
            let event = sh.timer.pause();
            dispatch_event(shared, &mut sh, event, Some(&reply)).await;
        }
        ClientMsg::Resume => {
            let event = sh.timer.resume();
            dispatch_event(shared, &mut sh, event, Some(&reply)).await;
        }
        ClientMsg::Stop => {
            let event = sh.timer.stop();
            dispatch_event(shared, &mut sh, event, Some(&reply)).await;
        }
        ClientMsg::Reset => {
            let event = sh.timer.reset();
            sh.settings.reset();
            if let Err(e) = sh.settings.save() {
                warn!(error = %e, "persisting settings failed");
            }
            dispatch_event(shared, &mut sh, event, Some(&reply)).await;
        }
        ClientMsg::CancelShutdown => {
            if let Some(handle) = sh.pending_shutdown.take() {
                handle.abort();
                sh.media.resume().await;
                info!("pending shutdown cancelled");
                broadcast(&mut sh, &DaemonMsg::ShutdownCancelled);
                send_ack(&reply, true, "shutdown cancelled");
            } else {
                send_ack(&reply, false, "no shutdown pending");
            }
        }
        ClientMsg::GetStatus => {
            let status = DaemonMsg::Status {
                state: sh.timer.state_kind(),
                input_ms: sh.timer.input().map(|t| t.total_ms),
                remaining_ms: sh.timer.remaining_ms(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            };
            let _ = reply.send(ipc::encode(&status));
        }
    }
}

/// Turn an engine transition into its wire form: ack the requesting
/// client (errors go only there), broadcast successful transitions to
/// subscribers, and run the alarm side effects.
async fn dispatch_event(
    shared: &Arc<Mutex<Shared>>,
    sh: &mut Shared,
    event: TimerEvent,
    reply: Option<&mpsc::UnboundedSender<String>>,
) {
    let msg = match event {
        TimerEvent::Start(Ok(duration)) => {
            ack(reply, true, "countdown started");
            DaemonMsg::Started { duration }
        }
        TimerEvent::Countdown(remaining) => DaemonMsg::Tick { remaining },
        TimerEvent::Pause(Ok((duration, remaining))) => {
            ack(reply, true, "countdown paused");
            DaemonMsg::Paused { duration, remaining }
        }
        TimerEvent::Resume(Ok((duration, remaining))) => {
            ack(reply, true, "countdown resumed");
            DaemonMsg::Resumed { duration, remaining }
        }
        TimerEvent::Stop(Ok(duration)) => {
            ack(reply, true, "countdown stopped");
            DaemonMsg::Stopped { duration }
        }
        TimerEvent::Reset => {
            ack(reply, true, "countdown reset");
            DaemonMsg::WasReset
        }
        TimerEvent::Alarm(duration) => {
            broadcast(sh, &DaemonMsg::Alarm { duration });
            handle_alarm(shared, sh, duration).await;
            return;
        }
        TimerEvent::Start(Err(e))
        | TimerEvent::Pause(Err(e))
        | TimerEvent::Resume(Err(e))
        | TimerEvent::Stop(Err(e)) => {
            ack(reply, false, &e.to_string());
            return;
        }
    };
    broadcast(sh, &msg);
}

/// Alarm side effects: pause playback, notify the user and, when
/// configured, arm the cancellable grace-period shutdown.
async fn handle_alarm(shared: &Arc<Mutex<Shared>>, sh: &mut Shared, duration: TimeParts) {
    info!(input_ms = duration.total_ms, "countdown expired");
    sh.media.pause().await;

    if sh.config.general.shutdown {
        let grace_ms = sh.config.general.grace_period_ms;
        broadcast(sh, &DaemonMsg::ShutdownPending { grace_ms });
        if sh.config.notification.enabled {
            notify::send(
                &format!("Timer is finished ({})", humanize(duration.total_ms)),
                &format!(
                    "The computer is about to shut down ({}s). Run 'sdtimerctl cancel' to stop it.",
                    grace_ms / 1000
                ),
            );
        }

        let shared = Arc::clone(shared);
        sh.pending_shutdown = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(grace_ms)).await;
            {
                let mut sh = shared.lock().await;
                sh.pending_shutdown = None;
            }
            if let Err(e) = shutdown::invoke().await {
                error!(error = %e, "shutdown command failed");
            }
        }));
    } else if sh.config.notification.enabled {
        notify::send(
            &format!("Timer has finished (after {})", humanize(duration.total_ms)),
            ":)",
        );
    }
}

fn broadcast(sh: &mut Shared, msg: &DaemonMsg) {
    let line = ipc::encode(msg);
    sh.subscriber_txs.retain(|tx| tx.send(line.clone()).is_ok());
}

fn ack(reply: Option<&mpsc::UnboundedSender<String>>, ok: bool, message: &str) {
    if let Some(reply) = reply {
        send_ack(reply, ok, message);
    }
}

fn send_ack(reply: &mpsc::UnboundedSender<String>, ok: bool, message: &str) {
    let ack = DaemonMsg::Ack {
        ok,
        message: message.into(),
    };
    let _ = reply.send(ipc::encode(&ack));
}

async fn handle_ipc_client(stream: UnixStream, cmd_tx: mpsc::UnboundedSender<Command>) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    // Channel for sending messages back to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Writer task
    let write_handle = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    while let Ok(Some(line)) = lines.next_line().await {
        let Some(msg) = ipc::decode_client(&line) else {
            continue;
        };
        if cmd_tx.send(Command { msg, reply: tx.clone() }).is_err() {
            break;
        }
    }

    // Client disconnected; dropping tx makes the main loop's broadcast
    // prune this subscriber on the next send.
    drop(tx);
    write_handle.abort();
}
