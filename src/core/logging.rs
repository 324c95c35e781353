use std::io;
use std::sync::Mutex;
use std::time::Duration;

use flexi_logger::writers::LogWriter;
use flexi_logger::{colored_opt_format, Age, Cleanup, Criterion, DeferredNow, Duplicate, Logger, LoggerHandle, Naming};
use hyper::StatusCode;
use lazy_static::lazy_static;
use log::{Level, LevelFilter, Record};
use once_cell::sync::OnceCell;
use twilight_http::{Client as HttpClient, Error};
use twilight_model::id::ChannelId;

use crate::core::bot_config::Logging;
use crate::error::StartupError;
use crate::sweeper_error;

static LOGGER_HANDLE: OnceCell<LoggerHandle> = OnceCell::new();
static LOG_CHANNEL: OnceCell<ChannelId> = OnceCell::new();

const DISCORD_SIZE_LIMIT: usize = 2000;
/// Lines beyond this are dropped while discord can't keep up.
const MAX_QUEUED: usize = 500;

lazy_static! {
    static ref IMPORTANT_QUEUE: Mutex<Vec<String>> = Mutex::new(Vec::new());
}

pub fn initialize(config: &Logging) -> Result<(), StartupError> {
    let handle = Logger::with_env_or_str(&config.spec)
        .log_to_file()
        .directory(&config.directory)
        .duplicate_to_stderr(Duplicate::Info)
        .format(colored_opt_format)
        .rotate(
            Criterion::Age(Age::Day),
            Naming::Timestamps,
            Cleanup::KeepLogAndZipFiles(10, 30),
        )
        .add_writer("discord_log", Box::new(ChannelLogWriter { queue: &IMPORTANT_QUEUE }))
        .start()
        .map_err(|_| StartupError::NoLoggingSpec)?;

    if LOGGER_HANDLE.set(handle).is_err() {
        sweeper_error!("The logging system was attempted to be initalized a second time!");
    }

    Ok(())
}

/// Starts mirroring important log lines into a discord channel.
pub fn initialize_discord_logging(http: HttpClient, channel_id: ChannelId) {
    if LOG_CHANNEL.set(channel_id).is_ok() {
        tokio::spawn(run(http, &IMPORTANT_QUEUE, channel_id));
    }
}

struct ChannelLogWriter {
    queue: &'static Mutex<Vec<String>>,
}

impl LogWriter for ChannelLogWriter {
    fn write(&self, now: &mut DeferredNow, record: &Record) -> Result<(), io::Error> {
        // nowhere to send them to
        if LOG_CHANNEL.get().is_none() {
            return Ok(());
        }

        let timestamp = now.now().naive_utc().format("%Y-%m-%d %H:%M:%S");
        if let Ok(mut queue) = self.queue.lock() {
            if queue.len() < MAX_QUEUED {
                queue.push(format!("``[{}]`` {} {}", timestamp, level_marker(record.level()), record.args()));
            }
        }

        Ok(())
    }

    fn flush(&self) -> Result<(), io::Error> {
        Ok(())
    }

    fn max_log_level(&self) -> LevelFilter {
        LevelFilter::Info
    }
}

/// Takes as many queued lines as fit in a single message.
fn take_message(queue: &Mutex<Vec<String>>) -> Option<String> {
    let mut todo = queue.lock().ok()?;
    let mut out: Vec<String> = vec![];
    let mut length = 0;
    while let Some(line) = todo.first() {
        let needed = line.len() + if out.is_empty() { 0 } else { 1 };
        if length + needed > DISCORD_SIZE_LIMIT {
            if out.is_empty() {
                // a single line that is too long on its own gets cut down
                let mut line = todo.remove(0);
                let mut cut = DISCORD_SIZE_LIMIT;
                while !line.is_char_boundary(cut) {
                    cut -= 1;
                }
                line.truncate(cut);
                out.push(line);
            }
            break;
        }
        length += needed;
        out.push(todo.remove(0));
    }

    if out.is_empty() {
        None
    } else {
        Some(out.join("\n"))
    }
}

async fn run(http: HttpClient, queue: &'static Mutex<Vec<String>>, channel_id: ChannelId) {
    loop {
        if let Some(message) = take_message(queue) {
            // logging failures here with the macros would feed the queue again
            match http.create_message(channel_id).content(message.clone()) {
                Ok(request) => match request.await {
                    Ok(_) => {}
                    Err(Error::Response { status, .. }) if status == StatusCode::TOO_MANY_REQUESTS => {
                        if let Ok(mut todo) = queue.lock() {
                            todo.insert(0, message);
                        }
                    }
                    Err(e) => log::warn!("Failed to send log lines to discord: {}", e),
                },
                Err(e) => log::warn!("Unable to assemble the log message: {}", e),
            }
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

fn level_marker(level: Level) -> &'static str {
    match level {
        Level::Error => ":no_entry:",
        Level::Warn => ":warning:",
        _ => ":information_source:",
    }
}

#[macro_use]
pub mod macros {
    #[macro_export]
    macro_rules! sweeper_important {
        ($($arg:tt)*) => (
            log::info!(target: "{discord_log,_Default}", $($arg)*)
        )
    }

    #[macro_export]
    macro_rules! sweeper_error {
        ($($arg:tt)*) => (
            log::error!(target: "{discord_log,_Default}", $($arg)*)
        )
    }

    #[macro_export]
    macro_rules! sweeper_warn {
        ($($arg:tt)*) => (
            log::warn!(target: "{discord_log,_Default}", $($arg)*)
        )
    }
}
