//! Line-oriented control surface on stdin.

use std::fmt::Write as _;
use std::str::FromStr;

use cadence_core::{format_position, Error, MediaSink, Track};
use cadence_player::{PlaybackEngine, PlaybackState};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::history::{History, Recent};

/// Rows `history` shows without an explicit count.
const DEFAULT_HISTORY_ROWS: usize = 10;

const HELP: &str = "\
commands:
  play <n>    play queue entry n (1-based)
  toggle      play or pause
  next        skip forward
  prev        previous track, or restart past 3s
  seek <s>    jump to s seconds
  vol <pct>   volume 0-100
  status      show the player state
  queue       list the queue
  history [n] recently played
  forget <n>  remove entry n of the history list
  quit        exit";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Play(usize),
    Toggle,
    Next,
    Prev,
    Seek(f64),
    Volume(f32),
    Status,
    Queue,
    History(usize),
    Forget(usize),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default().to_ascii_lowercase();
        let arg = words.next();

        let command = match name.as_str() {
            "play" | "p" => Self::Play(parse_arg(arg, "play <n>")?),
            "toggle" | "t" | "pause" => Self::Toggle,
            "next" | "n" => Self::Next,
            "prev" | "previous" => Self::Prev,
            "seek" => Self::Seek(parse_arg(arg, "seek <seconds>")?),
            "vol" | "volume" => {
                let percent: f32 = parse_arg(arg, "vol <0-100>")?;
                Self::Volume(percent / 100.0)
            }
            "status" | "s" => Self::Status,
            "queue" | "q" => Self::Queue,
            "history" | "h" => match arg {
                Some(_) => Self::History(parse_arg(arg, "history [n]")?),
                None => Self::History(DEFAULT_HISTORY_ROWS),
            },
            "forget" => Self::Forget(parse_arg(arg, "forget <n>")?),
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "Unknown command '{other}', try 'help'"
                )))
            }
        };
        Ok(command)
    }
}

fn parse_arg<T: FromStr>(arg: Option<&str>, usage: &str) -> cadence_core::Result<T> {
    arg.and_then(|a| a.parse().ok())
        .ok_or_else(|| Error::InvalidArgument(format!("usage: {usage}")))
}

/// Apply one command. Returns a message for the listener, if any.
pub async fn execute<S: MediaSink>(
    engine: &PlaybackEngine<S, History>,
    queue: &[Track],
    command: Command,
) -> Option<String> {
    match command {
        Command::Play(n) => match n.checked_sub(1).and_then(|i| queue.get(i)) {
            Some(track) => engine.play_track(track.clone(), queue.to_vec()),
            None => return Some(format!("No entry {n}, the queue has {}", queue.len())),
        },
        Command::Toggle => engine.toggle_play_pause(),
        Command::Next => engine.play_next(),
        Command::Prev => engine.play_previous(),
        Command::Seek(position) => engine.seek(position),
        Command::Volume(volume) => engine.change_volume(volume),
        Command::Queue => return Some(render_queue(&engine.snapshot(), queue)),
        Command::History(limit) => {
            return Some(match engine.history().recent(limit).await {
                Ok(entries) => render_history(&entries, queue),
                Err(e) => format!("History unavailable: {e}"),
            })
        }
        Command::Forget(n) => return Some(forget(engine.history(), n).await),
        Command::Help => return Some(HELP.to_string()),
        Command::Status | Command::Quit => {}
    }
    Some(render_status(&engine.snapshot()))
}

pub fn render_status(state: &PlaybackState) -> String {
    let Some(track) = &state.current_track else {
        return format!("■ nothing playing  vol {}%", state.volume.as_percentage());
    };
    format!(
        "{} {}  {}  [{}/{}]  vol {}%",
        if state.is_playing { "▶" } else { "❚❚" },
        track.display_name(),
        state.position_display(),
        state.current_index + 1,
        state.queue.len(),
        state.volume.as_percentage(),
    )
}

/// Numbered queue listing; before anything plays, the file's queue is shown.
pub fn render_queue(state: &PlaybackState, fallback: &[Track]) -> String {
    let (items, current) = if state.queue.is_empty() {
        (fallback, None)
    } else {
        (state.queue.as_slice(), Some(state.current_index))
    };

    let mut out = String::new();
    for (i, track) in items.iter().enumerate() {
        let marker = if Some(i) == current { '>' } else { ' ' };
        let _ = writeln!(
            out,
            "{marker}{:>3}. {}  ({})",
            i + 1,
            track.display_name(),
            track.duration.format()
        );
    }
    out.trim_end().to_string()
}

async fn forget(history: &History, n: usize) -> String {
    let entries = match history.recent(n).await {
        Ok(entries) => entries,
        Err(e) => return format!("History unavailable: {e}"),
    };
    let Some(entry) = n.checked_sub(1).and_then(|i| entries.get(i)) else {
        return format!("No history entry {n}");
    };
    match history.forget(entry).await {
        Ok(()) => format!("Removed {} from history", entry.key),
        Err(e) => format!("Could not remove {}: {e}", entry.key),
    }
}

/// Numbered recently-played listing. Titles the backend does not know are
/// looked up in the loaded queue.
pub fn render_history(entries: &[Recent], queue: &[Track]) -> String {
    if entries.is_empty() {
        return "No listening history yet".to_string();
    }

    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let title = entry.title.clone().unwrap_or_else(|| {
            queue
                .iter()
                .find(|t| t.history_key() == entry.key)
                .map_or_else(|| entry.key.to_string(), Track::display_name)
        });
        let _ = writeln!(
            out,
            "{:>4}. {title}  at {}  (played {}x)",
            i + 1,
            format_position(entry.position),
            entry.play_count
        );
    }
    out.trim_end().to_string()
}

/// Read commands from stdin until `quit` or end of input.
pub async fn run<S: MediaSink>(
    engine: &PlaybackEngine<S, History>,
    queue: &[Track],
) -> anyhow::Result<()> {
    println!("{}", render_queue(&engine.snapshot(), queue));
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => {
                if let Some(message) = execute(engine, queue, command).await {
                    println!("{message}");
                }
            }
            Err(e) => println!("{e}"),
        }
    }
    Ok(())
}
