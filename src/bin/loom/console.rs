//! Console commands, read from stdin on their own thread

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{info, warn};

use liveloom::Reloader;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Reload,
    Quit,
    Unknown(String),
}

fn parse(line: &str) -> Command {
    match line.trim() {
        "" | "reload" | "r" => Command::Reload,
        "quit" | "q" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_owned()),
    }
}

/// Listen for commands until `quit` or end of input. End of input only stops
/// listening; the render loop keeps going until interrupted.
pub fn spawn(mut reloader: Reloader, stop: Arc<AtomicBool>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("loom-console".into())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                match parse(&line) {
                    // Failures are already logged by the reloader.
                    Command::Reload => {
                        let _ = reloader.reload();
                    }
                    Command::Quit => {
                        stop.store(true, Ordering::Relaxed);
                        break;
                    }
                    Command::Unknown(other) => {
                        warn!("unknown command `{}` (try `reload` or `quit`)", other)
                    }
                }
                if stop.load(Ordering::Relaxed) {
                    break;
                }
            }
            info!("console closed");
        })
}
