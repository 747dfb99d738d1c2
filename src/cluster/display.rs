//! Terminal rendering of the cluster view.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::Local;

use super::NodeEntry;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Clear the terminal and print the current cluster table.
pub fn print(view: &HashMap<String, NodeEntry>, ttl: Duration) {
    print!("\x1b[H\x1b[2J");
    println!("{}", render(view, ttl, Instant::now()));
}

/// Render the cluster table. Rows past `ttl` show as OFFLINE with their
/// observed staleness in seconds; an empty temp status renders as N/A.
pub fn render(view: &HashMap<String, NodeEntry>, ttl: Duration, now: Instant) -> String {
    let mut out = String::new();
    let rule = "=".repeat(77);

    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!(
        "   DECENTRALIZED METRICS MESH (Nodes: {})   updated {}\n",
        view.len(),
        Local::now().format("%H:%M:%S")
    ));
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!(
        "{:<16} | {:<10} | {:<10} | {:<15} | {:<10}\n",
        "IP ADDRESS", "CPU", "MEM", "TEMP", "STATUS"
    ));
    out.push_str(&"-".repeat(77));
    out.push('\n');

    let mut keys: Vec<&String> = view.keys().collect();
    keys.sort();

    for key in keys {
        let entry = &view[key];
        let age = now.saturating_duration_since(entry.last_seen);

        if age > ttl {
            out.push_str(&format!(
                "{:<16} | {:<10} | {:<10} | {:<15} | {RED}OFFLINE{RESET} ({:.0}s)\n",
                key,
                "-",
                "-",
                "-",
                age.as_secs_f64()
            ));
            continue;
        }

        let m = &entry.snapshot;
        let temp = if m.temp_status.is_empty() {
            "N/A".to_string()
        } else {
            format!("{:.1}\u{b0}C ({})", m.temp_c, m.temp_status)
        };

        out.push_str(&format!(
            "{:<16} | {:>9.1}% | {:>9.1}% | {:<15} | {GREEN}ONLINE{RESET}\n",
            key, m.cpu, m.mem, temp
        ));
    }

    out.push_str(&rule);
    out
}
