//! User-facing output
//!
//! Status lines carry a bracketed marker (`[✓]`, `[✗]`, ...) coloured with
//! crossterm when stdout is a terminal and `NO_COLOR` is unset. Diagnostics go
//! through `tracing` instead.

use burrow_core::{WorkspaceRecord, WorkspaceStatus};
use crossterm::style::{Color, Stylize};
use std::io::IsTerminal;
use std::sync::OnceLock;

fn plain() -> bool {
    static PLAIN: OnceLock<bool> = OnceLock::new();
    *PLAIN.get_or_init(|| {
        std::env::var_os("NO_COLOR").is_some() || !std::io::stdout().is_terminal()
    })
}

fn marker(text: &'static str, color: Color) -> String {
    if plain() {
        text.to_string()
    } else {
        text.with(color).bold().to_string()
    }
}

pub fn header(msg: impl AsRef<str>) {
    println!("{} {}", marker("[★]", Color::Magenta), msg.as_ref());
}

pub fn success(msg: impl AsRef<str>) {
    println!("{} {}", marker("[✓]", Color::Green), msg.as_ref());
}

pub fn info(msg: impl AsRef<str>) {
    println!("{} {}", marker("[i]", Color::Cyan), msg.as_ref());
}

pub fn warn(msg: impl AsRef<str>) {
    eprintln!("{} {}", marker("[!]", Color::Yellow), msg.as_ref());
}

pub fn error(msg: impl AsRef<str>) {
    eprintln!("{} {}", marker("[✗]", Color::Red), msg.as_ref());
}

/// One block per workspace, registry order
pub fn print_list(workspaces: &[WorkspaceRecord]) {
    if workspaces.is_empty() {
        info("No workspaces yet. Create one with: burrow create <name>");
        return;
    }

    header(format!("Workspaces ({})", workspaces.len()));
    for ws in workspaces {
        let mut line = format!("  {} ({})", ws.name, ws.lang);
        if ws.display_name != ws.name {
            line.push_str(&format!(" \"{}\"", ws.display_name));
        }
        if ws.isolated {
            line.push_str(" [isolated]");
        }
        if !ws.exists() {
            line.push_str(" [missing]");
        }
        println!("{}", line);
        println!("      {}", ws.path.display());
        if !ws.description.is_empty() {
            println!("      {}", ws.description);
        }
    }
}

/// Full report for one workspace
pub fn print_status(status: &WorkspaceStatus) {
    let ws = &status.record;
    header(format!("{} ({})", ws.display_name, ws.name));

    if !ws.description.is_empty() {
        println!("  {}", ws.description);
    }
    println!("  Path:      {}", ws.path.display());
    println!("  Language:  {}", ws.lang);
    println!("  Isolated:  {}", if ws.isolated { "yes" } else { "no" });
    if !ws.author.is_empty() {
        println!("  Author:    {}", ws.author);
    }
    if !ws.created.is_empty() {
        println!("  Created:   {}", ws.created);
    }
    println!("  Files:     {} ({})", status.files, human_size(status.bytes));

    let commands = [
        ("build", &ws.build_cmd),
        ("run", &ws.run_cmd),
        ("test", &ws.test_cmd),
        ("clean", &ws.clean_cmd),
    ];
    println!("  Commands:");
    for (label, cmd) in commands {
        let shown = if cmd.is_empty() { "(not set)" } else { cmd.as_str() };
        println!("    {:<6} {}", label, shown);
    }

    if !ws.env_vars.is_empty() {
        println!("  Environment:");
        for (key, value) in &ws.env_vars {
            println!("    {}={}", key, value);
        }
    }
    if !ws.init_cmds.is_empty() {
        println!("  Init:");
        for cmd in &ws.init_cmds {
            println!("    {}", cmd);
        }
    }
    if !ws.mounts.is_empty() {
        println!("  Mounts:");
        for mount in &ws.mounts {
            println!("    {}", mount);
        }
    }
    if !ws.tags.is_empty() {
        println!("  Tags:      {}", ws.tags.join(", "));
    }
}

/// Bytes as B/K/M/G with one decimal above bytes
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["K", "M", "G", "T"];

    if bytes < 1024 {
        return format!("{}B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0B");
        assert_eq!(human_size(1023), "1023B");
        assert_eq!(human_size(1536), "1.5K");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0M");
    }
}
