//! Terminal output helpers for the interceptor status display
//!
//! The status reporter repaints a fixed-format block once per second; these
//! helpers provide the line prefixes and the ANSI clear/repaint primitives
//! that requires. Everything else in the toolkit logs through `tracing`.

pub const BOLD: &str = "\x1b[1m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const RESET: &str = "\x1b[0m";

/// Separator line used around menus and the status block
pub const DELIM: &str =
    "--------------------------------------------------------------------------------";

/// Total width of a status/menu line
pub const LINE_WIDTH: usize = 80;

pub fn printf(msg: &str) {
    println!("{msg}");
}

pub fn print_info(msg: &str) {
    println!("[{GREEN}*{RESET}] {msg}");
}

pub fn print_error(msg: &str) {
    println!("[{RED}!{RESET}] {msg}");
}

pub fn print_cmd(msg: &str) {
    println!("[{YELLOW}>{RESET}] {msg}");
}

/// Prompt prefix for interactive input (no trailing newline)
pub fn print_input(msg: &str) {
    use std::io::Write;
    print!("[{BOLD}?{RESET}] {msg} ");
    let _ = std::io::stdout().flush();
}

/// Move the cursor up `count` lines, clearing each
pub fn clear_lines(count: usize) {
    for _ in 0..count {
        print!("\x1b[1A\x1b[2K");
    }
    use std::io::Write;
    let _ = std::io::stdout().flush();
}
