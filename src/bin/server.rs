//! Lexviet conversation service binary.
//! Run with: cargo run --bin lexviet-server

use std::process::ExitCode;

use lexviet_agent::start_lexviet_agent;

fn main() -> ExitCode {
    start_lexviet_agent::run()
}
