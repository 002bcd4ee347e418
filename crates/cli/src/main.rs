// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! scribe: session orchestration and memory pipeline hooks.
//!
//! One binary, invoked by the host at each lifecycle event (`scribe hook
//! …`) and by operators/timers for queue, checkpoint and status work.
//! Hook subcommands read one JSON object from stdin and encode their
//! verdict in the exit code: 0 allow, 1 allow with message, 2 block.

mod commands;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scribe", version, about = "Session orchestration and memory pipeline hooks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lifecycle hooks (stdin JSON, exit-code semantics)
    Hook(commands::hook::HookArgs),
    /// Working-tree checkpoints (create, list, restore)
    Checkpoint(commands::checkpoint::CheckpointArgs),
    /// Project status block maintenance
    Status(commands::status::StatusArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let code = match cli.command {
        Command::Hook(args) => commands::hook::run(args).await,
        Command::Checkpoint(args) => commands::checkpoint::run(args).await,
        Command::Status(args) => commands::status::run(args).await,
    };
    ExitCode::from(code.clamp(0, 255) as u8)
}
