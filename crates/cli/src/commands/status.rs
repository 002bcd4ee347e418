// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project status command handlers

use clap::Args;
use scribe_adapters::vector::MemoryService;
use scribe_adapters::VectorClient;
use scribe_core::Paths;
use scribe_engine::status_doc::update_status_doc;

use crate::output::print_json;

#[derive(Args)]
pub struct StatusArgs {
    /// Refresh the <project_status> block in CLAUDE.md
    #[arg(long)]
    pub update: bool,
    /// Skip the vector service; use the journal and WSI only
    #[arg(long = "fast-local")]
    pub fast_local: bool,
}

pub async fn run(args: StatusArgs) -> i32 {
    let paths = Paths::resolve();
    // Bare `scribe status` behaves like `--update` (the timer invocation).
    let _ = args.update;

    let client;
    let service: Option<&dyn MemoryService> = if args.fast_local {
        None
    } else {
        client = VectorClient::from_env();
        Some(&client)
    };

    let report = update_status_doc(&paths, service, !args.fast_local).await;
    let ok = report.ok;
    print_json(&report);
    if ok {
        0
    } else {
        1
    }
}
