// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minimal CLI: build a service provider pipeline and print its description.
//!
//!  Build it with `cargo build --release --bin samlsp`
//!  The binary honours SAMLSP_CONFIG_FILE, else takes the file as its first argument.

use std::env;
use std::error::Error;

use samlsp::{ServiceProvider, info_fmt};

#[derive(serde::Serialize)]
struct Report<'a> {
    build_id: String,
    built_at: String,
    #[serde(flatten)]
    description: &'a samlsp::PipelineDescription,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let Some(path) = env::var("SAMLSP_CONFIG_FILE").ok().or_else(|| env::args().nth(1)) else {
        eprintln!("usage: samlsp <config-file> (or set SAMLSP_CONFIG_FILE)");
        return Err(Box::from("No configuration file given."));
    };

    let sp = match ServiceProvider::loader()
        .with_config_file(&path)
        .with_env_vars()
        .build()
        .await
    {
        Ok(sp) => sp,
        Err(e) => {
            eprintln!("Failed to build service provider from {path}: {e}");
            return Err(e.into());
        }
    };

    let pipeline = sp.pipeline();
    info_fmt!("Startup", "Pipeline {} ready", pipeline.build_id());

    let description = pipeline.describe();
    let report = Report {
        build_id: pipeline.build_id().to_string(),
        built_at: pipeline.built_at().to_rfc3339(),
        description: &description,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
