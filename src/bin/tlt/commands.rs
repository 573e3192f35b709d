// SPDX-License-Identifier: MPL-2.0

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use timelogtool::{
    commands::Arguments, config::load_config, driver::Driver, http::ReqwestTransport,
};

pub fn submit(args: Arguments, dotenv_path: Option<PathBuf>) -> Result<()> {
    let preset = args.preset;
    match preset {
        Some(preset) => log::info!("Using preset: {preset}"),
        None => log::info!("Using date range from the config file"),
    }

    let config = load_config(args.config)?;
    let today = Local::now().date_naive();
    let (range, template) = config.plan(preset, today)?;
    log::info!("Submitting {} hours per day for {range}", template.hours);

    let transport = ReqwestTransport::new(config.timeout)?;
    let credentials = config.credential_source(dotenv_path);
    let policy = config.skip_policy();
    Driver {
        transport: &transport,
        credentials: &*credentials,
        api_domain: &config.api_domain,
        policy: &policy,
    }
    .run(range, &template)?;

    Ok(())
}
