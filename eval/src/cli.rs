//! CLI command implementations.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use metrc::{Credentials, HttpMetrc, MetrcApi, Resource};
use tracing::{debug, info};

use crate::clock::{NameClock, SystemClock};
use crate::config::{EvalConfig, load_config};
use crate::report::{OutputFormat, render};
use crate::row::Bundle;
use crate::verify::Verifier;

/// Resource cycles run by `eval run`. Items are opt-in.
pub fn run_plan(with_items: bool) -> Vec<Resource> {
    let mut plan = vec![Resource::Locations, Resource::Strains];
    if with_items {
        plan.push(Resource::Items);
    }
    plan
}

/// Load the config file and apply the CLI license override.
pub fn load_effective_config(path: &Path, license: Option<&str>) -> Result<EvalConfig> {
    let mut config = load_config(path).context("load config")?;
    if let Some(license) = license {
        config.license_number = license.to_string();
        config.validate().context("validate license override")?;
    }
    debug!(path = %path.display(), license = %config.license_number, "config loaded");
    Ok(config)
}

/// Run `plan` against the live API and print every bundle to stdout.
pub fn run_live(config: EvalConfig, plan: &[Resource], format: OutputFormat) -> Result<()> {
    let credentials = Credentials::from_env().context("load metrc credentials")?;
    let api = HttpMetrc::new(config.base_url.clone(), credentials)?;
    let license = config.license_number.clone();
    let verifier = Verifier::new(&api, config, SystemClock);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_sequence(&verifier, &license, plan, format, &mut out)
}

/// Run each cycle in order, writing its bundle as soon as it is produced.
///
/// The first failing cycle aborts the sequence.
pub fn run_sequence<M: MetrcApi, C: NameClock, W: Write>(
    verifier: &Verifier<'_, M, C>,
    license: &str,
    plan: &[Resource],
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    info!(license, cycles = plan.len(), "starting verification");
    for resource in plan {
        match resource {
            Resource::Locations => emit(&verifier.verify_locations(license)?, format, out)?,
            Resource::Strains => emit(&verifier.verify_strains(license)?, format, out)?,
            Resource::Items => emit(&verifier.verify_items(license)?, format, out)?,
        }
    }
    Ok(())
}

fn emit<B: Bundle, W: Write>(bundle: &B, format: OutputFormat, out: &mut W) -> Result<()> {
    writeln!(out, "{}", render(bundle, format)?).context("write bundle")?;
    if let Some(warning) = bundle.cleanup_warning() {
        eprintln!("warning: {}", warning);
    }
    Ok(())
}

/// Print the effective configuration as TOML.
pub fn show_config(config: &EvalConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
