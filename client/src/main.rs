/*
 * SPDX-FileCopyrightText: Copyright (c) 2022 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: MIT
 *
 * Permission is hereby granted, free of charge, to any person obtaining a
 * copy of this software and associated documentation files (the "Software"),
 * to deal in the Software without restriction, including without limitation
 * the rights to use, copy, modify, merge, publish, distribute, sublicense,
 * and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
 * THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
 * FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
 * DEALINGS IN THE SOFTWARE.
 */

/* BIOS fleet client
 * Reads BIOS settings and versions, applies BIOS settings and sets a one time
 * boot device on one or more BMCs over Redfish.
 *
 * USAGE: ./biosfleet -n 10.153.145.103 -n 10.153.145.104 -U TheBMCUsername -c get_bios_versions
 * -n: IP address or hostname of a BMC's Redfish API, optionally with :port.
 *     Repeat the flag, or separate nodes with commas, for more than one node.
 * If -P is not given the password is prompted for.
 * Run with no params for help.
 * Run with `-v` for more output.
 */

use std::{io::Write, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, bail, Context};
use biosfleet::{settings, AttributeSet, BootSource, Credential, FleetResult, RedfishClientPool};
use tracing::{error, info};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    GetBiosSettings,
    GetBiosVersions,
    SetBiosSettings,
    SetBootOnce,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get_bios_settings" => Ok(Command::GetBiosSettings),
            "get_bios_versions" => Ok(Command::GetBiosVersions),
            "set_bios_settings" => Ok(Command::SetBiosSettings),
            "set_boot_once" => Ok(Command::SetBootOnce),
            _ => Err(anyhow!("Unsupported command {s}")),
        }
    }
}

fn main() -> Result<(), anyhow::Error> {
    let args: Vec<String> = std::env::args().collect();
    let mut opts = getopts::Options::new();

    opts.optflag("h", "help", "Print this help");
    opts.optflag("v", "verbose", "Log at DEBUG level. Default is INFO");
    opts.optmulti(
        "n",
        "node",
        "Required. Hostname or IP address of BMC Redfish API. Repeatable, or comma separated",
        "NODE",
    );
    opts.optopt("U", "username", "Required. BMC username", "USER");
    opts.optopt("P", "password", "BMC password. Prompted for if absent", "PASS");
    opts.optopt("f", "file", "BIOS settings file, one key=value per line", "FILE");
    opts.optopt(
        "s",
        "boot-source",
        "Boot source for set_boot_once: Pxe, Cd, Usb, Hdd or BiosSetup",
        "SOURCE",
    );
    opts.optopt("t", "timeout", "Per request timeout in seconds. Default 60", "SECS");
    opts.optopt(
        "c",
        "cmd",
        "Command to run:
                get_bios_settings   (single node)
                get_bios_versions
                set_bios_settings   (needs -f)
                set_boot_once       (needs -s)",
        "CMD",
    );

    let args_given = opts.parse(&args[1..])?;
    let usage = opts.usage("biosfleet -n bmc_ip -U bmc_user [-P bmc_pass] -c cmd");
    if args_given.opt_present("h") || !args_given.opt_present("n") || !args_given.opt_present("c")
    {
        eprintln!("{usage}");
        return Ok(());
    }

    let log_level = if args_given.opt_present("v") {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(log_level.into())
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);
    tracing_subscriber::registry()
        .with(Layer::default().compact().with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    let nodes: Vec<String> = args_given
        .opt_strs("n")
        .iter()
        .flat_map(|n| n.split(','))
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect();
    let username = args_given
        .opt_str("U")
        .ok_or_else(|| anyhow!("-U username is required\n{usage}"))?;
    let cmd_name = args_given.opt_str("c").unwrap_or_default();
    let Ok(cmd) = cmd_name.parse::<Command>() else {
        error!("Unsupported command specified {cmd_name}");
        eprintln!("{usage}");
        return Ok(());
    };

    // check command specific arguments before asking for a password
    let boot_source = match cmd {
        Command::SetBootOnce => Some(
            args_given
                .opt_str("s")
                .ok_or_else(|| anyhow!("set_boot_once needs -s boot source"))?
                .parse::<BootSource>()?,
        ),
        _ => None,
    };
    let settings_file = match cmd {
        Command::SetBiosSettings => Some(PathBuf::from(
            args_given
                .opt_str("f")
                .ok_or_else(|| anyhow!("set_bios_settings needs -f settings file"))?,
        )),
        _ => None,
    };

    let password = match args_given.opt_str("P") {
        Some(p) => p,
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .interact()?,
    };
    let credential = Credential::new(username, password);

    let mut builder = RedfishClientPool::builder();
    if let Some(secs) = args_given.opt_str("t") {
        let secs: u64 = secs
            .parse()
            .with_context(|| format!("Invalid timeout {secs}"))?;
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let pool = builder.build()?;

    match cmd {
        Command::GetBiosSettings => {
            let [node] = nodes.as_slice() else {
                bail!("get_bios_settings takes exactly one node");
            };
            let attrs = biosfleet::get_bios_settings(&pool, node, &credential)?;
            write_settings(&mut std::io::stdout().lock(), node, &attrs)?;
        }
        Command::GetBiosVersions => {
            let versions = biosfleet::get_bios_versions(&pool, &nodes, &credential).sorted();
            for (node, version) in versions.successes() {
                println!("{node}: {version}");
            }
            report_failures("getting bios version", &versions);
        }
        Command::SetBiosSettings => {
            let path = settings_file.ok_or_else(|| anyhow!("missing settings file"))?;
            let attrs = settings::load_settings(&path)?;
            info!("Applying {} BIOS settings from {}", attrs.len(), path.display());
            biosfleet::set_bios_settings(&pool, &nodes, &credential, &attrs)?;
            info!("BIOS settings changes require system restart");
        }
        Command::SetBootOnce => {
            let source = boot_source.ok_or_else(|| anyhow!("missing boot source"))?;
            let results = biosfleet::set_boot_once(&pool, &nodes, &credential, source);
            report_failures("setting boot source", &results);
        }
    }

    Ok(())
}

fn write_settings(out: &mut impl Write, node: &str, attrs: &AttributeSet) -> std::io::Result<()> {
    writeln!(out, "Getting bios settings for node: {node}")?;
    for (key, value) in attrs {
        writeln!(out, "{key}: {value}")?;
    }
    Ok(())
}

// Failed nodes were already logged as they happened; this is the closing tally.
fn report_failures<T>(action: &str, results: &FleetResult<T>) {
    let failed: Vec<&str> = results.failures().map(|(node, _)| node).collect();
    if !failed.is_empty() {
        error!(
            "An error occurred {action} for {} of {} nodes: {}",
            failed.len(),
            results.len(),
            failed.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(
            "get_bios_settings".parse::<Command>().unwrap(),
            Command::GetBiosSettings
        );
        assert_eq!(
            "get_bios_versions".parse::<Command>().unwrap(),
            Command::GetBiosVersions
        );
        assert_eq!(
            "set_bios_settings".parse::<Command>().unwrap(),
            Command::SetBiosSettings
        );
        assert_eq!("set_boot_once".parse::<Command>().unwrap(), Command::SetBootOnce);
        // rejected before the password prompt
        assert!("reset_bmc".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
        assert!("Get_Bios_Settings".parse::<Command>().is_err());
    }

    #[test]
    fn test_write_settings() {
        let mut attrs = AttributeSet::new();
        attrs.insert("BootMode", "UEFI");
        attrs.insert("NumaNodesPerSocket", 2i64);
        let mut out = Vec::new();
        write_settings(&mut out, "10.0.0.5", &attrs).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Getting bios settings for node: 10.0.0.5\nBootMode: UEFI\nNumaNodesPerSocket: 2\n"
        );
    }
}
