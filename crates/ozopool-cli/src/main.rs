// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use ozopool_api::Client;
use ozopool_app::{AppState, PasswordFormInput};
use runtime::{ApiRuntime, DemoRuntime};
use std::env;
use std::path::PathBuf;

const DEMO_SEED: u64 = 7;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `ozopool --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    if options.demo {
        if options.check_only {
            return Ok(());
        }
        let mut state = AppState::default();
        state.active_screen = config.start_screen()?;
        let mut runtime = DemoRuntime::new(DEMO_SEED);
        return ozopool_tui::run_app(&mut state, &mut runtime);
    }

    let client = Client::new(config.api_base_url(), config.api_timeout()?).with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;

    if let Some(encryption_id) = &options.set_password {
        let password = require_env("OZOPOOL_NEW_PASSWORD")?;
        let form = PasswordFormInput {
            password: password.clone(),
            confirm_password: password,
        };
        client.set_password(encryption_id, &form)?;
        println!("password updated");
        return Ok(());
    }

    let email = require_env("OZOPOOL_EMAIL")?;
    let password = require_env("OZOPOOL_PASSWORD")?;
    let session = client
        .login(&email, &password)
        .with_context(|| format!("log in to {} as {email}", config.api_base_url()))?;

    if options.check_only {
        return Ok(());
    }

    let mut state = AppState::default();
    state.active_screen = config.start_screen()?;
    let mut runtime = ApiRuntime::new(client, session, config.poll_interval()?);
    ozopool_tui::run_app(&mut state, &mut runtime)
}

fn require_env(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{name} is not set -- export it before launching"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    demo: bool,
    check_only: bool,
    set_password: Option<String>,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        demo: false,
        check_only: false,
        set_password: None,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--set-password" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--set-password requires the encryption id from the invite link")
                })?;
                options.set_password = Some(value.as_ref().to_owned());
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("ozopool");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Launch against a seeded in-memory fleet (no backend)");
    println!("  --check                  Validate config, backend connectivity, and credentials");
    println!("  --set-password <id>      Set the password for an invited account, then exit");
    println!("                           (reads OZOPOOL_NEW_PASSWORD)");
    println!("  --help                   Show this help");
    println!();
    println!("Credentials are read from OZOPOOL_EMAIL and OZOPOOL_PASSWORD.");
}
