mod doctor;
mod run;
mod serve;

use anyhow::Result;
use console::style;

use crate::core::terminal::{self, GuideSection, print_error};

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Core")
        .command("run", "Run a campaign from a contacts file")
        .command("serve", "Start the campaign API server")
        .print();

    GuideSection::new("Diagnostics")
        .command("doctor", "Check configuration and gateway access")
        .command("version", "Print the installed version")
        .print();

    GuideSection::new("Examples")
        .hint("callminder run --contacts contacts.json", "")
        .hint("callminder run --contacts contacts.json --dry-run", "")
        .hint("callminder run --contacts contacts.json --report out.json", "")
        .hint("callminder serve --port 8750", "")
        .hint("callminder doctor --probe", "")
        .print();

    println!(
        "\n {} {} <command> [flags]\n",
        style("Usage:").bold(),
        style("callminder").green()
    );
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct RunCommandArgs {
    pub contacts: Option<String>,
    pub config: Option<String>,
    pub report: Option<String>,
    pub max_attempts: Option<u32>,
    pub dry_run: bool,
    pub verbose: bool,
}

pub(crate) fn parse_run_command_args(args: &[String], start: usize) -> RunCommandArgs {
    let mut parsed = RunCommandArgs::default();
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--contacts" => {
                if i + 1 < args.len() {
                    parsed.contacts = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--config" => {
                if i + 1 < args.len() {
                    parsed.config = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--report" => {
                if i + 1 < args.len() {
                    parsed.report = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--max-attempts" => {
                if i + 1 < args.len() {
                    parsed.max_attempts = args[i + 1].parse().ok();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--dry-run" => {
                parsed.dry_run = true;
                i += 1;
            }
            "--verbose" | "-v" => {
                parsed.verbose = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    parsed
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ServeCommandArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<String>,
    pub verbose: bool,
}

pub(crate) fn parse_serve_command_args(args: &[String], start: usize) -> ServeCommandArgs {
    let mut parsed = ServeCommandArgs::default();
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--host" => {
                if i + 1 < args.len() {
                    parsed.host = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--port" => {
                if i + 1 < args.len() {
                    parsed.port = args[i + 1].parse().ok();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--config" => {
                if i + 1 < args.len() {
                    parsed.config = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--verbose" | "-v" => {
                parsed.verbose = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    parsed
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct DoctorCommandArgs {
    pub config: Option<String>,
    pub probe: bool,
}

pub(crate) fn parse_doctor_command_args(args: &[String], start: usize) -> DoctorCommandArgs {
    let mut parsed = DoctorCommandArgs::default();
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if i + 1 < args.len() {
                    parsed.config = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--probe" => {
                parsed.probe = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    parsed
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "run" => {
            let parsed = parse_run_command_args(&args, 2);
            if parsed.contacts.is_none() {
                print_error("Error: --contacts <file> is required for run mode.");
                print_help();
                return Ok(());
            }
            run::run_campaign(parsed).await
        }
        "serve" => {
            let parsed = parse_serve_command_args(&args, 2);
            serve::run_server(parsed).await
        }
        "doctor" => {
            let parsed = parse_doctor_command_args(&args, 2);
            doctor::run_doctor(parsed).await
        }
        "version" | "--version" | "-V" => {
            println!("callminder {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        cmd => {
            print_error(&format!("Unknown command: {}", cmd));
            print_help();
            Ok(())
        }
    }
}
