use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, subscriber::set_global_default};
use tracing_subscriber::EnvFilter;

use gradetool::{AppConfig, GradingContext, Report, workflows};

fn init_tracing(verbose: u8, quiet: u8) {
    // Map -q/-v to tracing levels; default WARN
    let level = match i16::from(verbose) - i16::from(quiet) {
        i16::MIN..=-1 => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr) // logs to stderr
        .with_target(false)
        .with_level(true)
        .compact()
        .finish();

    // Ignore error if already set in tests or env
    let _ = set_global_default(subscriber);
}

fn main() {
    let opts = Opts::parse();
    init_tracing(opts.verbose, opts.quiet);
    if let Err(e) = run(opts) {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_default()?,
    };
    if let Some(source) = config.source() {
        debug!("using config {}", source.display());
    }
    Ok(config)
}

fn run(opts: Opts) -> anyhow::Result<()> {
    let config = load_config(opts.config.as_deref())?;
    let ctx = GradingContext::from_config(&config)?;

    let report = match opts.command {
        Command::Organize { dir } => workflows::organize(&ctx, &dir)?,
        Command::CopyRevision {
            originals,
            revisions,
        } => workflows::copy_revision_feedback(&ctx, &originals, &revisions)?,
        Command::CopyFeedback { src, dest } => {
            workflows::copy_feedback_to_revision(&ctx, &src, &dest)?
        }
        Command::CopyTemplate { dir, template } => {
            workflows::copy_template(&ctx, &dir, &template)?
        }
        Command::CopyToSubdirs { template, dir } => {
            workflows::copy_template_to_subdirs(&ctx, &dir, &template)?
        }
        Command::TemplateToStudents {
            template,
            dir,
            prefix,
        } => workflows::template_to_students(&ctx, &template, &dir, &prefix)?,
        Command::ReplaceFeedback { dir, template } => {
            workflows::replace_feedback_files(&ctx, &dir, &template)?
        }
        Command::Distribute { from, to, confirm } => {
            if confirm {
                let mut ask = ask_on_stdin;
                workflows::distribute_feedback(&from, &to, Some(&mut ask))?
            } else {
                workflows::distribute_feedback(&from, &to, None)?
            }
        }
    };

    print_report(&report, opts.json)
}

fn ask_on_stdin(file: &Path, dir: &Path) -> bool {
    print!(
        "Move {} into {}? [y/N] ",
        file.display(),
        dir.display().to_string().bold()
    );
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn print_report(report: &Report, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

#[derive(Parser)]
#[command(version, about = "gt: instructor grading helpers")]
pub struct Opts {
    /// Increase verbosity (-v, -vv, -vvv). Default WARN.
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Decrease verbosity (-q). Each -q reduces level by one step.
    #[arg(short = 'q', action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,
    /// Config file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Print the summary as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Move every student's newest submission to the top of DIR and nest older ones inside it
    Organize {
        dir: PathBuf,
    },
    /// Copy feedback from the original submissions into the revised ones
    CopyRevision {
        originals: PathBuf,
        revisions: PathBuf,
    },
    /// Copy last version's feedback files over the feedback files of new LMS submission folders
    CopyFeedback {
        src: PathBuf,
        dest: PathBuf,
    },
    /// Replace LMS feedback files with the template; create one where missing
    CopyTemplate {
        dir: PathBuf,
        template: PathBuf,
    },
    /// Put a copy of the template, renamed after each subdirectory, into every subdirectory of DIR
    CopyToSubdirs {
        template: PathBuf,
        dir: PathBuf,
    },
    /// Put a copy of the template into each student's newest submission
    TemplateToStudents {
        template: PathBuf,
        dir: PathBuf,
        /// Prepended to each copy's file name
        #[arg(long, default_value = "")]
        prefix: String,
    },
    /// Back up and overwrite every feedback file under DIR with the template
    ReplaceFeedback {
        dir: PathBuf,
        template: PathBuf,
    },
    /// Move each file in FROM into the most similarly named directory in TO
    Distribute {
        from: PathBuf,
        to: PathBuf,
        /// Ask before each move
        #[arg(long)]
        confirm: bool,
    },
}
