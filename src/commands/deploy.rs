//! The `deploy` command: confirm, scan, create directories, link files.
use std::io::{BufRead, Write};

use anyhow::{Context as _, Result};

use crate::config::Settings;
use crate::config::ignore::IgnoreRules;
use crate::logging::{Color, Log, StepStatus};
use crate::resources::directory::DirectoryResource;
use crate::resources::symlink::SymlinkResource;
use crate::resources::{Applicable as _, Resource as _, ResourceChange, ResourceState};
use crate::scan::{self, DeployPlan};

/// Prompt shown before a run that changes the filesystem.
pub const CONFIRM_PROMPT: &str = "No dry mode. Do you want to continue? [y/N] ";

/// Counts of what a run did, or would do in dry-run mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeployReport {
    /// The user declined the confirmation prompt; nothing was changed.
    pub aborted: bool,
    /// Directories created.
    pub directories_created: usize,
    /// Symlinks created where nothing existed.
    pub links_created: usize,
    /// Symlinks created after removing an existing entry.
    pub links_replaced: usize,
    /// Destinations already linked to the right source.
    pub links_unchanged: usize,
    /// Walked entries that were not deployed.
    pub skipped: usize,
}

/// Ask for confirmation on `output` and read one line from `input`.
///
/// Only `y` or `yes` (any case) confirms; end of input declines.
///
/// # Errors
///
/// Returns an error if the prompt cannot be written or the answer read.
pub fn confirm(input: &mut impl BufRead, output: &mut impl Write) -> Result<bool> {
    write!(output, "{CONFIRM_PROMPT}").context("writing confirmation prompt")?;
    output.flush().context("writing confirmation prompt")?;
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("reading confirmation answer")?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(matches!(answer.as_str(), "y" | "yes"))
}

/// Run the deploy command.
///
/// Unless `settings.dry_run` or `settings.assume_yes` is set, the user is
/// asked to confirm on `output` with the answer read from `input`.
///
/// # Errors
///
/// Returns an error if the ignore file or the source tree cannot be read, or
/// if a directory or symlink cannot be created.  Links created before the
/// failure are left in place.
pub fn run(
    settings: &Settings,
    log: &dyn Log,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<DeployReport> {
    let version =
        option_env!("DOTDEPLOY_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
    log.debug(&format!("dotdeploy {version}"));

    if !settings.dry_run && !settings.assume_yes && !confirm(input, output)? {
        log.info("aborted");
        log.record_step("Confirm", StepStatus::Skipped, Some("aborted by user"));
        return Ok(DeployReport {
            aborted: true,
            ..DeployReport::default()
        });
    }

    log.stage(&format!("Scanning {}", settings.source.display()));
    log.info(&format!("identity: {}", settings.identity));
    log.info(&format!("destination: {}", settings.destination.display()));
    let ignore = IgnoreRules::load(&settings.ignore_file)?;
    log.debug(&format!(
        "{} ignore rule(s) from {}",
        ignore.len(),
        settings.ignore_file.display()
    ));
    let plan = scan::scan(
        &settings.source,
        &settings.destination,
        &settings.identity,
        &ignore,
        log,
    )?;
    log.info(&format!(
        "{} symlink(s), {} director(ies), {} skipped",
        plan.map.len(),
        plan.directories.len(),
        plan.skipped.len()
    ));

    let mut report = DeployReport {
        skipped: plan.skipped.len(),
        ..DeployReport::default()
    };

    if let Err(e) = create_directories(settings, &plan, log, &mut report) {
        log.record_step("Create directories", StepStatus::Failed, Some(&format!("{e:#}")));
        return Err(e);
    }
    if let Err(e) = create_symlinks(settings, &plan, log, &mut report) {
        log.record_step("Create symlinks", StepStatus::Failed, Some(&format!("{e:#}")));
        return Err(e);
    }
    Ok(report)
}

fn create_directories(
    settings: &Settings,
    plan: &DeployPlan,
    log: &dyn Log,
    report: &mut DeployReport,
) -> Result<()> {
    let header = if settings.dry_run {
        "Directories to create"
    } else {
        "Creating directories"
    };
    log.stage(header);

    for dir in &plan.directories {
        let resource = DirectoryResource::new(dir.clone());
        if settings.dry_run {
            if !resource.needs_change()? {
                log.debug(&format!("{} already exists", dir.display()));
            } else {
                log.dry_run(&dir.display().to_string());
                report.directories_created += 1;
            }
            continue;
        }
        match resource.apply()? {
            ResourceChange::AlreadyCorrect => {
                log.debug(&format!("{} already exists", dir.display()));
            }
            _ => {
                log.debug(&dir.display().to_string());
                report.directories_created += 1;
            }
        }
    }

    let (status, verb) = if settings.dry_run {
        (StepStatus::DryRun, "to create")
    } else {
        (StepStatus::Ok, "created")
    };
    let status = if report.directories_created == 0 {
        StepStatus::Skipped
    } else {
        status
    };
    log.record_step(
        "Create directories",
        status,
        Some(&format!("{} {verb}", report.directories_created)),
    );
    Ok(())
}

fn create_symlinks(
    settings: &Settings,
    plan: &DeployPlan,
    log: &dyn Log,
    report: &mut DeployReport,
) -> Result<()> {
    let header = if settings.dry_run {
        "Symlinks to create:"
    } else {
        "Creating symlinks:"
    };
    log.stage(header);

    for (source, destination) in plan.map.entries() {
        let resource = SymlinkResource::new(
            source.to_path_buf(),
            destination.to_path_buf(),
            settings.force,
        );
        let line = format!(
            "{} --> {}",
            Color::Green.paint(destination.display()),
            Color::Blue.paint(source.display())
        );
        let removing = format!(
            "Removing old {}",
            Color::Red.paint(destination.display())
        );

        if settings.dry_run {
            match resource.current_state()? {
                ResourceState::Correct => {
                    log.debug(&format!("{line} (already linked)"));
                    report.links_unchanged += 1;
                }
                ResourceState::Incorrect { current } if settings.force => {
                    log.dry_run(&format!("{removing} ({current})"));
                    log.dry_run(&line);
                    report.links_replaced += 1;
                }
                ResourceState::Incorrect { current } => {
                    log.dry_run(&line);
                    log.warn(&format!(
                        "{} exists ({current}); linking will fail without --force",
                        destination.display()
                    ));
                    report.links_created += 1;
                }
                ResourceState::Missing => {
                    log.dry_run(&line);
                    report.links_created += 1;
                }
            }
            continue;
        }

        match resource.apply()? {
            ResourceChange::AlreadyCorrect => {
                log.debug(&format!("{line} (already linked)"));
                report.links_unchanged += 1;
            }
            ResourceChange::Replaced { previous } => {
                log.info(&format!("{removing} ({previous})"));
                log.info(&line);
                report.links_replaced += 1;
            }
            ResourceChange::Applied => {
                log.info(&line);
                report.links_created += 1;
            }
        }
    }

    let changed = report.links_created + report.links_replaced;
    let status = match (settings.dry_run, changed) {
        (_, 0) => StepStatus::Skipped,
        (true, _) => StepStatus::DryRun,
        (false, _) => StepStatus::Ok,
    };
    log.record_step(
        "Create symlinks",
        status,
        Some(&format!(
            "{changed} {}, {} already linked",
            if settings.dry_run { "to link" } else { "linked" },
            report.links_unchanged
        )),
    );
    Ok(())
}
