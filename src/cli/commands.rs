//! Command dispatch: wires parsed arguments to the tree service.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::Snapshot;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{find_by_id, MoveRequest, Node, NodeId};
use crate::infrastructure::{InfraError, ServiceContainer};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Show) => cmd_show(cli),
        Some(Commands::Move {
            item,
            before,
            into,
            dry_run,
            output,
        }) => cmd_move(
            cli,
            item,
            before.as_deref(),
            into.as_deref(),
            *dry_run,
            output.as_deref(),
        ),
        Some(Commands::Validate) => cmd_validate(cli),
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Ok(()),
    }
}

/// Directory searched for the local config: the snapshot's directory, else cwd.
fn local_dir(cli: &Cli) -> CliResult<PathBuf> {
    match cli.file.as_deref().and_then(Path::parent) {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(dir.to_path_buf()),
        _ => env::current_dir()
            .map_err(|e| InfraError::io("determine current directory", e).into()),
    }
}

fn container(cli: &Cli) -> CliResult<ServiceContainer> {
    let dir = local_dir(cli)?;
    let settings = Settings::load(Some(dir.as_path()))?;
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

fn snapshot_path(cli: &Cli, settings: &Settings) -> CliResult<PathBuf> {
    cli.file
        .clone()
        .or_else(|| settings.snapshot.clone())
        .ok_or_else(|| {
            CliError::Usage("no snapshot file: pass --file or set `snapshot` in config".into())
        })
}

#[instrument(skip(cli))]
fn cmd_show(cli: &Cli) -> CliResult<()> {
    let c = container(cli)?;
    let path = snapshot_path(cli, &c.settings)?;
    let snapshot = c.tree.load(&path)?;
    let forest = c.tree.forest(&snapshot);

    println!("{}", forest.to_tree(path.display().to_string()));
    if !forest.detached().is_empty() {
        output::warning(&format!(
            "not reachable from a root: {}",
            join_ids(forest.detached())
        ));
    }
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_move(
    cli: &Cli,
    item: &str,
    before: Option<&str>,
    into: Option<&str>,
    dry_run: bool,
    output_path: Option<&Path>,
) -> CliResult<()> {
    let c = container(cli)?;
    let path = snapshot_path(cli, &c.settings)?;
    let snapshot = c.tree.load(&path)?;

    let item_id = c.tree.resolve(&snapshot, item)?;
    let request = match (before, into) {
        (Some(sibling), _) => MoveRequest::Before {
            sibling: c.tree.resolve(&snapshot, sibling)?,
        },
        (None, Some(parent)) => MoveRequest::ToEnd {
            parent: Some(c.tree.resolve(&snapshot, parent)?),
        },
        (None, None) => MoveRequest::to_root_end(),
    };

    let outcome = c.tree.move_node(&snapshot, &item_id, &request);
    if let Some(reason) = &outcome.rejection {
        return Err(CliError::Rejected(reason.to_string()));
    }

    output::header(&format!("move {item_id} {request}"));
    if outcome.changes.is_empty() {
        output::detail("nothing changed");
    }
    for node in &outcome.changes {
        let previous = find_by_id(&snapshot.nodes, Some(&node.id));
        output::detail(&describe_change(previous, node));
    }

    if dry_run {
        output::warning("dry run, snapshot not written");
        return Ok(());
    }
    let target = output_path.unwrap_or(path.as_path());
    c.tree.save(target, &Snapshot::new(outcome.nodes))?;
    output::action("Wrote", &target.display());
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_validate(cli: &Cli) -> CliResult<()> {
    let c = container(cli)?;
    let path = snapshot_path(cli, &c.settings)?;
    let snapshot = c.tree.read(&path)?;
    let report = c.tree.validate(&snapshot)?;

    output::success(&format!("{} nodes, no duplicate ids", snapshot.nodes.len()));
    for parent in &report.gaps {
        output::warning(&format!(
            "positions below {} are not numbered 1..N",
            describe_parent(parent.as_ref())
        ));
    }
    if !report.detached.is_empty() {
        output::warning(&format!(
            "not reachable from a root: {}",
            join_ids(&report.detached)
        ));
    }
    if report.is_clean() {
        output::success("sibling positions contiguous, every node reachable");
    }
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let c = container(cli)?;
            output::info(&c.settings.to_toml()?);
        }
        ConfigCommands::Init { global } => {
            let c = container(cli)?;
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".into())
                })?
            } else {
                local_config_path(&local_dir(cli)?)
            };
            if c.fs.exists(&path) {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                c.fs.create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            c.fs.write(&path, &Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(global) => output::info(&format!("global: {}", describe_path(&global))),
                None => output::info("global: <unavailable>"),
            }
            let local = local_config_path(&local_dir(cli)?);
            output::info(&format!("local:  {}", describe_path(&local)));
        }
    }
    Ok(())
}

fn describe_path(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found)", path.display())
    }
}

fn describe_parent(parent: Option<&NodeId>) -> String {
    match parent {
        Some(id) => id.to_string(),
        None => "root".to_string(),
    }
}

fn describe_position(position: Option<u32>) -> String {
    position.map_or_else(|| "-".to_string(), |p| p.to_string())
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One line per changed node: `id: position a -> b, parent x -> y`.
fn describe_change(previous: Option<&Node>, node: &Node) -> String {
    let Some(prev) = previous else {
        return format!(
            "{}: new at position {} below {}",
            node.id,
            describe_position(node.position),
            describe_parent(node.parent_id.as_ref())
        );
    };

    let mut parts = Vec::new();
    if prev.position != node.position {
        parts.push(format!(
            "position {} -> {}",
            describe_position(prev.position),
            describe_position(node.position)
        ));
    }
    if prev.parent_id != node.parent_id {
        parts.push(format!(
            "parent {} -> {}",
            describe_parent(prev.parent_id.as_ref()),
            describe_parent(node.parent_id.as_ref())
        ));
    }
    format!("{}: {}", node.id, parts.join(", "))
}
