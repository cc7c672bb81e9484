//! Argument parsing and execution for the `statledger` admin CLI.

use std::sync::Arc;

use statledger_core::{EntityId, MapResolver, StatNumber, StatValue, StatsEngine};


/// A parsed CLI command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Raw on-disk value of one stat.
    Get { entity: EntityId, key: String },
    /// Immediate write of one stat, bypassing the cache.
    Set { section: String, entity: EntityId, key: String, value: StatValue },
    /// Cached increment followed by a flush.
    Add { section: String, entity: EntityId, key: String, delta: StatNumber },
    /// Every stat stored for an entity, as JSON.
    Show { entity: EntityId },
    /// The entity's points.
    Points { entity: EntityId },
    Remove { section: String, entity: EntityId },
    FindSection { entity: EntityId },
    FindName { name: String },
    /// Remove the record and release the entity's section membership.
    Clear { entity: EntityId },
    Help,
}


/// Parse CLI arguments (without the program name) into a [`Command`].
pub fn parse_args(args: &[&str]) -> Result<Command, String> {
    if args.is_empty() {
        return Err("No command specified. Run 'statledger help' for usage.".into());
    }

    match args[0] {
        "get" => {
            expect_len(args, 3, "statledger get <entity> <key>")?;
            Ok(Command::Get {
                entity: parse_entity(args[1])?,
                key: args[2].to_string(),
            })
        }
        "set" => {
            expect_len(args, 5, "statledger set <section> <entity> <key> <value>")?;
            Ok(Command::Set {
                section: args[1].to_string(),
                entity: parse_entity(args[2])?,
                key: args[3].to_string(),
                value: parse_value(args[4]),
            })
        }
        "add" => {
            expect_len(args, 5, "statledger add <section> <entity> <key> <delta>")?;
            Ok(Command::Add {
                section: args[1].to_string(),
                entity: parse_entity(args[2])?,
                key: args[3].to_string(),
                delta: parse_delta(args[4])?,
            })
        }
        "show" => {
            expect_len(args, 2, "statledger show <entity>")?;
            Ok(Command::Show { entity: parse_entity(args[1])? })
        }
        "points" => {
            expect_len(args, 2, "statledger points <entity>")?;
            Ok(Command::Points { entity: parse_entity(args[1])? })
        }
        "remove" => {
            expect_len(args, 3, "statledger remove <section> <entity>")?;
            Ok(Command::Remove {
                section: args[1].to_string(),
                entity: parse_entity(args[2])?,
            })
        }
        "find-section" => {
            expect_len(args, 2, "statledger find-section <entity>")?;
            Ok(Command::FindSection { entity: parse_entity(args[1])? })
        }
        "find-name" => {
            if args.len() < 2 {
                return Err("Usage: statledger find-name <name>".into());
            }
            Ok(Command::FindName { name: args[1..].join(" ") })
        }
        "clear" => {
            expect_len(args, 2, "statledger clear <entity>")?;
            Ok(Command::Clear { entity: parse_entity(args[1])? })
        }
        "help" => Ok(Command::Help),
        other => Err(format!("Unknown command: '{}'", other)),
    }
}


/// Run a command against an engine. The resolver is filled in from the
/// document (or from the command's explicit section) before the engine
/// needs it.
pub fn execute(engine: &StatsEngine, resolver: &Arc<MapResolver>, cmd: Command) -> Result<String, String> {
    match cmd {
        Command::Get { entity, key } => {
            resolve_from_document(engine, resolver, &entity)?;
            match engine.get_stat(&entity, &key) {
                Some(value) => Ok(value.to_string()),
                None => Err(format!("no stat '{}' for {}", key, entity)),
            }
        }
        Command::Set { section, entity, key, value } => {
            resolver.assign(entity, &section);
            if engine.set_stat_raw(entity, &key, value) {
                Ok(String::new())
            } else {
                Err("failed to save stats document".into())
            }
        }
        Command::Add { section, entity, key, delta } => {
            resolver.assign(entity, &section);
            let result = engine.increase_stat(entity, &key, delta);
            let report = engine.flush_pending();
            if report.persisted {
                Ok(result.to_string())
            } else {
                Err("failed to save stats document".into())
            }
        }
        Command::Show { entity } => {
            let section = resolve_from_document(engine, resolver, &entity)?;
            let record = engine.entity_record(&section, &entity);
            serde_json::to_string_pretty(&record).map_err(|e| format!("cannot render record: {}", e))
        }
        Command::Points { entity } => {
            resolve_from_document(engine, resolver, &entity)?;
            match engine.points_summary(&entity) {
                Some(points) => Ok(format!("{} pts", points)),
                None => Err(format!("{} is not assigned to a section", entity)),
            }
        }
        Command::Remove { section, entity } => {
            if engine.remove_entry(&section, &entity) {
                Ok(format!("removed {} from {}", entity, section))
            } else {
                Err(format!("no entry for {} in {}", entity, section))
            }
        }
        Command::FindSection { entity } => engine
            .find_section_containing(&entity)
            .ok_or_else(|| format!("{} not found in any section", entity)),
        Command::FindName { name } => engine
            .find_entity_by_display_name(&name)
            .map(|id| id.to_string())
            .ok_or_else(|| format!("no entity named '{}'", name)),
        Command::Clear { entity } => {
            resolve_from_document(engine, resolver, &entity)?;
            let outcome = engine.clear_fully(&entity);
            if outcome.is_success() {
                Ok(outcome.to_string())
            } else {
                Err(outcome.to_string())
            }
        }
        Command::Help => Ok(usage().to_string()),
    }
}


pub fn usage() -> &'static str {
    "\
Usage: statledger <command>

  get <entity> <key>                       print a stored stat
  set <section> <entity> <key> <value>     write a stat immediately
  add <section> <entity> <key> <delta>     increment a stat and flush
  show <entity>                            print all stats as JSON
  points <entity>                          print the entity's points
  remove <section> <entity>                delete an entity's record
  find-section <entity>                    print the section holding an entity
  find-name <name>                         print the entity with a display name
  clear <entity>                           remove every stat for an entity
  help                                     show this message"
}


// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn expect_len(args: &[&str], len: usize, usage: &str) -> Result<(), String> {
    if args.len() == len {
        Ok(())
    } else {
        Err(format!("Usage: {}", usage))
    }
}

fn parse_entity(s: &str) -> Result<EntityId, String> {
    s.parse().map_err(|e| format!("invalid entity id '{}': {}", s, e))
}

/// Integers stay integers, then floats, anything else is text.
fn parse_value(s: &str) -> StatValue {
    if let Ok(i) = s.parse::<i64>() {
        StatValue::Integer(i)
    } else if let Ok(f) = s.parse::<f64>() {
        StatValue::Float(f)
    } else {
        StatValue::Text(s.to_string())
    }
}

fn parse_delta(s: &str) -> Result<StatNumber, String> {
    match parse_value(s) {
        StatValue::Integer(i) => Ok(StatNumber::Integer(i)),
        StatValue::Float(f) => Ok(StatNumber::Float(f)),
        StatValue::Text(_) => Err(format!("delta must be a number, got '{}'", s)),
    }
}

fn resolve_from_document(
    engine: &StatsEngine,
    resolver: &MapResolver,
    entity: &EntityId,
) -> Result<String, String> {
    let section = engine
        .find_section_containing(entity)
        .ok_or_else(|| format!("{} not found in any section", entity))?;
    resolver.assign(*entity, &section);
    Ok(section)
}
