//! Verb routing and privilege enforcement.
//!
//! Commands are explicit descriptors `{verb, required privileges, handler}`
//! registered into a table at startup; registering the same verb twice is a
//! fatal configuration error. Dispatch resolves the verb, enforces the
//! privilege subset rule, invokes the handler, and translates the error
//! taxonomy into player-facing text. Nothing a handler raises escapes one
//! command's handling.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use log::{error, warn};

use crate::config::Config;
use crate::logutil::escape_log;
use crate::scheduler::Scheduler;
use crate::world::errors::WorldError;
use crate::world::notify;
use crate::world::registry::World;
use crate::world::types::LivingId;

/// Everything a handler may touch, threaded explicitly -- there is no
/// ambient "current actor" state anywhere.
pub struct CommandContext<'a> {
    pub world: &'a mut World,
    pub scheduler: &'a mut Scheduler,
    pub config: &'a Config,
    /// Verb summaries for the `help` handler.
    pub help: &'a [HelpEntry],
    /// Set by the `quit` handler; the engine ends the session afterwards.
    pub quit: bool,
    /// Set by the `save` handler; the engine snapshots after the command.
    pub save_requested: bool,
}

pub type Handler = fn(&mut CommandContext<'_>, LivingId, &str, &str) -> Result<(), WorldError>;

/// A registered verb.
#[derive(Clone)]
pub struct CommandSpec {
    pub verb: &'static str,
    /// Privileges that must all be held by the actor.
    pub required_privileges: &'static [&'static str],
    pub help: &'static str,
    pub handler: Handler,
}

/// Summary row handed to the `help` handler.
#[derive(Debug, Clone)]
pub struct HelpEntry {
    pub verb: &'static str,
    pub required_privileges: &'static [&'static str],
    pub help: &'static str,
}

pub enum DispatchOutcome {
    /// The command ran (or was refused) and the session continues.
    Handled,
    /// No such verb; the engine may still try a direction shortcut.
    UnknownVerb,
    /// The story-completion signal fired; the engine takes over.
    StoryComplete,
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, CommandSpec>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the standard registry: player verbs plus the wizard set.
    pub fn standard() -> Result<Self> {
        let mut registry = Self::new();
        for spec in super::commands::specs() {
            registry.register(spec)?;
        }
        for spec in super::wizard::specs() {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    /// Register one verb. A duplicate is a configuration bug, caught at
    /// load time.
    pub fn register(&mut self, spec: CommandSpec) -> Result<()> {
        if self.commands.contains_key(spec.verb) {
            bail!("command defined more than once: {}", spec.verb);
        }
        self.commands.insert(spec.verb, spec);
        Ok(())
    }

    pub fn contains(&self, verb: &str) -> bool {
        self.commands.contains_key(verb)
    }

    /// Help rows for every registered verb, in alphabetical order.
    pub fn help_entries(&self) -> Vec<HelpEntry> {
        self.commands
            .values()
            .map(|spec| HelpEntry {
                verb: spec.verb,
                required_privileges: spec.required_privileges,
                help: spec.help,
            })
            .collect()
    }

    /// Route one structured action request `{verb, rest}` for `actor`.
    pub fn dispatch(
        &self,
        ctx: &mut CommandContext<'_>,
        actor: LivingId,
        verb: &str,
        rest: &str,
    ) -> DispatchOutcome {
        let Some(spec) = self.commands.get(verb) else {
            return DispatchOutcome::UnknownVerb;
        };

        let allowed = ctx
            .world
            .living(actor)
            .map(|l| {
                spec.required_privileges
                    .iter()
                    .all(|p| l.privileges.contains(*p))
            })
            .unwrap_or(false);
        if !allowed {
            // Privilege failure: audit-logged, reported as a refusal, state
            // untouched.
            let violation =
                WorldError::SecurityViolation(format!("verb '{verb}' requires privilege"));
            warn!("{actor} denied verb '{}': {violation}", escape_log(verb));
            notify::tell_living(ctx.world, actor, "You're not allowed to do that.");
            return DispatchOutcome::Handled;
        }

        match (spec.handler)(ctx, actor, verb, rest) {
            Ok(()) => DispatchOutcome::Handled,
            Err(WorldError::Parse(msg)) | Err(WorldError::ActionRefused(msg)) => {
                notify::tell_living(ctx.world, actor, &msg);
                DispatchOutcome::Handled
            }
            Err(violation @ WorldError::SecurityViolation(_)) => {
                warn!("{actor} verb '{}': {violation}", escape_log(verb));
                notify::tell_living(ctx.world, actor, "You're not allowed to do that.");
                DispatchOutcome::Handled
            }
            Err(WorldError::StoryComplete) => DispatchOutcome::StoryComplete,
            Err(err @ (WorldError::NotFound(_) | WorldError::Snapshot(_))) => {
                error!(
                    "internal error handling verb '{}' for {actor}: {err}",
                    escape_log(verb)
                );
                notify::tell_living(ctx.world, actor, "Something went wrong. It wasn't you.");
                DispatchOutcome::Handled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(
        _ctx: &mut CommandContext<'_>,
        _actor: LivingId,
        _verb: &str,
        _rest: &str,
    ) -> Result<(), WorldError> {
        Ok(())
    }

    #[test]
    fn duplicate_verb_is_fatal() {
        let spec = CommandSpec {
            verb: "frob",
            required_privileges: &[],
            help: "frob it",
            handler: noop,
        };
        let mut registry = CommandRegistry::new();
        registry.register(spec.clone()).expect("first registration");
        assert!(registry.register(spec).is_err());
    }

    #[test]
    fn standard_registry_builds() {
        let registry = CommandRegistry::standard().expect("no duplicate verbs");
        assert!(registry.contains("look"));
        assert!(registry.contains("clone"));
    }
}
