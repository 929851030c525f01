use serde_json::json;

use crate::demo::{demo_handlers, register_demo_keywords};
use crate::dsl::ast::CompiledCommand;
use crate::dsl::{compile_command, script, skipped_words};
use crate::engine::{self, EventLoop, Outcome, SubscriptionId};
use crate::error::AppError;
use crate::model::Value;
use crate::registry::catalog::{load_catalog, read_catalog};
use crate::registry::{BindTarget, Registry, SharedRegistry};
use crate::settings::Settings;
use crate::state::StageHandle;

/// What one command of a script did.
#[derive(Debug)]
pub enum CommandOutcome {
    /// No keyword resolved; nothing ran.
    Empty,
    Ran(Option<Value>),
    Bound(SubscriptionId),
    Failed(AppError),
}

#[derive(Debug)]
pub struct CommandReport {
    pub command: String,
    /// Words the compiler skipped.
    pub skipped: Vec<String>,
    pub outcome: CommandOutcome,
}

impl CommandReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, CommandOutcome::Failed(_))
    }

    pub fn to_json(&self) -> serde_json::Value {
        let outcome = match &self.outcome {
            CommandOutcome::Empty => json!({ "status": "empty" }),
            CommandOutcome::Ran(value) => json!({ "status": "ran", "value": value }),
            CommandOutcome::Bound(id) => json!({ "status": "bound", "subscription": id }),
            CommandOutcome::Failed(error) => json!({ "status": "failed", "error": error.info() }),
        };
        json!({
            "command": self.command,
            "skipped": self.skipped,
            "outcome": outcome,
        })
    }
}

/// A registry, the settings that drive tokenizing, and the host that holds
/// event bindings across commands.
pub struct Session {
    registry: SharedRegistry,
    settings: Settings,
    host: EventLoop,
}

impl Session {
    pub fn new(registry: SharedRegistry, settings: Settings) -> Self {
        Self {
            registry,
            settings,
            host: EventLoop::new(),
        }
    }

    /// Session over the demo vocabulary drawing onto `stage`, plus the
    /// catalog named in `settings`, if any.
    pub fn with_demo(settings: Settings, stage: &StageHandle) -> Result<Self, AppError> {
        let mut registry = Registry::new();
        register_demo_keywords(&mut registry, stage)?;
        if let Some(path) = &settings.catalog {
            let catalog = read_catalog(path)?;
            load_catalog(&mut registry, &catalog, &demo_handlers(stage))?;
        }
        Ok(Self::new(registry.into_shared(), settings))
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn host(&self) -> &EventLoop {
        &self.host
    }

    pub fn compile(&self, command: &str) -> Result<CompiledCommand, AppError> {
        let registry = self.registry.read();
        Ok(compile_command(&registry, command, &self.settings)?)
    }

    /// Compile and execute one command.
    pub fn run_command(&mut self, command: &str) -> Result<(CompiledCommand, Option<Outcome>), AppError> {
        let compiled = self.compile(command)?;
        let outcome = match &compiled.root {
            Some(root) => Some(engine::execute(root, &mut self.host)?),
            None => None,
        };
        Ok((compiled, outcome))
    }

    /// Run every command of `script` in order. A failing command is
    /// reported and the rest still run.
    pub fn run_script(&mut self, script: &str) -> Vec<CommandReport> {
        script::split_commands(script, &self.settings.command_separator)
            .into_iter()
            .map(|command| self.report(command))
            .collect()
    }

    fn report(&mut self, command: String) -> CommandReport {
        match self.run_command(&command) {
            Ok((compiled, outcome)) => {
                let outcome = match outcome {
                    None => CommandOutcome::Empty,
                    Some(Outcome::Ran(value)) => CommandOutcome::Ran(value),
                    Some(Outcome::Bound(id)) => CommandOutcome::Bound(id),
                };
                tracing::info!(%command, "command done");
                CommandReport {
                    command,
                    skipped: compiled.skipped,
                    outcome,
                }
            }
            Err(error) => {
                tracing::warn!(%command, %error, "command failed");
                let skipped = skipped_words(&self.registry.read(), &command, &self.settings);
                CommandReport {
                    command,
                    skipped,
                    outcome: CommandOutcome::Failed(error),
                }
            }
        }
    }

    /// Fire `signal` on `target`; returns how many bindings ran.
    pub fn fire(&mut self, target: &BindTarget, signal: &str) -> Result<usize, AppError> {
        Ok(self.host.fire(target, signal)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::dsl::error::CompileError;
    use crate::model::KeywordType;

    fn session() -> (Session, StageHandle) {
        let stage = StageHandle::new();
        let session = Session::with_demo(Settings::default(), &stage).unwrap();
        (session, stage)
    }

    #[test]
    fn failing_command_does_not_stop_the_script() {
        let (mut session, stage) = session();
        let reports = session.run_script("Create. Create a circle. Say hello.");
        assert_eq!(reports.len(), 3);
        assert!(matches!(
            &reports[0].outcome,
            CommandOutcome::Failed(AppError::Compile(_))
        ));
        assert!(matches!(
            &reports[1].outcome,
            CommandOutcome::Ran(Some(Value::Word { ty: KeywordType::Shape, .. }))
        ));
        assert!(reports[2].is_failed());
        assert_eq!(stage.snapshot().drawings.len(), 1);
    }

    #[test]
    fn events_bind_across_commands() {
        let (mut session, stage) = session();
        let reports =
            session.run_script("When the document loads, create a circle. Click the banner to move it up.");
        assert!(matches!(reports[0].outcome, CommandOutcome::Bound(_)));
        assert!(matches!(reports[1].outcome, CommandOutcome::Bound(_)));
        assert!(stage.snapshot().drawings.is_empty());

        assert_eq!(session.fire(&BindTarget::host("document"), "load").unwrap(), 1);
        assert_eq!(session.fire(&BindTarget::element("banner"), "click").unwrap(), 1);
        assert_eq!(stage.snapshot().drawings[0].offset, (0, -1));
    }

    #[test]
    fn failed_command_still_reports_skipped_words() {
        let (mut session, _) = session();
        let reports = session.run_script("Pleese craete a circle.");
        assert!(matches!(
            &reports[0].outcome,
            CommandOutcome::Failed(AppError::Compile(CompileError::UnexpectedKeyword { .. }))
        ));
        assert_eq!(reports[0].skipped, vec!["pleese", "craete", "a"]);
        assert_eq!(reports[0].to_json()["skipped"][1], "craete");

        let reports = session.run_script("Add the sidebar.");
        assert!(matches!(&reports[0].outcome, CommandOutcome::Failed(AppError::Exec(_))));
        assert_eq!(reports[0].skipped, vec!["the"]);
    }

    #[test]
    fn nested_event_binds_once_per_outer_fire() {
        let (mut session, stage) = session();
        session.run_script("When the document loads, click the banner to create a circle.");
        let document = BindTarget::host("document");
        assert_eq!(session.fire(&document, "load").unwrap(), 1);
        assert_eq!(session.fire(&document, "load").unwrap(), 1);
        assert_eq!(session.host().len(), 3);

        assert_eq!(session.fire(&BindTarget::element("banner"), "click").unwrap(), 2);
        assert_eq!(stage.snapshot().drawings.len(), 2);
    }

    #[test]
    fn empty_command_reports_skipped_words() {
        let (mut session, _) = session();
        let reports = session.run_script("Hello there.");
        assert!(matches!(reports[0].outcome, CommandOutcome::Empty));
        assert_eq!(reports[0].skipped, vec!["hello", "there"]);
        assert_eq!(reports[0].to_json()["outcome"]["status"], "empty");
    }

    #[test]
    fn failed_report_serializes_error_code() {
        let (mut session, _) = session();
        let reports = session.run_script("circle");
        let json = reports[0].to_json();
        assert_eq!(json["outcome"]["status"], "failed");
        assert_eq!(json["outcome"]["error"]["code"], "unexpected_keyword");
    }
}
