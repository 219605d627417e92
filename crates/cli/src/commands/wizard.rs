//! Line-oriented terminal host for the instant quote wizard.
//!
//! The host renders the current step, reads one command per line, and maps it
//! onto wizard mutations. It owns presentation only; every rule about steps,
//! pricing and validation lives in the wizard.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use quickquote_core::config::{AppConfig, LoadOptions, SinkKind};
use quickquote_core::{
    ApplicationError, DomainError, JsonLineSubmissionSink, QuoteSubmission, QuoteWizard, Scope,
    SubmissionSink, TracingAuditSink, TracingSubmissionSink, WizardStep,
};
use rust_decimal::Decimal;

use super::CommandResult;

const HELP: &str = "commands:
  select <id|n>   choose a service (step 1) or infrastructure tier
  toggle <id|n>   add or remove a technology
  scope <1-6>     set the project scope bucket
  clear           drop the infrastructure tier
  name <text>     set your name
  email <text>    set your email address
  company <text>  set your company
  next | back     move between steps
  submit          send the quote request from the contact step
  help | quit";

#[derive(Clone, Copy, Debug, Default)]
pub struct HostOptions {
    pub reduced_motion: bool,
}

#[derive(Debug)]
pub enum SessionOutcome {
    Submitted(QuoteSubmission),
    Cancelled,
}

enum Reply {
    Render,
    Help,
    Quit,
    Rejected(Vec<String>),
    Submitted(QuoteSubmission),
}

pub fn run<R, W>(options: &LoadOptions, input: R, output: &mut W) -> CommandResult
where
    R: BufRead,
    W: Write,
{
    match run_with_config(options, input, output) {
        Ok(SessionOutcome::Submitted(submission)) => CommandResult::success(
            "wizard",
            format!(
                "quote request {} submitted with estimate {}",
                submission.submission_id.0, submission.estimated_price
            ),
        ),
        Ok(SessionOutcome::Cancelled) => {
            CommandResult::success("wizard", "wizard closed without submitting")
        }
        Err(error) => match error.downcast::<ApplicationError>() {
            Ok(error) => CommandResult::from_application_error("wizard", error),
            Err(error) => CommandResult::failure("wizard", "io", format!("{error:#}"), 5),
        },
    }
}

/// True when submissions go to stdout as JSON lines. The host then keeps its
/// screens and the closing envelope off stdout so the payload stream stays
/// machine-readable.
pub fn payload_on_stdout(options: &LoadOptions) -> bool {
    AppConfig::load(options.clone())
        .map(|config| config.submission.sink == SinkKind::Stdout)
        .unwrap_or(false)
}

fn run_with_config<R, W>(
    options: &LoadOptions,
    input: R,
    output: &mut W,
) -> anyhow::Result<SessionOutcome>
where
    R: BufRead,
    W: Write,
{
    let config = AppConfig::load(options.clone())
        .map_err(ApplicationError::from)
        .context("failed to load configuration")?;
    let catalog = config
        .load_catalog()
        .map_err(ApplicationError::from)
        .context("failed to load catalog")?;
    let host = HostOptions { reduced_motion: config.host.reduced_motion };
    let mut wizard =
        QuoteWizard::new(Arc::new(catalog)).with_audit_sink(Arc::new(TracingAuditSink));

    let outcome = match config.submission.sink {
        SinkKind::Log => run_session(&mut wizard, &TracingSubmissionSink, host, input, output),
        SinkKind::Stdout => {
            let sink = JsonLineSubmissionSink::new(io::stdout());
            run_session(&mut wizard, &sink, host, input, output)
        }
    };
    outcome.context("wizard terminal I/O failed")
}

/// Drives one wizard session until submission, `quit`, or end of input.
pub fn run_session<R, W, S>(
    wizard: &mut QuoteWizard,
    sink: &S,
    host: HostOptions,
    input: R,
    output: &mut W,
) -> io::Result<SessionOutcome>
where
    R: BufRead,
    W: Write,
    S: SubmissionSink + ?Sized,
{
    let mut renderer = Renderer { host, last_price: None };
    renderer.render(wizard, output)?;

    for line in input.lines() {
        let line = line?;
        let command = line.trim();
        if command.is_empty() {
            continue;
        }

        match handle_command(wizard, sink, command) {
            Reply::Render => renderer.render(wizard, output)?,
            Reply::Help => writeln!(output, "{HELP}")?,
            Reply::Rejected(problems) => {
                for problem in problems {
                    writeln!(output, "! {problem}")?;
                }
            }
            Reply::Quit => {
                writeln!(output, "Wizard closed.")?;
                return Ok(SessionOutcome::Cancelled);
            }
            Reply::Submitted(submission) => {
                render_confirmation(&submission, output)?;
                return Ok(SessionOutcome::Submitted(submission));
            }
        }
        output.flush()?;
    }

    writeln!(output, "Input closed; quote discarded.")?;
    Ok(SessionOutcome::Cancelled)
}

fn handle_command<S>(wizard: &mut QuoteWizard, sink: &S, command: &str) -> Reply
where
    S: SubmissionSink + ?Sized,
{
    let (verb, argument) = command
        .split_once(char::is_whitespace)
        .map(|(verb, rest)| (verb, rest.trim()))
        .unwrap_or((command, ""));
    let verb = verb.to_ascii_lowercase();

    match (verb.as_str(), wizard.current_step()) {
        ("help" | "?", _) => Reply::Help,
        ("quit" | "exit" | "cancel", _) => Reply::Quit,
        ("next", _) => settle(wizard.next()),
        ("back", _) => settle(wizard.back()),
        ("submit", _) => match wizard.submit(sink) {
            Ok(submission) => Reply::Submitted(submission),
            Err(error) => Reply::Rejected(describe(&error)),
        },
        ("select", WizardStep::ServiceSelect) => {
            let ids = wizard.catalog().services().iter().map(|entry| entry.id.as_str());
            match resolve_option(argument, ids) {
                Some(id) => settle(wizard.select_service(id)),
                None => usage("select <service id or number>"),
            }
        }
        ("select", WizardStep::InfraSelect) => {
            let ids = wizard.catalog().infra_tiers().iter().map(|entry| entry.id.as_str());
            match resolve_option(argument, ids) {
                Some(id) => settle(wizard.select_infra(id)),
                None => usage("select <tier id or number>"),
            }
        }
        ("clear", WizardStep::InfraSelect) => settle(wizard.clear_infra()),
        ("toggle", WizardStep::TechnologySelect) => {
            let ids = wizard.catalog().technologies().iter().map(|entry| entry.id.as_str());
            match resolve_option(argument, ids) {
                Some(id) => settle(wizard.toggle_technology(id)),
                None => usage("toggle <technology id or number>"),
            }
        }
        ("scope", WizardStep::ScopeSelect) => match argument.parse::<u8>() {
            Ok(value) => match Scope::new(value) {
                Ok(scope) => settle(wizard.set_scope(scope)),
                Err(error) => Reply::Rejected(vec![error.to_string()]),
            },
            Err(_) => usage("scope <1-6>"),
        },
        ("name", WizardStep::ContactCapture) => settle(wizard.set_name(argument)),
        ("email", WizardStep::ContactCapture) => settle(wizard.set_email(argument)),
        ("company", WizardStep::ContactCapture) => settle(wizard.set_company(argument)),
        (verb, step) => Reply::Rejected(vec![format!(
            "`{verb}` is not available on the {} step; type `help`",
            step.title()
        )]),
    }
}

/// Accepts either a catalog id or its 1-based position in the listing.
fn resolve_option<'a>(argument: &str, ids: impl Iterator<Item = &'a str>) -> Option<String> {
    if argument.is_empty() {
        return None;
    }
    let ids: Vec<&str> = ids.collect();
    let by_position = argument
        .parse::<usize>()
        .ok()
        .and_then(|position| position.checked_sub(1))
        .and_then(|index| ids.get(index).copied());
    Some(by_position.unwrap_or(argument).to_string())
}

fn settle<T>(result: Result<T, DomainError>) -> Reply {
    match result {
        Ok(_) => Reply::Render,
        Err(error) => Reply::Rejected(describe(&error)),
    }
}

fn usage(text: &str) -> Reply {
    Reply::Rejected(vec![format!("usage: {text}")])
}

fn describe(error: &DomainError) -> Vec<String> {
    let violations = error.field_violations();
    if violations.is_empty() {
        return vec![error.to_string()];
    }
    violations.iter().map(ToString::to_string).collect()
}

struct Renderer {
    host: HostOptions,
    last_price: Option<Decimal>,
}

impl Renderer {
    fn render<W: Write>(&mut self, wizard: &QuoteWizard, output: &mut W) -> io::Result<()> {
        let step = wizard.current_step();
        let (number, total) = wizard.progress();

        writeln!(output)?;
        if self.host.reduced_motion {
            writeln!(output, "Step {number} of {total}: {}", step.title())?;
        } else {
            let filled = "#".repeat(number);
            let empty = "-".repeat(total.saturating_sub(number));
            writeln!(output, "[{filled}{empty}] Step {number} of {total}: {}", step.title())?;
        }

        render_options(wizard, output)?;
        self.render_estimate(wizard.estimated_price(), output)?;
        write!(output, "> ")?;
        output.flush()
    }

    fn render_estimate<W: Write>(
        &mut self,
        price: Option<Decimal>,
        output: &mut W,
    ) -> io::Result<()> {
        let Some(price) = price else {
            self.last_price = None;
            return writeln!(output, "Estimated price: choose a service to see an estimate");
        };

        let trend = match self.last_price {
            Some(previous) if !self.host.reduced_motion && previous != price => {
                let delta = price - previous;
                if delta.is_sign_positive() {
                    format!("  (up {delta})")
                } else {
                    format!("  (down {})", delta.abs())
                }
            }
            _ => String::new(),
        };
        self.last_price = Some(price);
        writeln!(output, "Estimated price: {price}{trend}")
    }
}

fn render_options<W: Write>(wizard: &QuoteWizard, output: &mut W) -> io::Result<()> {
    let catalog = wizard.catalog();
    let draft = wizard.draft();

    match wizard.current_step() {
        WizardStep::ServiceSelect => {
            for (position, entry) in catalog.services().iter().enumerate() {
                let marker = if draft.service.as_ref() == Some(&entry.id) { "*" } else { " " };
                writeln!(
                    output,
                    "  ({marker}) {}. {} [{}] from {}",
                    position + 1,
                    entry.label,
                    entry.id,
                    entry.base_price
                )?;
            }
        }
        WizardStep::TechnologySelect => {
            for (position, entry) in catalog.technologies().iter().enumerate() {
                let marker = if draft.technologies.contains(&entry.id) { "x" } else { " " };
                writeln!(
                    output,
                    "  [{marker}] {}. {} [{}] +{}",
                    position + 1,
                    entry.label,
                    entry.id,
                    entry.add_price
                )?;
            }
        }
        WizardStep::ScopeSelect => {
            for (index, label) in catalog.scope_labels().iter().enumerate() {
                let marker = if draft.scope.index() == index { "*" } else { " " };
                writeln!(output, "  ({marker}) {}. {label}", index + 1)?;
            }
        }
        WizardStep::InfraSelect => {
            for (position, entry) in catalog.infra_tiers().iter().enumerate() {
                let marker = if draft.infra.as_ref() == Some(&entry.id) { "*" } else { " " };
                writeln!(
                    output,
                    "  ({marker}) {}. {} [{}] +{}",
                    position + 1,
                    entry.label,
                    entry.id,
                    entry.add_price
                )?;
            }
        }
        WizardStep::ContactCapture => {
            writeln!(output, "  name:    {}", placeholder(&draft.name))?;
            writeln!(output, "  email:   {}", placeholder(&draft.email))?;
            writeln!(output, "  company: {}", placeholder(&draft.company))?;
        }
        WizardStep::Submitted => {}
    }

    Ok(())
}

fn placeholder(value: &str) -> &str {
    if value.trim().is_empty() {
        "<required>"
    } else {
        value
    }
}

fn render_confirmation<W: Write>(submission: &QuoteSubmission, output: &mut W) -> io::Result<()> {
    writeln!(output)?;
    writeln!(
        output,
        "Thanks, {}! Your quote request for an estimated {} is on its way (reference {}).",
        submission.draft.name, submission.estimated_price, submission.submission_id.0
    )?;
    output.flush()
}
