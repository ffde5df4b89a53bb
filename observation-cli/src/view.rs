//! Terminal rendering of the observation form.

use inquire::{Confirm, CustomUserError, InquireError, Select, Text, validator::Validation};
use observation_core::{
    CancellationToken, DraftMode, Field, ObservationForm, ObservationsApi, SubmitStatus,
    form::{LISTING_PATH, RecordingNavigator},
};
use std::fmt;
use tracing::debug;

use crate::cli;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Submit,
    Cancel,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Submit => f.write_str("Submit"),
            Action::Cancel => f.write_str("Cancel"),
        }
    }
}

/// Runs one form from load to navigation, then renders where it navigated.
pub async fn run_form(api: &ObservationsApi, mode: DraftMode) -> anyhow::Result<()> {
    let mut form = ObservationForm::new(api.clone(), RecordingNavigator::default(), mode);

    // Ctrl-C while a request is in flight tears the form down and stops the
    // listing shown after it.
    let scope = form.scope();
    let interrupted = CancellationToken::new();
    let listener = tokio::spawn({
        let interrupted = interrupted.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                scope.cancel();
                interrupted.cancel();
            }
        }
    });

    let result = match drive(&mut form).await {
        Ok(()) if form.navigator().last() == Some(LISTING_PATH) => {
            cli::list(api, &interrupted).await
        }
        other => other,
    };
    listener.abort();
    result
}

async fn drive(form: &mut ObservationForm<RecordingNavigator>) -> anyhow::Result<()> {
    form.load().await;
    if let Some(message) = form.error_message() {
        print_banner(&message);
        return Ok(());
    }

    loop {
        if form.is_torn_down() {
            debug!("form torn down, leaving without navigation");
            return Ok(());
        }

        if !fill_fields(form)? {
            form.cancel();
            return Ok(());
        }

        let action = answered(Select::new("Save?", vec![Action::Submit, Action::Cancel]).prompt())?;
        if action != Some(Action::Submit) {
            form.cancel();
            return Ok(());
        }

        match form.submit().await {
            SubmitStatus::Saved(saved) => {
                match saved.observation_id {
                    Some(id) => println!("Saved observation {id}."),
                    None => println!("Saved observation."),
                }
                return Ok(());
            }
            SubmitStatus::Rejected => {
                if let Some(message) = form.error_message() {
                    print_banner(&message);
                }
                let again = Confirm::new("Edit and submit again?").with_default(true);
                let retry = answered(again.prompt())?;
                if retry != Some(true) {
                    form.cancel();
                    return Ok(());
                }
            }
            SubmitStatus::Cancelled => {
                eprintln!("Request cancelled.");
                return Ok(());
            }
        }
    }
}

/// Prompts every field, prefilled from the draft. `false` if the user backed out.
fn fill_fields(form: &mut ObservationForm<RecordingNavigator>) -> anyhow::Result<bool> {
    for &field in Field::all() {
        let current = form.draft().get(field).to_string();
        match prompt_field(field, &current)? {
            Some(value) => form.change_field(field, value),
            None => return Ok(false),
        }
    }
    Ok(true)
}

fn prompt_field(field: Field, current: &str) -> anyhow::Result<Option<String>> {
    let options = field.options();

    if options.is_empty() {
        let hint = field.hint();
        let mut prompt = Text::new(field.label()).with_initial_value(current).with_validator(
            move |input: &str| -> Result<Validation, CustomUserError> {
                Ok(match field.check(input) {
                    Ok(()) => Validation::Valid,
                    Err(violation) => Validation::Invalid(format!("{field} {violation}").into()),
                })
            },
        );
        if let Some(hint) = hint.as_deref() {
            prompt = prompt.with_help_message(hint);
        }
        return answered(prompt.prompt());
    }

    let cursor = options.iter().position(|opt| opt.value == current).unwrap_or(0);
    let select = Select::new(field.label(), options).with_starting_cursor(cursor);
    let choice = answered(select.prompt())?;
    Ok(choice.map(|opt| opt.value))
}

/// Esc and Ctrl-C at a prompt mean "back out", not failure.
fn answered<T>(result: Result<T, InquireError>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn print_banner(message: &str) {
    eprintln!("Error: {message}");
}
