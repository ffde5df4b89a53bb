//! Controller behind the create/edit observation form.
//!
//! The controller owns the draft, the last surfaced error and a cancellation
//! token scoped to its own lifetime. Views feed it field changes and submit or
//! cancel actions; it talks to the access layer and tells a [`Navigator`]
//! where to go next.

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    api::{ApiError, ObservationsApi, Outcome},
    cancel::CancellationToken,
    model::{Observation, ObservationId},
};

pub mod draft;

pub use draft::{
    Draft, Field, FieldOption, FieldViolation, UnknownField, Violation, apply_field_change,
};

/// Path of the observation listing, where the form goes when it is done.
pub const LISTING_PATH: &str = "/";

/// Opaque "go to this path" capability supplied by the host.
pub trait Navigator {
    fn navigate(&mut self, path: &str);
}

/// Navigator that only remembers where it was sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingNavigator {
    visited: Vec<String>,
}

impl RecordingNavigator {
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    pub fn last(&self) -> Option<&str> {
        self.visited.last().map(String::as_str)
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&mut self, path: &str) {
        self.visited.push(path.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftMode {
    Create,
    Edit(ObservationId),
}

/// Failure shown in the form's error banner.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{}", join_violations(.0))]
    Invalid(Vec<FieldViolation>),
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitStatus {
    /// The service accepted the draft; the form navigated to the listing.
    Saved(Observation),
    /// Validation or the service refused it; see [`ObservationForm::error`].
    Rejected,
    /// The form was torn down before the call resolved.
    Cancelled,
}

pub struct ObservationForm<N> {
    api: ObservationsApi,
    navigator: N,
    mode: DraftMode,
    draft: Draft,
    error: Option<FormError>,
    scope: CancellationToken,
}

impl<N: Navigator> ObservationForm<N> {
    pub fn new(api: ObservationsApi, navigator: N, mode: DraftMode) -> Self {
        Self {
            api,
            navigator,
            mode,
            draft: Draft::default(),
            error: None,
            scope: CancellationToken::new(),
        }
    }

    pub fn mode(&self) -> DraftMode {
        self.mode
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn error(&self) -> Option<&FormError> {
        self.error.as_ref()
    }

    /// Text for the error banner, if one should be shown.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Token tied to this form's lifetime. Cancelling it tears the form down.
    pub fn scope(&self) -> CancellationToken {
        self.scope.clone()
    }

    pub fn is_torn_down(&self) -> bool {
        self.scope.is_cancelled()
    }

    /// Fetches the record being edited into the draft. No-op when creating.
    pub async fn load(&mut self) {
        let DraftMode::Edit(id) = self.mode else {
            return;
        };

        debug!(%id, "loading observation for edit");
        let result = self.api.read_record(id, &self.scope).await;
        if self.is_torn_down() {
            return;
        }

        match result {
            Ok(Outcome::Completed(record)) => self.draft = Draft::from_record(&record),
            Ok(Outcome::Cancelled) => {}
            Err(err) => self.error = Some(err.into()),
        }
    }

    pub fn change_field(&mut self, field: Field, value: impl Into<String>) {
        if self.is_torn_down() {
            return;
        }
        self.draft = apply_field_change(&self.draft, field, value);
    }

    /// Field change addressed by input name, as a view's change event carries it.
    pub fn change(&mut self, name: &str, value: impl Into<String>) -> Result<(), UnknownField> {
        let field = name.parse()?;
        self.change_field(field, value);
        Ok(())
    }

    pub async fn submit(&mut self) -> SubmitStatus {
        if self.is_torn_down() {
            return SubmitStatus::Cancelled;
        }

        let mut observation = match self.draft.validate() {
            Ok(observation) => observation,
            Err(violations) => {
                debug!(count = violations.len(), "draft failed validation");
                self.error = Some(FormError::Invalid(violations));
                return SubmitStatus::Rejected;
            }
        };

        let result = match self.mode {
            DraftMode::Create => {
                observation.observation_id = None;
                self.api.create(&observation, &self.scope).await
            }
            DraftMode::Edit(id) => {
                observation.observation_id = Some(id);
                self.api.update(&observation, &self.scope).await
            }
        };

        if self.is_torn_down() {
            return SubmitStatus::Cancelled;
        }

        match result {
            Ok(Outcome::Completed(saved)) => {
                info!(id = ?saved.observation_id, mode = ?self.mode, "observation saved");
                self.navigator.navigate(LISTING_PATH);
                SubmitStatus::Saved(saved)
            }
            Ok(Outcome::Cancelled) => SubmitStatus::Cancelled,
            Err(err) => {
                self.error = Some(err.into());
                SubmitStatus::Rejected
            }
        }
    }

    /// Drops the draft and leaves for the listing. Never touches the network.
    pub fn cancel(&mut self) {
        debug!(mode = ?self.mode, "form cancelled");
        self.draft = Draft::default();
        self.navigator.navigate(LISTING_PATH);
        self.teardown();
    }

    pub fn teardown(&self) {
        self.scope.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedTransport, api_with, json};
    use reqwest::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Arc;

    fn form_for(
        transport: &Arc<ScriptedTransport>,
        mode: DraftMode,
    ) -> ObservationForm<RecordingNavigator> {
        ObservationForm::new(api_with(transport), RecordingNavigator::default(), mode)
    }

    fn fill(form: &mut ObservationForm<RecordingNavigator>) {
        form.change("latitude", "45").unwrap();
        form.change("longitude", "-93").unwrap();
        form.change("sky_condition", "100").unwrap();
        form.change("air_temperature", "70").unwrap();
        form.change("air_temperature_unit", "F").unwrap();
    }

    fn record(id: u64) -> serde_json::Value {
        json!({
            "observation_id": id,
            "latitude": 45,
            "longitude": -93,
            "sky_condition": "100",
            "air_temperature": 70,
            "air_temperature_unit": "F"
        })
    }

    #[tokio::test]
    async fn create_submits_draft_and_navigates_to_listing() {
        let transport =
            ScriptedTransport::new([json(StatusCode::CREATED, json!({ "data": record(7) }))]);
        let mut form = form_for(&transport, DraftMode::Create);

        form.load().await;
        fill(&mut form);
        let status = form.submit().await;

        let SubmitStatus::Saved(saved) = status else {
            panic!("expected the draft to be saved, got {status:?}");
        };
        assert_eq!(saved.observation_id, Some(ObservationId(7)));
        assert_eq!(form.navigator().visited(), ["/"]);
        assert_eq!(form.error(), None);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let sent: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(
            sent,
            json!({
                "data": {
                    "latitude": 45,
                    "longitude": -93,
                    "sky_condition": "100",
                    "air_temperature": 70,
                    "air_temperature_unit": "F"
                }
            })
        );
    }

    #[tokio::test]
    async fn edit_populates_draft_from_fetched_record() {
        let fetched = json!({
            "observation_id": 3,
            "latitude": 12.5,
            "longitude": 101,
            "sky_condition": 106,
            "air_temperature": -4,
            "air_temperature_unit": "C"
        });
        let transport = ScriptedTransport::new([json(StatusCode::OK, json!({ "data": fetched }))]);
        let mut form = form_for(&transport, DraftMode::Edit(ObservationId(3)));

        form.load().await;

        assert_eq!(
            form.draft(),
            &Draft {
                observation_id: Some(ObservationId(3)),
                latitude: "12.5".into(),
                longitude: "101".into(),
                sky_condition: "106".into(),
                air_temperature: "-4".into(),
                air_temperature_unit: "C".into(),
            }
        );
        assert_eq!(transport.requests()[0].method, Method::GET);
    }

    #[tokio::test]
    async fn edit_keeps_decimal_text_exactly_as_served() {
        let fetched = json!({
            "observation_id": 5,
            "latitude": "45.000",
            "longitude": "-93.100",
            "sky_condition": "102",
            "air_temperature": "70.50",
            "air_temperature_unit": "F"
        });
        let transport = ScriptedTransport::new([json(StatusCode::OK, json!({ "data": fetched }))]);
        let mut form = form_for(&transport, DraftMode::Edit(ObservationId(5)));

        form.load().await;

        assert_eq!(form.draft().latitude, "45.000");
        assert_eq!(form.draft().longitude, "-93.100");
        assert_eq!(form.draft().air_temperature, "70.50");
        assert_eq!(form.draft().observation_id, Some(ObservationId(5)));
        assert_eq!(form.error(), None);
    }

    #[tokio::test]
    async fn edit_submit_updates_record_by_id() {
        let transport = ScriptedTransport::new([
            json(StatusCode::OK, json!({ "data": record(3) })),
            json(StatusCode::OK, json!({ "data": record(3) })),
        ]);
        let mut form = form_for(&transport, DraftMode::Edit(ObservationId(3)));

        form.load().await;
        form.change_field(Field::AirTemperature, "71");
        let status = form.submit().await;

        assert!(matches!(status, SubmitStatus::Saved(_)));
        assert_eq!(form.navigator().last(), Some(LISTING_PATH));

        let update = &transport.requests()[1];
        assert_eq!(update.method, Method::PUT);
        assert!(update.url.ends_with("/observations/3"));
        let sent: serde_json::Value =
            serde_json::from_str(update.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent["data"]["observation_id"], json!(3));
        assert_eq!(sent["data"]["air_temperature"], json!(71));
    }

    #[tokio::test]
    async fn failed_load_sets_error() {
        let transport = ScriptedTransport::new([json(
            StatusCode::NOT_FOUND,
            json!({ "error": "Observation 8 cannot be found." }),
        )]);
        let mut form = form_for(&transport, DraftMode::Edit(ObservationId(8)));

        form.load().await;

        assert_eq!(form.error_message().as_deref(), Some("Observation 8 cannot be found."));
        assert_eq!(form.draft(), &Draft::default());
    }

    #[tokio::test]
    async fn service_error_is_shown_and_draft_kept() {
        let transport =
            ScriptedTransport::new([json(StatusCode::BAD_REQUEST, json!({ "error": "X" }))]);
        let mut form = form_for(&transport, DraftMode::Create);

        fill(&mut form);
        let before = form.draft().clone();
        let status = form.submit().await;

        assert_eq!(status, SubmitStatus::Rejected);
        assert_eq!(form.error_message().as_deref(), Some("X"));
        assert_eq!(form.draft(), &before);
        assert!(form.navigator().visited().is_empty());
    }

    #[tokio::test]
    async fn resubmit_after_failure_succeeds_without_reentry() {
        let transport = ScriptedTransport::new([
            Reply::Fail(ApiError::Transport("connection reset".into())),
            json(StatusCode::CREATED, json!({ "data": record(9) })),
        ]);
        let mut form = form_for(&transport, DraftMode::Create);

        fill(&mut form);
        assert_eq!(form.submit().await, SubmitStatus::Rejected);
        assert_eq!(form.error_message().as_deref(), Some("connection reset"));

        assert!(matches!(form.submit().await, SubmitStatus::Saved(_)));
        assert_eq!(form.navigator().visited(), ["/"]);
    }

    #[tokio::test]
    async fn invalid_draft_is_not_sent() {
        let transport = ScriptedTransport::silent();
        let mut form = form_for(&transport, DraftMode::Create);

        form.change_field(Field::Latitude, "95");
        let status = form.submit().await;

        assert_eq!(status, SubmitStatus::Rejected);
        let Some(FormError::Invalid(violations)) = form.error() else {
            panic!("expected validation error, got {:?}", form.error());
        };
        assert_eq!(violations.len(), Field::all().len());
        assert!(form.error_message().unwrap().starts_with("Latitude must be between -90 and 90"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn cancel_never_calls_the_service() {
        for mode in [DraftMode::Create, DraftMode::Edit(ObservationId(2))] {
            let transport = ScriptedTransport::silent();
            let mut form = form_for(&transport, mode);

            fill(&mut form);
            form.cancel();

            assert_eq!(form.navigator().visited(), ["/"]);
            assert_eq!(form.draft(), &Draft::default());
            assert!(form.is_torn_down());
            assert!(transport.requests().is_empty());
        }
    }

    #[tokio::test]
    async fn teardown_during_load_leaves_state_untouched() {
        let transport = ScriptedTransport::new([Reply::Hang]);
        let mut form = form_for(&transport, DraftMode::Edit(ObservationId(4)));

        let scope = form.scope();
        tokio::spawn(async move { scope.cancel() });
        form.load().await;

        assert!(form.is_torn_down());
        assert_eq!(form.draft(), &Draft::default());
        assert_eq!(form.error(), None);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn teardown_during_submit_leaves_state_untouched() {
        let transport = ScriptedTransport::new([Reply::Hang]);
        let mut form = form_for(&transport, DraftMode::Create);

        fill(&mut form);
        let before = form.draft().clone();

        let scope = form.scope();
        tokio::spawn(async move { scope.cancel() });
        let status = form.submit().await;

        assert_eq!(status, SubmitStatus::Cancelled);
        assert_eq!(form.error(), None);
        assert_eq!(form.draft(), &before);
        assert!(form.navigator().visited().is_empty());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn torn_down_form_ignores_further_actions() {
        let transport = ScriptedTransport::silent();
        let mut form = form_for(&transport, DraftMode::Edit(ObservationId(4)));

        form.teardown();
        form.load().await;
        form.change_field(Field::Latitude, "10");

        assert_eq!(form.submit().await, SubmitStatus::Cancelled);
        assert_eq!(form.draft(), &Draft::default());
        assert_eq!(form.error(), None);
        assert!(form.navigator().visited().is_empty());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn unknown_input_name_is_rejected() {
        let transport = ScriptedTransport::silent();
        let mut form = form_for(&transport, DraftMode::Create);

        assert_eq!(form.change("humidity", "50"), Err(UnknownField("humidity".into())));
        assert_eq!(form.draft(), &Draft::default());
    }
}
