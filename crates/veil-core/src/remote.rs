#![forbid(unsafe_code)]

//! Mapping remote peer events onto modal requests.
//!
//! The remote peer pushes loosely typed events. Only events that carry a
//! choice list become [`ModalRequest`]s; combat events are skipped because
//! they are rendered by their own interface. Non-string choices are kept as
//! blanks so the manager's validation discards them.

use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::request::{ModalKind, ModalRequest};

/// Event kinds whose choices are not presented as modals.
const SELF_RENDERED_KINDS: [&str; 2] = ["combat_start", "combat"];

/// One entry of a remote choice list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RemoteChoice {
    Text(String),
    /// Any non-string value.
    Other(IgnoredAny),
}

/// A game event as pushed by the remote peer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub choices: Option<Vec<RemoteChoice>>,
}

impl RemoteEvent {
    /// Whether this event asks the user to pick from a list.
    #[must_use]
    pub fn offers_choice(&self) -> bool {
        !SELF_RENDERED_KINDS.contains(&self.kind.as_str())
            && self.choices.as_ref().is_some_and(|choices| !choices.is_empty())
    }

    /// Title shown for the modal: the message, else the title, else blank.
    #[must_use]
    pub fn modal_title(&self) -> &str {
        [self.message.as_deref(), self.title.as_deref()]
            .into_iter()
            .flatten()
            .find(|text| !text.trim().is_empty())
            .unwrap_or("")
    }

    /// Build a choice request, or `None` when the event offers no choice.
    pub fn choice_request(self, on_select: impl FnOnce(usize) + 'static) -> Option<ModalRequest> {
        if !self.offers_choice() {
            return None;
        }
        let title = self.modal_title().to_owned();
        let options = self
            .choices
            .unwrap_or_default()
            .into_iter()
            .map(|choice| match choice {
                RemoteChoice::Text(text) => text,
                RemoteChoice::Other(_) => String::new(),
            })
            .collect();
        Some(ModalRequest::from_parts(
            ModalKind::Choice,
            title,
            Some(options),
            on_select,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> RemoteEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn event_with_choices_becomes_request() {
        let event = parse(
            r#"{"type":"event","message":"A derelict drifts by","choices":["Board it","Fly on"]}"#,
        );
        let request = event.choice_request(|_| {}).unwrap();
        assert_eq!(request.title(), "A derelict drifts by");
        assert_eq!(
            request.options(),
            Some(&["Board it".to_string(), "Fly on".to_string()][..])
        );
    }

    #[test]
    fn combat_events_are_skipped() {
        for kind in ["combat_start", "combat"] {
            let event = parse(&format!(r#"{{"type":"{kind}","choices":["Attack","Flee"]}}"#));
            assert!(!event.offers_choice());
            assert!(event.choice_request(|_| {}).is_none());
        }
    }

    #[test]
    fn events_without_choices_are_skipped() {
        assert!(parse(r#"{"type":"event","message":"Quiet"}"#)
            .choice_request(|_| {})
            .is_none());
        assert!(parse(r#"{"type":"event","choices":[]}"#)
            .choice_request(|_| {})
            .is_none());
    }

    #[test]
    fn title_falls_back_to_title_field() {
        let event = parse(r#"{"type":"event","message":"  ","title":"Trader","choices":["Buy"]}"#);
        assert_eq!(event.modal_title(), "Trader");
    }

    #[test]
    fn non_string_choices_become_blank() {
        let event = parse(r#"{"type":"event","message":"m","choices":["Go",3,null]}"#);
        let request = event.choice_request(|_| {}).unwrap();
        let validated = request.validate("d").unwrap();
        assert_eq!(validated.options.as_slice(), ["Go"]);
    }
}
