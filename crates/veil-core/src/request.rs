#![forbid(unsafe_code)]

//! Modal requests and their admission-time validation.
//!
//! A [`ModalRequest`] is what upstream code hands to the manager. It is
//! untrusted: the option list may be missing, empty, or full of blank
//! strings. [`ModalRequest::validate`] turns it into a [`ValidatedRequest`]
//! whose [`ChoiceOptions`] are guaranteed non-empty.
//!
//! # Invariants
//!
//! - A `ChoiceOptions` value always holds at least one non-blank, trimmed entry.
//! - `on_select` is never invoked by validation, even when validation fails.
//!
//! # Failure Modes
//!
//! | Input | Result |
//! |-------|--------|
//! | `options == None` | [`RequestError::MissingOptions`] |
//! | `options == Some([])` | [`RequestError::EmptyOptions`] |
//! | every option blank after trimming | [`RequestError::NoValidOptions`] |

use std::fmt;

use crate::event::SurfaceId;

/// Callback invoked with the 1-based ordinal of the selected option.
pub type OnSelect = Box<dyn FnOnce(usize)>;

/// Kind of modal being requested.
///
/// Each kind is rendered by exactly one surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[non_exhaustive]
pub enum ModalKind {
    /// A titled list of options, one of which the user picks.
    Choice,
}

impl ModalKind {
    /// Identifier of the surface that renders this kind.
    #[must_use]
    pub const fn surface_id(self) -> SurfaceId {
        match self {
            Self::Choice => SurfaceId::CHOICE,
        }
    }

    /// Stable lowercase name, used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Choice => "choice",
        }
    }
}

impl fmt::Display for ModalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a request is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// No option list was supplied at all.
    MissingOptions,
    /// The option list was supplied but empty.
    EmptyOptions,
    /// Every supplied option was blank after trimming.
    NoValidOptions {
        /// Number of options that were discarded.
        discarded: usize,
    },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingOptions => write!(f, "request has no option list"),
            Self::EmptyOptions => write!(f, "request option list is empty"),
            Self::NoValidOptions { discarded } => {
                write!(f, "all {discarded} options were blank after trimming")
            }
        }
    }
}

impl std::error::Error for RequestError {}

/// Non-empty list of trimmed, non-blank option labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChoiceOptions(Vec<String>);

impl ChoiceOptions {
    /// Filter raw options down to their non-blank trimmed forms.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::EmptyOptions`] for an empty input and
    /// [`RequestError::NoValidOptions`] when nothing survives filtering.
    pub fn filter<S: AsRef<str>>(raw: &[S]) -> Result<Self, RequestError> {
        if raw.is_empty() {
            return Err(RequestError::EmptyOptions);
        }
        let kept: Vec<String> = raw
            .iter()
            .map(|option| option.as_ref().trim())
            .filter(|option| !option.is_empty())
            .map(str::to_owned)
            .collect();
        if kept.is_empty() {
            return Err(RequestError::NoValidOptions {
                discarded: raw.len(),
            });
        }
        Ok(Self(kept))
    }

    /// Number of options. Always at least one.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; provided for API symmetry with slices.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The option labels in display order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Whether `ordinal` (1-based) names one of the options.
    #[must_use]
    pub fn contains_ordinal(&self, ordinal: usize) -> bool {
        (1..=self.0.len()).contains(&ordinal)
    }

    /// Option labels prefixed with their 1-based ordinal, e.g. `"1. Go north"`.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, String)> + '_ {
        self.0
            .iter()
            .enumerate()
            .map(|(index, option)| (index + 1, format!("{}. {option}", index + 1)))
    }
}

/// Structural identity of a request, used to suppress duplicate bursts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestFingerprint {
    pub kind: ModalKind,
    pub title: String,
    pub options: Vec<String>,
}

/// A show-request as delivered by upstream code.
pub struct ModalRequest {
    kind: ModalKind,
    title: String,
    options: Option<Vec<String>>,
    on_select: OnSelect,
}

impl fmt::Debug for ModalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalRequest")
            .field("kind", &self.kind)
            .field("title", &self.title)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ModalRequest {
    /// Create a choice request.
    pub fn choice<I, S>(
        title: impl Into<String>,
        options: I,
        on_select: impl FnOnce(usize) + 'static,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_parts(
            ModalKind::Choice,
            title,
            Some(options.into_iter().map(Into::into).collect()),
            on_select,
        )
    }

    /// Create a request from raw parts. `options == None` models a
    /// request whose option list is missing entirely.
    pub fn from_parts(
        kind: ModalKind,
        title: impl Into<String>,
        options: Option<Vec<String>>,
        on_select: impl FnOnce(usize) + 'static,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            options,
            on_select: Box::new(on_select),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ModalKind {
        self.kind
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn options(&self) -> Option<&[String]> {
        self.options.as_deref()
    }

    /// Validate the option list and normalize the title.
    ///
    /// A blank title is replaced by `default_title`. On failure the
    /// callback is dropped without being called.
    ///
    /// # Errors
    ///
    /// See the module-level failure table.
    pub fn validate(self, default_title: &str) -> Result<ValidatedRequest, RequestError> {
        let raw = self.options.ok_or(RequestError::MissingOptions)?;
        let options = ChoiceOptions::filter(raw.as_slice())?;
        let title = match self.title.trim() {
            "" => default_title.to_owned(),
            trimmed => trimmed.to_owned(),
        };
        Ok(ValidatedRequest {
            kind: self.kind,
            title,
            options,
            on_select: self.on_select,
        })
    }
}

/// A request whose content passed validation.
pub struct ValidatedRequest {
    pub kind: ModalKind,
    pub title: String,
    pub options: ChoiceOptions,
    pub on_select: OnSelect,
}

impl fmt::Debug for ValidatedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedRequest")
            .field("kind", &self.kind)
            .field("title", &self.title)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ValidatedRequest {
    #[must_use]
    pub fn fingerprint(&self) -> RequestFingerprint {
        RequestFingerprint {
            kind: self.kind,
            title: self.title.clone(),
            options: self.options.as_slice().to_vec(),
        }
    }
}
