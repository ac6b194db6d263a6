//! Trust boundary for externally produced timelines
//!
//! Anything read from outside (an assistant reply, a file from disk) starts
//! as an [`UntrustedTimeline`]. The only way to turn it into a
//! [`CommittedTimeline`] is [`UntrustedTimeline::commit`], which runs the
//! validator and refuses timelines with errors.

use crate::document::repair_document;
use crate::health::HealthReport;
use crate::timeline::Timeline;
use crate::validate::{validate_with, CheckConfig, Issue, ValidationReport};
use crate::{Error, Result};
use serde_json::Value;
use std::io::Read;
use std::ops::Deref;

/// A timeline that has not been validated yet.
///
/// Reading is lenient: fields the typed model cannot hold are replaced with
/// placeholders and the problems are kept as errors for the next check.
#[derive(Debug, Clone)]
pub struct UntrustedTimeline {
    timeline: Timeline,
    read_errors: Vec<Issue>,
}

impl UntrustedTimeline {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            read_errors: Vec::new(),
        }
    }

    pub fn read<R: Read>(reader: R) -> Result<Self> {
        Self::from_value(serde_json::from_reader(reader)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Builds a timeline from a parsed document, repairing what it can
    pub fn from_value(mut document: Value) -> Result<Self> {
        let read_errors = repair_document(&mut document);
        let timeline = serde_json::from_value(document)?;
        if !read_errors.is_empty() {
            log::debug!("repaired {} field(s) while reading", read_errors.len());
        }
        Ok(Self { timeline, read_errors })
    }

    /// The timeline as read, placeholders included
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Runs the validator without consuming the timeline.
    ///
    /// Problems found while reading come first in the error list.
    pub fn check(&self, config: &CheckConfig) -> ValidationReport {
        let mut report = validate_with(&self.timeline, config);
        report.errors.splice(0..0, self.read_errors.iter().cloned());
        report
    }

    /// Health report including the problems found while reading
    pub fn health(&self, config: &CheckConfig) -> HealthReport {
        HealthReport::from_validation(&self.timeline, self.check(config), config)
    }

    pub fn commit(self) -> Result<CommittedTimeline> {
        self.commit_with(&CheckConfig::default())
    }

    /// Validates the timeline; succeeds only when there are no errors
    pub fn commit_with(self, config: &CheckConfig) -> Result<CommittedTimeline> {
        let report = self.check(config);
        if !report.is_valid() {
            log::warn!("rejecting timeline with {} error(s)", report.errors.len());
            for error in &report.errors {
                log::debug!("{}", error);
            }
            return Err(Error::Rejected(report));
        }

        log::debug!("committed timeline with {} warning(s)", report.warnings.len());
        Ok(CommittedTimeline {
            timeline: self.timeline,
            warnings: report.warnings,
        })
    }
}

/// A timeline that passed validation with no errors.
///
/// Read-only: edit the inner timeline through [`CommittedTimeline::into_inner`]
/// and commit the result again.
#[derive(Debug, Clone)]
pub struct CommittedTimeline {
    timeline: Timeline,
    warnings: Vec<Issue>,
}

impl CommittedTimeline {
    /// Warnings reported when the timeline was committed
    pub fn warnings(&self) -> &[Issue] {
        &self.warnings
    }

    pub fn into_inner(self) -> Timeline {
        self.timeline
    }

    /// Wraps an edited copy for another round of validation
    pub fn edit(&self, operation: impl FnOnce(&Timeline) -> Result<Timeline>) -> Result<UntrustedTimeline> {
        operation(&self.timeline).map(UntrustedTimeline::new)
    }
}

impl Deref for CommittedTimeline {
    type Target = Timeline;

    fn deref(&self) -> &Timeline {
        &self.timeline
    }
}
