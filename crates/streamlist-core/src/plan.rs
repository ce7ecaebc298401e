// ── Provider plans ──
//
// An ordered list of providers with per-entry eligibility. Eligibility is a
// configuration decision evaluated before any call; an ineligible entry is
// skipped silently and never counts as a failure.

use std::fmt;
use std::sync::Arc;

use crate::error::CoreError;
use crate::model::{ListingFilter, ListingKind};
use crate::provider::{Backend, Provider};

/// Which backends the catalog holds a token for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthState {
    pub rest_token: bool,
    pub graph_token: bool,
}

impl AuthState {
    pub fn has_token(self, backend: Backend) -> bool {
        match backend {
            Backend::Rest => self.rest_token,
            Backend::Graph => self.graph_token,
            Backend::Legacy => false,
        }
    }
}

/// What an eligibility check can look at.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityContext<'a> {
    pub kind: ListingKind,
    pub filter: &'a ListingFilter,
    pub auth: &'a AuthState,
}

pub type Predicate = Arc<dyn Fn(&EligibilityContext<'_>) -> bool + Send + Sync>;

/// One condition an entry must meet before it is tried.
#[derive(Clone)]
pub enum Requirement {
    /// A token for the entry's own backend.
    AuthToken,
    Predicate(Predicate),
}

impl fmt::Debug for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthToken => f.write_str("AuthToken"),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

#[derive(Clone)]
pub struct PlanEntry {
    provider: Arc<dyn Provider>,
    requirements: Vec<Requirement>,
}

impl PlanEntry {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            requirements: Vec::new(),
        }
    }

    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn requires_token(self) -> Self {
        self.requires(Requirement::AuthToken)
    }

    pub fn when<F>(self, predicate: F) -> Self
    where
        F: Fn(&EligibilityContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.requires(Requirement::Predicate(Arc::new(predicate)))
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// All requirements hold and the provider supports the request.
    pub fn is_eligible(&self, ctx: &EligibilityContext<'_>) -> bool {
        let backend = self.provider.backend();
        let requirements_met = self.requirements.iter().all(|r| match r {
            Requirement::AuthToken => ctx.auth.has_token(backend),
            Requirement::Predicate(check) => check(ctx),
        });
        requirements_met && self.provider.supports(ctx.kind, ctx.filter)
    }
}

impl fmt::Debug for PlanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanEntry")
            .field("provider", &self.provider.name())
            .field("requirements", &self.requirements)
            .finish()
    }
}

/// Ordered, non-empty list of plan entries.
#[derive(Debug, Clone)]
pub struct ProviderPlan {
    entries: Vec<PlanEntry>,
}

impl ProviderPlan {
    pub fn new(entries: Vec<PlanEntry>) -> Result<Self, CoreError> {
        if entries.is_empty() {
            return Err(CoreError::EmptyPlan);
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&PlanEntry> {
        self.entries.get(index)
    }

    /// Eligible entries in plan order, with their plan index.
    pub fn eligible(&self, ctx: &EligibilityContext<'_>) -> Vec<(usize, Arc<dyn Provider>)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_eligible(ctx))
            .map(|(index, entry)| (index, Arc::clone(&entry.provider)))
            .collect()
    }
}
