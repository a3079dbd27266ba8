//! Bookkeeping of a service browse session.
//!
//! The tracker is fed [`BrowseEvent`]s from any number of browsers and
//! resolvers and answers with the [`Action`]s the driver has to perform.
//! It never touches D-Bus itself.

use crate::types::{DomainItem, ResolvedService, ServiceItem, ServiceTypeItem};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BrowseOptions {
    /// Print `: All for now` / `: Cache exhausted` markers
    pub verbose: bool,
    pub resolve: bool,
    pub ignore_local: bool,
    pub terminate_on_all_for_now: bool,
    pub terminate_on_cache_exhausted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BrowseTarget {
    /// Enumerate service types, then browse every type found
    AllTypes { domain: String },
    Type { service_type: String, domain: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BrowseEvent {
    DomainNew(DomainItem),
    DomainRemove(DomainItem),
    TypeNew(ServiceTypeItem),
    TypeRemove(ServiceTypeItem),
    ServiceNew(ServiceItem),
    ServiceRemove(ServiceItem),
    AllForNow,
    CacheExhausted,
    Failure(String),
    Resolved(ResolvedService),
    ResolveFailed { item: ServiceItem, reason: String },
}

impl BrowseEvent {
    /// Interface index of the item carried, if any
    pub fn interface(&self) -> Option<i32> {
        match self {
            BrowseEvent::DomainNew(d) | BrowseEvent::DomainRemove(d) => Some(d.interface),
            BrowseEvent::TypeNew(t) | BrowseEvent::TypeRemove(t) => Some(t.interface),
            BrowseEvent::ServiceNew(s) | BrowseEvent::ServiceRemove(s) => Some(s.interface),
            BrowseEvent::Resolved(r) => Some(r.interface),
            BrowseEvent::ResolveFailed { item, .. } => Some(item.interface),
            BrowseEvent::AllForNow | BrowseEvent::CacheExhausted | BrowseEvent::Failure(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Create and start a service type browser
    BrowseTypes { domain: String },
    /// Create and start a service browser
    BrowseServices { service_type: String, domain: String },
    Resolve(ServiceItem),
    Added(ServiceItem),
    Removed(ServiceItem),
    Resolved(ResolvedService),
    ResolveFailed { item: ServiceItem, reason: String },
    AllForNow,
    CacheExhausted,
    Quit,
    Fail(String),
}

impl Action {
    /// Interface index of the item carried, if any
    pub fn interface(&self) -> Option<i32> {
        match self {
            Action::Resolve(item)
            | Action::Added(item)
            | Action::Removed(item)
            | Action::ResolveFailed { item, .. } => Some(item.interface),
            Action::Resolved(r) => Some(r.interface),
            _ => None,
        }
    }
}

struct Entry {
    item: ServiceItem,
    resolving: bool,
}

pub struct BrowseTracker {
    options: BrowseOptions,
    services: Vec<Entry>,
    browsed_types: Vec<String>,
    n_all_for_now: i32,
    n_cache_exhausted: i32,
    n_resolving: i32,
}

impl BrowseTracker {
    pub fn new(options: BrowseOptions) -> Self {
        Self {
            options,
            services: Vec::new(),
            browsed_types: Vec::new(),
            n_all_for_now: 0,
            n_cache_exhausted: 0,
            n_resolving: 0,
        }
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn pending_resolutions(&self) -> i32 {
        self.n_resolving
    }

    /// Actions that open the first browser
    pub fn start(&mut self, target: BrowseTarget) -> Vec<Action> {
        let mut actions = Vec::new();
        match target {
            BrowseTarget::AllTypes { domain } => {
                self.browser_created();
                actions.push(Action::BrowseTypes { domain });
            }
            BrowseTarget::Type {
                service_type,
                domain,
            } => self.browse_service_type(service_type, domain, &mut actions),
        }
        actions
    }

    pub fn handle(&mut self, event: BrowseEvent) -> Vec<Action> {
        let mut actions = Vec::new();

        match event {
            BrowseEvent::TypeNew(item) => {
                self.browse_service_type(item.service_type, item.domain, &mut actions);
            }
            // Services of a vanished type are removed by their own browser
            BrowseEvent::TypeRemove(_) => {}
            BrowseEvent::DomainNew(_) | BrowseEvent::DomainRemove(_) => {}
            BrowseEvent::ServiceNew(item) => self.add_service(item, &mut actions),
            BrowseEvent::ServiceRemove(item) => self.remove_service(&item, &mut actions),
            BrowseEvent::AllForNow => {
                self.n_all_for_now -= 1;
                self.check_terminate(&mut actions);
            }
            BrowseEvent::CacheExhausted => {
                self.n_cache_exhausted -= 1;
                self.check_terminate(&mut actions);
            }
            BrowseEvent::Failure(reason) => actions.push(Action::Fail(reason)),
            BrowseEvent::Resolved(resolved) => {
                if self.finish_resolution(&resolved.item()) {
                    actions.push(Action::Resolved(resolved));
                    self.check_terminate(&mut actions);
                }
            }
            BrowseEvent::ResolveFailed { item, reason } => {
                if self.finish_resolution(&item) {
                    actions.push(Action::ResolveFailed { item, reason });
                    self.check_terminate(&mut actions);
                }
            }
        }

        actions
    }

    fn browser_created(&mut self) {
        self.n_all_for_now += 1;
        self.n_cache_exhausted += 1;
    }

    fn browse_service_type(
        &mut self,
        service_type: String,
        domain: String,
        actions: &mut Vec<Action>,
    ) {
        if self
            .browsed_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&service_type))
        {
            return;
        }
        self.browsed_types.push(service_type.clone());
        self.browser_created();
        actions.push(Action::BrowseServices {
            service_type,
            domain,
        });
    }

    fn add_service(&mut self, item: ServiceItem, actions: &mut Vec<Action>) {
        if self.options.ignore_local && item.is_local() {
            return;
        }
        if self.services.iter().any(|e| e.item.same_service(&item)) {
            return;
        }

        let resolving = self.options.resolve;
        if resolving {
            self.n_resolving += 1;
        }
        self.services.push(Entry {
            item: item.clone(),
            resolving,
        });

        actions.push(Action::Added(item.clone()));
        if resolving {
            actions.push(Action::Resolve(item));
        }
    }

    fn remove_service(&mut self, item: &ServiceItem, actions: &mut Vec<Action>) {
        let Some(idx) = self.services.iter().position(|e| e.item.same_service(item)) else {
            return;
        };
        let entry = self.services.remove(idx);
        actions.push(Action::Removed(entry.item));

        if entry.resolving {
            // Its resolution result will be ignored
            self.n_resolving -= 1;
            self.check_terminate(actions);
        }
    }

    /// Returns false when nobody waits for this resolution any more
    fn finish_resolution(&mut self, item: &ServiceItem) -> bool {
        match self
            .services
            .iter_mut()
            .find(|e| e.resolving && e.item.same_service(item))
        {
            Some(entry) => {
                entry.resolving = false;
                self.n_resolving -= 1;
                true
            }
            None => false,
        }
    }

    fn check_terminate(&mut self, actions: &mut Vec<Action>) {
        if self.n_all_for_now <= 0 && self.n_resolving <= 0 {
            if self.options.verbose {
                actions.push(Action::AllForNow);
                // Report once until another browser comes up
                self.n_all_for_now += 1;
            }
            if self.options.terminate_on_all_for_now {
                actions.push(Action::Quit);
            }
        }

        if self.n_cache_exhausted <= 0 && self.n_resolving <= 0 {
            if self.options.verbose {
                actions.push(Action::CacheExhausted);
                self.n_cache_exhausted += 1;
            }
            if self.options.terminate_on_cache_exhausted {
                actions.push(Action::Quit);
            }
        }
    }
}
