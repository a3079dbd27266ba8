//! Browse session bookkeeping, driven with synthetic browser events.

use avahi_tools::browse::{Action, BrowseEvent, BrowseOptions, BrowseTarget, BrowseTracker};
use avahi_tools::constants::{lookup_result_flags, Protocol};
use avahi_tools::types::{ResolvedService, ServiceItem, ServiceTypeItem};

fn service(name: &str, service_type: &str) -> ServiceItem {
    ServiceItem {
        interface: 2,
        protocol: Protocol::Inet,
        name: name.to_string(),
        service_type: service_type.to_string(),
        domain: "local".to_string(),
        flags: 0,
    }
}

fn service_type(t: &str) -> ServiceTypeItem {
    ServiceTypeItem {
        interface: 2,
        protocol: Protocol::Inet,
        service_type: t.to_string(),
        domain: "local".to_string(),
        flags: 0,
    }
}

fn resolved(item: &ServiceItem) -> ResolvedService {
    ResolvedService {
        interface: item.interface,
        protocol: item.protocol,
        name: item.name.clone(),
        service_type: item.service_type.clone(),
        domain: item.domain.clone(),
        host_name: "box.local".to_string(),
        address_protocol: Protocol::Inet,
        address: "192.168.1.10".to_string(),
        port: 80,
        txt: Vec::new(),
        flags: 0,
    }
}

fn http() -> BrowseTarget {
    BrowseTarget::Type {
        service_type: "_http._tcp".to_string(),
        domain: "local".to_string(),
    }
}

fn tracker(options: BrowseOptions, target: BrowseTarget) -> BrowseTracker {
    let mut tracker = BrowseTracker::new(options);
    tracker.start(target);
    tracker
}

#[test]
fn test_start_opens_one_browser() {
    let mut t = BrowseTracker::new(BrowseOptions::default());
    assert_eq!(
        t.start(http()),
        vec![Action::BrowseServices {
            service_type: "_http._tcp".to_string(),
            domain: "local".to_string(),
        }]
    );

    let mut t = BrowseTracker::new(BrowseOptions::default());
    assert_eq!(
        t.start(BrowseTarget::AllTypes {
            domain: String::new()
        }),
        vec![Action::BrowseTypes {
            domain: String::new()
        }]
    );
}

#[test]
fn test_duplicate_announcements_are_collapsed() {
    let mut t = tracker(BrowseOptions::default(), http());
    let a = service("Web", "_http._tcp");
    let mut b = service("web", "_HTTP._tcp.");
    b.domain = "LOCAL.".to_string();

    assert_eq!(t.handle(BrowseEvent::ServiceNew(a.clone())), vec![Action::Added(a)]);
    assert!(t.handle(BrowseEvent::ServiceNew(b)).is_empty());
    assert_eq!(t.service_count(), 1);
}

#[test]
fn test_other_protocol_is_a_different_service() {
    let mut t = tracker(BrowseOptions::default(), http());
    let v4 = service("web", "_http._tcp");
    let mut v6 = v4.clone();
    v6.protocol = Protocol::Inet6;

    t.handle(BrowseEvent::ServiceNew(v4));
    assert_eq!(t.handle(BrowseEvent::ServiceNew(v6.clone())), vec![Action::Added(v6)]);
    assert_eq!(t.service_count(), 2);
}

#[test]
fn test_remove_unknown_service_is_ignored() {
    let mut t = tracker(BrowseOptions::default(), http());
    assert!(t
        .handle(BrowseEvent::ServiceRemove(service("ghost", "_http._tcp")))
        .is_empty());

    let a = service("web", "_http._tcp");
    t.handle(BrowseEvent::ServiceNew(a.clone()));
    assert_eq!(
        t.handle(BrowseEvent::ServiceRemove(a.clone())),
        vec![Action::Removed(a)]
    );
    assert_eq!(t.service_count(), 0);
}

#[test]
fn test_ignore_local_skips_local_services() {
    let options = BrowseOptions {
        ignore_local: true,
        ..Default::default()
    };
    let mut t = tracker(options, http());
    let mut local = service("me", "_http._tcp");
    local.flags = lookup_result_flags::LOCAL;

    assert!(t.handle(BrowseEvent::ServiceNew(local.clone())).is_empty());
    assert!(t.handle(BrowseEvent::ServiceRemove(local)).is_empty());
    assert_eq!(t.service_count(), 0);
}

#[test]
fn test_resolve_requests_resolution_once() {
    let options = BrowseOptions {
        resolve: true,
        ..Default::default()
    };
    let mut t = tracker(options, http());
    let a = service("web", "_http._tcp");

    assert_eq!(
        t.handle(BrowseEvent::ServiceNew(a.clone())),
        vec![Action::Added(a.clone()), Action::Resolve(a.clone())]
    );
    assert_eq!(t.pending_resolutions(), 1);

    let r = resolved(&a);
    assert_eq!(
        t.handle(BrowseEvent::Resolved(r.clone())),
        vec![Action::Resolved(r.clone())]
    );
    assert_eq!(t.pending_resolutions(), 0);

    // A late duplicate answer is dropped
    assert!(t.handle(BrowseEvent::Resolved(r)).is_empty());
    assert_eq!(t.pending_resolutions(), 0);
}

#[test]
fn test_resolve_failure_is_reported() {
    let options = BrowseOptions {
        resolve: true,
        ..Default::default()
    };
    let mut t = tracker(options, http());
    let a = service("web", "_http._tcp");
    t.handle(BrowseEvent::ServiceNew(a.clone()));

    let actions = t.handle(BrowseEvent::ResolveFailed {
        item: a.clone(),
        reason: "Timeout reached".to_string(),
    });
    assert_eq!(
        actions,
        vec![Action::ResolveFailed {
            item: a,
            reason: "Timeout reached".to_string(),
        }]
    );
    assert_eq!(t.pending_resolutions(), 0);
}

#[test]
fn test_terminate_waits_for_all_for_now() {
    let options = BrowseOptions {
        terminate_on_all_for_now: true,
        ..Default::default()
    };
    let mut t = tracker(options, http());
    t.handle(BrowseEvent::ServiceNew(service("web", "_http._tcp")));

    assert!(!t.handle(BrowseEvent::CacheExhausted).contains(&Action::Quit));
    assert_eq!(t.handle(BrowseEvent::AllForNow), vec![Action::Quit]);
}

#[test]
fn test_terminate_waits_for_pending_resolutions() {
    let options = BrowseOptions {
        resolve: true,
        terminate_on_all_for_now: true,
        ..Default::default()
    };
    let mut t = tracker(options, http());
    let a = service("web", "_http._tcp");
    t.handle(BrowseEvent::ServiceNew(a.clone()));

    assert!(t.handle(BrowseEvent::AllForNow).is_empty());

    let r = resolved(&a);
    assert_eq!(
        t.handle(BrowseEvent::Resolved(r.clone())),
        vec![Action::Resolved(r), Action::Quit]
    );
}

#[test]
fn test_removal_during_resolution_releases_terminate() {
    let options = BrowseOptions {
        resolve: true,
        terminate_on_all_for_now: true,
        ..Default::default()
    };
    let mut t = tracker(options, http());
    let a = service("web", "_http._tcp");
    t.handle(BrowseEvent::ServiceNew(a.clone()));
    assert!(t.handle(BrowseEvent::AllForNow).is_empty());

    assert_eq!(
        t.handle(BrowseEvent::ServiceRemove(a.clone())),
        vec![Action::Removed(a.clone()), Action::Quit]
    );
    assert_eq!(t.pending_resolutions(), 0);

    // The orphaned answer no longer matters
    assert!(t.handle(BrowseEvent::Resolved(resolved(&a))).is_empty());
}

#[test]
fn test_cache_exhausted_terminates_with_cache_option() {
    let options = BrowseOptions {
        terminate_on_cache_exhausted: true,
        ..Default::default()
    };
    let mut t = tracker(options, http());
    assert_eq!(t.handle(BrowseEvent::CacheExhausted), vec![Action::Quit]);
}

#[test]
fn test_verbose_markers_are_reported_once() {
    let options = BrowseOptions {
        verbose: true,
        ..Default::default()
    };
    let mut t = tracker(options, http());

    assert_eq!(t.handle(BrowseEvent::CacheExhausted), vec![Action::CacheExhausted]);
    assert_eq!(t.handle(BrowseEvent::AllForNow), vec![Action::AllForNow]);

    // Later services do not repeat the markers
    let a = service("web", "_http._tcp");
    assert_eq!(t.handle(BrowseEvent::ServiceNew(a.clone())), vec![Action::Added(a)]);
}

#[test]
fn test_all_types_browses_each_type_once() {
    let mut t = tracker(
        BrowseOptions::default(),
        BrowseTarget::AllTypes {
            domain: "local".to_string(),
        },
    );

    assert_eq!(
        t.handle(BrowseEvent::TypeNew(service_type("_ssh._tcp"))),
        vec![Action::BrowseServices {
            service_type: "_ssh._tcp".to_string(),
            domain: "local".to_string(),
        }]
    );
    // Same type on another interface
    let mut again = service_type("_SSH._tcp");
    again.interface = 3;
    assert!(t.handle(BrowseEvent::TypeNew(again)).is_empty());
    assert!(t
        .handle(BrowseEvent::TypeRemove(service_type("_ssh._tcp")))
        .is_empty());
}

#[test]
fn test_all_types_terminates_after_every_browser_finished() {
    let options = BrowseOptions {
        terminate_on_all_for_now: true,
        ..Default::default()
    };
    let mut t = tracker(
        options,
        BrowseTarget::AllTypes {
            domain: "local".to_string(),
        },
    );
    t.handle(BrowseEvent::TypeNew(service_type("_ssh._tcp")));
    t.handle(BrowseEvent::TypeNew(service_type("_http._tcp")));

    // Type browser plus two service browsers
    assert!(t.handle(BrowseEvent::AllForNow).is_empty());
    assert!(t.handle(BrowseEvent::AllForNow).is_empty());
    assert_eq!(t.handle(BrowseEvent::AllForNow), vec![Action::Quit]);
}

#[test]
fn test_browser_failure_fails_the_session() {
    let mut t = tracker(BrowseOptions::default(), http());
    assert_eq!(
        t.handle(BrowseEvent::Failure("Too many objects".to_string())),
        vec![Action::Fail("Too many objects".to_string())]
    );
}
