// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `reverse.rs`

#[cfg(test)]
mod tests {
    use crate::dns_errors::{DnsaError, ZoneError};
    use crate::model::{PreferredA, ReverseRecord, Validity};
    use crate::net_range::NetRange;
    use crate::reconcilers::reverse::{
        build_reverse, build_reverse_zone, compute_plan, display_reverse_zone,
        reconcile_reverse_zone, PtrAddition,
    };
    use crate::reconcilers::test_support::Harness;
    use crate::reconcilers::BuildOutcome;
    use crate::store::catalog::{self, ForwardCandidate};
    use crate::store::Query;
    use hickory_proto::rr::RecordType;
    use std::fs;
    use std::net::Ipv4Addr;

    fn candidate(ip: &str, host: &str, zone: &str, record_id: i64) -> ForwardCandidate {
        ForwardCandidate {
            ip: ip.parse().unwrap(),
            host: host.into(),
            zone: zone.into(),
            record_id,
        }
    }

    fn ptr(id: i64, host: &str, destination: &str) -> ReverseRecord {
        ReverseRecord {
            id,
            rev_zone_id: 1,
            block: 0,
            host: host.into(),
            destination: destination.into(),
        }
    }

    fn preferred(ip: &str, record_id: i64) -> PreferredA {
        PreferredA {
            id: 1,
            ip: ip.parse().unwrap(),
            record_id,
            fqdn: String::new(),
        }
    }

    fn slash24() -> NetRange {
        NetRange::new("10.0.0.0", 24).unwrap()
    }

    // ===== compute_plan =====

    #[test]
    fn test_plan_adds_missing_ptr() {
        let plan = compute_plan(
            &slash24(),
            &[],
            &[candidate("10.0.0.5", "www", "example.com", 1)],
            &[],
        );

        assert!(plan.removals.is_empty());
        assert_eq!(
            plan.additions,
            vec![PtrAddition {
                ip: Ipv4Addr::new(10, 0, 0, 5),
                block: 0,
                host: "5".into(),
                destination: "www.example.com.".into(),
            }]
        );
    }

    #[test]
    fn test_plan_is_empty_when_consistent() {
        let plan = compute_plan(
            &slash24(),
            &[ptr(1, "5", "www.example.com.")],
            &[candidate("10.0.0.5", "www", "example.com", 1)],
            &[],
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_matches_destination_without_trailing_dot() {
        let plan = compute_plan(
            &slash24(),
            &[ptr(1, "5", "www.example.com")],
            &[candidate("10.0.0.5", "www", "example.com", 1)],
            &[],
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_removes_stale_and_duplicate_ptrs() {
        let plan = compute_plan(
            &slash24(),
            &[
                ptr(1, "5", "www.example.com."),
                ptr(2, "5", "www.example.com."),
                ptr(3, "6", "gone.example.com."),
            ],
            &[candidate("10.0.0.5", "www", "example.com", 1)],
            &[],
        );

        let removed: Vec<i64> = plan.removals.iter().map(|r| r.id).collect();
        assert_eq!(removed, vec![2, 3]);
        assert!(plan.additions.is_empty());
    }

    #[test]
    fn test_plan_ignores_candidates_outside_range() {
        let range = NetRange::new("10.0.0.0", 26).unwrap();
        let plan = compute_plan(
            &range,
            &[],
            &[
                candidate("10.0.0.63", "in", "example.com", 1),
                candidate("10.0.0.64", "out", "example.com", 2),
            ],
            &[],
        );

        assert_eq!(plan.additions.len(), 1);
        assert_eq!(plan.additions[0].host, "63");
    }

    #[test]
    fn test_plan_preferred_keeps_one_record() {
        let plan = compute_plan(
            &slash24(),
            &[],
            &[
                candidate("10.0.0.5", "portal", "example.com", 2),
                candidate("10.0.0.5", "www", "example.com", 1),
            ],
            &[preferred("10.0.0.5", 1)],
        );

        assert_eq!(plan.additions.len(), 1);
        assert_eq!(plan.additions[0].destination, "www.example.com.");
    }

    #[test]
    fn test_plan_without_preference_keeps_every_record() {
        let plan = compute_plan(
            &slash24(),
            &[],
            &[
                candidate("10.0.0.5", "www", "example.com", 1),
                candidate("10.0.0.5", "portal", "example.com", 2),
            ],
            &[],
        );

        let names: Vec<&str> = plan.additions.iter().map(|a| a.destination.as_str()).collect();
        assert_eq!(names, vec!["portal.example.com.", "www.example.com."]);
    }

    #[test]
    fn test_plan_stale_preference_drops_address() {
        let plan = compute_plan(
            &slash24(),
            &[],
            &[candidate("10.0.0.5", "www", "example.com", 1)],
            &[preferred("10.0.0.5", 99)],
        );
        assert!(plan.additions.is_empty());
    }

    #[test]
    fn test_plan_orders_additions_by_address_zone_host() {
        let plan = compute_plan(
            &slash24(),
            &[],
            &[
                candidate("10.0.0.20", "b", "example.com", 1),
                candidate("10.0.0.3", "z", "example.org", 2),
                candidate("10.0.0.3", "a", "example.org", 3),
                candidate("10.0.0.3", "m", "example.com", 4),
            ],
            &[],
        );

        let order: Vec<(&str, &str)> = plan
            .additions
            .iter()
            .map(|a| (a.host.as_str(), a.destination.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("3", "m.example.com."),
                ("3", "a.example.org."),
                ("3", "z.example.org."),
                ("20", "b.example.com."),
            ]
        );
    }

    #[test]
    fn test_plan_apex_record_points_at_zone() {
        let plan = compute_plan(
            &slash24(),
            &[],
            &[candidate("10.0.0.1", "@", "example.com", 1)],
            &[],
        );
        assert_eq!(plan.additions[0].destination, "example.com.");
    }

    #[test]
    fn test_plan_slash16_uses_two_labels() {
        let range = NetRange::new("10.1.0.0", 16).unwrap();
        let plan = compute_plan(&range, &[], &[candidate("10.1.2.3", "h", "example.com", 1)], &[]);
        assert_eq!(plan.additions[0].host, "3.2");
    }

    // ===== reconciliation against the store =====

    #[test]
    fn test_new_a_record_gets_ptr() {
        let h = Harness::new();
        let zone = h.add_zone("example.com");
        h.add_a(zone, "www", "10.0.0.5");
        h.add_reverse("10.0.0.0", 24);

        let outcome = reconcile_reverse_zone(&h.ctx, "10.0.0.0").unwrap();

        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.removed, 0);
        assert_eq!(outcome.build, BuildOutcome::Built { serial: 2_024_010_201 });
        assert_eq!(h.ptrs("10.0.0.0"), vec![("5".to_string(), "www.example.com.".to_string())]);

        let text = h.zone_file("10.0.0.0").unwrap();
        assert!(text.contains("5\tPTR\twww.example.com.\n"));
        let checks = h.checker.zone_checks.borrow();
        assert_eq!(checks[0].0, "0.0.10.in-addr.arpa");
    }

    #[test]
    fn test_preferred_record_wins() {
        let h = Harness::new();
        let zone = h.add_zone("example.com");
        let www = h.add_a(zone, "www", "10.0.0.5");
        h.add_a(zone, "portal", "10.0.0.5");
        h.prefer("10.0.0.5", www, "www.example.com.");
        h.add_reverse("10.0.0.0", 24);

        reconcile_reverse_zone(&h.ctx, "10.0.0.0").unwrap();

        assert_eq!(h.ptrs("10.0.0.0"), vec![("5".to_string(), "www.example.com.".to_string())]);
    }

    #[test]
    fn test_deleted_a_record_loses_ptr() {
        let h = Harness::new();
        let zone = h.add_zone("example.com");
        h.add_a(zone, "www", "10.0.0.5");
        h.add_reverse("10.0.0.0", 24);
        reconcile_reverse_zone(&h.ctx, "10.0.0.0").unwrap();

        catalog::delete_records(h.ctx.store(), zone, "www", RecordType::A).unwrap();
        let outcome = reconcile_reverse_zone(&h.ctx, "10.0.0.0").unwrap();

        assert_eq!(outcome.removed, 1);
        assert!(h.ptrs("10.0.0.0").is_empty());
        assert_eq!(outcome.build, BuildOutcome::Built { serial: 2_024_010_202 });
        assert!(!h.zone_file("10.0.0.0").unwrap().contains("PTR"));
    }

    #[test]
    fn test_classless_zone_labels_relative_to_block() {
        let h = Harness::new();
        let zone = h.add_zone("example.com");
        h.add_a(zone, "first", "192.168.1.1");
        h.add_a(zone, "last", "192.168.1.62");
        h.add_a(zone, "outside", "192.168.1.65");
        h.add_reverse("192.168.1.0", 26);

        let outcome = reconcile_reverse_zone(&h.ctx, "192.168.1.0").unwrap();

        assert_eq!(outcome.added, 2);
        assert_eq!(
            h.ptrs("192.168.1.0"),
            vec![
                ("1".to_string(), "first.example.com.".to_string()),
                ("62".to_string(), "last.example.com.".to_string()),
            ]
        );
        assert_eq!(h.checker.zone_checks.borrow()[0].0, "0/26.1.168.192.in-addr.arpa");
    }

    #[test]
    fn test_sibling_classless_blocks_stay_apart() {
        let h = Harness::new();
        let zone = h.add_zone("example.com");
        h.add_a(zone, "low", "192.168.1.10");
        h.add_a(zone, "high", "192.168.1.70");
        h.add_reverse("192.168.1.0", 26);
        h.add_reverse("192.168.1.64", 26);

        reconcile_reverse_zone(&h.ctx, "192.168.1.0").unwrap();
        reconcile_reverse_zone(&h.ctx, "192.168.1.64").unwrap();

        assert_eq!(h.ptrs("192.168.1.0"), vec![("10".to_string(), "low.example.com.".to_string())]);
        assert_eq!(h.ptrs("192.168.1.64"), vec![("70".to_string(), "high.example.com.".to_string())]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let h = Harness::new();
        let zone = h.add_zone("example.com");
        h.add_a(zone, "www", "10.0.0.5");
        h.add_a(zone, "mail", "10.0.0.6");
        h.add_reverse("10.0.0.0", 24);
        reconcile_reverse_zone(&h.ctx, "10.0.0.0").unwrap();
        let text = h.zone_file("10.0.0.0").unwrap();

        let outcome = reconcile_reverse_zone(&h.ctx, "10.0.0.0").unwrap();

        assert_eq!(outcome.added, 0);
        assert_eq!(outcome.removed, 0);
        assert_eq!(outcome.build, BuildOutcome::Unchanged { serial: 2_024_010_201 });
        assert_eq!(h.zone_file("10.0.0.0").unwrap(), text);
    }

    #[test]
    fn test_malformed_record_set_aborts_before_writes() {
        let mut h = Harness::new();
        let zone = h.add_zone("example.com");
        h.add_a(zone, "www", "10.0.0.5");
        h.add_reverse("10.0.0.0", 24);
        let writes = h.truncate(Query::ForwardARecordsLike);

        let err = reconcile_reverse_zone(&h.ctx, "10.0.0.0").unwrap_err();

        assert!(matches!(
            err,
            DnsaError::Zone(ZoneError::MalformedRecordSet {
                query: "ForwardARecordsLike",
                ..
            })
        ));
        assert_eq!(writes.get(), 0);
        assert!(h.zone_file("10.0.0.0").is_none());
    }

    #[test]
    fn test_rejected_reverse_zone_keeps_ptrs_but_not_file() {
        let h = Harness::new();
        let zone = h.add_zone("example.com");
        h.add_a(zone, "www", "10.0.0.5");
        h.add_reverse("10.0.0.0", 24);
        h.checker.reject_zones.set(true);

        let outcome = reconcile_reverse_zone(&h.ctx, "10.0.0.0").unwrap();

        assert_eq!(outcome.build, BuildOutcome::Invalid);
        assert_eq!(h.ptrs("10.0.0.0").len(), 1);
        assert!(h.zone_file("10.0.0.0").is_none());
        let rev = catalog::reverse_zone(h.ctx.store(), "10.0.0.0").unwrap();
        assert_eq!(rev.validity, Validity::Invalid);
    }

    #[test]
    fn test_build_reverse_publishes_and_reloads() {
        let h = Harness::new();
        let zone = h.add_zone("example.com");
        h.add_a(zone, "www", "10.0.0.5");
        h.add_reverse("10.0.0.0", 24);

        build_reverse(&h.ctx, "10.0.0.0").unwrap();

        let conf = fs::read_to_string(&h.ctx.settings.reverse_config).unwrap();
        assert!(conf.contains("zone \"0.0.10.in-addr.arpa\" {"));
        assert!(conf.contains("10.0.0.0\";"));
        assert_eq!(h.reloader.reloads.get(), 1);

        build_reverse(&h.ctx, "10.0.0.0").unwrap();
        assert_eq!(h.reloader.reloads.get(), 1);
    }

    #[test]
    fn test_build_reverse_zone_does_not_reconcile() {
        let h = Harness::new();
        let zone = h.add_zone("example.com");
        h.add_a(zone, "www", "10.0.0.5");
        h.add_reverse("10.0.0.0", 24);

        let outcome = build_reverse_zone(&h.ctx, "10.0.0.0").unwrap();

        assert!(outcome.is_built());
        assert!(h.ptrs("10.0.0.0").is_empty());
    }

    #[test]
    fn test_unknown_reverse_zone() {
        let h = Harness::new();
        let err = reconcile_reverse_zone(&h.ctx, "10.9.9.0").unwrap_err();
        assert_eq!(err.status_reason(), "ZoneNotFound");
    }

    #[test]
    fn test_display_reverse_zone_lists_ptrs() {
        let h = Harness::new();
        let rev = h.add_reverse("10.0.0.0", 24);
        catalog::insert_reverse_record(h.ctx.store(), rev, 0, "9", "nine.example.com.").unwrap();

        let text = display_reverse_zone(&h.ctx, "10.0.0.0").unwrap();

        assert!(text.contains("9\tPTR\tnine.example.com.\n"));
        assert!(h.zone_file("10.0.0.0").is_none());
    }
}
