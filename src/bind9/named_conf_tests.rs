// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod tests {
    use crate::bind9::named_conf::{
        address_family, emit_forward_config, emit_reverse_config, AddressFamily, NotifySources,
        StanzaContext,
    };
    use crate::model::{ForwardZone, ReverseZone, SoaTimers, Validity, ZoneKind};
    use std::net::{Ipv4Addr, Ipv6Addr};

    const TIMERS: SoaTimers = SoaTimers {
        refresh: 604_800,
        retry: 86_400,
        expire: 2_419_200,
        ttl: 86_400,
    };

    fn forward(name: &str, validity: Validity, secondary: Option<&str>) -> ForwardZone {
        ForwardZone {
            id: 1,
            name: name.into(),
            primary_ns: "ns1.example.com".into(),
            secondary_ns: secondary.map(Into::into),
            hostmaster: "hostmaster.example.com".into(),
            serial: 2_024_010_101,
            timers: TIMERS,
            validity,
            updated: false,
            kind: ZoneKind::Master,
            master: None,
        }
    }

    fn reverse(net: &str, prefix: u8) -> ReverseZone {
        ReverseZone {
            id: 1,
            net_range: net.into(),
            prefix,
            net_start: 0,
            net_finish: 0,
            primary_ns: "ns1.example.com".into(),
            secondary_ns: None,
            hostmaster: "hostmaster.example.com".into(),
            serial: 1,
            timers: TIMERS,
            validity: Validity::Valid,
            updated: false,
            kind: ZoneKind::Master,
            master: None,
        }
    }

    fn ctx(notify: NotifySources) -> StanzaContext<'static> {
        StanzaContext {
            zone_dir: "/var/named/",
            slave_dir: "/var/named/slaves/",
            notify,
        }
    }

    #[test]
    fn test_master_stanza() {
        let text = emit_forward_config(
            &[forward("example.com", Validity::Valid, None)],
            &ctx(NotifySources::default()),
        );
        assert_eq!(
            text,
            "zone \"example.com\" {\n\ttype master;\n\tfile \"/var/named/example.com\";\n};\n\n"
        );
    }

    #[test]
    fn test_only_valid_masters_are_listed() {
        let zones = [
            forward("good.test", Validity::Valid, None),
            forward("bad.test", Validity::Invalid, None),
            forward("new.test", Validity::Unknown, None),
        ];
        let text = emit_forward_config(&zones, &ctx(NotifySources::default()));
        assert!(text.contains("\"good.test\""));
        assert!(!text.contains("bad.test"));
        assert!(!text.contains("new.test"));
    }

    #[test]
    fn test_slave_stanza() {
        let mut zone = forward("partner.test", Validity::Unknown, None);
        zone.kind = ZoneKind::Slave;
        zone.master = Some("192.0.2.10".into());

        let text = emit_forward_config(&[zone], &ctx(NotifySources::default()));
        assert_eq!(
            text,
            "zone \"partner.test\" {\n\ttype slave;\n\tmasters { 192.0.2.10; };\n\tfile \"/var/named/slaves/partner.test\";\n};\n\n"
        );
    }

    #[test]
    fn test_slave_without_master_is_skipped() {
        let mut zone = forward("partner.test", Validity::Valid, None);
        zone.kind = ZoneKind::Slave;
        assert!(emit_forward_config(&[zone], &ctx(NotifySources::default())).is_empty());
    }

    #[test]
    fn test_notify_source_follows_secondary_family() {
        let notify = NotifySources {
            v4: Some(Ipv4Addr::new(192, 0, 2, 53)),
            v6: Some("2001:db8::53".parse::<Ipv6Addr>().unwrap()),
        };
        let v4 = emit_forward_config(
            &[forward("a.test", Validity::Valid, Some("192.0.2.2"))],
            &ctx(notify),
        );
        assert!(v4.contains("\tnotify-source 192.0.2.53;\n"));

        let v6 = emit_forward_config(
            &[forward("b.test", Validity::Valid, Some("2001:db8::2"))],
            &ctx(notify),
        );
        assert!(v6.contains("\tnotify-source-v6 2001:db8::53;\n"));
    }

    #[test]
    fn test_notify_source_needs_configured_family() {
        let notify = NotifySources {
            v4: None,
            v6: Some("2001:db8::53".parse::<Ipv6Addr>().unwrap()),
        };
        assert_eq!(notify.line_for(Some("192.0.2.2")), None);
        assert_eq!(notify.line_for(None), None);
        assert_eq!(NotifySources::default().line_for(Some("192.0.2.2")), None);
    }

    #[test]
    fn test_address_family_of_literals() {
        assert_eq!(address_family("10.0.0.1"), Some(AddressFamily::V4));
        assert_eq!(address_family("::1"), Some(AddressFamily::V6));
        assert_eq!(address_family("localhost."), address_family("localhost"));
    }

    #[test]
    fn test_reverse_stanzas_use_arpa_names() {
        let zones = [reverse("10.0.0.0", 24), reverse("192.168.1.64", 26)];
        let text = emit_reverse_config(&zones, &ctx(NotifySources::default()));
        assert!(text.contains(
            "zone \"0.0.10.in-addr.arpa\" {\n\ttype master;\n\tfile \"/var/named/10.0.0.0\";\n};\n"
        ));
        assert!(text.contains("zone \"64/26.1.168.192.in-addr.arpa\" {"));
        assert!(text.contains("\tfile \"/var/named/192.168.1.64\";"));
    }

    #[test]
    fn test_reverse_zone_with_bad_range_is_skipped() {
        let text = emit_reverse_config(&[reverse("10.0.0.0", 20)], &ctx(NotifySources::default()));
        assert!(text.is_empty());
    }
}
