// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Golden tests for zone file rendering.

#[cfg(test)]
mod tests {
    use crate::bind9::zone_file::{render_forward_zone, render_reverse_zone, ForwardZoneRecords};
    use crate::dns_errors::ZoneError;
    use crate::model::{
        ForwardZone, GlueRecord, Record, ReverseRecord, ReverseZone, SoaTimers, Validity, ZoneKind,
    };
    use crate::services::ServiceTable;
    use hickory_proto::rr::RecordType;
    use std::net::Ipv4Addr;

    const TIMERS: SoaTimers = SoaTimers {
        refresh: 604_800,
        retry: 86_400,
        expire: 2_419_200,
        ttl: 86_400,
    };

    fn zone() -> ForwardZone {
        ForwardZone {
            id: 1,
            name: "example.com".into(),
            primary_ns: "ns1.example.com".into(),
            secondary_ns: Some("ns2.example.com".into()),
            hostmaster: "hostmaster.example.com".into(),
            serial: 2_024_010_101,
            timers: TIMERS,
            validity: Validity::Valid,
            updated: false,
            kind: ZoneKind::Master,
            master: None,
        }
    }

    fn record(id: i64, host: &str, rtype: RecordType, destination: &str) -> Record {
        Record {
            id,
            zone_id: 1,
            host: host.into(),
            rtype,
            destination: destination.into(),
            priority: None,
            service: None,
            protocol: None,
        }
    }

    fn header() -> Vec<Record> {
        let mut mx = record(2, "@", RecordType::MX, "mail.example.com");
        mx.priority = Some(10);
        let mut srv = record(3, "@", RecordType::SRV, "ldap.example.com");
        srv.priority = Some(0);
        srv.service = Some("ldap".into());
        srv.protocol = Some("tcp".into());
        // Deliberately out of type order
        vec![srv, mx, record(1, "@", RecordType::NS, "ns3.example.com")]
    }

    fn plain() -> Vec<Record> {
        vec![
            record(4, "www", RecordType::A, "10.0.0.5"),
            record(5, "ftp", RecordType::CNAME, "www"),
            record(6, "@", RecordType::TXT, "v=spf1 mx -all"),
        ]
    }

    fn glue() -> Vec<GlueRecord> {
        vec![GlueRecord {
            id: 1,
            zone_id: 1,
            child: "sub".into(),
            primary_ns: "ns1.sub.example.com".into(),
            secondary_ns: Some("ns.other.net".into()),
            primary_ip: Some(Ipv4Addr::new(10, 0, 0, 53)),
            secondary_ip: Some(Ipv4Addr::new(192, 0, 2, 1)),
        }]
    }

    const FORWARD_GOLDEN: &str = "$TTL\t86400
@\tIN\tSOA\tns1.example.com.\thostmaster.example.com. (
\t\t\t2024010201\t; Serial
\t\t\t604800\t; Refresh
\t\t\t86400\t; Retry
\t\t\t2419200\t; Expire
\t\t\t86400 )\t; Negative Cache TTL
;
\tIN\tNS\tns1.example.com.
\tIN\tNS\tns2.example.com.
@\tIN\tNS\tns3.example.com.
@\tIN\tMX\t10\tmail.example.com.
_ldap._tcp.example.com.\tIN\tSRV\t0\t0\t389\tldap.example.com.
www\tIN\tA\t10.0.0.5
ftp\tIN\tCNAME\twww
@\tIN\tTXT\t\"v=spf1 mx -all\"
sub\tIN\tNS\tns1.sub.example.com.
ns1.sub.example.com.\tIN\tA\t10.0.0.53
sub\tIN\tNS\tns.other.net.
";

    #[test]
    fn test_forward_zone_golden() {
        let (header, plain, glue) = (header(), plain(), glue());
        let records = ForwardZoneRecords {
            header: &header,
            plain: &plain,
            glue: &glue,
        };
        let services = ServiceTable::builtin();

        let first = render_forward_zone(&zone(), 2_024_010_201, records, &services).unwrap();
        let second = render_forward_zone(&zone(), 2_024_010_201, records, &services).unwrap();

        assert_eq!(first, FORWARD_GOLDEN);
        assert_eq!(first, second);
    }

    #[test]
    fn test_trailing_dots_are_not_doubled() {
        let mut zone = zone();
        zone.primary_ns = "ns1.example.com.".into();
        zone.hostmaster = "hostmaster.example.com.".into();
        zone.secondary_ns = None;

        let text = render_forward_zone(
            &zone,
            1,
            ForwardZoneRecords {
                header: &[],
                plain: &[],
                glue: &[],
            },
            &ServiceTable::builtin(),
        )
        .unwrap();

        assert!(text.contains("@\tIN\tSOA\tns1.example.com.\thostmaster.example.com. (\n"));
        assert!(!text.contains(".."));
        assert_eq!(text.matches("\tIN\tNS\t").count(), 1);
    }

    #[test]
    fn test_srv_with_unknown_service_fails() {
        let mut srv = record(1, "@", RecordType::SRV, "x.example.com");
        srv.service = Some("nosuch".into());
        srv.protocol = Some("tcp".into());

        let err = render_forward_zone(
            &zone(),
            1,
            ForwardZoneRecords {
                header: &[srv],
                plain: &[],
                glue: &[],
            },
            &ServiceTable::builtin(),
        )
        .unwrap_err();
        assert!(matches!(err, ZoneError::UnknownService { .. }));
    }

    #[test]
    fn test_srv_without_protocol_fails() {
        let mut srv = record(9, "@", RecordType::SRV, "x.example.com");
        srv.service = Some("ldap".into());

        let err = render_forward_zone(
            &zone(),
            1,
            ForwardZoneRecords {
                header: &[srv],
                plain: &[],
                glue: &[],
            },
            &ServiceTable::builtin(),
        )
        .unwrap_err();
        assert!(matches!(err, ZoneError::BadValue { column: 7, .. }));
    }

    #[test]
    fn test_srv_owner_ignores_host_column() {
        let mut srv = record(1, "dc1", RecordType::SRV, "dc1.example.com.");
        srv.priority = Some(5);
        srv.service = Some("_kerberos".into());
        srv.protocol = Some("_udp".into());

        let text = render_forward_zone(
            &zone(),
            1,
            ForwardZoneRecords {
                header: &[srv],
                plain: &[],
                glue: &[],
            },
            &ServiceTable::builtin(),
        )
        .unwrap();
        assert!(text.contains("\n_kerberos._udp.example.com.\tIN\tSRV\t5\t0\t88\tdc1.example.com.\n"));
        assert!(!text.contains("dc1.example.com.\tIN\tSRV"));
    }

    fn reverse_zone() -> ReverseZone {
        ReverseZone {
            id: 7,
            net_range: "192.168.1.0".into(),
            prefix: 26,
            net_start: u32::from(Ipv4Addr::new(192, 168, 1, 0)),
            net_finish: u32::from(Ipv4Addr::new(192, 168, 1, 63)),
            primary_ns: "ns1.example.com".into(),
            secondary_ns: None,
            hostmaster: "hostmaster.example.com".into(),
            serial: 0,
            timers: TIMERS,
            validity: Validity::Unknown,
            updated: true,
            kind: ZoneKind::Master,
            master: None,
        }
    }

    const REVERSE_GOLDEN: &str = "$TTL\t86400
@\tIN\tSOA\tns1.example.com.\thostmaster.example.com. (
\t\t\t2024010201\t; Serial
\t\t\t604800\t; Refresh
\t\t\t86400\t; Retry
\t\t\t2419200\t; Expire
\t\t\t86400 )\t; Negative Cache TTL
;
\tIN\tNS\tns1.example.com.
5\tPTR\twww.example.com.
1\tPTR\tgw.example.com.
";

    #[test]
    fn test_reverse_zone_golden() {
        let ptrs = vec![
            ReverseRecord {
                id: 2,
                rev_zone_id: 7,
                block: 0,
                host: "5".into(),
                destination: "www.example.com.".into(),
            },
            ReverseRecord {
                id: 1,
                rev_zone_id: 7,
                block: 0,
                host: "1".into(),
                destination: "gw.example.com".into(),
            },
        ];

        let text = render_reverse_zone(&reverse_zone(), 2_024_010_201, &ptrs);
        assert_eq!(text, REVERSE_GOLDEN);
        assert_eq!(text, render_reverse_zone(&reverse_zone(), 2_024_010_201, &ptrs));
    }
}
