// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod tests {
    use crate::dns_errors::ZoneError;
    use crate::services::ServiceTable;
    use std::io::Write;

    const SAMPLE: &str = "\
# Network services, Internet style
ssh             22/tcp                          # SSH Remote Login Protocol
domain          53/tcp
domain          53/udp
ldap            389/tcp
sip             5060/tcp        sip-tcp
bogus           notaport/tcp
broken
";

    #[test]
    fn test_parse_services_file() {
        let table = ServiceTable::parse(SAMPLE);
        assert_eq!(table.port("ssh", "tcp").unwrap(), 22);
        assert_eq!(table.port("domain", "udp").unwrap(), 53);
        assert_eq!(table.port("ldap", "tcp").unwrap(), 389);
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn test_aliases_resolve() {
        let table = ServiceTable::parse(SAMPLE);
        assert_eq!(table.port("sip-tcp", "tcp").unwrap(), 5060);
    }

    #[test]
    fn test_lookup_ignores_underscores_and_case() {
        let table = ServiceTable::parse(SAMPLE);
        assert_eq!(table.port("_LDAP", "_TCP").unwrap(), 389);
    }

    #[test]
    fn test_unknown_service() {
        let table = ServiceTable::parse(SAMPLE);
        assert_eq!(
            table.port("ldap", "udp").unwrap_err(),
            ZoneError::UnknownService {
                service: "ldap".into(),
                protocol: "udp".into()
            }
        );
    }

    #[test]
    fn test_builtin_table() {
        let table = ServiceTable::builtin();
        assert!(!table.is_empty());
        assert_eq!(table.port("kerberos", "udp").unwrap(), 88);
        assert_eq!(table.port("xmpp-server", "tcp").unwrap(), 5269);
    }

    #[test]
    fn test_load_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let table = ServiceTable::load(&dir.path().join("missing"));
        assert_eq!(table.port("https", "tcp").unwrap(), 443);
    }

    #[test]
    fn test_load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"custom 7777/tcp\n").unwrap();
        let table = ServiceTable::load(file.path());
        assert_eq!(table.port("custom", "tcp").unwrap(), 7777);
        assert!(table.port("https", "tcp").is_err());
    }
}
