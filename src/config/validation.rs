use lazy_static::lazy_static;
use regex::Regex;
use std::net::Ipv4Addr;
use thiserror::Error;
use tracing::{error, info};

use super::schema::{is_dhcp, HostSpec, ImageConfig};

lazy_static! {
    static ref IPV4_PATTERN: Regex = Regex::new(
        r"^((25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$"
    )
    .unwrap();
    static ref MAC_PATTERN: Regex = Regex::new(r"^([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})$").unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid data is provided in JSON for the nameserver: '{0}'")]
    InvalidNameserver(String),

    #[error("Invalid data is provided in JSON for '{field}' for the host {host}")]
    InvalidHostField { field: &'static str, host: String },

    #[error("Missing required field '{field}' for the host {host}")]
    MissingHostField { field: &'static str, host: String },

    #[error("ESXi license not accepted. Please accept the ESXi license agreement by providing the option 'Yes' in the JSON file")]
    LicenseNotAccepted,

    #[error("Validation of JSON for valid IP address and MAC address failed ({0} violation(s))")]
    InvalidDocument(usize),

    #[error("The file named '{0}' does not exist")]
    FileNotFound(String),

    #[error("There is not enough disk space in the {0} directory")]
    InsufficientSpace(String),

    #[error("Given checksum '{expected}' did not match the calculated checksum '{calculated}'")]
    ChecksumMismatch { expected: String, calculated: String },

    #[error("Password does not match")]
    PasswordMismatch,

    #[error("Password cannot be empty")]
    EmptyPassword,
}

/// Field check order per host. Once an address field holds `dhcp`, the
/// fields after it are not checked.
const HOST_FIELDS: [&str; 4] = ["macAddress", "mgmtIpv4", "mgmtGateway", "mgmtNetmask"];

/// Four dot-separated decimal octets, each 0-255
pub fn validate_ipv4(value: &str) -> bool {
    IPV4_PATTERN.is_match(value) && value.parse::<Ipv4Addr>().is_ok()
}

/// Six colon- or dash-separated hex pairs, any case
pub fn validate_mac(value: &str) -> bool {
    MAC_PATTERN.is_match(value)
}

pub fn check_license(config: &ImageConfig) -> Result<(), ValidationError> {
    if config.license_accepted() {
        Ok(())
    } else {
        Err(ValidationError::LicenseNotAccepted)
    }
}

/// Every address and MAC violation in the document, in document order
pub fn collect_violations(config: &ImageConfig) -> Vec<ValidationError> {
    let mut violations = Vec::new();

    for server in config.dns_servers() {
        if !validate_ipv4(server) {
            violations.push(ValidationError::InvalidNameserver(server.clone()));
        }
    }

    for host in &config.hosts {
        collect_host_violations(host, &mut violations);
    }

    violations
}

fn collect_host_violations(host: &HostSpec, violations: &mut Vec<ValidationError>) {
    for field in HOST_FIELDS {
        let value = match field {
            "macAddress" => {
                if !validate_mac(&host.mac_address) {
                    violations.push(invalid(field, host));
                }
                continue;
            }
            "mgmtIpv4" => Some(host.mgmt_ipv4.as_str()),
            "mgmtGateway" => host.mgmt_gateway.as_deref(),
            _ => host.mgmt_netmask.as_deref(),
        };

        match value {
            Some(value) if is_dhcp(value) => break,
            Some(value) if !validate_ipv4(value) => violations.push(invalid(field, host)),
            Some(_) => {}
            None => violations.push(ValidationError::MissingHostField {
                field,
                host: host.display_name().to_string(),
            }),
        }
    }

    if !host.is_dhcp() && host.host_name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        violations.push(ValidationError::MissingHostField {
            field: "hostName",
            host: host.display_name().to_string(),
        });
    }
}

fn invalid(field: &'static str, host: &HostSpec) -> ValidationError {
    ValidationError::InvalidHostField {
        field,
        host: host.display_name().to_string(),
    }
}

/// Log one error per violation and return how many were found
pub fn report_violations(config: &ImageConfig) -> usize {
    let violations = collect_violations(config);

    for violation in &violations {
        error!("{}", violation);
    }

    if violations.is_empty() {
        info!("Validation of JSON for valid IP address and MAC address is successful.");
    } else {
        error!("Validation of JSON for valid IP address and MAC address failed.");
    }
    violations.len()
}

/// Validate the document, logging one error per violation
pub fn validate_config(config: &ImageConfig) -> bool {
    report_violations(config) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn host(ip: &str, gateway: Option<&str>, netmask: Option<&str>) -> HostSpec {
        HostSpec {
            mac_address: "00:50:56:aa:bb:01".to_string(),
            mgmt_ipv4: ip.to_string(),
            mgmt_netmask: netmask.map(str::to_string),
            mgmt_gateway: gateway.map(str::to_string),
            mgmt_vlan_id: "0".to_string(),
            host_name: Some("esx01".to_string()),
            install_disk: "usb".to_string(),
            clear_part: None,
        }
    }

    fn config(hosts: Vec<HostSpec>, dns: Option<Vec<&str>>) -> ImageConfig {
        ImageConfig {
            esxi_iso_file_name: "base.iso".to_string(),
            iso_checksum: "d41d8cd98f00b204e9800998ecf8427e".to_string(),
            accept_license: "Yes".to_string(),
            dns_suffix: None,
            dns: dns.map(|d| d.into_iter().map(str::to_string).collect()),
            hosts,
        }
    }

    #[rstest]
    #[case("192.168.1.10", true)]
    #[case("0.0.0.0", true)]
    #[case("255.255.255.255", true)]
    #[case("256.1.1.1", false)]
    #[case("192.168.1", false)]
    #[case("192.168.1.1.1", false)]
    #[case("192.168.one.1", false)]
    #[case("10.0.0.1/24", false)]
    #[case("010.0.0.1", false)]
    #[case("10.0.0.01", false)]
    #[case("::1", false)]
    #[case("", false)]
    fn test_validate_ipv4(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(validate_ipv4(value), expected, "{value}");
    }

    #[rstest]
    #[case("AA:BB:CC:DD:EE:FF", true)]
    #[case("aa-bb-cc-dd-ee-ff", true)]
    #[case("00:50:56:Ab:cD:01", true)]
    #[case("AA:BB:CC", false)]
    #[case("AA:BB:CC:DD:EE:GG", false)]
    #[case("AABBCCDDEEFF", false)]
    #[case("AA:BB:CC:DD:EE:FF:00", false)]
    fn test_validate_mac(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(validate_mac(value), expected, "{value}");
    }

    #[test]
    fn test_valid_document() {
        let cfg = config(
            vec![
                host("10.0.0.21", Some("10.0.0.1"), Some("255.255.255.0")),
                host("dhcp", None, None),
            ],
            Some(vec!["10.0.0.2"]),
        );

        assert!(collect_violations(&cfg).is_empty());
        assert!(validate_config(&cfg));
    }

    #[test]
    fn test_invalid_nameserver() {
        let cfg = config(vec![], Some(vec!["10.0.0.2", "10.0.0.300"]));

        assert_eq!(
            collect_violations(&cfg),
            vec![ValidationError::InvalidNameserver("10.0.0.300".to_string())]
        );
        assert!(!validate_config(&cfg));
    }

    #[test]
    fn test_report_violations_counts() {
        let bad = host("10.0.0.256", Some("gateway"), Some("255.255.255.0"));
        let cfg = config(vec![bad], Some(vec!["10.0.0.300"]));

        assert_eq!(report_violations(&cfg), 3);
        assert_eq!(report_violations(&config(vec![], None)), 0);
    }

    #[test]
    fn test_every_violation_is_reported() {
        let mut bad = host("10.0.0.256", Some("gateway"), Some("255.255.255.0"));
        bad.mac_address = "00:50:56".to_string();
        let cfg = config(vec![bad], None);

        let fields: Vec<_> = collect_violations(&cfg)
            .into_iter()
            .map(|v| match v {
                ValidationError::InvalidHostField { field, .. } => field,
                other => panic!("unexpected violation: {other}"),
            })
            .collect();
        assert_eq!(fields, vec!["macAddress", "mgmtIpv4", "mgmtGateway"]);
    }

    #[rstest]
    #[case("dhcp")]
    #[case("DHCP")]
    #[case("Dhcp")]
    fn test_dhcp_host_skips_address_checks(#[case] ip: &str) {
        let cfg = config(vec![host(ip, Some("not-an-ip"), Some("999.0.0.0"))], None);

        assert!(collect_violations(&cfg).is_empty());
    }

    #[test]
    fn test_dhcp_host_still_checks_mac() {
        let mut dhcp = host("dhcp", None, None);
        dhcp.mac_address = "zz:zz:zz:zz:zz:zz".to_string();
        let cfg = config(vec![dhcp], None);

        assert_eq!(collect_violations(&cfg).len(), 1);
    }

    // Preserved short-circuit: a `dhcp` gateway on a static host stops the
    // remaining checks, so the malformed netmask goes unreported.
    #[test]
    fn test_dhcp_gateway_short_circuits_netmask() {
        let cfg = config(vec![host("10.0.0.21", Some("dhcp"), Some("bogus"))], None);

        assert!(collect_violations(&cfg).is_empty());
    }

    #[test]
    fn test_static_host_missing_fields() {
        let mut fixed = host("10.0.0.21", None, Some("255.255.255.0"));
        fixed.host_name = None;
        let cfg = config(vec![fixed], None);

        assert_eq!(
            collect_violations(&cfg),
            vec![
                ValidationError::MissingHostField {
                    field: "mgmtGateway",
                    host: "00:50:56:aa:bb:01".to_string()
                },
                ValidationError::MissingHostField {
                    field: "hostName",
                    host: "00:50:56:aa:bb:01".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_check_license() {
        let mut cfg = config(vec![], None);
        assert!(check_license(&cfg).is_ok());

        cfg.accept_license = "yes".to_string();
        assert_eq!(check_license(&cfg), Err(ValidationError::LicenseNotAccepted));
    }
}
