use serde::Deserialize;

/// Root input document describing the base image and the hosts to install
#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    /// Base ESXi installer image, relative to the working directory
    #[serde(rename = "esxiIsoFileName")]
    pub esxi_iso_file_name: String,
    /// Expected content hash of the base image
    #[serde(rename = "isoMdSum")]
    pub iso_checksum: String,
    #[serde(rename = "AcceptEsxiLicenseAgreement")]
    pub accept_license: String,
    #[serde(rename = "dnsSuffix0", default)]
    pub dns_suffix: Option<String>,
    #[serde(default)]
    pub dns: Option<Vec<String>>,
    pub hosts: Vec<HostSpec>,
}

impl ImageConfig {
    pub fn dns_servers(&self) -> &[String] {
        self.dns.as_deref().unwrap_or_default()
    }

    /// DNS suffix, ignoring a blank value
    pub fn dns_suffix(&self) -> Option<&str> {
        self.dns_suffix.as_deref().filter(|s| !s.is_empty())
    }

    pub fn license_accepted(&self) -> bool {
        self.accept_license.trim() == "Yes"
    }
}

/// One target machine
#[derive(Debug, Clone, Deserialize)]
pub struct HostSpec {
    #[serde(rename = "macAddress")]
    pub mac_address: String,
    /// Management IPv4 address or the literal `dhcp`
    #[serde(rename = "mgmtIpv4")]
    pub mgmt_ipv4: String,
    #[serde(rename = "mgmtNetmask", default)]
    pub mgmt_netmask: Option<String>,
    #[serde(rename = "mgmtGateway", default)]
    pub mgmt_gateway: Option<String>,
    #[serde(rename = "mgmtVlanId")]
    pub mgmt_vlan_id: String,
    #[serde(rename = "hostName", default)]
    pub host_name: Option<String>,
    /// `usb`, `local`, or raw installer flags starting with `--`
    #[serde(rename = "installDisk")]
    pub install_disk: String,
    #[serde(rename = "clearPart", default)]
    pub clear_part: Option<String>,
}

impl HostSpec {
    pub fn is_dhcp(&self) -> bool {
        is_dhcp(&self.mgmt_ipv4)
    }

    /// Name used in log messages, falling back to the MAC address
    pub fn display_name(&self) -> &str {
        self.host_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.mac_address)
    }
}

pub fn is_dhcp(value: &str) -> bool {
    value.eq_ignore_ascii_case("dhcp")
}
