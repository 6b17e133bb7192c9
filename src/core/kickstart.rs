//! Kickstart (`KS.CFG`) rendering.
//!
//! The file carries the global installer settings, the first-boot script, and
//! a `%pre` section with one block per host. Each block only fires on the
//! machine whose NIC list contains the host's MAC address, and appends that
//! host's directives to the `%include`d side file.

use thiserror::Error;
use tracing::debug;

use crate::config::{HostSpec, ImageConfig};

/// Side file the `%pre` section populates and the main section includes
pub const PRE_SCRIPT_PATH: &str = "/tmp/pre_script.cfg";

/// Name of the kickstart file at the root of the image
pub const KICKSTART_FILE_NAME: &str = "KS.CFG";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("Invalid install_disk value: {0}")]
    InvalidInstallDisk(String),
}

/// Installer flags for an `installDisk` selector
pub fn install_disk_flags(selector: &str) -> Result<&str, RenderError> {
    match selector {
        "usb" => Ok("--firstdisk=usb --overwritevmfs"),
        "local" => Ok("--firstdisk=local --overwritevmfs"),
        flags if flags.starts_with("--") => Ok(flags),
        other => Err(RenderError::InvalidInstallDisk(other.to_string())),
    }
}

/// `name.suffix`, or just `name` without a suffix
pub fn qualified_host_name(name: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) => format!("{}.{}", name, suffix),
        None => name.to_string(),
    }
}

pub struct KickstartRenderer<'a> {
    config: &'a ImageConfig,
    encrypted_root_password: &'a str,
    firstboot_script: &'a str,
}

impl<'a> KickstartRenderer<'a> {
    pub fn new(
        config: &'a ImageConfig,
        encrypted_root_password: &'a str,
        firstboot_script: &'a str,
    ) -> Self {
        Self {
            config,
            encrypted_root_password,
            firstboot_script,
        }
    }

    pub fn render(&self) -> Result<String, RenderError> {
        let mut ks = String::new();

        ks.push_str("vmaccepteula\n");
        ks.push_str(&format!("rootpw --iscrypted {}\n", self.encrypted_root_password.trim()));
        ks.push_str(&format!("%include {}\n", PRE_SCRIPT_PATH));
        ks.push_str("reboot\n");

        ks.push_str("\n%firstboot --interpreter=busybox\n");
        ks.push_str(self.firstboot_script);

        ks.push_str("\n\n%pre --interpreter=busybox\n");
        for host in &self.config.hosts {
            ks.push_str(&self.render_host(host)?);
        }

        Ok(ks)
    }

    /// The conditional `%pre` block for one host
    pub fn render_host(&self, host: &HostSpec) -> Result<String, RenderError> {
        let mac = host.mac_address.to_lowercase();
        let mut block = String::new();

        block.push_str(&format!("if esxcfg-nics -l | grep -q \"{}\"\n", mac));
        block.push_str("then\n");

        if let Some(clear_part) = host.clear_part.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            debug!(
                "The value provided for the clearPart is \"{}\" for the host with the MAC address {}",
                clear_part, mac
            );
            block.push_str(&format!("echo clearpart {} >> {}\n", clear_part, PRE_SCRIPT_PATH));
        }

        let network = self.network_directive(host, &mac);
        debug!(
            "The value provided for the network is \"{}\" for the host with the MAC address {}",
            network, mac
        );
        block.push_str(&format!("echo {} >> {}\n", network, PRE_SCRIPT_PATH));

        let install_disk = host.install_disk.trim();
        let flags = install_disk_flags(install_disk)?;
        debug!(
            "The value provided for the install disk is \"{}\"({}) for the host with the MAC address {}",
            install_disk, flags, mac
        );
        block.push_str(&format!("echo install {} >> {}\n", flags, PRE_SCRIPT_PATH));

        block.push_str("fi\n");
        Ok(block)
    }

    fn network_directive(&self, host: &HostSpec, mac: &str) -> String {
        let vlan = host.mgmt_vlan_id.trim();

        if host.is_dhcp() {
            return format!("network --bootproto=dhcp --vlanid={} --device={}", vlan, mac);
        }

        let host_name = qualified_host_name(
            host.host_name.as_deref().unwrap_or_default().trim(),
            self.config.dns_suffix(),
        );
        let mut directive = format!(
            "network --bootproto=static --ip={} --netmask={} --gateway={} --vlanid={} --hostname={} --device={}",
            host.mgmt_ipv4,
            host.mgmt_netmask.as_deref().unwrap_or_default(),
            host.mgmt_gateway.as_deref().unwrap_or_default(),
            vlan,
            host_name,
            mac
        );

        let dns = self.config.dns_servers();
        if !dns.is_empty() {
            directive.push_str(&format!(" --nameserver={}", dns.join(",").trim()));
        }

        directive
    }
}
