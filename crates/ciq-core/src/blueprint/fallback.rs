//! Built-in parameter table used when the blueprint cannot be read.
//!
//! The copilot keeps prompting even without a template on disk; the
//! merge step will still fail loudly, but collection can proceed.

use super::schema::ParameterSpec;

fn spec(title: &str, description: &str, example: &str) -> ParameterSpec {
    ParameterSpec {
        title: title.to_string(),
        description: description.to_string(),
        example: example.to_string(),
    }
}

/// Static parameter-to-description table covering the core deployment
/// parameters of the NF blueprint.
pub fn fallback_parameters() -> Vec<(String, ParameterSpec)> {
    let entries = [
        (
            "global.alms.host_interface",
            spec("ALMS Host Interface", "ALMS host network interface configuration", ""),
        ),
        (
            "global.alms.ipv4_cidr",
            spec("ALMS IPv4 CIDR", "ALMS IPv4 CIDR network configuration", "10.0.0.0/24"),
        ),
        (
            "global.alms.ipv4_gw",
            spec("ALMS IPv4 Gateway", "ALMS IPv4 gateway address", "10.0.0.1"),
        ),
        (
            "global.alms.ipv4_ip",
            spec("ALMS IPv4 Address", "ALMS IPv4 IP address", "10.0.0.10"),
        ),
        (
            "global.provisioning.dnn1",
            spec("Data Network Name 1", "Data Network Name 1 for 5G provisioning", "internet"),
        ),
        (
            "global.provisioning.dnn2",
            spec("Data Network Name 2", "Data Network Name 2 for 5G provisioning", "ims"),
        ),
        (
            "global.provisioning.mcc",
            spec("Mobile Country Code", "Mobile Country Code for network identification", "001"),
        ),
        (
            "global.provisioning.mnc",
            spec("Mobile Network Code", "Mobile Network Code for network identification", "01"),
        ),
        (
            "global.provisioning.network_name",
            spec("Network Name", "Full network name for display", ""),
        ),
        (
            "global.provisioning.nrf_endpoint_fqdn",
            spec("NRF Endpoint FQDN", "Network Repository Function endpoint FQDN", ""),
        ),
        (
            "global.provisioning.nrf_endpoint_port",
            spec("NRF Endpoint Port", "Network Repository Function endpoint port", "8443"),
        ),
        (
            "global.provisioning.primary_dns_ip",
            spec("Primary DNS IP", "Primary DNS server IP address", "8.8.8.8"),
        ),
        (
            "global.secrets.users.root_passwd",
            spec("Root Password", "Root user password for system administration", ""),
        ),
        (
            "global.containers.storageclass",
            spec("Storage Class", "Kubernetes storage class for persistent volumes", "standard"),
        ),
        (
            "global.containers.timezone",
            spec("Timezone", "System timezone configuration for containers", "UTC"),
        ),
    ];

    entries
        .into_iter()
        .map(|(path, spec)| (path.to_string(), spec))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_paths_are_unique_and_dotted() {
        let params = fallback_parameters();
        let mut paths: Vec<&str> = params.iter().map(|(p, _)| p.as_str()).collect();
        let before = paths.len();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), before);
        assert!(params.iter().all(|(p, _)| p.contains('.')));
    }
}
