#![allow(dead_code)]

use reconlib::Settings;
use wiremock::MockServer;

pub const CRTSH_RESPONSE: &str = r#"[
    {
        "issuer_ca_id": 185756,
        "issuer_name": "C=US, O=DigiCert Inc, CN=DigiCert TLS RSA SHA256 2020 CA1",
        "common_name": "skyline.github.com",
        "name_value": "skyline.github.com\nwww.skyline.github.com",
        "id": 8383197569,
        "entry_timestamp": "2023-01-10T23:48:41.932",
        "not_before": "2023-01-10T00:00:00",
        "not_after": "2024-01-24T23:59:59",
        "serial_number": "071a522c3982234f64fdd14b8f4b9577"
    },
    {
        "issuer_ca_id": 244621,
        "issuer_name": "C=BE, O=GlobalSign nv-sa, CN=GlobalSign Atlas R3 DV TLS CA 2022 Q4",
        "common_name": "f.cloud.github.com",
        "name_value": "f.cloud.github.com",
        "id": 7998084684,
        "entry_timestamp": "2022-11-17T19:45:02.684",
        "not_before": "2022-11-17T19:45:02",
        "not_after": "2023-12-19T19:45:01",
        "serial_number": "01fdd231f5ad27a5acc8d6ffdcf8a4ab"
    }
]"#;

pub const HOSTSEARCH_RESPONSE: &str = "github.com,140.82.121.4\n\
lb-140-82-121-9-fra.github.com,140.82.121.9\n\
api.github.com,140.82.121.6\n";

pub const VIRUSTOTAL_RESPONSE: &str = r#"{
    "meta": {"count": 2},
    "data": [
        {"type": "domain", "id": "svn.nmap.org"},
        {"type": "domain", "id": "issues.nmap.org"}
    ]
}"#;

/// Settings with every service pointed at the mock server
pub fn settings_for(server: &MockServer) -> Settings {
    Settings {
        user_agent: Some("reconlib-tests".to_string()),
        http_timeout_seconds: 5.0,
        crtsh_url: server.uri(),
        hackertarget_url: server.uri(),
        virustotal_url: server.uri(),
        virustotal_api_key: Some("integration-key".to_string()),
        virustotal_api_key_env: "RECONLIB_INTEGRATION_KEY_NEVER_SET".to_string(),
        ..Settings::default()
    }
}
