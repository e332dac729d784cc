use super::http::{Headers, HttpTransport, Transport};
use super::query::{build_url, params, QueryParams, QueryUrlBuilder};
use super::source::SubdomainSource;
use super::store::TargetStore;
use crate::config::Settings;
use crate::error::{ReconError, ReconResult};
use crate::utils::validate_ip_address;
use async_trait::async_trait;
use ipnet::IpNet;
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;

/// IP address to hostname, one hostname per address
pub type HostMapping = HashMap<IpAddr, String>;

/// Record type label (A, MX, NS, ...) to values in response order
pub type DnsRecordSet = HashMap<String, Vec<String>>;

const AS_LOOKUP_PATTERN: &str =
    r#"^"(?P<ip_addr>[^"]+)","(?P<asn>[^"]+)","(?P<network>[^"]+)","(?P<owner>.+)"$"#;

/// HackerTarget API endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HackerTargetEndpoint {
    HostSearch,
    DnsLookup,
    ReverseDns,
    AsLookup,
}

impl HackerTargetEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            HackerTargetEndpoint::HostSearch => "hostsearch/",
            HackerTargetEndpoint::DnsLookup => "dnslookup/",
            HackerTargetEndpoint::ReverseDns => "reversedns/",
            HackerTargetEndpoint::AsLookup => "aslookup/",
        }
    }
}

/// Addresses one HackerTarget request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HackerTargetQuery {
    pub endpoint: HackerTargetEndpoint,
    pub params: QueryParams,
}

/// Parsed host-search response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostSearch {
    pub hosts: HostMapping,
    pub subdomains: HashSet<String>,
    pub ip_addresses: HashSet<IpAddr>,
}

/// Ownership of one autonomous system, merged across lookups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsnInfo {
    pub owner: String,
    pub networks: BTreeSet<IpNet>,
}

/// Result of one AS lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsLookup {
    pub ip_address: IpAddr,
    pub asn: u32,
    pub network: IpNet,
    pub owner: String,
}

/// Results accumulated by a [`HackerTargetClient`]
#[derive(Debug, Default)]
pub struct HackerTargetResults {
    pub hosts: TargetStore<HostMapping>,
    pub subdomains: TargetStore<HashSet<String>>,
    pub ip_addresses: TargetStore<HashSet<IpAddr>>,
    pub dns_records: TargetStore<DnsRecordSet>,
    pub as_lookups: TargetStore<AsLookup>,
    /// Keyed by ASN rather than target; never reset
    pub asn: HashMap<u32, AsnInfo>,
}

fn lines(body: &str) -> impl Iterator<Item = &str> {
    body.lines().map(str::trim).filter(|line| !line.is_empty())
}

fn parse_ip(value: &str, context: &str) -> ReconResult<IpAddr> {
    value.trim().parse::<IpAddr>().map_err(|_| {
        ReconError::parse(format!(
            "Invalid IP address '{}' in {} response",
            value, context
        ))
    })
}

/// Parse `hostname,ip` lines
pub fn parse_host_search(body: &str) -> ReconResult<HostSearch> {
    let mut result = HostSearch::default();

    for line in lines(body) {
        let (hostname, ip) = line.split_once(',').ok_or_else(|| {
            ReconError::parse(format!("Unexpected host-search line: '{}'", line))
        })?;

        let hostname = hostname.trim().to_string();
        let ip = parse_ip(ip, "host-search")?;

        result.hosts.insert(ip, hostname.clone());
        result.subdomains.insert(hostname);
        result.ip_addresses.insert(ip);
    }

    Ok(result)
}

/// Parse `TYPE : value` lines, grouping values by record type
pub fn parse_dns_lookup(body: &str) -> ReconResult<DnsRecordSet> {
    let mut records = DnsRecordSet::new();

    for line in lines(body) {
        let (record_type, value) = line.split_once(" : ").ok_or_else(|| {
            ReconError::parse(format!("Unexpected dns-lookup line: '{}'", line))
        })?;

        records
            .entry(record_type.trim().to_string())
            .or_default()
            .push(value.trim().to_string());
    }

    Ok(records)
}

/// Parse a single `ip hostname` line
pub fn parse_reverse_dns(body: &str) -> ReconResult<(IpAddr, String)> {
    let line = lines(body)
        .next()
        .ok_or_else(|| ReconError::parse("Empty reverse-dns response"))?;

    let (ip, hostname) = line.split_once(' ').ok_or_else(|| {
        ReconError::parse(format!("Unexpected reverse-dns line: '{}'", line))
    })?;

    Ok((parse_ip(ip, "reverse-dns")?, hostname.trim().to_string()))
}

/// Parse a `"ip","asn","network","owner"` line
pub fn parse_as_lookup(pattern: &Regex, body: &str) -> ReconResult<AsLookup> {
    let line = body.trim();
    let captures = pattern
        .captures(line)
        .ok_or_else(|| ReconError::parse(format!("Unexpected AS-lookup response: '{}'", line)))?;

    let asn = captures["asn"].trim().parse::<u32>().map_err(|_| {
        ReconError::parse(format!("Invalid ASN '{}' in AS-lookup response", &captures["asn"]))
    })?;
    let network = captures["network"].trim().parse::<IpNet>().map_err(|_| {
        ReconError::parse(format!(
            "Invalid network '{}' in AS-lookup response",
            &captures["network"]
        ))
    })?;

    Ok(AsLookup {
        ip_address: parse_ip(&captures["ip_addr"], "AS-lookup")?,
        asn,
        network,
        owner: captures["owner"].to_string(),
    })
}

/// Client for the HackerTarget host-search, DNS, reverse DNS and AS lookup endpoints
pub struct HackerTargetClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    as_lookup_pattern: Regex,
    results: HackerTargetResults,
}

impl HackerTargetClient {
    /// Create a HackerTarget client with an HTTP transport built from settings
    pub fn new(settings: &Settings) -> ReconResult<Self> {
        let transport = HttpTransport::from_settings(settings)?;
        Self::with_transport(Arc::new(transport), settings)
    }

    /// Create a HackerTarget client on top of an existing transport
    pub fn with_transport(transport: Arc<dyn Transport>, settings: &Settings) -> ReconResult<Self> {
        let as_lookup_pattern = Regex::new(AS_LOOKUP_PATTERN).map_err(|e| {
            ReconError::configuration(format!("Failed to compile AS lookup pattern: {}", e))
        })?;

        Ok(Self {
            transport,
            base_url: settings.hackertarget_url.clone(),
            as_lookup_pattern,
            results: HackerTargetResults::default(),
        })
    }

    /// Query URL for `endpoint` searching for `target`
    pub fn query_url(&self, endpoint: HackerTargetEndpoint, target: &str) -> String {
        self.build_query_url(&HackerTargetQuery {
            endpoint,
            params: params([("q", target)]),
        })
    }

    async fn query(&self, endpoint: HackerTargetEndpoint, target: &str) -> ReconResult<String> {
        let url = self.query_url(endpoint, target);

        tracing::debug!("Querying HackerTarget {:?}: {}", endpoint, url);

        Ok(self.transport.fetch(&url, &Headers::new()).await?)
    }

    /// Map each IP address known for a domain to its hostname
    pub async fn host_search(&mut self, target: &str) -> ReconResult<HostSearch> {
        let body = self.query(HackerTargetEndpoint::HostSearch, target).await?;
        let result = parse_host_search(&body)?;

        tracing::info!(
            "Found {} hosts for {} from HackerTarget",
            result.hosts.len(),
            target
        );

        self.results.hosts.replace(target, result.hosts.clone());
        self.results
            .subdomains
            .replace(target, result.subdomains.clone());
        self.results
            .ip_addresses
            .replace(target, result.ip_addresses.clone());

        Ok(result)
    }

    /// DNS records of a domain, grouped by record type
    pub async fn dns_lookup(&mut self, target: &str) -> ReconResult<DnsRecordSet> {
        let body = self.query(HackerTargetEndpoint::DnsLookup, target).await?;
        let records = parse_dns_lookup(&body)?;

        self.results.dns_records.replace(target, records.clone());

        Ok(records)
    }

    /// Hostname for an IP address
    pub async fn reverse_dns(&mut self, target: &str) -> ReconResult<HostMapping> {
        let ip = validate_ip_address(target)?;
        let body = self
            .query(HackerTargetEndpoint::ReverseDns, &ip.to_string())
            .await?;
        let (ip_address, hostname) = parse_reverse_dns(&body)?;

        let mapping = HostMapping::from([(ip_address, hostname.clone())]);

        self.results.hosts.replace(target, mapping.clone());
        self.results
            .subdomains
            .replace(target, HashSet::from([hostname]));
        self.results
            .ip_addresses
            .replace(target, HashSet::from([ip_address]));

        Ok(mapping)
    }

    /// ASN, network block and owner for an IP address
    pub async fn as_lookup(&mut self, target: &str) -> ReconResult<AsLookup> {
        let ip = validate_ip_address(target)?;
        let body = self
            .query(HackerTargetEndpoint::AsLookup, &ip.to_string())
            .await?;
        let lookup = parse_as_lookup(&self.as_lookup_pattern, &body)?;

        let info = self
            .results
            .asn
            .entry(lookup.asn)
            .or_insert_with(|| AsnInfo {
                owner: lookup.owner.clone(),
                networks: BTreeSet::new(),
            });
        info.owner = lookup.owner.clone();
        info.networks.insert(lookup.network);

        self.results.as_lookups.replace(target, lookup.clone());

        Ok(lookup)
    }

    pub fn results(&self) -> &HackerTargetResults {
        &self.results
    }

    pub fn hosts(&self, target: &str) -> Option<&HostMapping> {
        self.results.hosts.get(target)
    }

    pub fn subdomains(&self, target: &str) -> Option<&HashSet<String>> {
        self.results.subdomains.get(target)
    }

    pub fn ip_addresses(&self, target: &str) -> Option<&HashSet<IpAddr>> {
        self.results.ip_addresses.get(target)
    }

    pub fn dns_records(&self, target: &str) -> Option<&DnsRecordSet> {
        self.results.dns_records.get(target)
    }

    pub fn asn(&self) -> &HashMap<u32, AsnInfo> {
        &self.results.asn
    }
}

impl QueryUrlBuilder for HackerTargetClient {
    type Query = HackerTargetQuery;

    fn build_query_url(&self, query: &HackerTargetQuery) -> String {
        build_url(&self.base_url, query.endpoint.path(), &query.params)
    }
}

#[async_trait]
impl SubdomainSource for HackerTargetClient {
    fn name(&self) -> &'static str {
        "hackertarget"
    }

    async fn fetch_subdomains(&mut self, target: &str) -> ReconResult<HashSet<String>> {
        self.host_search(target).await?;
        Ok(self.subdomains(target).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::external::mock::MockTransport;

    const HOSTSEARCH_RESPONSE: &str = "lb-140-82-114-27-iad.github.com,140.82.114.27\n\
        lb-140-82-121-9-fra.github.com,140.82.121.9\n\
        out-23.smtp.github.com,192.30.252.206\n\
        lb-192-30-255-117-sea.github.com,192.30.255.117\n\
        o1.sgmail.github.com,192.254.114.176\n";

    const DNSLOOKUP_RESPONSE: &str = "A : 140.82.113.4\n\
        MX : 1 aspmx.l.google.com.\n\
        MX : 10 alt3.aspmx.l.google.com.\n\
        MX : 10 alt4.aspmx.l.google.com.\n\
        NS : dns1.p08.nsone.net.\n\
        NS : dns2.p08.nsone.net.\n\
        TXT : \"MS=6BF03E6AF5CB689E315FB6199603BABF2C88D805\"\n\
        TXT : \"MS=ms44452932\"\n\
        SOA : dns1.p08.nsone.net. hostmaster.nsone.net. 1656468023 43200 7200 1209600 3600\n";

    const ASLOOKUP_RESPONSE: &str = "\"140.82.114.27\",\"36459\",\"140.82.114.0/24\",\"GITHUB, US\"\n";

    fn ip(value: &str) -> IpAddr {
        value.parse().unwrap()
    }

    fn client(mock: Arc<MockTransport>) -> HackerTargetClient {
        HackerTargetClient::with_transport(mock, &Settings::default()).unwrap()
    }

    #[test]
    fn test_query_url() {
        let client = client(MockTransport::new());

        assert_eq!(
            client.build_query_url(&HackerTargetQuery {
                endpoint: HackerTargetEndpoint::HostSearch,
                params: Vec::new(),
            }),
            "https://api.hackertarget.com/hostsearch/"
        );
        assert_eq!(
            client.build_query_url(&HackerTargetQuery {
                endpoint: HackerTargetEndpoint::HostSearch,
                params: params([("q", "github.com"), ("apikey", "abc123")]),
            }),
            "https://api.hackertarget.com/hostsearch/?q=github.com&apikey=abc123"
        );
        assert_eq!(
            client.query_url(HackerTargetEndpoint::AsLookup, "140.82.121.9"),
            "https://api.hackertarget.com/aslookup/?q=140.82.121.9"
        );
    }

    #[test]
    fn test_parse_host_search() {
        let result = parse_host_search("a.com,1.2.3.4\nb.com,5.6.7.8\n").unwrap();

        assert_eq!(
            result.subdomains,
            HashSet::from(["a.com".to_string(), "b.com".to_string()])
        );
        assert_eq!(
            result.ip_addresses,
            HashSet::from([ip("1.2.3.4"), ip("5.6.7.8")])
        );
        assert_eq!(
            result.hosts,
            HostMapping::from([
                (ip("1.2.3.4"), "a.com".to_string()),
                (ip("5.6.7.8"), "b.com".to_string()),
            ])
        );
    }

    #[test]
    fn test_parse_host_search_later_ip_overwrites() {
        let result = parse_host_search("a.com,1.2.3.4\nb.com,1.2.3.4").unwrap();

        assert_eq!(result.hosts.len(), 1);
        assert_eq!(result.hosts[&ip("1.2.3.4")], "b.com");
        assert_eq!(result.subdomains.len(), 2);
    }

    #[test]
    fn test_parse_host_search_rejects_garbage() {
        match parse_host_search("API count exceeded - Increase Quota with Membership") {
            Err(ReconError::Parse(msg)) => assert!(msg.contains("API count exceeded")),
            other => panic!("Expected parse error, got {:?}", other),
        }
        assert!(matches!(
            parse_host_search("a.com,not-an-ip"),
            Err(ReconError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_dns_lookup_preserves_order() {
        let records = parse_dns_lookup(DNSLOOKUP_RESPONSE).unwrap();

        assert_eq!(records["A"], vec!["140.82.113.4"]);
        assert_eq!(
            records["MX"],
            vec![
                "1 aspmx.l.google.com.",
                "10 alt3.aspmx.l.google.com.",
                "10 alt4.aspmx.l.google.com.",
            ]
        );
        assert_eq!(records["NS"], vec!["dns1.p08.nsone.net.", "dns2.p08.nsone.net."]);
        assert_eq!(
            records["TXT"],
            vec![
                "\"MS=6BF03E6AF5CB689E315FB6199603BABF2C88D805\"",
                "\"MS=ms44452932\"",
            ]
        );
        assert_eq!(
            records["SOA"],
            vec!["dns1.p08.nsone.net. hostmaster.nsone.net. 1656468023 43200 7200 1209600 3600"]
        );
    }

    #[test]
    fn test_parse_dns_lookup_splits_on_first_separator() {
        let records = parse_dns_lookup("TXT : \"v=spf1 : include\"").unwrap();
        assert_eq!(records["TXT"], vec!["\"v=spf1 : include\""]);
    }

    #[test]
    fn test_parse_as_lookup() {
        let pattern = Regex::new(AS_LOOKUP_PATTERN).unwrap();
        let lookup = parse_as_lookup(&pattern, ASLOOKUP_RESPONSE).unwrap();

        assert_eq!(
            lookup,
            AsLookup {
                ip_address: ip("140.82.114.27"),
                asn: 36459,
                network: "140.82.114.0/24".parse().unwrap(),
                owner: "GITHUB, US".to_string(),
            }
        );

        assert!(matches!(
            parse_as_lookup(&pattern, "error invalid input"),
            Err(ReconError::Parse(_))
        ));
        assert!(matches!(
            parse_as_lookup(&pattern, "\"1.2.3.4\",\"AS1\",\"1.2.3.0/24\",\"X\""),
            Err(ReconError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_host_search_stores_results() {
        let mock = MockTransport::new();
        mock.push_ok(HOSTSEARCH_RESPONSE);
        let mut client = client(mock.clone());

        let result = client.host_search("github.com").await.unwrap();

        assert_eq!(result.hosts.len(), 5);
        assert_eq!(
            result.hosts[&ip("140.82.121.9")],
            "lb-140-82-121-9-fra.github.com"
        );
        assert_eq!(client.hosts("github.com"), Some(&result.hosts));
        assert_eq!(client.subdomains("github.com"), Some(&result.subdomains));
        assert_eq!(client.ip_addresses("github.com"), Some(&result.ip_addresses));
        assert_eq!(
            mock.requested_urls(),
            vec!["https://api.hackertarget.com/hostsearch/?q=github.com"]
        );
    }

    #[tokio::test]
    async fn test_fetch_subdomains() {
        let mock = MockTransport::new();
        mock.push_ok(HOSTSEARCH_RESPONSE);
        let mut client = client(mock);

        let subdomains = client.fetch_subdomains("github.com").await.unwrap();
        assert_eq!(subdomains.len(), 5);
        assert!(subdomains.contains("o1.sgmail.github.com"));
    }

    #[tokio::test]
    async fn test_dns_lookup_replaces_previous_records() {
        let mock = MockTransport::new();
        mock.push_ok(DNSLOOKUP_RESPONSE);
        mock.push_ok("A : 140.82.113.3\n");
        let mut client = client(mock);

        client.dns_lookup("github.com").await.unwrap();
        let records = client.dns_lookup("github.com").await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(client.dns_records("github.com"), Some(&records));
        assert_eq!(records["A"], vec!["140.82.113.3"]);
    }

    #[tokio::test]
    async fn test_reverse_dns() {
        let mock = MockTransport::new();
        mock.push_ok("140.82.121.9 lb-140-82-121-9-fra.github.com\n");
        let mut client = client(mock);

        let mapping = client.reverse_dns("140.82.121.9").await.unwrap();

        assert_eq!(
            mapping,
            HostMapping::from([(
                ip("140.82.121.9"),
                "lb-140-82-121-9-fra.github.com".to_string()
            )])
        );
        assert!(client
            .subdomains("140.82.121.9")
            .unwrap()
            .contains("lb-140-82-121-9-fra.github.com"));
        assert!(client
            .ip_addresses("140.82.121.9")
            .unwrap()
            .contains(&ip("140.82.121.9")));
    }

    #[tokio::test]
    async fn test_invalid_targets_rejected_before_request() {
        let mock = MockTransport::new();
        let mut client = client(mock.clone());

        for result in [
            client.reverse_dns("not-an-ip").await.map(|_| ()),
            client.as_lookup("not-an-ip").await.map(|_| ()),
        ] {
            match result {
                Err(ReconError::InvalidTarget(msg)) => assert!(msg.contains("not-an-ip")),
                other => panic!("Expected invalid target error, got {:?}", other),
            }
        }

        assert!(mock.requested_urls().is_empty());
    }

    #[tokio::test]
    async fn test_as_lookup_accumulates_across_calls() {
        let mock = MockTransport::new();
        mock.push_ok(ASLOOKUP_RESPONSE);
        mock.push_ok("\"140.82.112.3\",\"36459\",\"140.82.112.0/20\",\"GITHUB, US\"");
        mock.push_ok("\"8.8.8.8\",\"15169\",\"8.8.8.0/24\",\"GOOGLE, US\"");
        let mut client = client(mock);

        let first = client.as_lookup("140.82.114.27").await.unwrap();
        assert_eq!(first.asn, 36459);
        assert_eq!(first.network, "140.82.114.0/24".parse::<IpNet>().unwrap());

        client.as_lookup("140.82.112.3").await.unwrap();
        client.as_lookup("8.8.8.8").await.unwrap();

        let github = &client.asn()[&36459];
        assert_eq!(github.owner, "GITHUB, US");
        assert!(github
            .networks
            .contains(&"140.82.114.0/24".parse::<IpNet>().unwrap()));
        assert!(github
            .networks
            .contains(&"140.82.112.0/20".parse::<IpNet>().unwrap()));
        assert_eq!(client.asn()[&15169].owner, "GOOGLE, US");
        assert_eq!(client.asn().len(), 2);
    }
}
