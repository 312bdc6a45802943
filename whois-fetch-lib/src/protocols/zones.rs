//! Zone table: which lookup service is authoritative for a domain suffix.
//!
//! The built-in table covers the common gTLDs and ccTLDs plus a handful of
//! second-level zones run by a different service than their parent.

use std::collections::HashMap;

/// Map from domain suffix (e.g. "com", "br.com") to lookup service hostname.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneTable {
    zones: HashMap<String, String>,
    catch_all: Option<String>,
}

impl ZoneTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (suffix, host) in BUILTIN_ZONES {
            table.insert(*suffix, *host);
        }
        table
    }

    /// Register or replace the service for a suffix.
    ///
    /// Suffixes are stored lowercased and without surrounding dots.
    pub fn insert<S: AsRef<str>, H: Into<String>>(&mut self, suffix: S, host: H) {
        let suffix = suffix.as_ref().trim_matches('.').to_lowercase();
        self.zones.insert(suffix, host.into());
    }

    /// Set the host used when no suffix matches.
    pub fn set_catch_all<H: Into<String>>(&mut self, host: Option<H>) {
        self.catch_all = host.map(Into::into);
    }

    /// The catch-all host, if configured.
    pub fn catch_all(&self) -> Option<&str> {
        self.catch_all.as_deref()
    }

    /// Exact lookup of a single suffix.
    pub fn get(&self, suffix: &str) -> Option<&str> {
        self.zones.get(suffix).map(String::as_str)
    }

    /// Find the service for a query, most specific suffix first.
    ///
    /// Returns the matching suffix and host. For `a.b.c` the candidates are
    /// `a.b.c`, `b.c`, then `c`; the catch-all is consulted last. Matching
    /// ignores ASCII case.
    pub fn lookup<'a>(&'a self, query: &str) -> Option<(String, &'a str)> {
        let query = query.to_ascii_lowercase();
        let labels: Vec<&str> = query.split('.').collect();
        for i in 0..labels.len() {
            let candidate = labels[i..].join(".");
            if let Some(host) = self.zones.get(&candidate) {
                return Some((candidate, host.as_str()));
            }
        }
        self.catch_all
            .as_deref()
            .map(|host| (String::new(), host))
    }

    /// Number of registered suffixes.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// All registered suffixes, sorted.
    pub fn suffixes(&self) -> Vec<&str> {
        let mut suffixes: Vec<&str> = self.zones.keys().map(String::as_str).collect();
        suffixes.sort_unstable();
        suffixes
    }
}

/// Built-in suffix to service mappings.
const BUILTIN_ZONES: &[(&str, &str)] = &[
    // Generic TLDs
    ("com", "whois.verisign-grs.com"),
    ("net", "whois.verisign-grs.com"),
    ("org", "whois.pir.org"),
    ("info", "whois.nic.info"),
    ("biz", "whois.nic.biz"),
    ("name", "whois.nic.name"),
    ("mobi", "whois.nic.mobi"),
    ("pro", "whois.nic.pro"),
    ("aero", "whois.aero"),
    ("asia", "whois.nic.asia"),
    ("coop", "whois.nic.coop"),
    ("museum", "whois.nic.museum"),
    ("travel", "whois.nic.travel"),
    ("xxx", "whois.nic.xxx"),
    ("edu", "whois.educause.edu"),
    ("gov", "whois.dotgov.gov"),
    ("int", "whois.iana.org"),
    ("arpa", "whois.iana.org"),
    ("app", "whois.nic.google"),
    ("dev", "whois.nic.google"),
    ("page", "whois.nic.google"),
    ("xyz", "whois.nic.xyz"),
    ("online", "whois.nic.online"),
    ("site", "whois.nic.site"),
    ("tech", "whois.nic.tech"),
    ("shop", "whois.nic.shop"),
    ("blog", "whois.nic.blog"),
    ("cloud", "whois.nic.cloud"),
    // Country code TLDs
    ("ac", "whois.nic.ac"),
    ("ai", "whois.nic.ai"),
    ("at", "whois.nic.at"),
    ("au", "whois.auda.org.au"),
    ("be", "whois.dns.be"),
    ("br", "whois.registro.br"),
    ("ca", "whois.cira.ca"),
    ("cc", "ccwhois.verisign-grs.com"),
    ("ch", "whois.nic.ch"),
    ("cn", "whois.cnnic.cn"),
    ("co", "whois.nic.co"),
    ("cz", "whois.nic.cz"),
    ("de", "whois.denic.de"),
    ("dk", "whois.punktum.dk"),
    ("es", "whois.nic.es"),
    ("eu", "whois.eu"),
    ("fi", "whois.fi"),
    ("fr", "whois.nic.fr"),
    ("ie", "whois.weare.ie"),
    ("in", "whois.registry.in"),
    ("io", "whois.nic.io"),
    ("it", "whois.nic.it"),
    ("jp", "whois.jprs.jp"),
    ("kr", "whois.kr"),
    ("me", "whois.nic.me"),
    ("mx", "whois.mx"),
    ("nl", "whois.domain-registry.nl"),
    ("no", "whois.norid.no"),
    ("nr", "cenpac.net.nr"),
    ("nz", "whois.irs.net.nz"),
    ("pl", "whois.dns.pl"),
    ("pt", "whois.dns.pt"),
    ("ru", "whois.tcinet.ru"),
    ("se", "whois.iis.se"),
    ("sh", "whois.nic.sh"),
    ("tv", "whois.nic.tv"),
    ("uk", "whois.nic.uk"),
    ("us", "whois.nic.us"),
    ("ws", "whois.website.ws"),
    // Second-level zones served apart from their parent
    ("ac.uk", "whois.ja.net"),
    ("gov.uk", "whois.ja.net"),
    ("br.com", "whois.centralnic.com"),
    ("uk.com", "whois.centralnic.com"),
    ("us.com", "whois.centralnic.com"),
    ("eu.com", "whois.centralnic.com"),
    ("uk.net", "whois.centralnic.com"),
    ("com.nr", "cenpac.net.nr"),
    ("net.nr", "cenpac.net.nr"),
    ("org.nr", "cenpac.net.nr"),
    ("edu.nr", "cenpac.net.nr"),
    ("biz.nr", "cenpac.net.nr"),
    ("info.nr", "cenpac.net.nr"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_contains_common_zones() {
        let table = ZoneTable::builtin();
        assert_eq!(table.get("com"), Some("whois.verisign-grs.com"));
        assert_eq!(table.get("org"), Some("whois.pir.org"));
        assert_eq!(table.get("net.nr"), Some("cenpac.net.nr"));
        assert_eq!(table.len(), BUILTIN_ZONES.len());
        assert!(table.catch_all().is_none());
    }

    #[test]
    fn test_most_specific_suffix_wins() {
        let mut table = ZoneTable::new();
        table.insert("c", "whois.c");
        table.insert("b.c", "whois.b-c");

        let (suffix, host) = table.lookup("a.b.c").unwrap();
        assert_eq!(suffix, "b.c");
        assert_eq!(host, "whois.b-c");

        let (suffix, host) = table.lookup("a.x.c").unwrap();
        assert_eq!(suffix, "c");
        assert_eq!(host, "whois.c");
    }

    #[test]
    fn test_full_query_can_match() {
        let mut table = ZoneTable::new();
        table.insert("b.c", "whois.b-c");
        assert_eq!(table.lookup("b.c").unwrap().1, "whois.b-c");
        // Fewer labels than the suffix never matches it
        assert!(table.lookup("c").is_none());
    }

    #[test]
    fn test_exact_tail_comparison() {
        let mut table = ZoneTable::new();
        table.insert("om", "whois.om");
        assert!(table.lookup("example.com").is_none());
    }

    #[test]
    fn test_catch_all_consulted_last() {
        let mut table = ZoneTable::new();
        table.insert("com", "whois.verisign-grs.com");
        table.set_catch_all(Some("whois.iana.org"));

        assert_eq!(table.lookup("example.com").unwrap().1, "whois.verisign-grs.com");
        let (suffix, host) = table.lookup("x.nonexistent").unwrap();
        assert_eq!(suffix, "");
        assert_eq!(host, "whois.iana.org");
    }

    #[test]
    fn test_insert_normalizes_suffix() {
        let mut table = ZoneTable::new();
        table.insert(".Example.", "whois.example");
        assert_eq!(table.get("example"), Some("whois.example"));
    }

    #[test]
    fn test_builtin_second_level_zones() {
        let table = ZoneTable::builtin();
        assert_eq!(table.lookup("foo.br.com").unwrap().1, "whois.centralnic.com");
        assert_eq!(table.lookup("foo.com").unwrap().1, "whois.verisign-grs.com");
        assert_eq!(table.lookup("ox.ac.uk").unwrap().1, "whois.ja.net");
        assert_eq!(table.lookup("bbc.co.uk").unwrap().1, "whois.nic.uk");
    }

    #[test]
    fn test_suffixes_sorted() {
        let table = ZoneTable::builtin();
        let suffixes = table.suffixes();
        let mut sorted = suffixes.clone();
        sorted.sort();
        assert_eq!(suffixes, sorted);
    }
}
