//! Heuristics for whether Google sign-in can work on the domain a front end is served from.
//!
//! Firebase only completes OAuth sign-in on domains listed in the project's authorized domains.
//! Preview deployments get fresh hostnames that are never on that list, so sign-in is better
//! hidden there. None of this is authoritative; it only decides what to offer the user.

pub const EMULATOR_VAR: &str = "USE_FIREBASE_EMULATOR";
pub const AUTH_DOMAIN_VAR: &str = "FIREBASE_AUTH_DOMAIN";

/// Hostnames (or hostname suffixes) used by preview and tunnelling services.
const PREVIEW_DOMAINS: &[&str] = &[
    "vercel.app",
    "netlify.app",
    "github.io",
    "now.sh",
    "preview.app",
    "ngrok.io",
    "localhost",
];

/// Domains that are authorized in every Firebase project out of the box.
const DEFAULT_AUTHORIZED_DOMAINS: &[&str] = &["localhost"];

/// The hosting context a front end runs in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthEnvironment {
    /// Hostname the front end is served from. `None` outside a browser.
    pub hostname: Option<String>,
    /// Whether the Firebase auth emulator is in use, which accepts any domain.
    pub use_emulator: bool,
    pub firebase_auth_domain: Option<String>,
}

impl AuthEnvironment {
    /// Reads the emulator flag and auth domain from the environment.
    pub fn from_env(hostname: Option<String>) -> Self {
        Self {
            hostname,
            use_emulator: std::env::var(EMULATOR_VAR).is_ok_and(|v| v == "true"),
            firebase_auth_domain: std::env::var(AUTH_DOMAIN_VAR)
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }

    pub fn current_domain(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    pub fn firebase_auth_domain(&self) -> Option<&str> {
        self.firebase_auth_domain.as_deref()
    }

    pub fn is_preview_environment(&self) -> bool {
        if self.use_emulator {
            return false;
        }
        let Some(hostname) = self.current_domain() else {
            return false;
        };
        PREVIEW_DOMAINS
            .iter()
            .any(|domain| hostname.contains(domain))
    }

    /// Whether the current domain is probably on the project's authorized list.
    ///
    /// Besides the Firebase defaults, the configured auth domain and its subdomains count.
    pub fn is_domain_likely_authorized(&self) -> bool {
        if self.use_emulator {
            return true;
        }
        let Some(hostname) = self.current_domain() else {
            return false;
        };
        DEFAULT_AUTHORIZED_DOMAINS
            .iter()
            .copied()
            .chain(self.firebase_auth_domain())
            .any(|domain| {
                hostname == domain
                    || hostname
                        .strip_suffix(domain)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            })
    }

    /// The current domain and its common variants, to add to the authorized list.
    pub fn domains_to_authorize(&self) -> Vec<String> {
        let Some(hostname) = self.current_domain() else {
            return Vec::new();
        };

        let mut domains = vec![hostname.to_string()];
        if hostname != "localhost" {
            if !hostname.starts_with("www.") {
                domains.push(format!("www.{hostname}"));
            }
            let labels: Vec<&str> = hostname.split('.').collect();
            if labels.len() > 2 {
                domains.push(labels[labels.len() - 2..].join("."));
            }
        }
        domains
    }

    pub fn should_disable_google_sign_in(&self) -> bool {
        if self.use_emulator {
            return false;
        }
        if self.is_preview_environment() {
            return true;
        }
        !self.is_domain_likely_authorized()
    }
}
