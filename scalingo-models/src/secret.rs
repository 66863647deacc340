use std::fmt;

const REDACTED: &str = "[REDACTED]";

/// Suffix appended to a declared prefix to build the connection secret key
pub const CONNECTION_URL_SUFFIX: &str = "_URL";

/// Connection string of a database, as exposed by the provider.
///
/// `Display` and `Debug` never print the value.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseUrl {
    /// Variable name the provider uses for this URL
    pub name: String,
    pub value: String,
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ Name: {}, Value: {} }}", self.name, REDACTED)
    }
}

impl fmt::Debug for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseUrl")
            .field("name", &self.name)
            .field("value", &REDACTED)
            .finish()
    }
}

/// One key of a namespaced secret.
///
/// `Display` and `Debug` never print the value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret {
    pub namespace: String,
    pub name: String,
    pub key: String,
    pub value: String,
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ Namespace: {}, Name: {}, Key: {}, Value: {} }}",
            self.namespace, self.name, self.key, REDACTED
        )
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("key", &self.key)
            .field("value", &REDACTED)
            .finish()
    }
}

/// Key under which the connection URL is stored.
///
/// `<prefix>_URL` when a prefix was declared, `default_name` otherwise.
pub fn compose_connection_url_name(prefix: &str, default_name: &str) -> String {
    if prefix.is_empty() {
        default_name.to_string()
    } else {
        format!("{prefix}{CONNECTION_URL_SUFFIX}")
    }
}
