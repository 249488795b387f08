//! Upstream HTTP status classification.

/// HTTP status code returned by the geocoding service.
///
/// Anything other than 200 is surfaced to the host as an upstream failure;
/// the classification helpers only feed log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatusCode(pub u16);

impl HttpStatusCode {
    pub const OK: HttpStatusCode = HttpStatusCode(200);

    /// The only status the geocoding service uses for a usable body.
    pub fn is_ok(&self) -> bool {
        *self == Self::OK
    }

    /// 4xx: usually a bad or missing API key.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    /// 5xx: the service itself failed.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }
}

impl From<u16> for HttpStatusCode {
    fn from(code: u16) -> Self {
        HttpStatusCode(code)
    }
}

impl std::fmt::Display for HttpStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
