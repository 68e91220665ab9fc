use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;

macro_rules! define_header_keys {
    ($($name:ident => $string:expr),* $(,)?) => {
        /// Header name; compares and hashes case-insensitively while keeping
        /// the spelling it was received with.
        #[derive(Debug, Clone)]
        pub enum HeaderKey {
            $($name,)*
            Custom(String),
        }

        impl HeaderKey {
            pub fn from_str(s: &str) -> Option<Self> {
                let s_trimmed = s.trim();
                if s_trimmed.is_empty() {
                    return None;
                }
                let s_lower = s_trimmed.to_ascii_lowercase();
                match s_lower.as_str() {
                    $(
                        s if s == $string.to_ascii_lowercase() => Some(HeaderKey::$name),
                    )*
                    _ => Some(HeaderKey::Custom(s_trimmed.to_string())),
                }
            }

            pub fn as_str(&self) -> &str {
                match self {
                    $(
                        HeaderKey::$name => $string,
                    )*
                    HeaderKey::Custom(s) => s.as_str(),
                }
            }
        }

        impl PartialEq for HeaderKey {
            fn eq(&self, other: &Self) -> bool {
                self.as_str().eq_ignore_ascii_case(other.as_str())
            }
        }

        impl Eq for HeaderKey {}

        impl Hash for HeaderKey {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.as_str().to_ascii_lowercase().hash(state);
            }
        }
    };
}

define_header_keys! {
    // ===== General =====
    Connection => "Connection",
    Date => "Date",
    TransferEncoding => "Transfer-Encoding",

    // ===== Request =====
    Accept => "Accept",
    AcceptCharset => "Accept-Charset",
    Expect => "Expect",
    Host => "Host",
    UserAgent => "User-Agent",

    // ===== Response =====
    Server => "Server",

    // ===== Entity =====
    ContentDisposition => "Content-Disposition",
    ContentEncoding => "Content-Encoding",
    ContentLength => "Content-Length",
    ContentType => "Content-Type",
}

impl fmt::Display for HeaderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
