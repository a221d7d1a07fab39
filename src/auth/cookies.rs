use std::sync::{PoisonError, RwLock};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use url::Url;

/// Cookie jar shared by the HTTP client and the session. `reset` swaps in an
/// empty jar, so a torn-down session stops riding along on later requests.
#[derive(Debug, Default)]
pub struct SessionCookies {
    jar: RwLock<Jar>,
}

impl SessionCookies {
    /// Load a persisted `name=value; name2=value2` header into the jar.
    pub fn seed(&self, header: &str, url: &Url) {
        let jar = self.jar.read().unwrap_or_else(PoisonError::into_inner);
        for pair in header
            .split(';')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
        {
            jar.add_cookie_str(pair, url);
        }
    }

    /// The `Cookie` header the jar would send to `url`.
    pub fn header_for(&self, url: &Url) -> Option<String> {
        self.cookies(url)
            .and_then(|value| value.to_str().ok().map(ToOwned::to_owned))
    }

    pub fn reset(&self) {
        *self.jar.write().unwrap_or_else(PoisonError::into_inner) = Jar::default();
    }
}

impl CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.jar
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.jar
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cookies(url)
    }
}
