use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Client, Method, Response, StatusCode, Url};

use crate::errors::{MediaApiError, Result};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

/// Request description resolved exactly once inside [`Session::send`].
///
/// Most calls are a plain GET of one url; everything else (login form, api
/// posts, header overrides, redirect policy) goes through the `Full` shape.
#[derive(Debug, Clone)]
pub enum RequestDescriptor {
    UrlOnly(Url),
    Full {
        url: Url,
        method: Method,
        form: Option<Vec<(&'static str, String)>>,
        headers: HeaderMap,
        follow_redirects: bool,
    },
}

impl RequestDescriptor {
    pub fn get(url: Url) -> Self {
        Self::UrlOnly(url)
    }

    pub fn post_form(url: Url, form: Vec<(&'static str, String)>) -> Self {
        Self::Full {
            url,
            method: Method::POST,
            form: Some(form),
            headers: HeaderMap::new(),
            follow_redirects: true,
        }
    }

    pub fn header(self, name: HeaderName, value: HeaderValue) -> Self {
        let (url, method, form, mut headers, follow_redirects) = self.into_parts();
        headers.insert(name, value);
        Self::Full {
            url,
            method,
            form,
            headers,
            follow_redirects,
        }
    }

    pub fn no_redirects(self) -> Self {
        let (url, method, form, headers, _) = self.into_parts();
        Self::Full {
            url,
            method,
            form,
            headers,
            follow_redirects: false,
        }
    }

    fn into_parts(
        self,
    ) -> (
        Url,
        Method,
        Option<Vec<(&'static str, String)>>,
        HeaderMap,
        bool,
    ) {
        match self {
            Self::UrlOnly(url) => (url, Method::GET, None, HeaderMap::new(), true),
            Self::Full {
                url,
                method,
                form,
                headers,
                follow_redirects,
            } => (url, method, form, headers, follow_redirects),
        }
    }
}

/// Cookie-jar-backed HTTP context shared by every site call.
///
/// Clones share the same jar, so a clone handed to another component keeps
/// seeing the cookies accumulated by earlier requests. reqwest fixes the
/// redirect policy per client, so two clients over one jar cover both
/// policies.
#[derive(Clone)]
pub struct Session {
    client: Client,
    no_redirect_client: Client,
    jar: Arc<Jar>,
}

impl Session {
    pub fn new(user_agent: &str) -> Result<Self> {
        let jar = Arc::new(Jar::default());

        let mut headers = HeaderMap::new();
        let ua = HeaderValue::from_str(user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(USER_AGENT, ua);

        let client = Client::builder()
            .cookie_provider(jar.clone())
            .default_headers(headers.clone())
            .build()
            .map_err(|source| MediaApiError::BuildClient {
                context: "building redirecting client",
                source,
            })?;

        let no_redirect_client = Client::builder()
            .cookie_provider(jar.clone())
            .default_headers(headers)
            .redirect(Policy::none())
            .build()
            .map_err(|source| MediaApiError::BuildClient {
                context: "building no-redirect client",
                source,
            })?;

        Ok(Self {
            client,
            no_redirect_client,
            jar,
        })
    }

    /// Sends a request, following redirects per the descriptor.
    ///
    /// Any final status other than 200 is an error; the error keeps the final
    /// url so callers can still inspect where the redirects landed. On
    /// success `Response::url()` carries the same information.
    pub async fn send(&self, descriptor: RequestDescriptor, context: &str) -> Result<Response> {
        let (url, method, form, headers, follow_redirects) = descriptor.into_parts();
        let client = if follow_redirects {
            &self.client
        } else {
            &self.no_redirect_client
        };

        let mut request = client.request(method, url).headers(headers);
        if let Some(form) = form {
            request = request.form(&form);
        }

        let response = request
            .send()
            .await
            .map_err(|source| MediaApiError::Request {
                context: context.to_string(),
                source,
            })?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let final_url = response.url().to_string();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            return Err(MediaApiError::HttpStatus {
                context: context.to_string(),
                status,
                final_url,
                body,
            });
        }

        Ok(response)
    }

    /// Pure jar lookup, no network call.
    pub fn find_cookie(&self, url: &Url, name: &str) -> Option<String> {
        let header = self.jar.cookies(url)?;
        let raw = header.to_str().ok()?;
        raw.split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_session() -> Session {
        Session::new(DEFAULT_USER_AGENT).expect("session should build")
    }

    #[test]
    fn find_cookie_on_empty_jar_is_none() {
        let session = test_session();
        let url = Url::parse("https://agonp.jp/api/v1/programs/episodes/view.json").unwrap();
        assert_eq!(session.find_cookie(&url, "fuel_csrf_token"), None);
    }

    #[tokio::test]
    async fn send_follows_redirects_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hop"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{}/land", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/land"))
            .respond_with(ResponseTemplate::new(200).set_body_string("landed"))
            .mount(&server)
            .await;

        let session = test_session();
        let url = Url::parse(&format!("{}/hop", server.uri())).unwrap();
        let response = session
            .send(RequestDescriptor::get(url), "following a redirect")
            .await
            .expect("redirect chain should resolve");

        assert!(response.url().as_str().ends_with("/land"));
    }

    #[tokio::test]
    async fn send_without_redirects_surfaces_intermediate_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hop"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{}/land", server.uri()).as_str()),
            )
            .mount(&server)
            .await;

        let session = test_session();
        let url = Url::parse(&format!("{}/hop", server.uri())).unwrap();
        let err = session
            .send(
                RequestDescriptor::get(url).no_redirects(),
                "checking redirect target",
            )
            .await
            .expect_err("302 is not a success status");

        match err {
            MediaApiError::HttpStatus {
                status, final_url, ..
            } => {
                assert_eq!(status.as_u16(), 302);
                assert!(final_url.ends_with("/hop"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn responses_update_the_shared_jar() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/issue"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("set-cookie", "crumb=abc123; Path=/"),
            )
            .mount(&server)
            .await;

        let session = test_session();
        let url = Url::parse(&format!("{}/issue", server.uri())).unwrap();
        session
            .send(RequestDescriptor::get(url.clone()), "collecting a cookie")
            .await
            .expect("request should succeed");

        assert_eq!(session.find_cookie(&url, "crumb").as_deref(), Some("abc123"));
        // a clone shares the jar
        assert_eq!(
            session.clone().find_cookie(&url, "crumb").as_deref(),
            Some("abc123")
        );
    }
}
