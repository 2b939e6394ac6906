//! Authentication filters.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::error::{Error, Result};
use crate::filter::{Filter, FilterContext};
use crate::http::HttpResponse;
use crate::request::RequestSpec;
use crate::response::ResponseSpec;

/// Sends preemptive HTTP basic credentials.
#[derive(Debug, Clone)]
pub struct BasicAuthFilter {
    username: String,
    password: String,
}

impl BasicAuthFilter {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn header_value(&self) -> String {
        let credentials = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(credentials))
    }
}

impl Filter for BasicAuthFilter {
    fn filter(
        &self,
        request: &mut RequestSpec,
        response: &mut ResponseSpec,
        ctx: FilterContext<'_>,
    ) -> Result<HttpResponse> {
        request
            .remove_header("Authorization")
            .header("Authorization", self.header_value());
        ctx.next(request, response)
    }

    fn name(&self) -> &str {
        "basic-auth"
    }
}

pub const DEFAULT_LOGIN_ACTION: &str = "/j_spring_security_check";
pub const DEFAULT_USERNAME_FIELD: &str = "j_username";
pub const DEFAULT_PASSWORD_FIELD: &str = "j_password";

/// Logs in through an HTML form endpoint before the request goes out.
///
/// The login is a separate POST issued through the request's transport. It
/// does not pass through any filter. Every cookie the login sets is copied
/// into a `Cookie` header on the filtered request. A login answered with a
/// status of 400 or above, or one that sets no cookie, fails the request
/// with [`Error::Authentication`].
#[derive(Debug, Clone)]
pub struct FormAuthFilter {
    username: String,
    password: String,
    username_field: String,
    password_field: String,
    action: String,
}

impl FormAuthFilter {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            username_field: DEFAULT_USERNAME_FIELD.to_string(),
            password_field: DEFAULT_PASSWORD_FIELD.to_string(),
            action: DEFAULT_LOGIN_ACTION.to_string(),
        }
    }

    pub fn username_field(mut self, field: impl Into<String>) -> Self {
        self.username_field = field.into();
        self
    }

    pub fn password_field(mut self, field: impl Into<String>) -> Self {
        self.password_field = field.into();
        self
    }

    /// Path the login form posts to.
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    fn login(&self, request: &RequestSpec) -> Result<String> {
        let mut login = request.detached();
        login
            .form_param(self.username_field.as_str(), &self.username)
            .form_param(self.password_field.as_str(), &self.password);
        let response = login.post(&self.action)?;

        if response.status >= 400 {
            return Err(Error::Authentication(format!(
                "login at {} answered {}",
                self.action, response.status_line
            )));
        }

        let cookies: Vec<&str> = response
            .headers_named("set-cookie")
            .filter_map(|cookie| cookie.split(';').next())
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .collect();
        if cookies.is_empty() {
            return Err(Error::Authentication(format!(
                "login at {} set no session cookie",
                self.action
            )));
        }
        Ok(cookies.join("; "))
    }
}

impl Filter for FormAuthFilter {
    fn filter(
        &self,
        request: &mut RequestSpec,
        response: &mut ResponseSpec,
        ctx: FilterContext<'_>,
    ) -> Result<HttpResponse> {
        let cookie = self.login(request)?;
        debug!(action = %self.action, user = %self.username, "form login succeeded");
        request.header("Cookie", cookie);
        ctx.next(request, response)
    }

    fn name(&self) -> &str {
        "form-auth"
    }
}
