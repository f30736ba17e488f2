//! Partner-side helpers around the sign-on handshake.
//!
//! - [`PartnerUser::claims`] / [`PartnerUser::name_identifier`] project the
//!   signed-in partner user onto the attributes the collaborator requires in
//!   its assertion. Building, signing and posting the assertion is left to
//!   the SAML library.
//! - [`sign_in_redirect`] / [`sign_in_redirect_for_page`] keep click-through
//!   parameters when an anonymous user lands on the embedding page.
//!
//! The controller never calls these; they back the partner's sign-in routes
//! and the `claims` / `sign-in-redirect` CLI subcommands.

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// NameID format sent with every assertion.
pub const EMAIL_NAME_ID_FORMAT: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress";

/// The signed-in partner user, as captured at sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerUser {
    /// Partner-side user id.
    pub id: String,
    /// Email address, when known.
    #[serde(default)]
    pub user_email: Option<String>,
    /// Display name, when known.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Collaborator tenant the user belongs to.
    #[serde(default)]
    pub tenant_code: Option<String>,
}

/// Attribute claims required by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionClaims {
    /// Email claim (falls back to the user id).
    pub user_email: String,
    /// Display-name claim (falls back to the user id).
    pub display_name: String,
    /// Tenant claim.
    pub tenant_code: Option<String>,
}

/// Subject NameID of the assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameIdentifier {
    /// NameID value.
    pub name_identifier: String,
    /// NameID `Format` attribute.
    pub name_identifier_format: String,
}

impl PartnerUser {
    fn email_or_id(&self) -> &str {
        non_empty(self.user_email.as_deref()).unwrap_or(&self.id)
    }

    /// Claims for the assertion.
    pub fn claims(&self) -> AssertionClaims {
        AssertionClaims {
            user_email: self.email_or_id().to_string(),
            display_name: non_empty(self.display_name.as_deref())
                .unwrap_or(&self.id)
                .to_string(),
            tenant_code: self.tenant_code.clone(),
        }
    }

    /// NameID for the assertion subject.
    pub fn name_identifier(&self) -> NameIdentifier {
        NameIdentifier {
            name_identifier: self.email_or_id().to_string(),
            name_identifier_format: EMAIL_NAME_ID_FORMAT.to_string(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Sign-in path for an anonymous visitor, keeping every query parameter.
///
/// Returns `/` without parameters, `/?k=v&k2=v2` (re-encoded) otherwise.
pub fn sign_in_redirect<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        return "/".to_string();
    }
    let Ok(mut url) = Url::parse("http://partner.invalid/") else {
        return "/".to_string();
    };
    url.query_pairs_mut()
        .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
    match url.query() {
        Some(query) => format!("/?{query}"),
        None => "/".to_string(),
    }
}

/// Sign-in redirect for an anonymous visit to `page_url`.
///
/// Accepts an absolute URL, a relative path, or a bare query string.
pub fn sign_in_redirect_for_page(page_url: &str) -> String {
    let Ok(base) = Url::parse("http://partner.invalid/") else {
        return "/".to_string();
    };
    match Url::parse(page_url).or_else(|_| base.join(page_url)) {
        Ok(url) => {
            let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
            sign_in_redirect(&params)
        }
        Err(_) => "/".to_string(),
    }
}
