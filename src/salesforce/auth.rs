//! Username/password login through the SOAP partner API
//!
//! Salesforce accepts the password with the user's security token appended.
//! The response carries a session id (usable as a REST bearer token) and the
//! server URL, from which the instance host is derived.

use super::RestSession;
use crate::config::SalesforceConfig;
use crate::error::{Result, SalesforceMcpError};
use once_cell::sync::Lazy;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

static INSTANCE_ORIGIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(https?://[^/]+)").expect("valid origin regex"));

/// Session id and instance extracted from a successful login
#[derive(Debug)]
pub struct LoginResult {
    pub session_id: SecretString,
    pub instance_url: String,
}

/// Log in with the configured credentials and open a REST session.
pub async fn login(config: &SalesforceConfig) -> Result<RestSession> {
    let endpoint = login_endpoint(config);
    info!(
        "Logging in to Salesforce as {} via {}",
        config.username, endpoint
    );

    let password_and_token = SecretString::from(format!(
        "{}{}",
        config.password.expose_secret(),
        config.security_token.expose_secret()
    ));
    let envelope = login_envelope(&config.username, &password_and_token);

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;
    let response = client
        .post(&endpoint)
        .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=UTF-8")
        .header("SOAPAction", "login")
        .body(envelope)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    debug!("Login response status: {}", status);

    let result = parse_login_response(&body)?;
    info!("Salesforce login succeeded, instance {}", result.instance_url);

    RestSession::new(
        result.instance_url,
        result.session_id,
        config.api_version.clone(),
        config.request_timeout,
    )
}

/// SOAP login URL for the configured domain (or explicit override)
pub fn login_endpoint(config: &SalesforceConfig) -> String {
    let base = config
        .login_url
        .clone()
        .unwrap_or_else(|| format!("https://{}.salesforce.com", config.domain));
    format!(
        "{}/services/Soap/u/{}",
        base.trim_end_matches('/'),
        config.api_version
    )
}

fn login_envelope(username: &str, password_and_token: &SecretString) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8" ?>
<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xmlns:env="http://schemas.xmlsoap.org/soap/envelope/"
    xmlns:urn="urn:partner.soap.sforce.com">
  <env:Header>
    <urn:CallOptions>
      <urn:client>salesforce-mcp</urn:client>
      <urn:defaultNamespace>sf</urn:defaultNamespace>
    </urn:CallOptions>
  </env:Header>
  <env:Body>
    <n1:login xmlns:n1="urn:partner.soap.sforce.com">
      <n1:username>{}</n1:username>
      <n1:password>{}</n1:password>
    </n1:login>
  </env:Body>
</env:Envelope>"#,
        escape(username),
        escape(password_and_token.expose_secret())
    )
}

/// Text of the login response elements the bridge cares about
#[derive(Debug, Default)]
struct LoginFields {
    session_id: Option<String>,
    server_url: Option<String>,
    fault: Option<String>,
}

fn unreadable(e: impl std::fmt::Display) -> SalesforceMcpError {
    SalesforceMcpError::Auth(format!("unreadable login response: {}", e))
}

/// Walk the SOAP body and collect the first `sessionId`, `serverUrl` and
/// `faultstring` values, whatever namespace prefix they carry.
fn read_login_fields(body: &str) -> Result<LoginFields> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut fields = LoginFields::default();
    let mut current: Option<Vec<u8>> = None;

    loop {
        match reader.read_event().map_err(unreadable)? {
            Event::Start(element) => {
                let name = element.local_name().as_ref().to_vec();
                // An empty faultstring is still a fault.
                if name == b"faultstring" {
                    fields.fault.get_or_insert_with(String::new);
                }
                current = Some(name);
            }
            Event::Empty(element) => {
                if element.local_name().as_ref() == b"faultstring" {
                    fields.fault.get_or_insert_with(String::new);
                }
            }
            Event::End(_) => current = None,
            Event::Text(text) => {
                let slot = match current.as_deref() {
                    Some(b"sessionId") => &mut fields.session_id,
                    Some(b"serverUrl") => &mut fields.server_url,
                    Some(b"faultstring") => &mut fields.fault,
                    _ => continue,
                };
                if slot.as_deref().map_or(true, str::is_empty) {
                    *slot = Some(text.unescape().map_err(unreadable)?.into_owned());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(fields)
}

/// Extract the session id and instance URL, or the SOAP fault text.
pub fn parse_login_response(body: &str) -> Result<LoginResult> {
    let fields = read_login_fields(body)?;

    if let Some(message) = fields.fault {
        warn!("Salesforce login rejected: {}", message);
        return Err(SalesforceMcpError::Auth(message));
    }

    let session_id = fields.session_id.ok_or_else(|| {
        SalesforceMcpError::Auth("login response did not contain a session id".to_string())
    })?;

    let server_url = fields.server_url.ok_or_else(|| {
        SalesforceMcpError::Auth("login response did not contain a server URL".to_string())
    })?;

    let instance_url = INSTANCE_ORIGIN
        .captures(&server_url)
        .map(|c| c[1].to_string())
        .ok_or_else(|| {
            SalesforceMcpError::Auth(format!("unexpected server URL in login response: {}", server_url))
        })?;

    Ok(LoginResult {
        session_id: SecretString::from(session_id),
        instance_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_OK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="urn:partner.soap.sforce.com">
<soapenv:Body><loginResponse><result>
<metadataServerUrl>https://acme.my.salesforce.com/services/Soap/m/59.0/00D5Y000001abc</metadataServerUrl>
<passwordExpired>false</passwordExpired>
<sandbox>false</sandbox>
<serverUrl>https://acme.my.salesforce.com/services/Soap/u/59.0/00D5Y000001abc</serverUrl>
<sessionId>00D5Y000001abc!AQ0AQKz</sessionId>
</result></loginResponse></soapenv:Body></soapenv:Envelope>"#;

    const LOGIN_FAULT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:sf="urn:fault.partner.soap.sforce.com">
<soapenv:Body><soapenv:Fault><faultcode>sf:INVALID_LOGIN</faultcode>
<faultstring>INVALID_LOGIN: Invalid username, password, security token; or user locked out.</faultstring>
</soapenv:Fault></soapenv:Body></soapenv:Envelope>"#;

    #[test]
    fn test_parse_successful_login() {
        let result = parse_login_response(LOGIN_OK).unwrap();
        assert_eq!(result.instance_url, "https://acme.my.salesforce.com");
        assert_eq!(result.session_id.expose_secret(), "00D5Y000001abc!AQ0AQKz");
    }

    #[test]
    fn test_parse_fault() {
        let err = parse_login_response(LOGIN_FAULT).unwrap_err();
        match err {
            SalesforceMcpError::Auth(msg) => assert!(msg.starts_with("INVALID_LOGIN")),
            other => panic!("expected Auth error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_login_response("<html>maintenance</html>"),
            Err(SalesforceMcpError::Auth(_))
        ));
    }

    #[test]
    fn test_fault_character_references_are_decoded() {
        let body = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
<soapenv:Body><soapenv:Fault><faultcode>sf:LOGIN_MUST_USE_SECURITY_TOKEN</faultcode>
<faultstring>LOGIN_MUST_USE_SECURITY_TOKEN: append the user&#39;s token &amp; retry&#10;see &#x2F;help</faultstring>
</soapenv:Fault></soapenv:Body></soapenv:Envelope>"#;

        match parse_login_response(body).unwrap_err() {
            SalesforceMcpError::Auth(msg) => assert_eq!(
                msg,
                "LOGIN_MUST_USE_SECURITY_TOKEN: append the user's token & retry\nsee /help"
            ),
            other => panic!("expected Auth error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_fault_is_still_rejected() {
        let body = "<Envelope><Body><Fault><faultstring></faultstring></Fault></Body></Envelope>";
        match parse_login_response(body).unwrap_err() {
            SalesforceMcpError::Auth(msg) => assert!(msg.is_empty()),
            other => panic!("expected Auth error, got {:?}", other),
        }
    }

    #[test]
    fn test_session_id_entities_are_decoded() {
        let body = LOGIN_OK.replace("00D5Y000001abc!AQ0AQKz", "00D5Y000001abc!AQ&amp;x");
        let result = parse_login_response(&body).unwrap();
        assert_eq!(result.session_id.expose_secret(), "00D5Y000001abc!AQ&x");
    }

    #[test]
    fn test_envelope_escapes_credentials() {
        let secret = SecretString::from("p<w>d\"'tok".to_string());
        let envelope = login_envelope("a&b@x.com", &secret);
        assert!(envelope.contains("<n1:username>a&amp;b@x.com</n1:username>"));
        assert!(envelope.contains("<n1:password>p&lt;w&gt;d&quot;&apos;tok</n1:password>"));
    }
}
