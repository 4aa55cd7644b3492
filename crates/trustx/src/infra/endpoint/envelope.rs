//! The endpoint answers either with a bare JSON body or with a JSONP
//! envelope of the form `<callback path>("<token>")(<body>);`. The envelope is
//! taken apart textually, its content is never evaluated.

use {crate::domain::profile::CALLBACK_PATH, thiserror::Error, trustx_dto::response::Response};

/// A decoded response.
#[derive(Debug)]
pub struct Envelope {
    /// The token echoed by the endpoint, `None` for bare JSON bodies.
    pub token: Option<String>,
    pub response: Response,
}

pub fn decode(payload: &str) -> Result<Envelope, Error> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(Error::Empty);
    }
    if payload.starts_with('{') {
        return Ok(Envelope {
            token: None,
            response: serde_json::from_str(payload)?,
        });
    }

    let call = payload.strip_prefix(CALLBACK_PATH).ok_or(Error::Callback)?;
    let call = call.strip_prefix("(\"").ok_or(Error::Malformed)?;
    let (token, body) = call.split_once("\")(").ok_or(Error::Malformed)?;
    let body = body.trim_end();
    let body = body.strip_suffix(';').unwrap_or(body).trim_end();
    let body = body.strip_suffix(')').ok_or(Error::Malformed)?;
    Ok(Envelope {
        token: Some(token.to_owned()),
        response: serde_json::from_str(body)?,
    })
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("empty response")]
    Empty,
    #[error("response does not invoke the adapter callback")]
    Callback,
    #[error("malformed callback invocation")]
    Malformed,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
