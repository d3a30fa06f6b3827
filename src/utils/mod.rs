use actix_web::{FromRequest, web};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::error;

/// Claims issued by the external identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

#[cfg(test)]
impl Claims {
    pub fn new(sub: impl Into<String>, exp: u64) -> Self {
        let now = chrono::Utc::now().timestamp() as u64;
        Claims {
            sub: sub.into(),
            iat: now,
            exp: now + exp,
            email: None,
            name: None,
            username: None,
            picture: None,
        }
    }

    pub fn with_profile(
        mut self,
        email: Option<&str>,
        name: Option<&str>,
        username: Option<&str>,
    ) -> Self {
        self.email = email.map(str::to_owned);
        self.name = name.map(str::to_owned);
        self.username = username.map(str::to_owned);
        self
    }

    pub fn encode(&self, secret: &[u8]) -> Result<String, error::SystemError> {
        let header = jsonwebtoken::Header::new(Algorithm::HS256);
        let key = jsonwebtoken::EncodingKey::from_secret(secret);
        Ok(jsonwebtoken::encode(&header, self, &key)?)
    }
}

impl Claims {
    pub fn decode(token: &str, secret: &[u8]) -> Result<Self, error::SystemError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();
        validation.required_spec_claims.insert("exp".to_string());
        validation.required_spec_claims.insert("sub".to_string());
        let token_data = decode::<Self>(token, &DecodingKey::from_secret(secret), &validation)?;
        Ok(token_data.claims)
    }
}

pub struct ValidatedJson<T>(pub T);

impl<T> FromRequest for ValidatedJson<T>
where
    T: Validate + serde::de::DeserializeOwned + 'static,
{
    type Error = error::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let fut = web::Json::<T>::from_request(req, payload);

        Box::pin(async move {
            let json = fut.await.map_err(|e| error::Error::BadRequest(e.to_string().into()))?;
            let model = json.into_inner();
            model.validate().map_err(|e| error::Error::BadRequest(e.to_string().into()))?;
            Ok(ValidatedJson(model))
        })
    }
}

/// Like [`ValidatedJson`], but an empty body yields `T::default()`.
pub struct OptionalValidatedJson<T>(pub T);

impl<T> FromRequest for OptionalValidatedJson<T>
where
    T: Validate + Default + serde::de::DeserializeOwned + 'static,
{
    type Error = error::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let fut = web::Bytes::from_request(req, payload);

        Box::pin(async move {
            let bytes = fut.await.map_err(|e| error::Error::BadRequest(e.to_string().into()))?;
            let model = if bytes.iter().all(u8::is_ascii_whitespace) {
                T::default()
            } else {
                serde_json::from_slice::<T>(&bytes)
                    .map_err(|e| error::Error::BadRequest(e.to_string().into()))?
            };
            model.validate().map_err(|e| error::Error::BadRequest(e.to_string().into()))?;
            Ok(OptionalValidatedJson(model))
        })
    }
}
